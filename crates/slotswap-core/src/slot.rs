//! Slots, transfer requests, and the two-phase reassignment arena.
//!
//! A [`Slot`] is the only durable state in the system. A [`TransferRequest`]
//! is an ephemeral "move me from this slot to that one" input. [`SlotArena`]
//! owns the slots loaded for one resolution and applies a closed chain of
//! requests to them: all releases first, then all assignments, so the final
//! owner of every slot depends only on the request that moves into it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{OwnerId, SlotId};

/// A uniquely identified unit of ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    id: SlotId,
    owner: OwnerId,
}

impl Slot {
    pub fn new(id: SlotId, owner: OwnerId) -> Self {
        Slot { id, owner }
    }

    /// Creates an unowned slot.
    pub fn free(id: SlotId) -> Self {
        Slot {
            id,
            owner: OwnerId::empty(),
        }
    }

    pub fn id(&self) -> &SlotId {
        &self.id
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn is_free(&self) -> bool {
        self.owner.is_empty()
    }

    /// Drops the current owner.
    pub fn release(&mut self) {
        self.owner = OwnerId::empty();
    }

    pub fn assign_to(&mut self, owner: OwnerId) {
        self.owner = owner;
    }
}

/// "`requester` holds `from_slot` and wants `to_slot`."
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_slot: SlotId,
    pub to_slot: SlotId,
    pub requester: OwnerId,
}

impl TransferRequest {
    pub fn new(from_slot: SlotId, to_slot: SlotId, requester: OwnerId) -> Self {
        TransferRequest {
            from_slot,
            to_slot,
            requester,
        }
    }

    /// Both endpoint slots, `from_slot` first.
    pub fn slots(&self) -> [&SlotId; 2] {
        [&self.from_slot, &self.to_slot]
    }
}

impl fmt::Display for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.requester, self.from_slot, self.to_slot)
    }
}

/// Owned, id-keyed storage for the slots touched by one resolution.
///
/// Each slot exists exactly once in the arena, so a slot that is the source
/// of one request and the target of another is the same record in both
/// phases of [`SlotArena::apply`].
#[derive(Debug, Clone, Default)]
pub struct SlotArena {
    slots: BTreeMap<SlotId, Slot>,
}

impl SlotArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: Slot) {
        self.slots.insert(slot.id.clone(), slot);
    }

    pub fn get(&self, id: &SlotId) -> Option<&Slot> {
        self.slots.get(id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Applies `requests` as one unit.
    ///
    /// Fails with [`CoreError::SlotNotFound`] before touching anything if an
    /// endpoint is missing. Otherwise every `from_slot` is released, then every
    /// `to_slot` is assigned to its request's requester.
    pub fn apply(&mut self, requests: &[TransferRequest]) -> Result<(), CoreError> {
        if let Some(missing) = requests
            .iter()
            .flat_map(TransferRequest::slots)
            .find(|id| !self.slots.contains_key(*id))
        {
            return Err(CoreError::SlotNotFound {
                id: missing.clone(),
            });
        }

        for request in requests {
            if let Some(slot) = self.slots.get_mut(&request.from_slot) {
                slot.release();
            }
        }
        for request in requests {
            if let Some(slot) = self.slots.get_mut(&request.to_slot) {
                slot.assign_to(request.requester.clone());
            }
        }
        Ok(())
    }

    /// Slots in id order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.values()
    }

    pub fn into_slots(self) -> Vec<Slot> {
        self.slots.into_values().collect()
    }
}

impl FromIterator<Slot> for SlotArena {
    fn from_iter<I: IntoIterator<Item = Slot>>(iter: I) -> Self {
        let mut arena = SlotArena::new();
        for slot in iter {
            arena.insert(slot);
        }
        arena
    }
}
