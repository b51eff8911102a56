//! In-memory implementation of [`SlotRepository`].
//!
//! [`InMemorySlotRepository`] is a first-class backend for tests and for
//! embedding applications that keep slot state in process. Slots live in a
//! `DashMap`, so concurrent readers and writers never block each other on a
//! single global lock.

use std::collections::{BTreeSet, HashMap};

use dashmap::DashMap;

use slotswap_core::{Slot, SlotId};

use crate::error::StorageError;
use crate::traits::SlotRepository;

/// In-memory implementation of [`SlotRepository`].
#[derive(Debug, Default)]
pub struct InMemorySlotRepository {
    slots: DashMap<SlotId, Slot>,
}

impl InMemorySlotRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl SlotRepository for InMemorySlotRepository {
    fn find_by_id(&self, id: &SlotId) -> Result<Option<Slot>, StorageError> {
        Ok(self.slots.get(id).map(|entry| entry.value().clone()))
    }

    fn find_all(&self, ids: &BTreeSet<SlotId>) -> Result<HashMap<SlotId, Slot>, StorageError> {
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.slots
                    .get(id)
                    .map(|entry| (id.clone(), entry.value().clone()))
            })
            .collect())
    }

    fn save(&self, slot: &Slot) -> Result<(), StorageError> {
        self.slots.insert(slot.id().clone(), slot.clone());
        Ok(())
    }

    fn save_all(&self, slots: &[Slot]) -> Result<(), StorageError> {
        for slot in slots {
            self.save(slot)?;
        }
        Ok(())
    }
}
