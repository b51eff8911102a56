//! The [`SlotRepository`] trait defining the storage contract for slots.
//!
//! The exchange logic depends only on this trait. All backends
//! ([`InMemorySlotRepository`](crate::InMemorySlotRepository),
//! [`SqliteSlotRepository`](crate::SqliteSlotRepository)) implement it and are
//! swappable without changing resolution logic.

use std::collections::{BTreeSet, HashMap};

use slotswap_core::{Slot, SlotId};

use crate::error::StorageError;

/// Storage contract for [`Slot`]s.
///
/// Methods take `&self` so one repository can serve concurrent callers;
/// backends provide their own interior synchronization. Returned slots are
/// independent copies: mutating them changes nothing until they are saved.
pub trait SlotRepository: Send + Sync {
    /// Loads a single slot, or `None` if it does not exist.
    fn find_by_id(&self, id: &SlotId) -> Result<Option<Slot>, StorageError>;

    /// Loads every slot in `ids` that exists. Unknown ids are simply absent
    /// from the returned map.
    fn find_all(&self, ids: &BTreeSet<SlotId>) -> Result<HashMap<SlotId, Slot>, StorageError>;

    /// Inserts or overwrites a slot by id.
    fn save(&self, slot: &Slot) -> Result<(), StorageError>;

    /// Inserts or overwrites several slots as one unit.
    fn save_all(&self, slots: &[Slot]) -> Result<(), StorageError>;
}
