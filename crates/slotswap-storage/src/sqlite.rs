//! SQLite implementation of [`SlotRepository`].
//!
//! [`SqliteSlotRepository`] persists slots in a single `slots` table with WAL
//! mode and automatic schema migrations. `save_all` runs in one transaction,
//! so a resolved cycle is either fully written or not written at all.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use slotswap_core::{OwnerId, Slot, SlotId};

use crate::error::StorageError;
use crate::traits::SlotRepository;

const UPSERT_SLOT: &str = "INSERT INTO slots (slot_id, owner_id) VALUES (?1, ?2)
     ON CONFLICT(slot_id) DO UPDATE SET owner_id = excluded.owner_id";

/// SQLite-backed implementation of [`SlotRepository`].
///
/// `rusqlite::Connection` is `!Sync`, so it sits behind a `Mutex`; each
/// repository call holds the connection only for its own statements.
pub struct SqliteSlotRepository {
    conn: Mutex<Connection>,
}

impl SqliteSlotRepository {
    /// Opens (or creates) a SQLite database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        Ok(SqliteSlotRepository {
            conn: Mutex::new(conn),
        })
    }

    /// Opens an in-memory SQLite database.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteSlotRepository {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn load_slot(conn: &Connection, id: &SlotId) -> Result<Option<Slot>, StorageError> {
        let mut stmt = conn.prepare_cached("SELECT owner_id FROM slots WHERE slot_id = ?1")?;
        let owner: Option<String> = stmt
            .query_row(params![id.as_str()], |row| row.get(0))
            .optional()?;
        Ok(owner.map(|owner| Slot::new(id.clone(), OwnerId(owner))))
    }
}

impl SlotRepository for SqliteSlotRepository {
    fn find_by_id(&self, id: &SlotId) -> Result<Option<Slot>, StorageError> {
        let conn = self.conn()?;
        Self::load_slot(&conn, id)
    }

    fn find_all(&self, ids: &BTreeSet<SlotId>) -> Result<HashMap<SlotId, Slot>, StorageError> {
        let conn = self.conn()?;
        let mut found = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(slot) = Self::load_slot(&conn, id)? {
                found.insert(id.clone(), slot);
            }
        }
        Ok(found)
    }

    fn save(&self, slot: &Slot) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(UPSERT_SLOT, params![slot.id().as_str(), slot.owner().as_str()])?;
        Ok(())
    }

    fn save_all(&self, slots: &[Slot]) -> Result<(), StorageError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_SLOT)?;
            for slot in slots {
                stmt.execute(params![slot.id().as_str(), slot.owner().as_str()])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: &str, owner: &str) -> Slot {
        Slot::new(SlotId::from(id), OwnerId::from(owner))
    }

    #[test]
    fn save_and_find_by_id() {
        let repo = SqliteSlotRepository::in_memory().unwrap();
        repo.save(&slot("A", "x")).unwrap();

        assert_eq!(repo.find_by_id(&SlotId::from("A")).unwrap(), Some(slot("A", "x")));
        assert_eq!(repo.find_by_id(&SlotId::from("B")).unwrap(), None);
    }

    #[test]
    fn free_slot_round_trips_as_empty_owner() {
        let repo = SqliteSlotRepository::in_memory().unwrap();
        repo.save(&Slot::free(SlotId::from("D"))).unwrap();

        let loaded = repo.find_by_id(&SlotId::from("D")).unwrap().unwrap();
        assert!(loaded.is_free());
    }

    #[test]
    fn save_all_upserts() {
        let repo = SqliteSlotRepository::in_memory().unwrap();
        repo.save_all(&[slot("A", "x"), slot("B", "y")]).unwrap();
        repo.save_all(&[slot("A", "y"), slot("B", "x")]).unwrap();

        let ids: BTreeSet<SlotId> = ["A", "B"].into_iter().map(SlotId::from).collect();
        let found = repo.find_all(&ids).unwrap();
        assert_eq!(found[&SlotId::from("A")].owner(), &OwnerId::from("y"));
        assert_eq!(found[&SlotId::from("B")].owner(), &OwnerId::from("x"));
    }

    #[test]
    fn find_all_skips_unknown_ids() {
        let repo = SqliteSlotRepository::in_memory().unwrap();
        repo.save(&slot("A", "x")).unwrap();

        let ids: BTreeSet<SlotId> = ["A", "Z"].into_iter().map(SlotId::from).collect();
        let found = repo.find_all(&ids).unwrap();
        assert_eq!(found.len(), 1);
    }
}
