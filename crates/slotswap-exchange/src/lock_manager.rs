//! Per-slot lease manager serializing batches that touch the same slots.
//!
//! [`SlotLockManager`] grants exclusive, TTL-bounded leases on individual
//! slots to a [`BatchId`]. Batches over disjoint slot sets run side by side;
//! a batch that overlaps a running one is denied up front instead of
//! interleaving its load-then-write sequence with the other's.
//!
//! Leases taken through [`SlotLockManager::lease_batch`] belong to a running
//! batch and never expire while its [`BatchLeases`] guard is alive. The TTL
//! only reclaims leases whose batch is no longer running.

use std::fmt;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use slotswap_core::SlotId;

/// Identity of one batch resolution (UUID v4 newtype).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

impl BatchId {
    pub fn new() -> Self {
        BatchId(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A held lease on one slot.
#[derive(Debug, Clone)]
pub struct SlotLease {
    pub holder: BatchId,
    pub acquired_at: Instant,
    pub expires_at: Instant,
}

impl SlotLease {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Leases of one running batch, released when dropped.
///
/// Created by [`SlotLockManager::lease_batch`]. While the guard lives, its
/// batch counts as running and none of its leases can be taken over.
pub struct BatchLeases<'a> {
    locks: &'a SlotLockManager,
    batch: BatchId,
    grants: Vec<LockGrant>,
}

impl BatchLeases<'_> {
    pub fn batch(&self) -> BatchId {
        self.batch
    }

    pub fn grants(&self) -> &[LockGrant] {
        &self.grants
    }
}

impl Drop for BatchLeases<'_> {
    fn drop(&mut self) {
        let released = self.locks.release_all(&self.batch);
        self.locks.running.remove(&self.batch);
        tracing::debug!("Batch {} released {} slot(s)", self.batch, released.len());
    }
}

/// A successful lease acquisition.
#[derive(Debug, Clone, Serialize)]
pub struct LockGrant {
    pub slot_id: SlotId,
    pub holder: BatchId,
    pub ttl: Duration,
}

/// A lease request that was denied.
#[derive(Debug, Clone, Serialize)]
pub struct LockDenial {
    pub slot_id: SlotId,
    pub holder: BatchId,
}

/// Errors from lease operations.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// The slot is leased by another, unexpired batch.
    #[error("slot {} is leased by batch {}", .0.slot_id, .0.holder)]
    AlreadyHeld(LockDenial),

    /// The batch does not hold a lease on the slot.
    #[error("slot {slot_id} is not leased by batch {batch_id}")]
    NotHeld { slot_id: SlotId, batch_id: BatchId },
}

/// Status entry for one leased slot.
#[derive(Debug, Clone, Serialize)]
pub struct LockStatusEntry {
    pub slot_id: SlotId,
    pub holder: BatchId,
    pub held_for: Duration,
    pub expired: bool,
}

/// Exclusive per-slot lease manager with TTL-based expiry.
///
/// Backed by `DashMap`; an expired lease of a batch that is not running
/// counts as free and is taken over by the next batch that asks for the slot.
pub struct SlotLockManager {
    leases: DashMap<SlotId, SlotLease>,
    running: DashSet<BatchId>,
    default_ttl: Duration,
}

impl SlotLockManager {
    /// Creates a lease manager with the given lease TTL.
    pub fn new(default_ttl: Duration) -> Self {
        SlotLockManager {
            leases: DashMap::new(),
            running: DashSet::new(),
            default_ttl,
        }
    }

    /// Creates a lease manager with the default 30-second TTL.
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(30))
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// True while a [`BatchLeases`] guard for `batch` is alive.
    pub fn is_running(&self, batch: &BatchId) -> bool {
        self.running.contains(batch)
    }

    fn is_reclaimable(&self, lease: &SlotLease, now: Instant) -> bool {
        lease.is_expired(now) && !self.is_running(&lease.holder)
    }

    /// Tries to lease one slot for `batch`. Re-acquiring refreshes the TTL.
    pub fn try_acquire(&self, batch: &BatchId, slot_id: &SlotId) -> Result<LockGrant, LockError> {
        let now = Instant::now();
        let lease = SlotLease {
            holder: *batch,
            acquired_at: now,
            expires_at: now + self.default_ttl,
        };

        match self.leases.entry(slot_id.clone()) {
            Entry::Vacant(vacant) => {
                vacant.insert(lease);
            }
            Entry::Occupied(mut occupied) => {
                let current = occupied.get_mut();
                if current.holder != *batch && !self.is_reclaimable(current, now) {
                    return Err(LockError::AlreadyHeld(LockDenial {
                        slot_id: slot_id.clone(),
                        holder: current.holder,
                    }));
                }
                *current = lease;
            }
        }

        Ok(LockGrant {
            slot_id: slot_id.clone(),
            holder: *batch,
            ttl: self.default_ttl,
        })
    }

    /// Leases every slot in `slot_ids` for `batch`, all-or-nothing.
    ///
    /// Slot ids are sorted and deduplicated so overlapping batches always
    /// contend in the same order. On the first denial every lease taken by
    /// this call is released again.
    pub fn batch_acquire(
        &self,
        batch: &BatchId,
        slot_ids: &[SlotId],
    ) -> Result<Vec<LockGrant>, LockError> {
        let mut sorted: Vec<&SlotId> = slot_ids.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut grants = Vec::with_capacity(sorted.len());
        for slot_id in sorted {
            match self.try_acquire(batch, slot_id) {
                Ok(grant) => grants.push(grant),
                Err(err) => {
                    // Rollback
                    for grant in &grants {
                        let _ = self.release(batch, &grant.slot_id);
                    }
                    return Err(err);
                }
            }
        }

        Ok(grants)
    }

    /// Leases every slot in `slot_ids` for a running batch.
    ///
    /// Same all-or-nothing contract as [`SlotLockManager::batch_acquire`], but
    /// the leases cannot expire until the returned guard is dropped, which
    /// also releases them.
    pub fn lease_batch(
        &self,
        batch: &BatchId,
        slot_ids: &[SlotId],
    ) -> Result<BatchLeases<'_>, LockError> {
        // Running before the first grant, so even a zero TTL holds.
        self.running.insert(*batch);
        match self.batch_acquire(batch, slot_ids) {
            Ok(grants) => {
                tracing::debug!("Batch {} leased {} slot(s)", batch, grants.len());
                Ok(BatchLeases {
                    locks: self,
                    batch: *batch,
                    grants,
                })
            }
            Err(err) => {
                self.running.remove(batch);
                Err(err)
            }
        }
    }

    /// Releases `batch`'s lease on one slot.
    pub fn release(&self, batch: &BatchId, slot_id: &SlotId) -> Result<(), LockError> {
        self.leases
            .remove_if(slot_id, |_, lease| lease.holder == *batch)
            .map(|_| ())
            .ok_or_else(|| LockError::NotHeld {
                slot_id: slot_id.clone(),
                batch_id: *batch,
            })
    }

    /// Releases every lease held by `batch`, returning the freed slots in id
    /// order.
    pub fn release_all(&self, batch: &BatchId) -> Vec<SlotId> {
        let mut held: Vec<SlotId> = self
            .leases
            .iter()
            .filter(|entry| entry.value().holder == *batch)
            .map(|entry| entry.key().clone())
            .collect();
        held.sort();

        held.retain(|slot_id| self.release(batch, slot_id).is_ok());
        held
    }

    /// The batch whose lease on `slot_id` is still in force.
    pub fn holder(&self, slot_id: &SlotId) -> Option<BatchId> {
        let now = Instant::now();
        self.leases
            .get(slot_id)
            .filter(|lease| !self.is_reclaimable(lease, now))
            .map(|lease| lease.holder)
    }

    /// Every recorded lease, in slot id order.
    pub fn status(&self) -> Vec<LockStatusEntry> {
        let now = Instant::now();
        let mut entries: Vec<LockStatusEntry> = self
            .leases
            .iter()
            .map(|entry| LockStatusEntry {
                slot_id: entry.key().clone(),
                holder: entry.value().holder,
                held_for: now.saturating_duration_since(entry.value().acquired_at),
                expired: self.is_reclaimable(entry.value(), now),
            })
            .collect();
        entries.sort_by(|a, b| a.slot_id.cmp(&b.slot_id));
        entries
    }

    /// Removes expired leases of batches that are not running and returns
    /// the freed slots in id order.
    pub fn sweep_expired_locks(&self) -> Vec<SlotId> {
        let now = Instant::now();
        let mut expired: Vec<SlotId> = self
            .leases
            .iter()
            .filter(|entry| self.is_reclaimable(entry.value(), now))
            .map(|entry| entry.key().clone())
            .collect();
        expired.sort();

        expired.retain(|slot_id| {
            self.leases
                .remove_if(slot_id, |_, lease| self.is_reclaimable(lease, now))
                .is_some()
        });

        if !expired.is_empty() {
            tracing::info!("Swept {} expired slot lease(s): {:?}", expired.len(), expired);
        }
        expired
    }
}

impl Default for SlotLockManager {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(ids: &[&str]) -> Vec<SlotId> {
        ids.iter().copied().map(SlotId::from).collect()
    }

    #[test]
    fn second_batch_is_denied() {
        let locks = SlotLockManager::with_default_ttl();
        let (first, second) = (BatchId::new(), BatchId::new());

        locks.try_acquire(&first, &SlotId::from("A")).unwrap();
        match locks.try_acquire(&second, &SlotId::from("A")) {
            Err(LockError::AlreadyHeld(denial)) => assert_eq!(denial.holder, first),
            other => panic!("expected AlreadyHeld, got {other:?}"),
        }
    }

    #[test]
    fn same_batch_can_reacquire() {
        let locks = SlotLockManager::with_default_ttl();
        let batch = BatchId::new();
        locks.try_acquire(&batch, &SlotId::from("A")).unwrap();
        locks.try_acquire(&batch, &SlotId::from("A")).unwrap();
        assert_eq!(locks.holder(&SlotId::from("A")), Some(batch));
    }

    #[test]
    fn batch_acquire_dedups_and_sorts() {
        let locks = SlotLockManager::with_default_ttl();
        let batch = BatchId::new();
        let grants = locks
            .batch_acquire(&batch, &slots(&["C", "A", "C", "B"]))
            .unwrap();
        let granted: Vec<_> = grants.iter().map(|g| g.slot_id.as_str()).collect();
        assert_eq!(granted, vec!["A", "B", "C"]);
    }

    #[test]
    fn batch_acquire_is_all_or_nothing() {
        let locks = SlotLockManager::with_default_ttl();
        let (first, second) = (BatchId::new(), BatchId::new());
        locks.try_acquire(&first, &SlotId::from("C")).unwrap();

        assert!(locks.batch_acquire(&second, &slots(&["A", "B", "C"])).is_err());
        assert_eq!(locks.holder(&SlotId::from("A")), None);
        assert_eq!(locks.holder(&SlotId::from("B")), None);
        assert_eq!(locks.holder(&SlotId::from("C")), Some(first));
    }

    #[test]
    fn disjoint_batches_coexist() {
        let locks = SlotLockManager::with_default_ttl();
        let (first, second) = (BatchId::new(), BatchId::new());
        locks.batch_acquire(&first, &slots(&["A", "B"])).unwrap();
        locks.batch_acquire(&second, &slots(&["C", "D"])).unwrap();
        assert_eq!(locks.status().len(), 4);
    }

    #[test]
    fn release_requires_holder() {
        let locks = SlotLockManager::with_default_ttl();
        let (first, second) = (BatchId::new(), BatchId::new());
        locks.try_acquire(&first, &SlotId::from("A")).unwrap();

        assert!(matches!(
            locks.release(&second, &SlotId::from("A")),
            Err(LockError::NotHeld { .. })
        ));
        locks.release(&first, &SlotId::from("A")).unwrap();
        assert_eq!(locks.holder(&SlotId::from("A")), None);
    }

    #[test]
    fn release_all_frees_only_own_leases() {
        let locks = SlotLockManager::with_default_ttl();
        let (first, second) = (BatchId::new(), BatchId::new());
        locks.batch_acquire(&first, &slots(&["B", "A"])).unwrap();
        locks.try_acquire(&second, &SlotId::from("C")).unwrap();

        assert_eq!(locks.release_all(&first), slots(&["A", "B"]));
        assert_eq!(locks.holder(&SlotId::from("C")), Some(second));
    }

    #[test]
    fn expired_lease_is_taken_over_and_swept() {
        let locks = SlotLockManager::new(Duration::ZERO);
        let (first, second) = (BatchId::new(), BatchId::new());
        locks.try_acquire(&first, &SlotId::from("A")).unwrap();
        locks.try_acquire(&first, &SlotId::from("B")).unwrap();

        // Zero TTL: every lease is already expired.
        assert_eq!(locks.holder(&SlotId::from("A")), None);
        locks.try_acquire(&second, &SlotId::from("A")).unwrap();

        assert_eq!(locks.sweep_expired_locks(), slots(&["A", "B"]));
        assert!(locks.status().is_empty());
    }

    #[test]
    fn running_batch_keeps_expired_leases() {
        let locks = SlotLockManager::new(Duration::ZERO);
        let (running, late) = (BatchId::new(), BatchId::new());

        let leases = locks.lease_batch(&running, &slots(&["A", "B"])).unwrap();
        assert_eq!(leases.grants().len(), 2);
        assert!(locks.is_running(&running));

        // Past its TTL, but the batch has not finished.
        assert!(matches!(
            locks.try_acquire(&late, &SlotId::from("A")),
            Err(LockError::AlreadyHeld(_))
        ));
        assert!(locks.sweep_expired_locks().is_empty());
        assert_eq!(locks.holder(&SlotId::from("B")), Some(running));
        assert!(locks.status().iter().all(|entry| !entry.expired));

        drop(leases);
        assert!(!locks.is_running(&running));
        assert!(locks.status().is_empty());
        locks.try_acquire(&late, &SlotId::from("A")).unwrap();
    }

    #[test]
    fn denied_lease_batch_is_not_running() {
        let locks = SlotLockManager::with_default_ttl();
        let (first, second) = (BatchId::new(), BatchId::new());
        let _held = locks.lease_batch(&first, &slots(&["B"])).unwrap();

        assert!(locks.lease_batch(&second, &slots(&["A", "B"])).is_err());
        assert!(!locks.is_running(&second));
        assert_eq!(locks.holder(&SlotId::from("A")), None);
    }

    #[test]
    fn status_reports_lease_age() {
        let locks = SlotLockManager::with_default_ttl();
        let batch = BatchId::new();
        locks.try_acquire(&batch, &SlotId::from("A")).unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let status = locks.status();
        assert_eq!(status.len(), 1);
        assert!(status[0].held_for >= Duration::from_millis(5));
        assert!(status[0].held_for < locks.default_ttl());
    }
}
