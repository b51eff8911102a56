//! Concurrency-safe entry point combining the use case with slot leases.
//!
//! [`ExchangeService`] leases every slot a batch references before running
//! [`BatchReservation`], so two batches touching a common slot never
//! interleave their load-then-write sequences. The leases cannot expire while
//! resolution runs, however slow the repository is, and are released whether
//! it succeeds, fails, or errors. A lease conflict is reported
//! immediately; there is no waiting or retry.

use std::sync::Arc;

use slotswap_core::{Eligibility, TransferRequest};
use slotswap_storage::{SlotRepository, SqliteSlotRepository};

use crate::batch::{referenced_slots, BatchReservation};
use crate::config::ExchangeConfig;
use crate::error::ExchangeError;
use crate::lock_manager::{BatchId, SlotLockManager};
use crate::result::BatchResult;

pub struct ExchangeService<R> {
    reservations: BatchReservation<R>,
    locks: Arc<SlotLockManager>,
}

impl<R: SlotRepository> ExchangeService<R> {
    /// Creates a service with its own lease manager using `config.lock_ttl`.
    pub fn new(repository: Arc<R>, config: &ExchangeConfig) -> Self {
        Self::with_lock_manager(repository, Arc::new(SlotLockManager::new(config.lock_ttl)))
    }

    /// Creates a service sharing `locks` with other services.
    pub fn with_lock_manager(repository: Arc<R>, locks: Arc<SlotLockManager>) -> Self {
        ExchangeService {
            reservations: BatchReservation::new(repository),
            locks,
        }
    }

    pub fn lock_manager(&self) -> &Arc<SlotLockManager> {
        &self.locks
    }

    pub fn reservations(&self) -> &BatchReservation<R> {
        &self.reservations
    }

    /// Leases the batch's slots and runs unconstrained resolution.
    pub fn submit(&self, requests: &[TransferRequest]) -> Result<BatchResult, ExchangeError> {
        self.leased(requests, |reservations| reservations.resolve(requests))
    }

    /// Leases the batch's slots and runs policy-constrained resolution.
    pub fn submit_with_policy(
        &self,
        requests: &[TransferRequest],
        policy: &Eligibility,
    ) -> Result<BatchResult, ExchangeError> {
        self.leased(requests, |reservations| {
            reservations.resolve_with_policy(requests, policy)
        })
    }

    fn leased<F>(&self, requests: &[TransferRequest], run: F) -> Result<BatchResult, ExchangeError>
    where
        F: FnOnce(&BatchReservation<R>) -> Result<BatchResult, ExchangeError>,
    {
        let slots: Vec<_> = referenced_slots(requests).into_iter().collect();

        // Held until `run` returns or unwinds; no lease expires before that.
        let _leases = self.locks.lease_batch(&BatchId::new(), &slots)?;
        run(&self.reservations)
    }
}

impl ExchangeService<SqliteSlotRepository> {
    /// Opens a SQLite-backed service: a file when `config.db_path` is set,
    /// otherwise an in-memory database.
    pub fn open(config: &ExchangeConfig) -> Result<Self, ExchangeError> {
        let repository = match &config.db_path {
            Some(path) => SqliteSlotRepository::new(path)?,
            None => SqliteSlotRepository::in_memory()?,
        };
        tracing::info!(
            "Opened slot store at {}",
            config.db_path.as_deref().unwrap_or(":memory:")
        );
        Ok(Self::new(Arc::new(repository), config))
    }

    /// [`ExchangeService::open`] with the configuration read from the
    /// environment.
    pub fn open_from_env() -> Result<Self, ExchangeError> {
        let config = ExchangeConfig::from_env()?;
        Self::open(&config)
    }
}
