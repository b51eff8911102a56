//! Error types for slotswap-exchange.
//!
//! [`ExchangeError`] is for infrastructure faults only. "No cycle" and "a
//! cycle slot is missing" are ordinary outcomes reported through
//! [`BatchResult`](crate::BatchResult), never through this type.

use thiserror::Error;

use slotswap_storage::StorageError;

use crate::config::ConfigError;
use crate::lock_manager::LockError;

/// Errors produced while resolving a batch.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The repository failed to load or persist slots.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Another batch holds a lease on one of the batch's slots.
    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    /// Configuration could not be read.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
