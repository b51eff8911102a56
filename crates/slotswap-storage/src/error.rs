//! Storage error types for slotswap-storage.
//!
//! [`StorageError`] covers the infrastructure failures a repository can hit.
//! A slot that does not exist is not an error: lookups return `None` or leave
//! the id out of the result map.

use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying SQLite call failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// A thread panicked while holding the connection.
    #[error("connection lock poisoned")]
    LockPoisoned,
}
