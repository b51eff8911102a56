//! Storage abstraction for slots.
//!
//! Provides the [`SlotRepository`] trait defining the storage contract that
//! all backends implement, plus [`InMemorySlotRepository`] and
//! [`SqliteSlotRepository`] as first-class backends.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`traits`]: SlotRepository trait definition
//! - [`memory`]: InMemorySlotRepository implementation
//! - [`schema`]: schema migrations
//! - [`sqlite`]: SqliteSlotRepository implementation

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use memory::InMemorySlotRepository;
pub use sqlite::SqliteSlotRepository;
pub use traits::SlotRepository;
