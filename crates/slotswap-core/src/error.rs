//! Core error types for slotswap-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Graph lookups
//! never error: an unknown vertex simply has no edges.

use crate::id::SlotId;
use thiserror::Error;

/// Core errors produced by the slotswap-core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A request names a slot that was not loaded into the arena.
    #[error("slot not found: {id}")]
    SlotNotFound { id: SlotId },
}
