//! Core data model for batch slot exchanges.
//!
//! - [`id`]: `SlotId` and `OwnerId` newtypes
//! - [`graph`]: generic directed multigraph with first-cycle detection
//! - [`slot`]: `Slot`, `TransferRequest`, and the two-phase `SlotArena`
//! - [`eligibility`]: directed owner-to-owner transfer permissions
//! - [`error`]: `CoreError`

pub mod eligibility;
pub mod error;
pub mod graph;
pub mod id;
pub mod slot;

// Re-export commonly used types
pub use eligibility::Eligibility;
pub use error::CoreError;
pub use graph::{Edge, Graph, Path};
pub use id::{OwnerId, SlotId};
pub use slot::{Slot, SlotArena, TransferRequest};
