//! Batch slot exchange: cycle-based swap resolution with per-slot leases.
//!
//! - [`batch`]: `BatchReservation`, the resolve / resolve-with-policy use case
//! - [`result`]: `BatchResult` and `FailureReason`
//! - [`lock_manager`]: TTL-bounded per-slot leases keyed by `BatchId`
//! - [`service`]: `ExchangeService`, resolution under leases
//! - [`config`]: `ExchangeConfig` from environment variables
//! - [`logging`]: tracing subscriber bootstrap
//! - [`error`]: `ExchangeError`

pub mod batch;
pub mod config;
pub mod error;
pub mod lock_manager;
pub mod logging;
pub mod result;
pub mod service;

pub use batch::{referenced_slots, BatchReservation};
pub use config::{ConfigError, ExchangeConfig};
pub use error::ExchangeError;
pub use lock_manager::{BatchId, BatchLeases, LockError, SlotLockManager};
pub use result::{BatchResult, BatchStatus, FailureReason};
pub use service::ExchangeService;
