//! Batch swap resolution over a slot repository.
//!
//! [`BatchReservation`] turns an unordered batch of [`TransferRequest`]s into
//! at most one executable cycle and applies it atomically:
//!
//! 1. Build a request graph (keyed by slot, or by current owner when a policy
//!    is given; the owner graph is intersected with the policy graph).
//! 2. Take the first cycle. No cycle means [`BatchResult::no_cycle`] and no
//!    repository writes.
//! 3. Load the cycle's slots, release every source, assign every target, and
//!    persist all of them with a single `save_all`.
//!
//! Requests that are not on the chosen cycle are left out silently.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use slotswap_core::{CoreError, Eligibility, Graph, OwnerId, Slot, SlotArena, SlotId, TransferRequest};
use slotswap_storage::SlotRepository;

use crate::error::ExchangeError;
use crate::result::{BatchResult, FailureReason};

/// Every slot referenced as either endpoint of any request, in id order.
pub fn referenced_slots(requests: &[TransferRequest]) -> BTreeSet<SlotId> {
    requests
        .iter()
        .flat_map(TransferRequest::slots)
        .cloned()
        .collect()
}

/// The swap resolution use case, bound to one repository.
pub struct BatchReservation<R> {
    repository: Arc<R>,
}

impl<R> Clone for BatchReservation<R> {
    fn clone(&self) -> Self {
        BatchReservation {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: SlotRepository> BatchReservation<R> {
    pub fn new(repository: Arc<R>) -> Self {
        BatchReservation { repository }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Resolves `requests` with no permission policy.
    ///
    /// Each request is an edge `from_slot -> to_slot`.
    pub fn resolve(&self, requests: &[TransferRequest]) -> Result<BatchResult, ExchangeError> {
        let mut graph: Graph<SlotId, TransferRequest> = Graph::new();
        for request in requests {
            graph.add_edge(
                request.from_slot.clone(),
                request.to_slot.clone(),
                request.clone(),
            );
        }

        match graph.find_first_cycle() {
            Some(cycle) => {
                tracing::debug!("Found slot cycle {}", cycle);
                self.execute(cycle.into_payloads())
            }
            None => {
                tracing::debug!("No slot cycle among {} request(s)", requests.len());
                Ok(BatchResult::no_cycle())
            }
        }
    }

    /// Resolves `requests` restricted to owner handoffs `policy` permits.
    ///
    /// Each request becomes an edge from the current owner of its `from_slot`
    /// to the current owner of its `to_slot`. Only edges whose owner pair is
    /// granted in `policy` take part in cycle search.
    pub fn resolve_with_policy(
        &self,
        requests: &[TransferRequest],
        policy: &Eligibility,
    ) -> Result<BatchResult, ExchangeError> {
        let current = self.repository.find_all(&referenced_slots(requests))?;

        let mut owners: Graph<OwnerId, TransferRequest> = Graph::new();
        for request in requests {
            if let Some((from, to)) = owner_pair(&current, request) {
                owners.add_edge(from.clone(), to.clone(), request.clone());
            }
        }

        let permitted = owners.intersection(policy.as_graph());
        tracing::debug!(
            "{} of {} owner edge(s) permitted by policy",
            permitted.edge_count(),
            owners.edge_count()
        );

        match permitted.find_first_cycle() {
            Some(cycle) => {
                tracing::debug!("Found owner cycle {}", cycle);
                self.execute(cycle.into_payloads())
            }
            None => Ok(BatchResult::no_cycle()),
        }
    }

    /// Applies one closed chain of requests and persists every touched slot.
    fn execute(&self, cycle: Vec<TransferRequest>) -> Result<BatchResult, ExchangeError> {
        let loaded = self.repository.find_all(&referenced_slots(&cycle))?;
        let mut arena: SlotArena = loaded.into_values().collect();

        match arena.apply(&cycle) {
            Ok(()) => {}
            Err(CoreError::SlotNotFound { id }) => {
                tracing::warn!("Cycle references unknown slot {}; nothing executed", id);
                return Ok(BatchResult::failure(FailureReason::MissingSlot(id)));
            }
        }

        self.repository.save_all(&arena.into_slots())?;
        tracing::info!(
            "Executed {} transfer(s): {}",
            cycle.len(),
            cycle
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(BatchResult::success(cycle))
    }
}

/// Current owners of both endpoints, or `None` when either is unknown or
/// unowned.
fn owner_pair<'a>(
    current: &'a HashMap<SlotId, Slot>,
    request: &TransferRequest,
) -> Option<(&'a OwnerId, &'a OwnerId)> {
    let owner_of = move |id: &SlotId| match current.get(id) {
        None => {
            tracing::debug!("Skipping {}: slot {} not found", request, id);
            None
        }
        Some(slot) if slot.is_free() => {
            tracing::debug!("Skipping {}: slot {} has no owner", request, id);
            None
        }
        Some(slot) => Some(slot.owner()),
    };

    let from = owner_of(&request.from_slot)?;
    let to = owner_of(&request.to_slot)?;
    Some((from, to))
}
