//! Directed transfer permissions between owners.
//!
//! [`Eligibility`] wraps a payload-free [`Graph`] over [`OwnerId`]. An edge
//! `from -> to` means the current holder `from` may hand off to the current
//! holder `to`. Permissions are directional: granting `x -> y` says nothing
//! about `y -> x`.

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::id::OwnerId;

/// Policy store of owner-to-owner transfer permissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Eligibility {
    graph: Graph<OwnerId, ()>,
}

impl Eligibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `from -> to`. Granting twice keeps a single permission edge.
    pub fn mark_transfer_eligible(&mut self, from: OwnerId, to: OwnerId) {
        if !self.graph.has_edge(&from, &to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Revokes `from -> to`. The reverse direction is left as it is.
    pub fn mark_transfer_ineligible(&mut self, from: &OwnerId, to: &OwnerId) {
        self.graph.remove_edge(from, to);
    }

    pub fn is_transfer_eligible(&self, from: &OwnerId, to: &OwnerId) -> bool {
        self.graph.has_edge(from, to)
    }

    /// Granted pairs in grant order, grouped by source owner.
    pub fn permissions(&self) -> impl Iterator<Item = (&OwnerId, &OwnerId)> {
        self.graph.edges().map(|e| (&e.from, &e.to))
    }

    /// The underlying permission graph, for intersection with a request graph.
    pub fn as_graph(&self) -> &Graph<OwnerId, ()> {
        &self.graph
    }
}
