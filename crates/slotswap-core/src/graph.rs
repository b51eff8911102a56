//! Generic directed multigraph with first-cycle detection.
//!
//! [`Graph`] maps each vertex key `K` to the ordered list of its outgoing
//! [`Edge`]s. Parallel edges between the same pair are kept: every edge stands
//! for a distinct request, so multiplicity carries meaning.
//!
//! # Iteration order
//!
//! The adjacency map is an [`IndexMap`], which makes every traversal
//! reproducible:
//! - vertices are visited in first-seen order (a vertex is seen when it first
//!   appears as an endpoint of an added edge, `from` before `to`);
//! - a vertex's edges are visited in insertion order.
//!
//! [`Graph::find_first_cycle`] therefore returns the same cycle for the same
//! sequence of insertions, whichever of several candidate cycles that is.

use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::Directed;
use serde::{Deserialize, Serialize};

/// A directed edge carrying a payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge<K, P> {
    pub from: K,
    pub to: K,
    pub payload: P,
}

impl<K, P> Edge<K, P> {
    pub fn new(from: K, to: K, payload: P) -> Self {
        Edge { from, to, payload }
    }
}

impl<K: PartialEq, P> Edge<K, P> {
    /// True when the edge starts and ends at the same vertex.
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

impl<K: fmt::Display, P> fmt::Display for Edge<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// An ordered run of edges, as returned by [`Graph::find_first_cycle`].
///
/// For a cycle, `edges[i].to == edges[i + 1].from` and the last edge ends
/// where the first one starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path<K, P> {
    edges: Vec<Edge<K, P>>,
}

impl<K, P> Path<K, P> {
    pub fn new(edges: Vec<Edge<K, P>>) -> Self {
        Path { edges }
    }

    pub fn edges(&self) -> &[Edge<K, P>] {
        &self.edges
    }

    pub fn into_edges(self) -> Vec<Edge<K, P>> {
        self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Payloads in path order.
    pub fn payloads(&self) -> impl Iterator<Item = &P> {
        self.edges.iter().map(|e| &e.payload)
    }

    /// Consumes the path, keeping only the payloads in path order.
    pub fn into_payloads(self) -> Vec<P> {
        self.edges.into_iter().map(|e| e.payload).collect()
    }

    /// Vertices the path departs from, in path order.
    pub fn nodes(&self) -> impl Iterator<Item = &K> {
        self.edges.iter().map(|e| &e.from)
    }
}

impl<K: PartialEq, P> Path<K, P> {
    /// True when consecutive edges chain and the last edge returns to the
    /// start. An empty path is not closed.
    pub fn is_closed(&self) -> bool {
        let (Some(first), Some(last)) = (self.edges.first(), self.edges.last()) else {
            return false;
        };
        self.edges.windows(2).all(|w| w[0].to == w[1].from) && last.to == first.from
    }
}

impl<K: fmt::Display, P> fmt::Display for Path<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.edges.first() else {
            return write!(f, "-");
        };
        write!(f, "{}", first.from)?;
        for edge in &self.edges {
            write!(f, " -> {}", edge.to)?;
        }
        Ok(())
    }
}

/// Directed multigraph keyed by `K` with edge payloads `P`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize, P: Serialize",
    deserialize = "K: Deserialize<'de> + Hash + Eq, P: Deserialize<'de>"
))]
pub struct Graph<K, P> {
    adjacency: IndexMap<K, Vec<Edge<K, P>>>,
}

impl<K, P> Default for Graph<K, P> {
    fn default() -> Self {
        Graph {
            adjacency: IndexMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash, P> Graph<K, P> {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Appends an edge to `from`'s adjacency list.
    ///
    /// `to` is registered as a vertex even if it has no outgoing edges, so
    /// sink vertices take part in cycle search and intersection.
    pub fn add_edge(&mut self, from: K, to: K, payload: P) -> &mut Self {
        self.add(Edge::new(from, to, payload))
    }

    /// Appends an already-built edge. See [`Graph::add_edge`].
    pub fn add(&mut self, edge: Edge<K, P>) -> &mut Self {
        let to = edge.to.clone();
        self.adjacency
            .entry(edge.from.clone())
            .or_default()
            .push(edge);
        self.adjacency.entry(to).or_default();
        self
    }

    /// Removes every edge from `from` to `to`, whatever its payload.
    ///
    /// Returns how many edges were removed. Vertices stay in the graph.
    pub fn remove_edge(&mut self, from: &K, to: &K) -> usize {
        let Some(edges) = self.adjacency.get_mut(from) else {
            return 0;
        };
        let before = edges.len();
        edges.retain(|e| e.to != *to);
        before - edges.len()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// True iff at least one edge runs from `from` to `to`.
    pub fn has_edge(&self, from: &K, to: &K) -> bool {
        self.edges_from(from).iter().any(|e| e.to == *to)
    }

    /// Outgoing edges of `from` in insertion order. Unknown vertices have none.
    pub fn edges_from(&self, from: &K) -> &[Edge<K, P>] {
        self.adjacency.get(from).map_or(&[], Vec::as_slice)
    }

    pub fn contains_node(&self, node: &K) -> bool {
        self.adjacency.contains_key(node)
    }

    /// Vertices in first-seen order.
    pub fn nodes(&self) -> impl Iterator<Item = &K> {
        self.adjacency.keys()
    }

    /// All edges, grouped by source vertex in first-seen order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge<K, P>> {
        self.adjacency.values().flatten()
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}

impl<K: Clone + Eq + Hash, P: Clone> Graph<K, P> {
    /// Keeps the edges of `self` whose endpoint pair is also an edge of
    /// `other`.
    ///
    /// Payloads come from `self`; `other`'s payloads are ignored. Parallel
    /// edges in `self` all survive when `other` has the pair at least once.
    pub fn intersection<P2>(&self, other: &Graph<K, P2>) -> Graph<K, P> {
        let mut result = Graph::new();
        for edge in self.edges() {
            if other.has_edge(&edge.from, &edge.to) {
                result.add(edge.clone());
            }
        }
        result
    }

    /// Depth-first search for a directed cycle.
    ///
    /// Every vertex is used as a search root at most once, in first-seen
    /// order. When an edge reaches a vertex still on the search stack, the
    /// cycle is the part of the current search path starting at that vertex,
    /// closed by the edge just followed. A self-loop is a one-edge cycle.
    pub fn find_first_cycle(&self) -> Option<Path<K, P>> {
        let n = self.adjacency.len();
        let mut visited = vec![false; n];
        let mut on_stack = vec![false; n];

        for root in 0..n {
            if visited[root] {
                continue;
            }
            visited[root] = true;
            on_stack[root] = true;

            // (vertex, next edge to explore). `path[i]` leads from
            // `frames[i]` to `frames[i + 1]`.
            let mut frames: Vec<(usize, usize)> = vec![(root, 0)];
            let mut path: Vec<&Edge<K, P>> = Vec::new();

            while let Some((vertex, next)) = frames.last().copied() {
                let Some(edge) = self.adjacency[vertex].get(next) else {
                    on_stack[vertex] = false;
                    frames.pop();
                    path.pop();
                    continue;
                };
                if let Some(top) = frames.last_mut() {
                    top.1 += 1;
                }

                let Some(target) = self.adjacency.get_index_of(&edge.to) else {
                    continue;
                };
                if on_stack[target] {
                    return Some(close_cycle(&path, edge));
                }
                if !visited[target] {
                    visited[target] = true;
                    on_stack[target] = true;
                    path.push(edge);
                    frames.push((target, 0));
                }
            }
        }

        None
    }

    /// Exports the graph as a petgraph `StableGraph`, one node per vertex in
    /// first-seen order and one edge per stored edge.
    pub fn to_petgraph(&self) -> StableGraph<K, P, Directed, u32> {
        let mut graph = StableGraph::with_capacity(self.node_count(), self.edge_count());
        let indices: Vec<NodeIndex<u32>> = self
            .adjacency
            .keys()
            .map(|key| graph.add_node(key.clone()))
            .collect();

        for edge in self.edges() {
            let from = self.adjacency.get_index_of(&edge.from);
            let to = self.adjacency.get_index_of(&edge.to);
            if let (Some(from), Some(to)) = (from, to) {
                graph.add_edge(indices[from], indices[to], edge.payload.clone());
            }
        }

        graph
    }
}

/// Builds the cycle closed by `closing`: the suffix of `path` that starts at
/// `closing.to`, followed by `closing` itself.
fn close_cycle<K: Clone + Eq, P: Clone>(path: &[&Edge<K, P>], closing: &Edge<K, P>) -> Path<K, P> {
    let start = path
        .iter()
        .position(|e| e.from == closing.to)
        .unwrap_or(path.len());
    let mut edges: Vec<Edge<K, P>> = path[start..].iter().map(|e| (*e).clone()).collect();
    edges.push(closing.clone());
    Path::new(edges)
}
