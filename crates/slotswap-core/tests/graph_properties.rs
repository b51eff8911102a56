//! Property tests for the multigraph: cycle search is checked against
//! petgraph's topological sort, and every reported cycle is a real, simple,
//! closed walk over edges of the graph.

use std::collections::HashSet;

use petgraph::algo::toposort;
use proptest::prelude::*;

use slotswap_core::Graph;

fn edge_list() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..6, 0u8..6), 0..14)
}

fn build(edges: &[(u8, u8)]) -> Graph<u8, usize> {
    let mut graph = Graph::new();
    for (i, &(from, to)) in edges.iter().enumerate() {
        graph.add_edge(from, to, i);
    }
    graph
}

proptest! {
    #[test]
    fn cycle_found_iff_petgraph_finds_no_topological_order(edges in edge_list()) {
        let graph = build(&edges);
        let cyclic = toposort(&graph.to_petgraph(), None).is_err();
        prop_assert_eq!(graph.find_first_cycle().is_some(), cyclic);
    }

    #[test]
    fn reported_cycle_is_simple_closed_and_real(edges in edge_list()) {
        let graph = build(&edges);
        if let Some(cycle) = graph.find_first_cycle() {
            prop_assert!(cycle.is_closed());

            let starts: HashSet<u8> = cycle.nodes().copied().collect();
            prop_assert_eq!(starts.len(), cycle.len());

            for edge in cycle.edges() {
                prop_assert_eq!(edges[edge.payload], (edge.from, edge.to));
            }
        }
    }

    #[test]
    fn cycle_search_is_deterministic(edges in edge_list()) {
        prop_assert_eq!(build(&edges).find_first_cycle(), build(&edges).find_first_cycle());
    }

    #[test]
    fn intersection_only_keeps_pairs_present_in_both(
        edges in edge_list(),
        allowed in edge_list(),
    ) {
        let graph = build(&edges);
        let mut policy: Graph<u8, ()> = Graph::new();
        for &(from, to) in &allowed {
            policy.add_edge(from, to, ());
        }

        let both = graph.intersection(&policy);
        let expected = edges
            .iter()
            .filter(|(from, to)| policy.has_edge(from, to))
            .count();
        prop_assert_eq!(both.edge_count(), expected);
        for edge in both.edges() {
            prop_assert!(policy.has_edge(&edge.from, &edge.to));
            prop_assert!(graph.has_edge(&edge.from, &edge.to));
        }
    }

    #[test]
    fn remove_edge_removes_every_parallel_edge(edges in edge_list(), from in 0u8..6, to in 0u8..6) {
        let mut graph = build(&edges);
        let before = graph.edge_count();
        let removed = graph.remove_edge(&from, &to);

        let expected = edges.iter().filter(|&&pair| pair == (from, to)).count();
        prop_assert_eq!(removed, expected);
        prop_assert_eq!(graph.edge_count(), before - removed);
        prop_assert!(!graph.has_edge(&from, &to));
    }
}

const LONG_CHAIN: u32 = 200_000;

fn chain(len: u32) -> Graph<u32, ()> {
    let mut graph = Graph::new();
    for i in 0..len - 1 {
        graph.add_edge(i, i + 1, ());
    }
    graph
}

#[test]
fn long_open_chain_has_no_cycle() {
    let graph = chain(LONG_CHAIN);
    assert_eq!(graph.node_count(), LONG_CHAIN as usize);
    assert!(graph.find_first_cycle().is_none());
}

#[test]
fn long_closed_chain_is_one_full_cycle() {
    let mut graph = chain(LONG_CHAIN);
    graph.add_edge(LONG_CHAIN - 1, 0, ());

    let cycle = graph.find_first_cycle().expect("closed chain is a cycle");
    assert_eq!(cycle.len(), LONG_CHAIN as usize);
    assert!(cycle.is_closed());
    assert_eq!(cycle.edges()[0].from, 0);
}
