//! Impact Traversal Engine
//!
//! Computes everything downstream of a selected artifact by following edges
//! from source to target across all categories.

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::BTreeSet;
use trace_model::{ArtifactId, Edge, IdSet};

/// Identifiers reachable from `root`
///
/// A node enters the result when first reached through an edge and is
/// expanded at most once, so cycles terminate. The root itself appears only
/// if some path leads back to it. No outgoing edges yields the empty set.
#[must_use]
pub fn descendants(root: &str, edges: &[Edge]) -> IdSet {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for edge in edges {
        let (source, target) = edge.pair();
        graph.add_edge(source, target, ());
    }

    let mut reached = IdSet::new();
    if !graph.contains_node(root) {
        return reached;
    }

    let mut expanded = BTreeSet::from([root]);
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        for next in graph.neighbors_directed(current, Direction::Outgoing) {
            reached.insert(ArtifactId::new(next));
            if expanded.insert(next) {
                stack.push(next);
            }
        }
    }

    tracing::debug!(root, reached = reached.len(), "Computed impact set");
    reached
}
