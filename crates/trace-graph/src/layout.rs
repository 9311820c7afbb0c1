//! Layout Adapter boundary
//!
//! Coordinates are assigned outside the core. [`LayoutAdapter`] is the
//! contract; [`LayeredLayout`] is a deterministic implementation used by the
//! CLI and tests.

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use trace_model::{ArtifactId, ArtifactNode, Edge};

/// Node with assigned coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNode {
    pub id: ArtifactId,
    pub x: f64,
    pub y: f64,
}

/// Pure node/edge list to positioned node list
pub trait LayoutAdapter: Send + Sync {
    /// Position every node with a resolvable identifier
    fn layout(&self, nodes: &[ArtifactNode], edges: &[Edge]) -> Vec<PositionedNode>;
}

/// Rank-by-depth layout
///
/// Nodes without incoming edges sit on rank 0; every other node sits one
/// rank below the first node that reaches it breadth-first. Nodes only
/// reachable through a cycle fall back to rank 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayeredLayout {
    pub column_gap: f64,
    pub row_gap: f64,
}

impl Default for LayeredLayout {
    fn default() -> Self {
        Self {
            column_gap: 220.0,
            row_gap: 120.0,
        }
    }
}

impl LayoutAdapter for LayeredLayout {
    fn layout(&self, nodes: &[ArtifactNode], edges: &[Edge]) -> Vec<PositionedNode> {
        let ids: Vec<&str> = nodes.iter().filter_map(ArtifactNode::resolved_id).collect();

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for id in &ids {
            graph.add_node(*id);
        }
        for edge in edges {
            let (source, target) = edge.pair();
            if graph.contains_node(source) && graph.contains_node(target) {
                graph.add_edge(source, target, ());
            }
        }

        let mut rank: BTreeMap<&str, usize> = BTreeMap::new();
        let mut queue: VecDeque<&str> = ids
            .iter()
            .copied()
            .filter(|id| graph.neighbors_directed(*id, Direction::Incoming).next().is_none())
            .collect();
        for id in &queue {
            rank.insert(*id, 0);
        }
        while let Some(current) = queue.pop_front() {
            let next_rank = rank.get(current).map_or(0, |r| r + 1);
            for next in graph.neighbors_directed(current, Direction::Outgoing) {
                if !rank.contains_key(next) {
                    rank.insert(next, next_rank);
                    queue.push_back(next);
                }
            }
        }

        let mut columns: BTreeMap<usize, usize> = BTreeMap::new();
        ids.iter()
            .map(|id| {
                let row = rank.get(id).copied().unwrap_or(0);
                let column = columns.entry(row).or_insert(0);
                #[allow(clippy::cast_precision_loss)]
                let position = PositionedNode {
                    id: ArtifactId::new(*id),
                    x: *column as f64 * self.column_gap,
                    y: row as f64 * self.row_gap,
                };
                *column += 1;
                position
            })
            .collect()
    }
}
