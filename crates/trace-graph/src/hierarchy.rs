//! Hierarchy edges supplied by the requirement service
//!
//! Each tree record may carry an `outgoing` list of typed cross-links such
//! as `{"id": "REQ-7", "name": "...", "type": "TRACES_TO"}`. Entries without
//! a `type` are plain child listings and are ignored.

use crate::error::{GraphError, GraphResult};
use serde_json::Value;
use std::collections::BTreeSet;
use trace_model::{ArtifactNode, Edge};

/// Attribute key holding outgoing cross-links
pub const OUTGOING_KEY: &str = "outgoing";

/// Extract one hierarchy edge per typed outgoing entry
///
/// Source is the owning node's resolved identifier; target is the entry's
/// `id` (or `sid`). De-duplicated by pair, first wins.
///
/// # Errors
///
/// Returns [`GraphError::MalformedHierarchy`] when nesting exceeds
/// `max_depth`.
pub fn extract_hierarchy_edges(roots: &[ArtifactNode], max_depth: usize) -> GraphResult<Vec<Edge>> {
    let mut seen = BTreeSet::new();
    let mut edges = Vec::new();
    for root in roots {
        collect(root, 0, max_depth, &mut seen, &mut edges)?;
    }
    Ok(edges)
}

fn collect(
    node: &ArtifactNode,
    depth: usize,
    max_depth: usize,
    seen: &mut BTreeSet<(String, String)>,
    edges: &mut Vec<Edge>,
) -> GraphResult<()> {
    if depth > max_depth {
        return Err(GraphError::malformed(depth, max_depth, node.resolved_id()));
    }
    if let (Some(source), Some(Value::Array(entries))) =
        (node.resolved_id(), node.attributes.get(OUTGOING_KEY))
    {
        for entry in entries {
            let Some((target, label)) = typed_target(entry) else {
                continue;
            };
            if seen.insert((source.to_string(), target.to_string())) {
                edges.push(Edge::hierarchy(source, target, label));
            }
        }
    }
    for child in &node.children {
        collect(child, depth + 1, max_depth, seen, edges)?;
    }
    Ok(())
}

fn typed_target(entry: &Value) -> Option<(&str, &str)> {
    let label = entry.get("type")?.as_str().filter(|s| !s.is_empty())?;
    let target = entry
        .get("id")
        .or_else(|| entry.get("sid"))?
        .as_str()
        .filter(|s| !s.is_empty())?;
    Some((target, label))
}
