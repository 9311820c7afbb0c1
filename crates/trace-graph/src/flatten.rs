//! Tree Flattener
//!
//! Converts nested artifact trees into a flat mapping keyed by resolved
//! identifier. Traversal is pre-order; later duplicates overwrite earlier
//! ones while keeping the position of the first insertion.

use crate::error::{GraphError, GraphResult};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use trace_model::{ArtifactId, ArtifactNode, Edge, EdgeCategory};

/// Default recursion-depth guard
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Flat node mapping in first-seen order
pub type FlatNodes = IndexMap<ArtifactId, ArtifactNode>;

/// Flatten with the default depth guard
///
/// # Errors
///
/// Returns [`GraphError::MalformedHierarchy`] when nesting exceeds
/// [`DEFAULT_MAX_DEPTH`].
pub fn flatten(roots: &[ArtifactNode]) -> GraphResult<FlatNodes> {
    flatten_with_limit(roots, DEFAULT_MAX_DEPTH)
}

/// Flatten with an explicit depth guard
///
/// Nodes without a resolvable identifier are skipped, but their children
/// are still visited. Stored values are shallow copies.
///
/// # Errors
///
/// Returns [`GraphError::MalformedHierarchy`] when nesting exceeds
/// `max_depth`.
pub fn flatten_with_limit(roots: &[ArtifactNode], max_depth: usize) -> GraphResult<FlatNodes> {
    let mut acc = FlatNodes::new();
    for root in roots {
        visit(root, 0, max_depth, &mut acc)?;
    }
    Ok(acc)
}

fn visit(
    node: &ArtifactNode,
    depth: usize,
    max_depth: usize,
    acc: &mut FlatNodes,
) -> GraphResult<()> {
    if depth > max_depth {
        return Err(GraphError::malformed(depth, max_depth, node.resolved_id()));
    }
    if let Some(id) = node.resolved_id() {
        acc.insert(ArtifactId::new(id), node.shallow_copy());
    }
    for child in &node.children {
        visit(child, depth + 1, max_depth, acc)?;
    }
    Ok(())
}

/// Rebuild with the default depth guard
///
/// # Errors
///
/// Returns [`GraphError::MalformedHierarchy`] when a structural chain is
/// deeper than [`DEFAULT_MAX_DEPTH`].
pub fn rebuild(flat: &FlatNodes, edges: &[Edge]) -> GraphResult<Vec<ArtifactNode>> {
    rebuild_with_limit(flat, edges, DEFAULT_MAX_DEPTH)
}

/// Rebuild trees from a flat mapping and its structural edges
///
/// Nodes with no incoming structural edge become roots, in mapping order.
/// Edges whose endpoints are missing from `flat` are ignored. A child
/// already placed under another parent is not placed twice.
///
/// # Errors
///
/// Returns [`GraphError::MalformedHierarchy`] when a structural chain is
/// deeper than `max_depth`.
pub fn rebuild_with_limit(
    flat: &FlatNodes,
    edges: &[Edge],
    max_depth: usize,
) -> GraphResult<Vec<ArtifactNode>> {
    let mut children: IndexMap<&str, Vec<&str>> = IndexMap::new();
    let mut has_parent: BTreeSet<&str> = BTreeSet::new();

    for edge in edges {
        if edge.category != EdgeCategory::Structural {
            continue;
        }
        let (source, target) = edge.pair();
        if !flat.contains_key(source) || !flat.contains_key(target) || source == target {
            continue;
        }
        if has_parent.insert(target) {
            children.entry(source).or_default().push(target);
        }
    }

    let assembly = Assembly {
        flat,
        children: &children,
        max_depth,
    };
    let mut placed = BTreeSet::new();
    let mut roots = Vec::new();
    for id in flat.keys().filter(|id| !has_parent.contains(id.as_str())) {
        if let Some(node) = assembly.node(id.as_str(), 0, &mut placed)? {
            roots.push(node);
        }
    }
    Ok(roots)
}

struct Assembly<'a, 'f> {
    flat: &'f FlatNodes,
    children: &'f IndexMap<&'a str, Vec<&'a str>>,
    max_depth: usize,
}

impl<'a> Assembly<'a, '_> {
    fn node(
        &self,
        id: &'a str,
        depth: usize,
        placed: &mut BTreeSet<&'a str>,
    ) -> GraphResult<Option<ArtifactNode>> {
        if depth > self.max_depth {
            return Err(GraphError::malformed(depth, self.max_depth, Some(id)));
        }
        if !placed.insert(id) {
            return Ok(None);
        }
        let Some(found) = self.flat.get(id) else {
            return Ok(None);
        };
        let mut node = found.shallow_copy();
        if let Some(kids) = self.children.get(id) {
            for kid in kids {
                if let Some(child) = self.node(*kid, depth + 1, placed)? {
                    node.children.push(child);
                }
            }
        }
        Ok(Some(node))
    }
}
