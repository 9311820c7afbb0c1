//! Edge Synthesizer
//!
//! Derives structural parent-to-child edges from a filtered tree.

use crate::error::{GraphError, GraphResult};
use crate::filter::NodeFilter;
use crate::flatten::DEFAULT_MAX_DEPTH;
use std::collections::BTreeSet;
use trace_model::{ArtifactNode, Edge, IdSet};

/// Structural edge synthesizer
#[derive(Debug, Clone)]
pub struct EdgeSynthesizer {
    filter: NodeFilter,
    max_depth: usize,
}

impl Default for EdgeSynthesizer {
    fn default() -> Self {
        Self::new(NodeFilter::default())
    }
}

impl EdgeSynthesizer {
    #[must_use]
    pub fn new(filter: NodeFilter) -> Self {
        Self {
            filter,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// With recursion-depth guard
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[inline]
    #[must_use]
    pub fn filter(&self) -> &NodeFilter {
        &self.filter
    }

    #[inline]
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// One structural edge per valid parent-to-child relationship
    ///
    /// A child qualifies when its identifier is in `valid_ids` and its name
    /// is not excluded. Descent continues through every child, qualifying
    /// or not, so edges below a pruned node still appear. Output is in
    /// pre-order and de-duplicated by pair.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MalformedHierarchy`] when nesting exceeds the
    /// depth guard.
    pub fn synthesize(&self, roots: &[ArtifactNode], valid_ids: &IdSet) -> GraphResult<Vec<Edge>> {
        let mut seen = BTreeSet::new();
        let mut edges = Vec::new();
        for root in roots {
            self.descend(root, 0, valid_ids, &mut seen, &mut edges)?;
        }
        Ok(edges)
    }

    fn descend<'a>(
        &self,
        node: &'a ArtifactNode,
        depth: usize,
        valid_ids: &IdSet,
        seen: &mut BTreeSet<(&'a str, &'a str)>,
        edges: &mut Vec<Edge>,
    ) -> GraphResult<()> {
        if depth > self.max_depth {
            return Err(GraphError::malformed(depth, self.max_depth, node.resolved_id()));
        }
        let parent = node.resolved_id();
        for child in &node.children {
            if let (Some(source), Some(target)) = (parent, child.resolved_id()) {
                if valid_ids.contains(target)
                    && !self.filter.is_excluded(child)
                    && seen.insert((source, target))
                {
                    edges.push(Edge::structural(source, target));
                }
            }
            self.descend(child, depth + 1, valid_ids, seen, edges)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use pretty_assertions::assert_eq;
    use trace_model::{ArtifactKind, EdgeCategory};

    fn block(id: &str) -> ArtifactNode {
        ArtifactNode::new(id, ArtifactKind::Block)
    }

    fn pairs(edges: &[Edge]) -> Vec<(&str, &str)> {
        edges.iter().map(Edge::pair).collect()
    }

    fn synthesize(roots: &[ArtifactNode]) -> Vec<Edge> {
        let synth = EdgeSynthesizer::default();
        let flat = flatten(roots).unwrap();
        let valid = synth.filter().valid_ids(&flat);
        synth.synthesize(roots, &valid).unwrap()
    }

    #[test]
    fn edges_follow_preorder() {
        let tree = block("A")
            .with_child(block("B").with_child(block("C")))
            .with_child(block("D"));
        let edges = synthesize(&[tree]);

        assert_eq!(pairs(&edges), vec![("A", "B"), ("B", "C"), ("A", "D")]);
        assert!(edges.iter().all(|e| e.category == EdgeCategory::Structural));
    }

    #[test]
    fn excluded_children_produce_no_edges() {
        let tree = block("A")
            .with_child(ArtifactNode::named("Scope", ArtifactKind::Block))
            .with_child(block("9").with_name("More Info").with_child(block("X")))
            .with_child(block("B"));
        let edges = synthesize(&[tree]);

        assert_eq!(pairs(&edges), vec![("9", "X"), ("A", "B")]);
    }

    #[test]
    fn duplicate_pairs_suppressed() {
        let tree = block("A").with_child(block("B")).with_child(block("B"));
        assert_eq!(pairs(&synthesize(&[tree])), vec![("A", "B")]);
    }

    #[test]
    fn invalid_targets_skipped() {
        let tree = block("A").with_child(block("B")).with_child(block("C"));
        let valid: IdSet = ["A", "C"].into_iter().map(Into::into).collect();
        let edges = EdgeSynthesizer::default().synthesize(&[tree], &valid).unwrap();
        assert_eq!(pairs(&edges), vec![("A", "C")]);
    }

    #[test]
    fn unnamed_parent_emits_nothing_but_descends() {
        let mut group = ArtifactNode::new("", ArtifactKind::Block);
        group.children.push(block("A").with_child(block("B")));
        assert_eq!(pairs(&synthesize(&[group])), vec![("A", "B")]);
    }
}
