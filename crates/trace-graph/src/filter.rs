//! Decorative-node filtering applied before edge synthesis

use crate::flatten::FlatNodes;
use std::collections::BTreeSet;
use trace_model::{ArtifactNode, IdSet};

/// Display names pruned from every view by default
pub const DEFAULT_EXCLUDED_NAMES: [&str; 2] = ["Scope", "More Info"];

/// Name-based node filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFilter {
    excluded_names: BTreeSet<String>,
}

impl Default for NodeFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_NAMES)
    }
}

impl NodeFilter {
    /// Filter excluding the given display names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Filter that keeps everything
    #[must_use]
    pub fn none() -> Self {
        Self {
            excluded_names: BTreeSet::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_excluded(&self, node: &ArtifactNode) -> bool {
        node.display_name
            .as_deref()
            .is_some_and(|name| self.excluded_names.contains(name))
    }

    /// Identifiers of the flattened nodes that survive the filter
    #[must_use]
    pub fn valid_ids(&self, flat: &FlatNodes) -> IdSet {
        flat.iter()
            .filter(|(_, node)| !self.is_excluded(node))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Drop excluded nodes from a flat mapping
    #[must_use]
    pub fn retain(&self, mut flat: FlatNodes) -> FlatNodes {
        flat.retain(|_, node| !self.is_excluded(node));
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use trace_model::ArtifactKind;

    #[test]
    fn default_prunes_decorative_names() {
        let tree = ArtifactNode::new("P", ArtifactKind::Block)
            .with_child(ArtifactNode::named("Scope", ArtifactKind::Block))
            .with_child(ArtifactNode::new("7", ArtifactKind::Block).with_name("More Info"))
            .with_child(ArtifactNode::new("8", ArtifactKind::Block).with_name("Gain"));
        let flat = flatten(&[tree]).unwrap();
        let filter = NodeFilter::default();

        let valid = filter.valid_ids(&flat);
        let ids: Vec<_> = valid.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["8", "P"]);
        assert_eq!(filter.retain(flat).len(), 2);
    }

    #[test]
    fn none_keeps_everything() {
        let node = ArtifactNode::named("Scope", ArtifactKind::Block);
        assert!(!NodeFilter::none().is_excluded(&node));
        assert!(NodeFilter::new(["Scope"]).is_excluded(&node));
    }
}
