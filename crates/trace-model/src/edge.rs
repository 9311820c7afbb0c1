//! Directed relationships between artifacts
//!
//! Edges are tagged by the pool they come from. The identifier is derived
//! from the category and the `(source, target)` pair, so two edges with the
//! same pair in the same pool are equal by identifier.

use crate::id::ArtifactId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Relationship pool an edge belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeCategory {
    /// Parent to child in an artifact tree
    Structural,
    /// Cross-tool link (requirement satisfied by a block)
    Traceability,
    /// Link created by the user in the current session
    Manual,
    /// Cross-link supplied by the requirement hierarchy service
    Hierarchy,
}

impl EdgeCategory {
    /// All categories in merge order
    pub const ALL: [EdgeCategory; 4] = [
        Self::Structural,
        Self::Traceability,
        Self::Manual,
        Self::Hierarchy,
    ];

    /// Prefix used when deriving edge identifiers
    #[inline]
    #[must_use]
    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::Structural => "e",
            Self::Traceability => "trace",
            Self::Manual => "manual",
            Self::Hierarchy => "hier",
        }
    }
}

impl Display for EdgeCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Structural => "structural",
            Self::Traceability => "traceability",
            Self::Manual => "manual",
            Self::Hierarchy => "hierarchy",
        };
        f.write_str(name)
    }
}

/// Deterministic edge identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Derive identifier from category and endpoints
    #[must_use]
    pub fn derive(category: EdgeCategory, source: &str, target: &str) -> Self {
        Self(format!("{}-{source}-{target}", category.id_prefix()))
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EdgeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directed edge between two artifact identifiers
///
/// Endpoints need not be present in the current view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: ArtifactId,
    pub target: ArtifactId,
    pub category: EdgeCategory,
    /// Relationship label such as `SATISFIES`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    /// Create an edge of the given category
    #[must_use]
    pub fn new(
        category: EdgeCategory,
        source: impl Into<ArtifactId>,
        target: impl Into<ArtifactId>,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: EdgeId::derive(category, source.as_str(), target.as_str()),
            source,
            target,
            category,
            label: None,
        }
    }

    /// Parent-to-child edge
    #[inline]
    #[must_use]
    pub fn structural(source: impl Into<ArtifactId>, target: impl Into<ArtifactId>) -> Self {
        Self::new(EdgeCategory::Structural, source, target)
    }

    /// Cross-tool traceability edge
    #[inline]
    #[must_use]
    pub fn traceability(
        source: impl Into<ArtifactId>,
        target: impl Into<ArtifactId>,
        label: impl Into<String>,
    ) -> Self {
        Self::new(EdgeCategory::Traceability, source, target).with_label(label)
    }

    /// User-created edge
    #[inline]
    #[must_use]
    pub fn manual(source: impl Into<ArtifactId>, target: impl Into<ArtifactId>) -> Self {
        Self::new(EdgeCategory::Manual, source, target)
    }

    /// Externally supplied hierarchy edge
    #[inline]
    #[must_use]
    pub fn hierarchy(
        source: impl Into<ArtifactId>,
        target: impl Into<ArtifactId>,
        label: impl Into<String>,
    ) -> Self {
        Self::new(EdgeCategory::Hierarchy, source, target).with_label(label)
    }

    /// With relationship label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// `(source, target)` pair used for de-duplication
    #[inline]
    #[must_use]
    pub fn pair(&self) -> (&str, &str) {
        (self.source.as_str(), self.target.as_str())
    }

    /// Check whether either endpoint is `id`
    #[inline]
    #[must_use]
    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_prefixed_by_category() {
        assert_eq!(Edge::structural("A", "B").id.as_str(), "e-A-B");
        assert_eq!(
            Edge::traceability("R", "B", "SATISFIES").id.as_str(),
            "trace-R-B"
        );
        assert_eq!(Edge::manual("A", "B").id.as_str(), "manual-A-B");
        assert_eq!(
            Edge::hierarchy("R1", "R2", "TRACES_TO").id.as_str(),
            "hier-R1-R2"
        );
    }

    #[test]
    fn same_pair_different_pool_differs() {
        let structural = Edge::structural("A", "B");
        let manual = Edge::manual("A", "B");
        assert_eq!(structural.pair(), manual.pair());
        assert_ne!(structural.id, manual.id);
    }

    #[test]
    fn touches_either_endpoint() {
        let edge = Edge::manual("A", "B");
        assert!(edge.touches("A"));
        assert!(edge.touches("B"));
        assert!(!edge.touches("C"));
    }

    #[test]
    fn label_is_omitted_when_absent() {
        let json = serde_json::to_value(Edge::structural("A", "B")).unwrap();
        assert!(json.get("label").is_none());
        assert_eq!(json["category"], "structural");
    }
}
