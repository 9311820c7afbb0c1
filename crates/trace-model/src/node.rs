//! Artifact nodes and the tree records they are decoded from
//!
//! [`TreeRecord`] is the loose wire shape returned by the requirement and
//! block services. [`ArtifactNode`] is the typed tree the graph engines
//! consume; its `attributes` payload is carried through untouched.

use crate::error::ModelError;
use crate::id::ArtifactId;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Which source an artifact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Requirement from the systems-modeling tool
    Requirement,
    /// Block from the simulation/code-generation tool
    Block,
    /// Aggregate container owning a block tree
    ParentContainer,
}

impl ArtifactKind {
    /// Stable lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requirement => "requirement",
            Self::Block => "block",
            Self::ParentContainer => "parent_container",
        }
    }
}

/// Node of an artifact tree
///
/// Children are exclusively owned by their parent. Identifiers are not
/// validated; see [`ArtifactNode::resolved_id`] for the lookup rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactNode {
    /// Explicit identifier, if the record carried one
    pub id: Option<ArtifactId>,
    /// Human label
    pub display_name: Option<String>,
    /// Source tag
    pub kind: ArtifactKind,
    /// Domain type reported by the source tool (e.g. `SubSystem`)
    #[serde(default)]
    pub node_type: Option<String>,
    /// Ordered children
    #[serde(default)]
    pub children: Vec<ArtifactNode>,
    /// Opaque domain metadata
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ArtifactNode {
    /// Create a childless node with an explicit identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<ArtifactId>, kind: ArtifactKind) -> Self {
        Self {
            id: Some(id.into()),
            display_name: None,
            kind,
            node_type: None,
            children: Vec::new(),
            attributes: Map::new(),
        }
    }

    /// Create a node that only has a display name
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            id: None,
            display_name: Some(name.into()),
            kind,
            node_type: None,
            children: Vec::new(),
            attributes: Map::new(),
        }
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// With domain type
    #[inline]
    #[must_use]
    pub fn with_node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    /// Append a child
    #[inline]
    #[must_use]
    pub fn with_child(mut self, child: ArtifactNode) -> Self {
        self.children.push(child);
        self
    }

    /// Replace children
    #[inline]
    #[must_use]
    pub fn with_children(mut self, children: Vec<ArtifactNode>) -> Self {
        self.children = children;
        self
    }

    /// Set an attribute
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Identifier used for flattening and edges
    ///
    /// The explicit id wins; otherwise the display name. Empty strings do
    /// not count. `None` marks a decorative node.
    #[must_use]
    pub fn resolved_id(&self) -> Option<&str> {
        self.id
            .as_ref()
            .map(ArtifactId::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| self.display_name.as_deref().filter(|s| !s.is_empty()))
    }

    /// Label for display: name, then identifier
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or_else(|| self.id.as_ref().map(ArtifactId::as_str))
            .unwrap_or("")
    }

    /// Copy of this node without its children
    #[must_use]
    pub fn shallow_copy(&self) -> Self {
        Self {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            kind: self.kind,
            node_type: self.node_type.clone(),
            children: Vec::new(),
            attributes: self.attributes.clone(),
        }
    }

    /// Build a typed tree from a wire record
    #[must_use]
    pub fn from_record(record: TreeRecord, kind: ArtifactKind) -> Self {
        let id = record
            .id
            .or(record.sid)
            .filter(|s| !s.is_empty())
            .map(ArtifactId::new);
        let children = record
            .children
            .unwrap_or_default()
            .into_iter()
            .map(|child| Self::from_record(child, kind))
            .collect();

        Self {
            id,
            display_name: record.name,
            kind,
            node_type: record.node_type,
            children,
            attributes: record.attributes,
        }
    }

    /// Convert a forest of records
    #[must_use]
    pub fn forest(records: Vec<TreeRecord>, kind: ArtifactKind) -> Vec<Self> {
        records
            .into_iter()
            .map(|r| Self::from_record(r, kind))
            .collect()
    }
}

/// Tree record as served by the requirement and block services
///
/// Requirements carry `id`, blocks carry `sid`. Every other key
/// (`description`, `incoming`, `outgoing`, `generated_code`, ...) lands in
/// `attributes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeRecord {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, rename = "type")]
    pub node_type: Option<String>,

    #[serde(default)]
    pub children: Option<Vec<TreeRecord>>,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Accept string or numeric identifiers, treat null as absent
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(ModelError::UnsupportedIdentifier(
            other.to_string(),
        ))),
    }
}
