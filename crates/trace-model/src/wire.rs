//! Collaborator-service records
//!
//! Request and response shapes of the storage/query service. Field names
//! follow the service exactly.

use crate::edge::Edge;
use crate::id::ArtifactId;
use crate::node::{ArtifactKind, ArtifactNode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Relationship label used when a link omits one
pub const DEFAULT_RELATIONSHIP: &str = "SATISFIES";

/// Summary of one top-level parent container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentSummary {
    pub id: ArtifactId,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub block_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl ParentSummary {
    /// Pseudo-node standing in for the container in a view
    #[must_use]
    pub fn to_node(&self) -> ArtifactNode {
        let mut node = ArtifactNode::new(self.id.clone(), ArtifactKind::ParentContainer)
            .with_node_type("LoadParent")
            .with_attribute("block_count", json!(self.block_count));
        node.display_name = Some(self.filename.clone().unwrap_or_else(|| self.id.to_string()));
        if let Some(created_at) = &self.created_at {
            node.attributes
                .insert("created_at".to_string(), Value::String(created_at.clone()));
        }
        node
    }
}

/// Requirement end of a traceability link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedRequirement {
    pub id: ArtifactId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
}

/// Block end of a traceability link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedBlock {
    pub sid: ArtifactId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
}

/// Cross-tool link between a requirement and a block (or container)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceabilityLink {
    pub requirement: LinkedRequirement,
    pub block: LinkedBlock,
    #[serde(default)]
    pub relationship: Option<String>,
}

impl TraceabilityLink {
    /// Traceability edge running from the requirement to the block
    #[must_use]
    pub fn to_edge(&self) -> Edge {
        Edge::traceability(
            self.requirement.id.clone(),
            self.block.sid.clone(),
            self.relationship
                .clone()
                .unwrap_or_else(|| DEFAULT_RELATIONSHIP.to_string()),
        )
    }
}

/// Response of the traceability listing endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceabilityLinks {
    #[serde(default)]
    pub total_links: Option<usize>,
    #[serde(default)]
    pub links: Vec<TraceabilityLink>,
}

/// Node type reported by the lookup endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Requirement,
    Block,
    LoadParent,
    #[serde(other)]
    Unknown,
}

/// Response of the node-type lookup endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTypeInfo {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub id: Option<ArtifactId>,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub parent_id: Option<ArtifactId>,
}

impl NodeTypeInfo {
    /// Type info with no children and no parent
    #[must_use]
    pub fn of(node_type: NodeType) -> Self {
        Self {
            node_type,
            id: None,
            has_children: false,
            parent_id: None,
        }
    }

    /// With children flag
    #[must_use]
    pub fn with_children(mut self, has_children: bool) -> Self {
        self.has_children = has_children;
        self
    }

    /// With owning container
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<ArtifactId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Requirement that owns derived requirements
    #[must_use]
    pub fn is_cross_referenceable_parent(&self) -> bool {
        self.node_type == NodeType::Requirement && self.has_children
    }
}

/// Body of the connect request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub source: ArtifactId,
    pub target: ArtifactId,
}

/// Successful connect response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub relationship_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Edit of one generated-code reference attached to a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeReferenceUpdate {
    pub block_sid: ArtifactId,
    pub block_path: String,
    pub file_path: String,
    pub ref_index: usize,
    #[serde(default)]
    pub line: Option<u64>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Response of the code-reference update endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeReferenceResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub updated_ref: Option<Value>,
}
