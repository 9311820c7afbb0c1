//! Relationship snapshots and version listings
//!
//! A [`RelationshipSnapshot`] is an immutable point-in-time record of one
//! artifact's relationships, created by the versioning service. The core
//! only ever compares two of them.

use crate::id::ArtifactId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier set used inside snapshots
pub type IdSet = BTreeSet<ArtifactId>;

/// Block-side relationship sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSets {
    #[serde(default)]
    pub outgoing: IdSet,
    #[serde(default)]
    pub incoming: IdSet,
    #[serde(default)]
    pub satisfies: IdSet,
}

/// Requirement-side relationship sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipSets {
    #[serde(default)]
    pub derives_from: IdSet,
    #[serde(default)]
    pub derived_by: IdSet,
    #[serde(default)]
    pub satisfies: IdSet,
}

/// Edit that produced a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotChange {
    #[serde(default, rename = "type")]
    pub change_type: String,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub source: Option<ArtifactId>,
    #[serde(default)]
    pub target: Option<ArtifactId>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl SnapshotChange {
    /// Delta with explicit endpoints
    #[must_use]
    pub fn connection(source: impl Into<ArtifactId>, target: impl Into<ArtifactId>) -> Self {
        Self {
            change_type: "connection_added".to_string(),
            relationship: None,
            source: Some(source.into()),
            target: Some(target.into()),
            timestamp: None,
        }
    }
}

/// Immutable relationship record of one artifact version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipSnapshot {
    pub artifact_id: ArtifactId,
    pub version_id: String,
    pub version_number: u32,
    pub timestamp: String,
    pub is_initial: bool,
    pub connections: ConnectionSets,
    pub relationships: RelationshipSets,
    pub change: Option<SnapshotChange>,
}

impl RelationshipSnapshot {
    /// Empty snapshot for an artifact version
    #[must_use]
    pub fn new(artifact_id: impl Into<ArtifactId>, version_id: impl Into<String>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            version_id: version_id.into(),
            version_number: 0,
            timestamp: String::new(),
            is_initial: false,
            connections: ConnectionSets::default(),
            relationships: RelationshipSets::default(),
            change: None,
        }
    }

    /// With connection sets
    #[must_use]
    pub fn with_connections(mut self, connections: ConnectionSets) -> Self {
        self.connections = connections;
        self
    }

    /// With relationship sets
    #[must_use]
    pub fn with_relationships(mut self, relationships: RelationshipSets) -> Self {
        self.relationships = relationships;
        self
    }

    /// With change record
    #[must_use]
    pub fn with_change(mut self, change: SnapshotChange) -> Self {
        self.change = Some(change);
        self
    }

    /// Union of every connection and relationship set
    #[must_use]
    pub fn related_ids(&self) -> IdSet {
        let c = &self.connections;
        let r = &self.relationships;
        c.outgoing
            .iter()
            .chain(&c.incoming)
            .chain(&c.satisfies)
            .chain(&r.derives_from)
            .chain(&r.derived_by)
            .chain(&r.satisfies)
            .cloned()
            .collect()
    }
}

/// Body of the `snapshot` field in a version record
#[derive(Debug, Clone, Default, Deserialize)]
struct SnapshotBody {
    #[serde(default)]
    connections: ConnectionSets,
    #[serde(default)]
    relationships: RelationshipSets,
    #[serde(default)]
    change: Option<SnapshotChange>,
}

/// Version snapshot record as served by the versioning service
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotRecord {
    pub version_id: String,
    pub artifact_id: ArtifactId,
    #[serde(default)]
    pub artifact_type: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub version_number: Option<u32>,
    #[serde(default)]
    pub is_initial: Option<bool>,
    #[serde(default)]
    snapshot: serde_json::Value,
}

impl From<SnapshotRecord> for RelationshipSnapshot {
    fn from(record: SnapshotRecord) -> Self {
        // Non-object bodies (e.g. `{"raw": ...}` fallbacks) carry no sets.
        let body: SnapshotBody = serde_json::from_value(record.snapshot).unwrap_or_default();
        Self {
            artifact_id: record.artifact_id,
            version_id: record.version_id,
            version_number: record.version_number.unwrap_or_default(),
            timestamp: record.timestamp.unwrap_or_default(),
            is_initial: record.is_initial.unwrap_or(false),
            connections: body.connections,
            relationships: body.relationships,
            change: body.change,
        }
    }
}

/// One entry of an artifact's version history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub version_id: String,
    #[serde(default)]
    pub artifact_id: Option<ArtifactId>,
    #[serde(default, alias = "type")]
    pub artifact_type: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub version_number: Option<u32>,
    #[serde(default)]
    pub parent_version_id: Option<String>,
}

impl VersionSummary {
    /// Timestamp parsed as naive UTC (`2025-01-31T10:00:00.123456`)
    #[must_use]
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        let raw = self.timestamp.as_deref()?;
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }
}

/// Response of the version listing endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionList {
    #[serde(default)]
    pub artifact_id: Option<ArtifactId>,
    #[serde(default)]
    pub versions: Vec<VersionSummary>,
    #[serde(default)]
    pub count: Option<usize>,
}
