//! Tracegraph Model
//!
//! Artifacts, edges and relationship snapshots shared by every crate of
//! the traceability workspace.
//!
//! # Core Concepts
//!
//! - [`ArtifactNode`]: requirement, block or container, with an opaque
//!   attribute payload
//! - [`Edge`]: directed relationship tagged by [`EdgeCategory`]
//! - [`RelationshipSnapshot`]: immutable relationship record of one version
//! - [`ViewScope`]: collapsed or expanded rendering scope
//! - [`ViewKey`]: Blake3 digest used to suppress redundant recomposition
//!
//! # Example
//!
//! ```rust
//! use trace_model::{ArtifactKind, ArtifactNode, Edge};
//!
//! let root = ArtifactNode::new("REQ-1", ArtifactKind::Requirement)
//!     .with_child(ArtifactNode::new("REQ-2", ArtifactKind::Requirement));
//! let edge = Edge::structural("REQ-1", "REQ-2");
//!
//! assert_eq!(root.resolved_id(), Some("REQ-1"));
//! assert_eq!(edge.id.as_str(), "e-REQ-1-REQ-2");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod edge;
mod error;
mod id;
mod key;
mod node;
mod scope;
mod snapshot;

/// Collaborator-service records
pub mod wire;

pub use edge::{Edge, EdgeCategory, EdgeId};
pub use error::ModelError;
pub use id::ArtifactId;
pub use key::{ViewKey, ViewKeyHasher};
pub use node::{ArtifactKind, ArtifactNode, TreeRecord};
pub use scope::ViewScope;
pub use snapshot::{
    ConnectionSets, IdSet, RelationshipSets, RelationshipSnapshot, SnapshotChange,
    SnapshotRecord, VersionList, VersionSummary,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
