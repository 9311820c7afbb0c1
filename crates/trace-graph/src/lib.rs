//! Tracegraph Engines
//!
//! In-memory graph assembly, traversal and version diffing over artifact
//! trees from independent tools.
//!
//! # Core Concepts
//!
//! - [`flatten`]: nested trees to a flat identifier mapping
//! - [`EdgeSynthesizer`]: structural parent-to-child edges over a filtered tree
//! - [`ViewComposer`]: four-pool merge per [`ViewScope`](trace_model::ViewScope),
//!   suppressed when the view key is unchanged
//! - [`descendants`]: downstream impact set of one artifact
//! - [`diff`]: added/removed identifiers between two snapshots
//! - [`LayoutAdapter`]: coordinate assignment boundary
//!
//! # Example
//!
//! ```rust
//! use trace_graph::{CollaboratorData, ViewComposer, descendants};
//! use trace_model::{ArtifactKind, ArtifactNode, ViewScope};
//!
//! let mut data = CollaboratorData::new();
//! data.set_requirements(vec![ArtifactNode::new("R1", ArtifactKind::Requirement)
//!     .with_child(ArtifactNode::new("R2", ArtifactKind::Requirement))]);
//!
//! let mut composer = ViewComposer::default();
//! let view = composer.compose(&ViewScope::Collapsed, &data).unwrap();
//! assert_eq!(view.edges.len(), 1);
//!
//! let impact = descendants("R1", &view.edges);
//! assert!(impact.contains("R2"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod compose;
mod diff;
mod error;
mod filter;
mod flatten;
mod hierarchy;
mod impact;
mod layout;
mod synthesize;

pub use compose::{
    compose_view, relevant_to, CollaboratorData, ComposedView, EdgePools, ExpandedBlocks,
    ViewComposer,
};
pub use diff::{diff, ChangeClass, SnapshotDiff};
pub use error::{GraphError, GraphResult};
pub use filter::{NodeFilter, DEFAULT_EXCLUDED_NAMES};
pub use flatten::{flatten, flatten_with_limit, rebuild, rebuild_with_limit, FlatNodes, DEFAULT_MAX_DEPTH};
pub use hierarchy::{extract_hierarchy_edges, OUTGOING_KEY};
pub use impact::descendants;
pub use layout::{LayeredLayout, LayoutAdapter, PositionedNode};
pub use synthesize::EdgeSynthesizer;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{
        descendants, diff, flatten, CollaboratorData, ComposedView, EdgeSynthesizer,
        GraphError, GraphResult, NodeFilter, SnapshotDiff, ViewComposer,
    };
}
