//! Tracegraph Client
//!
//! Boundary to the storage/query service that owns requirements, blocks,
//! links and version snapshots.
//!
//! - [`TraceService`]: async contract consumed by the session layer
//! - [`HttpTraceService`]: `reqwest` implementation of the JSON routes
//! - [`SnapshotCache`]: moka cache of immutable snapshots

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod cache;
mod error;
mod http;
mod service;

pub use cache::SnapshotCache;
pub use error::{ServiceError, ServiceResult};
pub use http::{ClientConfig, HttpTraceService, DEFAULT_BASE_URL};
pub use service::TraceService;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
