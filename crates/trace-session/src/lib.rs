//! Tracegraph Session
//!
//! Interactive layer over the graph engines: the connection mediator, the
//! explicit view state machine, and [`Session`], the single writer that
//! ties collaborator calls to both.
//!
//! # Example
//!
//! ```rust,no_run
//! use trace_session::{Session, TraceConfig};
//!
//! # async fn example() -> trace_session::SessionResult<()> {
//! let session = Session::over_http(TraceConfig::default().with_env_overrides())?;
//! let view = session.load().await?;
//! println!("{} nodes, {} edges", view.nodes.len(), view.edges.len());
//!
//! let state = session.select("REQ-001")?;
//! println!("impact: {:?}", state.highlighted());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod cache;
mod config;
mod error;
mod mediator;
mod session;
mod state;
mod timeline;

pub use cache::{CachedBlocks, TreeCache};
pub use config::{FilterSettings, ServiceSettings, TraceConfig, BASE_URL_ENV};
pub use error::{CacheError, ConfigError, SessionError, SessionResult};
pub use mediator::{CommittedConnection, ConnectionMediator, Proposal, RejectReason};
pub use session::Session;
pub use state::{transition, Event, Notification, NotificationLevel, ViewState};
pub use timeline::VersionTimeline;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{
        Event, Proposal, RejectReason, Session, SessionError, SessionResult, TraceConfig,
        ViewState,
    };
}
