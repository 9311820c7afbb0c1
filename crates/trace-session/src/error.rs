//! Error types for the session layer

use std::path::PathBuf;
use trace_client::ServiceError;
use trace_graph::GraphError;
use trace_model::ArtifactId;

/// Errors loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Errors of the persisted tree cache
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt cache entry {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level session error
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("artifact {0} has no versions")]
    NoVersions(ArtifactId),

    #[error("scope changed while the request was in flight")]
    StaleScope,
}

impl SessionError {
    /// Input data is unusable; retrying will not help
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Graph(_) | Self::Config(_))
    }
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
