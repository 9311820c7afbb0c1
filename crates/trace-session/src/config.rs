//! Session configuration
//!
//! Loaded from TOML; every key is optional. `TRACEGRAPH_BASE_URL`
//! overrides `service.base_url`.
//!
//! ```toml
//! max_tree_depth = 256
//! cache_dir = "/var/cache/tracegraph"
//!
//! [service]
//! base_url = "http://localhost:5000/api"
//! timeout_secs = 30
//!
//! [filter]
//! excluded_names = ["Scope", "More Info"]
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use trace_client::{ClientConfig, DEFAULT_BASE_URL};
use trace_graph::{EdgeSynthesizer, NodeFilter, DEFAULT_EXCLUDED_NAMES, DEFAULT_MAX_DEPTH};
use trace_model::wire::DEFAULT_RELATIONSHIP;

/// Environment variable overriding the service base URL
pub const BASE_URL_ENV: &str = "TRACEGRAPH_BASE_URL";

/// Collaborator service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Decorative-node filtering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub excluded_names: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            excluded_names: DEFAULT_EXCLUDED_NAMES.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Tracegraph configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub service: ServiceSettings,
    pub filter: FilterSettings,
    /// Recursion-depth guard for tree traversal
    pub max_tree_depth: usize,
    /// Directory of the persisted tree cache; disabled when absent
    pub cache_dir: Option<PathBuf>,
    /// Immutable snapshot cache entries
    pub snapshot_cache_capacity: u64,
    /// Label for traceability edges created by the mediator
    pub default_relationship: String,
    /// Discard async results that arrive after the scope moved on
    pub drop_stale_responses: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            filter: FilterSettings::default(),
            max_tree_depth: DEFAULT_MAX_DEPTH,
            cache_dir: None,
            snapshot_cache_capacity: 1024,
            default_relationship: DEFAULT_RELATIONSHIP.to_string(),
            drop_stale_responses: true,
        }
    }
}

impl TraceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`TraceConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply environment overrides
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => self.with_base_url(url.trim()),
            _ => self,
        }
    }

    /// With service base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.service.base_url = base_url.into();
        self
    }

    /// With tree cache directory
    #[inline]
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// With stale-response policy
    #[inline]
    #[must_use]
    pub fn with_drop_stale_responses(mut self, drop: bool) -> Self {
        self.drop_stale_responses = drop;
        self
    }

    /// With max tree depth
    #[inline]
    #[must_use]
    pub fn with_max_tree_depth(mut self, depth: usize) -> Self {
        self.max_tree_depth = depth;
        self
    }

    /// Reject settings the engines cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tree_depth == 0 {
            return Err(ConfigError::invalid("max_tree_depth", "must be at least 1"));
        }
        if self.service.timeout_secs == 0 {
            return Err(ConfigError::invalid("service.timeout_secs", "must be at least 1"));
        }
        if self.default_relationship.trim().is_empty() {
            return Err(ConfigError::invalid("default_relationship", "must not be empty"));
        }
        Ok(())
    }

    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_base_url(self.service.base_url.clone())
            .with_timeout(Duration::from_secs(self.service.timeout_secs))
    }

    #[must_use]
    pub fn node_filter(&self) -> NodeFilter {
        NodeFilter::new(self.filter.excluded_names.iter().cloned())
    }

    #[must_use]
    pub fn synthesizer(&self) -> EdgeSynthesizer {
        EdgeSynthesizer::new(self.node_filter()).with_max_depth(self.max_tree_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_backend() {
        let config = TraceConfig::default();
        assert_eq!(config.service.base_url, "http://localhost:5000/api");
        assert_eq!(config.filter.excluded_names, vec!["Scope", "More Info"]);
        assert_eq!(config.default_relationship, "SATISFIES");
        assert!(config.drop_stale_responses);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = TraceConfig::from_toml_str(
            r#"
            cache_dir = "/tmp/tg"

            [service]
            base_url = "http://backend:8080/api"
            "#,
        )
        .unwrap();

        assert_eq!(config.service.base_url, "http://backend:8080/api");
        assert_eq!(config.service.timeout_secs, 30);
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/tg")));
        assert_eq!(config.max_tree_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn rejects_zero_depth() {
        let err = TraceConfig::from_toml_str("max_tree_depth = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "max_tree_depth", .. }));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            TraceConfig::from_toml_str("max_tree_depth = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = TraceConfig::load("/nonexistent/tracegraph.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn derived_components_follow_settings() {
        let config = TraceConfig::default().with_max_tree_depth(8);
        assert_eq!(config.synthesizer().max_depth(), 8);
        assert_eq!(config.client_config().timeout, Duration::from_secs(30));
    }
}
