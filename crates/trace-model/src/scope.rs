//! View scope: which subset of the graph is rendered

use crate::id::ArtifactId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Currently rendered subset of the graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ViewScope {
    /// All top-level containers plus the requirement tree
    #[default]
    Collapsed,
    /// One container's block tree plus the requirement tree
    Expanded { container: ArtifactId },
}

impl ViewScope {
    /// Expanded scope for a container
    #[inline]
    #[must_use]
    pub fn expanded(container: impl Into<ArtifactId>) -> Self {
        Self::Expanded {
            container: container.into(),
        }
    }

    /// Expanded container, if any
    #[inline]
    #[must_use]
    pub fn container(&self) -> Option<&ArtifactId> {
        match self {
            Self::Collapsed => None,
            Self::Expanded { container } => Some(container),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        matches!(self, Self::Collapsed)
    }
}

impl Display for ViewScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collapsed => f.write_str("collapsed"),
            Self::Expanded { container } => write!(f, "expanded:{container}"),
        }
    }
}
