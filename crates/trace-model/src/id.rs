//! Stable artifact identifiers
//!
//! Provides [`ArtifactId`], the identifier shared by requirements, model
//! blocks and parent containers.

use crate::error::ModelError;
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Stable identifier of an artifact
///
/// Unique across the union of all trees loaded in a session. Requirements
/// use their requirement id, blocks their model SID, containers their
/// container id. Collisions are not resolved here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Create identifier from any string-like value
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check for the empty identifier
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the inner string
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for ArtifactId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArtifactId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ModelError::EmptyIdentifier);
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for ArtifactId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ArtifactId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ArtifactId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ArtifactId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ArtifactId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ArtifactId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn parse_trims_and_rejects_empty() {
        assert_eq!(ArtifactId::from_str("  REQ-1 ").unwrap().as_str(), "REQ-1");
        assert!(matches!(
            ArtifactId::from_str("   "),
            Err(ModelError::EmptyIdentifier)
        ));
    }

    #[test]
    fn borrow_allows_str_lookup() {
        let set: BTreeSet<ArtifactId> = ["A", "B"].into_iter().map(ArtifactId::from).collect();
        assert!(set.contains("A"));
        assert!(!set.contains("C"));
    }

    #[test]
    fn serializes_transparently() {
        let id = ArtifactId::new("sid:42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"sid:42\"");
    }
}
