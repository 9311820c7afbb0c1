//! Version timeline of one artifact

use trace_model::{ArtifactId, VersionList, VersionSummary};

/// Versions ordered oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionTimeline {
    artifact: Option<ArtifactId>,
    versions: Vec<VersionSummary>,
}

impl VersionTimeline {
    /// Order a listing by version number
    ///
    /// Entries without a number sort by timestamp after the numbered ones.
    #[must_use]
    pub fn new(list: VersionList) -> Self {
        let mut versions = list.versions;
        versions.sort_by(|a, b| {
            let key = |v: &VersionSummary| (v.version_number.is_none(), v.version_number);
            key(a)
                .cmp(&key(b))
                .then_with(|| a.timestamp.cmp(&b.timestamp))
        });
        Self {
            artifact: list.artifact_id,
            versions,
        }
    }

    #[inline]
    #[must_use]
    pub fn artifact(&self) -> Option<&ArtifactId> {
        self.artifact.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn versions(&self) -> &[VersionSummary] {
        &self.versions
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&VersionSummary> {
        self.versions.last()
    }

    /// Default comparison baseline of a version
    ///
    /// The recorded parent version when it is listed, otherwise the
    /// preceding entry. The initial version and unknown ids have none.
    #[must_use]
    pub fn baseline_of(&self, version_id: &str) -> Option<&VersionSummary> {
        let index = self.versions.iter().position(|v| v.version_id == version_id)?;
        let recorded = self.versions[index]
            .parent_version_id
            .as_deref()
            .and_then(|parent| self.versions.iter().find(|v| v.version_id == parent));
        recorded.or_else(|| index.checked_sub(1).map(|i| &self.versions[i]))
    }
}
