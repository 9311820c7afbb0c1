//! Version Diff Engine
//!
//! Set-membership comparison of two relationship snapshots. No
//! attribute-level comparison is performed, so `modified` stays empty.

use serde::{Deserialize, Serialize};
use trace_model::{IdSet, RelationshipSnapshot};

/// Classification of one identifier in a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeClass {
    Added,
    Removed,
    Modified,
}

/// Added, removed and modified identifier sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    pub added: IdSet,
    pub removed: IdSet,
    pub modified: IdSet,
}

impl SnapshotDiff {
    /// Nothing to highlight; diff mode should be disabled
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Classification of `id`, added taking precedence
    #[must_use]
    pub fn classify(&self, id: &str) -> Option<ChangeClass> {
        if self.added.contains(id) {
            Some(ChangeClass::Added)
        } else if self.removed.contains(id) {
            Some(ChangeClass::Removed)
        } else if self.modified.contains(id) {
            Some(ChangeClass::Modified)
        } else {
            None
        }
    }
}

/// Compare `current` against `baseline`
///
/// Without a baseline every set is empty. Otherwise `added` is
/// `current - baseline` plus both endpoints of `current.change`, and
/// `removed` is `baseline - current`.
#[must_use]
pub fn diff(current: &RelationshipSnapshot, baseline: Option<&RelationshipSnapshot>) -> SnapshotDiff {
    let Some(baseline) = baseline else {
        return SnapshotDiff::default();
    };

    let now = current.related_ids();
    let before = baseline.related_ids();

    let mut added: IdSet = now.difference(&before).cloned().collect();
    let removed: IdSet = before.difference(&now).cloned().collect();

    if let Some(change) = &current.change {
        added.extend(change.source.iter().cloned());
        added.extend(change.target.iter().cloned());
    }

    tracing::debug!(
        current = %current.version_id,
        baseline = %baseline.version_id,
        added = added.len(),
        removed = removed.len(),
        "Diffed snapshots"
    );

    SnapshotDiff {
        added,
        removed,
        modified: IdSet::new(),
    }
}
