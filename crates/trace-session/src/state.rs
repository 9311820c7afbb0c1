//! Explicit UI state machine
//!
//! [`ViewState`] holds everything the presentation layer reads: scope,
//! selection, impact highlight, pending connection source, diff highlight
//! and the current notification. It only changes through [`transition`].

use serde::Serialize;
use trace_graph::{descendants, ChangeClass, SnapshotDiff};
use trace_model::{ArtifactId, Edge, IdSet, ViewScope};

/// Severity of a user notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Blocking message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Discrete input to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Node clicked; highlights everything downstream
    SelectNode(ArtifactId),
    ClearSelection,
    /// Drag-connect started from a node
    BeginConnect(ArtifactId),
    CancelConnect,
    /// Switch to one container's block tree
    Expand(ArtifactId),
    Collapse,
    DiffLoaded(SnapshotDiff),
    DiffCleared,
    Notify(Notification),
    DismissNotification,
}

/// Read-only view of the interaction state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    scope: ViewScope,
    scope_version: u64,
    selected: Option<ArtifactId>,
    highlighted: IdSet,
    pending_source: Option<ArtifactId>,
    diff: Option<SnapshotDiff>,
    notification: Option<Notification>,
}

impl ViewState {
    #[inline]
    #[must_use]
    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Incremented on every scope change
    #[inline]
    #[must_use]
    pub fn scope_version(&self) -> u64 {
        self.scope_version
    }

    #[inline]
    #[must_use]
    pub fn selected(&self) -> Option<&ArtifactId> {
        self.selected.as_ref()
    }

    /// Impact set of the selected node
    #[inline]
    #[must_use]
    pub fn highlighted(&self) -> &IdSet {
        &self.highlighted
    }

    #[inline]
    #[must_use]
    pub fn pending_source(&self) -> Option<&ArtifactId> {
        self.pending_source.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn diff(&self) -> Option<&SnapshotDiff> {
        self.diff.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_diff_mode(&self) -> bool {
        self.diff.is_some()
    }

    /// Diff classification used for node styling
    #[must_use]
    pub fn change_class(&self, id: &str) -> Option<ChangeClass> {
        self.diff.as_ref().and_then(|d| d.classify(id))
    }

    #[inline]
    #[must_use]
    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    fn enter_scope(&mut self, scope: ViewScope) {
        self.scope = scope;
        self.scope_version += 1;
        self.selected = None;
        self.highlighted.clear();
    }
}

/// Apply one event
///
/// `edges` are the currently rendered edges; only selection reads them.
/// Expanding keeps the pending connection source so a redirected
/// connection can be finished inside the container. Collapsing drops it.
#[must_use]
pub fn transition(mut state: ViewState, event: Event, edges: &[Edge]) -> ViewState {
    match event {
        Event::SelectNode(id) => {
            state.highlighted = descendants(id.as_str(), edges);
            state.selected = Some(id);
        }
        Event::ClearSelection => {
            state.selected = None;
            state.highlighted.clear();
        }
        Event::BeginConnect(id) => state.pending_source = Some(id),
        Event::CancelConnect => state.pending_source = None,
        Event::Expand(container) => {
            if state.scope.container() != Some(&container) {
                state.enter_scope(ViewScope::Expanded { container });
            }
        }
        Event::Collapse => {
            if !state.scope.is_collapsed() {
                state.enter_scope(ViewScope::Collapsed);
                state.pending_source = None;
            }
        }
        Event::DiffLoaded(diff) => state.diff = (!diff.is_empty()).then_some(diff),
        Event::DiffCleared => state.diff = None,
        Event::Notify(notification) => state.notification = Some(notification),
        Event::DismissNotification => state.notification = None,
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edges() -> Vec<Edge> {
        vec![
            Edge::structural("R1", "R2"),
            Edge::traceability("R2", "B1", "SATISFIES"),
        ]
    }

    fn apply(state: ViewState, events: Vec<Event>) -> ViewState {
        events
            .into_iter()
            .fold(state, |s, e| transition(s, e, &edges()))
    }

    #[test]
    fn selecting_highlights_downstream() {
        let state = apply(ViewState::default(), vec![Event::SelectNode("R1".into())]);

        assert_eq!(state.selected().map(ArtifactId::as_str), Some("R1"));
        let ids: Vec<_> = state.highlighted().iter().map(ArtifactId::as_str).collect();
        assert_eq!(ids, vec!["B1", "R2"]);

        let cleared = apply(state, vec![Event::ClearSelection]);
        assert!(cleared.highlighted().is_empty());
        assert!(cleared.selected().is_none());
    }

    #[test]
    fn scope_changes_bump_version() {
        let state = apply(
            ViewState::default(),
            vec![
                Event::SelectNode("R1".into()),
                Event::Expand("P1".into()),
            ],
        );
        assert_eq!(state.scope(), &ViewScope::expanded("P1"));
        assert_eq!(state.scope_version(), 1);
        assert!(state.highlighted().is_empty());

        let same = apply(state.clone(), vec![Event::Expand("P1".into())]);
        assert_eq!(same.scope_version(), 1);

        let other = apply(state, vec![Event::Expand("P2".into()), Event::Collapse]);
        assert_eq!(other.scope_version(), 3);
        assert!(other.scope().is_collapsed());
    }

    #[test]
    fn collapse_when_collapsed_is_noop() {
        let state = apply(ViewState::default(), vec![Event::Collapse]);
        assert_eq!(state, ViewState::default());
    }

    #[test]
    fn pending_source_survives_expand_not_collapse() {
        let state = apply(
            ViewState::default(),
            vec![Event::BeginConnect("R1".into()), Event::Expand("P1".into())],
        );
        assert_eq!(state.pending_source().map(ArtifactId::as_str), Some("R1"));

        let state = apply(state, vec![Event::Collapse]);
        assert!(state.pending_source().is_none());
    }

    #[test]
    fn empty_diff_disables_diff_mode() {
        let mut diff = SnapshotDiff::default();
        let state = apply(ViewState::default(), vec![Event::DiffLoaded(diff.clone())]);
        assert!(!state.is_diff_mode());

        diff.added.insert("B1".into());
        let state = apply(state, vec![Event::DiffLoaded(diff)]);
        assert!(state.is_diff_mode());
        assert_eq!(state.change_class("B1"), Some(ChangeClass::Added));

        let state = apply(state, vec![Event::DiffCleared]);
        assert!(state.change_class("B1").is_none());
    }

    #[test]
    fn notifications_are_dismissable() {
        let state = apply(
            ViewState::default(),
            vec![Event::Notify(Notification::error("Connection failed"))],
        );
        assert_eq!(
            state.notification().map(|n| n.level),
            Some(NotificationLevel::Error)
        );
        let state = apply(state, vec![Event::DismissNotification]);
        assert!(state.notification().is_none());
    }
}
