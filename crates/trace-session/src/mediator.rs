//! Connection Mediator
//!
//! Decides what a drag-connect gesture means before anything is persisted.
//! Self-loops and pairs already on screen are rejected without an external
//! call. Targets that live inside another container are redirected so the
//! user can pick the exact element in expanded scope. Only an accepted
//! proposal reaches the connection service, and only a successful commit
//! yields edges for the in-memory pools.

use std::fmt;
use trace_client::TraceService;
use trace_graph::ComposedView;
use trace_model::wire::{ConnectRequest, NodeType, NodeTypeInfo};
use trace_model::{ArtifactId, Edge, ViewScope};

/// Why a connection was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    SelfLoop,
    /// The pair is already rendered; the gesture is a no-op
    AlreadyConnected,
    /// The scope changed while the request was in flight
    StaleScope,
    /// The connection service refused or failed
    Service(String),
}

impl RejectReason {
    /// A no-op rather than a failure worth telling the user about
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::SelfLoop | Self::AlreadyConnected | Self::StaleScope)
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfLoop => f.write_str("cannot connect a node to itself"),
            Self::AlreadyConnected => f.write_str("nodes are already connected"),
            Self::StaleScope => f.write_str("view changed before the connection completed"),
            Self::Service(reason) => write!(f, "connection failed: {reason}"),
        }
    }
}

/// Outcome of [`ConnectionMediator::propose`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proposal {
    Accepted,
    /// Expand this container and re-offer the connection there
    Redirected(ArtifactId),
    Rejected(RejectReason),
}

/// Edges to add after the connection service persisted a relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedConnection {
    pub manual: Edge,
    pub traceability: Edge,
    pub relationship: String,
}

impl CommittedConnection {
    /// Both edges, manual first
    #[must_use]
    pub fn into_edges(self) -> [Edge; 2] {
        [self.manual, self.traceability]
    }
}

/// Stateless connection policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionMediator {
    default_relationship: String,
}

impl Default for ConnectionMediator {
    fn default() -> Self {
        Self::new(trace_model::wire::DEFAULT_RELATIONSHIP)
    }
}

impl ConnectionMediator {
    #[must_use]
    pub fn new(default_relationship: impl Into<String>) -> Self {
        Self {
            default_relationship: default_relationship.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn default_relationship(&self) -> &str {
        &self.default_relationship
    }

    /// Checks that need no external call
    #[must_use]
    pub fn precheck(source: &str, target: &str, view: &ComposedView) -> Option<RejectReason> {
        if source == target {
            Some(RejectReason::SelfLoop)
        } else if view.has_pair(source, target) {
            Some(RejectReason::AlreadyConnected)
        } else {
            None
        }
    }

    /// Classify a proposed connection
    ///
    /// Node-type lookups that fail are treated as an unknown type, which
    /// never redirects.
    pub async fn propose(
        &self,
        service: &dyn TraceService,
        source: &ArtifactId,
        target: &ArtifactId,
        scope: &ViewScope,
        view: &ComposedView,
    ) -> Proposal {
        if let Some(reason) = Self::precheck(source.as_str(), target.as_str(), view) {
            tracing::debug!(%source, %target, %reason, "Connection rejected before lookup");
            return Proposal::Rejected(reason);
        }

        let Some(target_info) = lookup(service, target).await else {
            return Proposal::Accepted;
        };
        let Some(container) = redirect_container(target, &target_info, scope) else {
            return Proposal::Accepted;
        };

        match lookup(service, source).await {
            Some(info) if info.is_cross_referenceable_parent() => {
                tracing::info!(%source, %target, %container, "Connection redirected to container");
                Proposal::Redirected(container)
            }
            _ => Proposal::Accepted,
        }
    }

    /// Persist an accepted connection
    ///
    /// # Errors
    ///
    /// Returns [`RejectReason::Service`] when the service fails or answers
    /// `success: false`; no edges are produced in that case.
    pub async fn commit(
        &self,
        service: &dyn TraceService,
        source: &ArtifactId,
        target: &ArtifactId,
    ) -> Result<CommittedConnection, RejectReason> {
        let request = ConnectRequest {
            source: source.clone(),
            target: target.clone(),
        };
        let response = match service.connect(&request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(%source, %target, error = %err, "Connection service failed");
                return Err(RejectReason::Service(err.user_reason()));
            }
        };
        if !response.success {
            let reason = response
                .message
                .unwrap_or_else(|| "connection was not created".to_string());
            tracing::error!(%source, %target, %reason, "Connection service refused");
            return Err(RejectReason::Service(reason));
        }

        let relationship = response
            .relationship_type
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| self.default_relationship.clone());
        tracing::info!(%source, %target, %relationship, "Connection committed");
        Ok(CommittedConnection {
            manual: Edge::manual(source.clone(), target.clone()),
            traceability: Edge::traceability(source.clone(), target.clone(), relationship.clone()),
            relationship,
        })
    }
}

async fn lookup(service: &dyn TraceService, id: &ArtifactId) -> Option<NodeTypeInfo> {
    match service.node_type(id).await {
        Ok(info) => Some(info),
        Err(err) => {
            tracing::debug!(%id, error = %err, "Node type lookup failed; treating as unknown");
            None
        }
    }
}

/// Container a target must be reached through from `scope`, if any
fn redirect_container(
    target: &ArtifactId,
    info: &NodeTypeInfo,
    scope: &ViewScope,
) -> Option<ArtifactId> {
    match info.node_type {
        NodeType::LoadParent if scope.is_collapsed() => Some(target.clone()),
        NodeType::Block => info
            .parent_id
            .as_ref()
            .filter(|parent| scope.container() != Some(*parent))
            .cloned(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trace_graph::{CollaboratorData, ViewComposer};
    use trace_model::wire::ConnectResponse;
    use trace_test_utils::{sample_service, Endpoint, FakeTraceService};

    fn view(scope: &ViewScope, edges: Vec<Edge>) -> ComposedView {
        let mut data = CollaboratorData::new();
        for edge in edges {
            data.add_edge(edge);
        }
        let view = ViewComposer::default().compose(scope, &data).unwrap();
        (*view).clone()
    }

    fn id(s: &str) -> ArtifactId {
        ArtifactId::new(s)
    }

    #[tokio::test]
    async fn self_loop_makes_no_call() {
        let svc = sample_service();
        let mediator = ConnectionMediator::default();
        let scope = ViewScope::Collapsed;

        let proposal = mediator
            .propose(&svc, &id("A"), &id("A"), &scope, &view(&scope, vec![]))
            .await;

        assert_eq!(proposal, Proposal::Rejected(RejectReason::SelfLoop));
        assert!(svc.calls().is_empty());
    }

    #[tokio::test]
    async fn rendered_pair_is_already_connected() {
        let svc = sample_service();
        let scope = ViewScope::Collapsed;
        let rendered = view(&scope, vec![Edge::traceability("R2", "B2", "SATISFIES")]);

        let proposal = ConnectionMediator::default()
            .propose(&svc, &id("R2"), &id("B2"), &scope, &rendered)
            .await;

        assert_eq!(proposal, Proposal::Rejected(RejectReason::AlreadyConnected));
        assert!(svc.calls().is_empty());
    }

    #[tokio::test]
    async fn container_target_redirects_in_collapsed_scope() {
        let svc = sample_service();
        let scope = ViewScope::Collapsed;

        let proposal = ConnectionMediator::default()
            .propose(&svc, &id("R1"), &id("P1"), &scope, &view(&scope, vec![]))
            .await;

        assert_eq!(proposal, Proposal::Redirected(id("P1")));
        assert_eq!(svc.call_count(Endpoint::Connect), 0);
    }

    #[tokio::test]
    async fn container_target_accepted_once_expanded() {
        let svc = sample_service();
        let scope = ViewScope::expanded("P1");

        let proposal = ConnectionMediator::default()
            .propose(&svc, &id("R1"), &id("P1"), &scope, &view(&scope, vec![]))
            .await;

        assert_eq!(proposal, Proposal::Accepted);
    }

    #[tokio::test]
    async fn sub_element_redirects_to_its_parent() {
        let svc = sample_service();
        let mediator = ConnectionMediator::default();

        let collapsed = ViewScope::Collapsed;
        let proposal = mediator
            .propose(&svc, &id("R1"), &id("B2"), &collapsed, &view(&collapsed, vec![]))
            .await;
        assert_eq!(proposal, Proposal::Redirected(id("P1")));

        let other = ViewScope::expanded("P2");
        let proposal = mediator
            .propose(&svc, &id("R1"), &id("B2"), &other, &view(&other, vec![]))
            .await;
        assert_eq!(proposal, Proposal::Redirected(id("P1")));

        let own = ViewScope::expanded("P1");
        let proposal = mediator
            .propose(&svc, &id("R1"), &id("B2"), &own, &view(&own, vec![]))
            .await;
        assert_eq!(proposal, Proposal::Accepted);
    }

    #[tokio::test]
    async fn leaf_requirement_is_not_redirected() {
        let svc = sample_service();
        let scope = ViewScope::Collapsed;

        let proposal = ConnectionMediator::default()
            .propose(&svc, &id("R2"), &id("P1"), &scope, &view(&scope, vec![]))
            .await;

        assert_eq!(proposal, Proposal::Accepted);
    }

    #[tokio::test]
    async fn failed_lookup_counts_as_unknown() {
        let svc = sample_service().failing(Endpoint::NodeType, "lookup down");
        let scope = ViewScope::Collapsed;

        let proposal = ConnectionMediator::default()
            .propose(&svc, &id("R1"), &id("P1"), &scope, &view(&scope, vec![]))
            .await;

        assert_eq!(proposal, Proposal::Accepted);
    }

    #[tokio::test]
    async fn commit_yields_manual_and_traceability_edges() {
        let svc = FakeTraceService::new().with_connect_response(ConnectResponse {
            success: true,
            relationship_type: None,
            message: None,
        });

        let committed = ConnectionMediator::new("IMPLEMENTS")
            .commit(&svc, &id("R1"), &id("B2"))
            .await
            .unwrap();

        assert_eq!(committed.relationship, "IMPLEMENTS");
        let [manual, trace] = committed.into_edges();
        assert_eq!(manual.id.as_str(), "manual-R1-B2");
        assert_eq!(trace.id.as_str(), "trace-R1-B2");
        assert_eq!(trace.label.as_deref(), Some("IMPLEMENTS"));
        assert_eq!(svc.calls_to(Endpoint::Connect), vec!["R1->B2"]);
    }

    #[tokio::test]
    async fn commit_failure_carries_server_reason() {
        let svc = FakeTraceService::new().failing(Endpoint::Connect, "incompatible types");

        let err = ConnectionMediator::default()
            .commit(&svc, &id("R1"), &id("B2"))
            .await
            .unwrap_err();

        assert_eq!(err, RejectReason::Service("incompatible types".to_string()));
        assert!(!err.is_silent());
    }

    #[tokio::test]
    async fn unsuccessful_response_is_rejected() {
        let svc = FakeTraceService::new().with_connect_response(ConnectResponse {
            success: false,
            relationship_type: None,
            message: Some("duplicate relationship".to_string()),
        });

        let err = ConnectionMediator::default()
            .commit(&svc, &id("R1"), &id("B2"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "connection failed: duplicate relationship");
    }
}
