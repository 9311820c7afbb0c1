//! Session controller
//!
//! [`Session`] owns the collaborator data, the view composer and the
//! [`ViewState`] behind one mutex. Every mutation happens inside a short
//! synchronous critical section; the lock is never held across an await,
//! so service calls only suspend the operation that issued them.
//!
//! Scope-dependent operations capture the scope version before awaiting.
//! With `drop_stale_responses` set, a response that arrives after the
//! scope moved on is discarded and logged.

use crate::cache::TreeCache;
use crate::config::TraceConfig;
use crate::error::{SessionError, SessionResult};
use crate::mediator::{ConnectionMediator, Proposal, RejectReason};
use crate::state::{transition, Event, Notification, ViewState};
use crate::timeline::VersionTimeline;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use trace_client::{HttpTraceService, ServiceResult, SnapshotCache, TraceService};
use trace_graph::{
    diff, extract_hierarchy_edges, CollaboratorData, ComposedView, GraphResult, SnapshotDiff,
    ViewComposer,
};
use trace_model::wire::{CodeReferenceResponse, CodeReferenceUpdate, TraceabilityLink};
use trace_model::{ArtifactId, ArtifactKind, ArtifactNode, Edge};

struct Inner {
    data: CollaboratorData,
    composer: ViewComposer,
    state: ViewState,
}

impl Inner {
    fn compose(&mut self) -> GraphResult<Arc<ComposedView>> {
        self.composer.compose(self.state.scope(), &self.data)
    }

    /// Run one event through the state machine
    ///
    /// Selection needs the rendered edges, so only it composes.
    fn apply(&mut self, event: Event) -> GraphResult<()> {
        let view = match event {
            Event::SelectNode(_) => Some(self.compose()?),
            _ => None,
        };
        let edges = view.as_deref().map_or(&[][..], |v| v.edges.as_slice());
        let state = std::mem::take(&mut self.state);
        self.state = transition(state, event, edges);
        Ok(())
    }
}

/// Single-writer traceability session
pub struct Session {
    config: TraceConfig,
    service: Arc<dyn TraceService>,
    mediator: ConnectionMediator,
    snapshots: SnapshotCache,
    tree_cache: Option<TreeCache>,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.config.service.base_url)
            .field("scope", self.inner.lock().state.scope())
            .finish_non_exhaustive()
    }
}

impl Session {
    #[must_use]
    pub fn new(config: TraceConfig, service: Arc<dyn TraceService>) -> Self {
        let inner = Inner {
            data: CollaboratorData::new(),
            composer: ViewComposer::new(config.synthesizer()),
            state: ViewState::default(),
        };
        Self {
            mediator: ConnectionMediator::new(config.default_relationship.clone()),
            snapshots: SnapshotCache::new(config.snapshot_cache_capacity),
            tree_cache: config.cache_dir.clone().map(TreeCache::new),
            inner: Mutex::new(inner),
            config,
            service,
        }
    }

    /// Session against the HTTP collaborator at `config.service.base_url`
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Service`] if the client cannot be built.
    pub fn over_http(config: TraceConfig) -> SessionResult<Self> {
        let service = HttpTraceService::new(&config.client_config())?;
        Ok(Self::new(config, Arc::new(service)))
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn tree_cache(&self) -> Option<&TreeCache> {
        self.tree_cache.as_ref()
    }

    /// Snapshot of the interaction state
    #[must_use]
    pub fn state(&self) -> ViewState {
        self.inner.lock().state.clone()
    }

    /// Revision of the collaborator data
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.lock().data.revision()
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        f(&mut self.inner.lock())
    }

    fn is_stale(&self, version: u64, inner: &Inner) -> bool {
        self.config.drop_stale_responses && inner.state.scope_version() != version
    }

    /// Fetch requirements, containers and links, then compose
    ///
    /// Requirements come from the tree cache when it holds them. Failed
    /// reads degrade to empty collections.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Graph`] for a malformed requirement tree.
    pub async fn load(&self) -> SessionResult<Arc<ComposedView>> {
        self.load_with(true).await
    }

    /// Same as [`Session::load`] but bypasses the tree cache
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Graph`] for a malformed requirement tree.
    pub async fn refresh(&self) -> SessionResult<Arc<ComposedView>> {
        self.load_with(false).await
    }

    async fn load_with(&self, use_cache: bool) -> SessionResult<Arc<ComposedView>> {
        let requirements = self.fetch_requirements(use_cache).await;
        let hierarchy = extract_hierarchy_edges(&requirements, self.config.max_tree_depth)?;
        let (parents, links) = futures::join!(
            read_or_empty("parents", self.service.parents()),
            read_or_empty("traceability links", self.service.traceability_links())
        );
        let traceability: Vec<Edge> = links.links.iter().map(TraceabilityLink::to_edge).collect();

        tracing::info!(
            requirements = requirements.len(),
            parents = parents.len(),
            links = traceability.len(),
            hierarchy = hierarchy.len(),
            "Loaded collaborator data"
        );
        self.with_inner(|inner| {
            inner.data.set_requirements(requirements);
            inner.data.set_parents(parents);
            inner.data.set_traceability(traceability);
            inner.data.set_hierarchy(hierarchy);
            Ok(inner.compose()?)
        })
    }

    async fn fetch_requirements(&self, use_cache: bool) -> Vec<ArtifactNode> {
        if let (true, Some(cache)) = (use_cache, &self.tree_cache) {
            if let Some(roots) = cache.requirements().await {
                tracing::debug!(roots = roots.len(), "Requirements seeded from tree cache");
                return roots;
            }
        }
        match self.service.requirements_hierarchy().await {
            Ok(records) => {
                let roots = ArtifactNode::forest(records, ArtifactKind::Requirement);
                if let Some(cache) = &self.tree_cache {
                    if let Err(err) = cache.store_requirements(&roots).await {
                        tracing::warn!(error = %err, "Could not store requirements in tree cache");
                    }
                }
                roots
            }
            Err(err) => {
                tracing::warn!(source = "requirements", error = %err, "Read failed; degrading to empty");
                Vec::new()
            }
        }
    }

    async fn fetch_blocks(&self, container: &ArtifactId, use_cache: bool) -> Vec<ArtifactNode> {
        if let (true, Some(cache)) = (use_cache, &self.tree_cache) {
            if let Some(roots) = cache.blocks(container.as_str()).await {
                tracing::debug!(%container, roots = roots.len(), "Blocks seeded from tree cache");
                return roots;
            }
        }
        match self.service.parent_blocks(container).await {
            Ok(records) => {
                let roots = ArtifactNode::forest(records, ArtifactKind::Block);
                if let Some(cache) = &self.tree_cache {
                    if let Err(err) = cache.store_blocks(container, &roots).await {
                        tracing::warn!(error = %err, "Could not store blocks in tree cache");
                    }
                }
                roots
            }
            Err(err) => {
                tracing::warn!(source = "blocks", %container, error = %err, "Read failed; degrading to empty");
                Vec::new()
            }
        }
    }

    /// Current view, recomposed only when its inputs changed
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Graph`] for a malformed tree.
    pub fn view(&self) -> SessionResult<Arc<ComposedView>> {
        self.with_inner(|inner| Ok(inner.compose()?))
    }

    /// Switch to a container's block tree
    ///
    /// The scope changes at once; the blocks follow when fetched.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::StaleScope`] if the scope moved on while the
    /// blocks were fetched, or [`SessionError::Graph`] for a malformed tree.
    pub async fn expand(&self, container: impl Into<ArtifactId>) -> SessionResult<Arc<ComposedView>> {
        let container = container.into();
        let version = self.with_inner(|inner| -> SessionResult<u64> {
            inner.apply(Event::Expand(container.clone()))?;
            Ok(inner.state.scope_version())
        })?;

        let roots = self.fetch_blocks(&container, true).await;

        self.with_inner(|inner| {
            if self.is_stale(version, inner) {
                tracing::warn!(%container, "Dropping block tree for a scope no longer shown");
                return Err(SessionError::StaleScope);
            }
            inner.data.set_blocks(container, roots);
            Ok(inner.compose()?)
        })
    }

    /// Return to the container overview
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Graph`] for a malformed tree.
    pub fn collapse(&self) -> SessionResult<Arc<ComposedView>> {
        self.with_inner(|inner| {
            inner.apply(Event::Collapse)?;
            Ok(inner.compose()?)
        })
    }

    /// Select a node and highlight its impact set
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Graph`] for a malformed tree.
    pub fn select(&self, id: impl Into<ArtifactId>) -> SessionResult<ViewState> {
        self.dispatch(Event::SelectNode(id.into()))
    }

    /// Apply an event that needs no collaborator call
    ///
    /// Scope changes should go through [`Session::expand`] and
    /// [`Session::collapse`] so the block tree is fetched.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Graph`] when a selection cannot compose.
    pub fn dispatch(&self, event: Event) -> SessionResult<ViewState> {
        self.with_inner(|inner| {
            inner.apply(event)?;
            Ok(inner.state.clone())
        })
    }

    fn notify(&self, notification: Notification) {
        self.with_inner(|inner| {
            let state = std::mem::take(&mut inner.state);
            inner.state = transition(state, Event::Notify(notification), &[]);
        });
    }

    /// Propose and, when accepted, persist a connection
    ///
    /// A redirection expands the container and keeps `source` pending so
    /// the caller can re-offer the connection to a specific element. Only a
    /// successful commit adds the manual and traceability edges. Service
    /// failures raise an error notification.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when composing or expanding fails. Refused
    /// connections are an `Ok(Proposal::Rejected(_))`.
    pub async fn connect(
        &self,
        source: impl Into<ArtifactId>,
        target: impl Into<ArtifactId>,
    ) -> SessionResult<Proposal> {
        let source = source.into();
        let target = target.into();
        let (version, scope, view) = self.with_inner(|inner| -> SessionResult<_> {
            inner.apply(Event::BeginConnect(source.clone()))?;
            Ok((
                inner.state.scope_version(),
                inner.state.scope().clone(),
                inner.compose()?,
            ))
        })?;

        let proposal = self
            .mediator
            .propose(self.service.as_ref(), &source, &target, &scope, &view)
            .await;

        let stale = self.with_inner(|inner| -> SessionResult<bool> {
            if !self.is_stale(version, inner) {
                return Ok(false);
            }
            if inner.state.pending_source() == Some(&source) {
                inner.apply(Event::CancelConnect)?;
            }
            Ok(true)
        })?;
        if stale {
            tracing::warn!(%source, %target, "Dropping connection proposal for a scope no longer shown");
            return Ok(Proposal::Rejected(RejectReason::StaleScope));
        }

        match proposal {
            Proposal::Rejected(reason) => {
                self.with_inner(|inner| inner.apply(Event::CancelConnect))?;
                Ok(Proposal::Rejected(reason))
            }
            Proposal::Redirected(container) => {
                self.expand(container.clone()).await?;
                Ok(Proposal::Redirected(container))
            }
            Proposal::Accepted => {
                let committed = self
                    .mediator
                    .commit(self.service.as_ref(), &source, &target)
                    .await;
                self.with_inner(|inner| -> SessionResult<Proposal> {
                    inner.apply(Event::CancelConnect)?;
                    match committed {
                        Ok(committed) => {
                            for edge in committed.into_edges() {
                                inner.data.add_edge(edge);
                            }
                            Ok(Proposal::Accepted)
                        }
                        Err(reason) => {
                            inner.apply(Event::Notify(Notification::error(reason.to_string())))?;
                            Ok(Proposal::Rejected(reason))
                        }
                    }
                })
            }
        }
    }

    /// Versions of an artifact, oldest first
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Service`] if the listing cannot be fetched.
    pub async fn versions(&self, artifact: &ArtifactId) -> SessionResult<VersionTimeline> {
        let list = self.service.artifact_versions(artifact).await?;
        Ok(VersionTimeline::new(list))
    }

    /// Diff a version against an explicit baseline and enter diff mode
    ///
    /// Without a baseline the diff is empty, which leaves diff mode.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Service`] if a snapshot cannot be fetched.
    pub async fn diff(&self, version_id: &str, baseline: Option<&str>) -> SessionResult<SnapshotDiff> {
        let service = self.service.as_ref();
        let current = self.snapshots.get_or_fetch(service, version_id).await?;
        let base = match baseline {
            Some(id) => Some(self.snapshots.get_or_fetch(service, id).await?),
            None => None,
        };

        let result = diff(&current, base.as_deref());
        self.dispatch(Event::DiffLoaded(result.clone()))?;
        Ok(result)
    }

    /// Diff the latest version of `artifact` against its predecessor
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoVersions`] for an artifact without
    /// versions, otherwise as [`Session::diff`].
    pub async fn diff_latest(&self, artifact: &ArtifactId) -> SessionResult<SnapshotDiff> {
        let timeline = self.versions(artifact).await?;
        let latest = timeline
            .latest()
            .ok_or_else(|| SessionError::NoVersions(artifact.clone()))?;
        let baseline = timeline.baseline_of(&latest.version_id);
        self.diff(&latest.version_id, baseline.map(|v| v.version_id.as_str()))
            .await
    }

    /// Update a generated-code reference of a block
    ///
    /// On success the expanded container's block tree is refetched. On
    /// failure a notification carries the server reason and nothing else
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Service`] when the update call fails.
    pub async fn update_code_reference(
        &self,
        update: &CodeReferenceUpdate,
    ) -> SessionResult<CodeReferenceResponse> {
        let response = match self.service.update_code_reference(update).await {
            Ok(response) if response.success => response,
            Ok(response) => {
                let reason = response
                    .message
                    .clone()
                    .unwrap_or_else(|| "code reference was not updated".to_string());
                tracing::error!(block = %update.block_sid, %reason, "Code reference update refused");
                self.notify(Notification::error(reason));
                return Ok(response);
            }
            Err(err) => {
                tracing::error!(block = %update.block_sid, error = %err, "Code reference update failed");
                self.notify(Notification::error(err.user_reason()));
                return Err(err.into());
            }
        };

        let expanded = self.with_inner(|inner| {
            inner
                .state
                .scope()
                .container()
                .cloned()
                .map(|c| (c, inner.state.scope_version()))
        });
        if let Some((container, version)) = expanded {
            let roots = self.fetch_blocks(&container, false).await;
            self.with_inner(|inner| {
                if self.is_stale(version, inner) {
                    tracing::warn!(%container, "Dropping refreshed block tree for a scope no longer shown");
                } else {
                    inner.data.set_blocks(container, roots);
                }
            });
        }
        tracing::info!(block = %update.block_sid, file = %update.file_path, "Code reference updated");
        Ok(response)
    }
}

async fn read_or_empty<T: Default>(
    source: &'static str,
    read: impl Future<Output = ServiceResult<T>>,
) -> T {
    match read.await {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(source, error = %err, "Read failed; degrading to empty");
            T::default()
        }
    }
}
