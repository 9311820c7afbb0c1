//! Collaborator service contract

use crate::error::ServiceResult;
use async_trait::async_trait;
use trace_model::wire::{
    CodeReferenceResponse, CodeReferenceUpdate, ConnectRequest, ConnectResponse, NodeTypeInfo,
    ParentSummary, TraceabilityLinks,
};
use trace_model::{ArtifactId, RelationshipSnapshot, TreeRecord, VersionList};

/// Storage/query service consumed by the session layer
///
/// Read methods are safe to retry. `connect` and `update_code_reference`
/// are the only writes.
#[async_trait]
pub trait TraceService: Send + Sync {
    /// Full requirement forest
    async fn requirements_hierarchy(&self) -> ServiceResult<Vec<TreeRecord>>;

    /// Top-level parent containers
    async fn parents(&self) -> ServiceResult<Vec<ParentSummary>>;

    /// Block forest of one container
    async fn parent_blocks(&self, parent: &ArtifactId) -> ServiceResult<Vec<TreeRecord>>;

    /// Every cross-tool traceability link
    async fn traceability_links(&self) -> ServiceResult<TraceabilityLinks>;

    /// Type lookup used by the connection mediator
    async fn node_type(&self, id: &ArtifactId) -> ServiceResult<NodeTypeInfo>;

    /// Persist a relationship
    async fn connect(&self, request: &ConnectRequest) -> ServiceResult<ConnectResponse>;

    /// Version history of one artifact
    async fn artifact_versions(&self, artifact: &ArtifactId) -> ServiceResult<VersionList>;

    /// Immutable snapshot of one version
    async fn version_snapshot(&self, version_id: &str) -> ServiceResult<RelationshipSnapshot>;

    /// Edit one generated-code reference of a block
    async fn update_code_reference(
        &self,
        update: &CodeReferenceUpdate,
    ) -> ServiceResult<CodeReferenceResponse>;
}
