//! Testing utilities for the Tracegraph workspace
//!
//! Tree builders, a populated fixture, and [`FakeTraceService`], an
//! in-memory collaborator that records every call.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use trace_client::{ServiceError, ServiceResult, TraceService};
use trace_model::wire::{
    CodeReferenceResponse, CodeReferenceUpdate, ConnectRequest, ConnectResponse, LinkedBlock,
    LinkedRequirement, NodeType, NodeTypeInfo, ParentSummary, TraceabilityLink, TraceabilityLinks,
};
use trace_model::{
    ArtifactId, ArtifactKind, ArtifactNode, ConnectionSets, RelationshipSnapshot, SnapshotChange,
    TreeRecord, VersionList, VersionSummary,
};

/// Requirement record with children
pub fn requirement(id: &str, name: &str, children: Vec<TreeRecord>) -> TreeRecord {
    TreeRecord {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        node_type: Some("Requirement".to_string()),
        children: Some(children),
        ..TreeRecord::default()
    }
}

/// Block record with children
pub fn block(sid: &str, name: &str, children: Vec<TreeRecord>) -> TreeRecord {
    TreeRecord {
        sid: Some(sid.to_string()),
        name: Some(name.to_string()),
        node_type: Some("SubSystem".to_string()),
        children: Some(children),
        ..TreeRecord::default()
    }
}

/// Decorative block that only has a name
pub fn decorative(name: &str) -> TreeRecord {
    TreeRecord {
        name: Some(name.to_string()),
        ..TreeRecord::default()
    }
}

pub fn req_node(id: &str) -> ArtifactNode {
    ArtifactNode::new(id, ArtifactKind::Requirement)
}

pub fn block_node(id: &str) -> ArtifactNode {
    ArtifactNode::new(id, ArtifactKind::Block)
}

pub fn parent(id: &str, filename: &str) -> ParentSummary {
    ParentSummary {
        id: ArtifactId::new(id),
        filename: Some(filename.to_string()),
        block_count: 0,
        created_at: None,
    }
}

pub fn link(requirement: &str, block: &str) -> TraceabilityLink {
    TraceabilityLink {
        requirement: LinkedRequirement {
            id: ArtifactId::new(requirement),
            name: None,
            node_type: Some("Requirement".to_string()),
        },
        block: LinkedBlock {
            sid: ArtifactId::new(block),
            name: None,
            node_type: None,
        },
        relationship: Some("SATISFIES".to_string()),
    }
}

pub fn version(artifact: &str, number: u32) -> VersionSummary {
    VersionSummary {
        version_id: format!("{artifact}_v{number}"),
        artifact_id: Some(ArtifactId::new(artifact)),
        artifact_type: Some("block".to_string()),
        tool: Some("simulink".to_string()),
        timestamp: Some(format!("2025-01-{number:02}T00:00:00")),
        version_number: Some(number),
        parent_version_id: (number > 1).then(|| format!("{artifact}_v{}", number - 1)),
    }
}

pub fn snapshot(artifact: &str, number: u32, outgoing: &[&str]) -> RelationshipSnapshot {
    let mut snap = RelationshipSnapshot::new(artifact, format!("{artifact}_v{number}"))
        .with_connections(ConnectionSets {
            outgoing: outgoing.iter().map(|s| ArtifactId::new(*s)).collect(),
            ..ConnectionSets::default()
        });
    snap.version_number = number;
    snap.is_initial = number == 1;
    snap
}

/// Collaborator operation, used to script failures and inspect calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Requirements,
    Parents,
    Blocks,
    Links,
    NodeType,
    Connect,
    Versions,
    Snapshot,
    CodeReference,
}

#[derive(Default)]
struct FakeState {
    requirements: Vec<TreeRecord>,
    parents: Vec<ParentSummary>,
    blocks: HashMap<String, Vec<TreeRecord>>,
    links: Vec<TraceabilityLink>,
    node_types: HashMap<String, NodeTypeInfo>,
    versions: HashMap<String, Vec<VersionSummary>>,
    snapshots: HashMap<String, RelationshipSnapshot>,
    connect_response: Option<ConnectResponse>,
    code_reference_response: Option<CodeReferenceResponse>,
    failures: HashMap<Endpoint, String>,
    calls: Vec<(Endpoint, String)>,
}

/// In-memory [`TraceService`]
///
/// Unknown node types and versions answer 404 with the backend's error
/// bodies. A scripted failure answers 500 with the scripted reason.
#[derive(Default)]
pub struct FakeTraceService {
    state: Mutex<FakeState>,
    node_type_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeTraceService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_requirements(self, records: Vec<TreeRecord>) -> Self {
        self.state.lock().requirements = records;
        self
    }

    pub fn with_parent(self, summary: ParentSummary) -> Self {
        self.state.lock().parents.push(summary);
        self
    }

    pub fn with_blocks(self, parent: &str, records: Vec<TreeRecord>) -> Self {
        self.set_blocks(parent, records);
        self
    }

    pub fn with_link(self, link: TraceabilityLink) -> Self {
        self.state.lock().links.push(link);
        self
    }

    pub fn with_node_type(self, id: &str, info: NodeTypeInfo) -> Self {
        self.state.lock().node_types.insert(id.to_string(), info);
        self
    }

    pub fn with_versions(self, artifact: &str, versions: Vec<VersionSummary>) -> Self {
        self.state
            .lock()
            .versions
            .insert(artifact.to_string(), versions);
        self
    }

    pub fn with_snapshot(self, snapshot: RelationshipSnapshot) -> Self {
        self.state
            .lock()
            .snapshots
            .insert(snapshot.version_id.clone(), snapshot);
        self
    }

    pub fn with_connect_response(self, response: ConnectResponse) -> Self {
        self.state.lock().connect_response = Some(response);
        self
    }

    pub fn with_code_reference_response(self, response: CodeReferenceResponse) -> Self {
        self.state.lock().code_reference_response = Some(response);
        self
    }

    pub fn failing(self, endpoint: Endpoint, reason: &str) -> Self {
        self.fail(endpoint, reason);
        self
    }

    /// Script a failure at runtime
    pub fn fail(&self, endpoint: Endpoint, reason: &str) {
        self.state
            .lock()
            .failures
            .insert(endpoint, reason.to_string());
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.state.lock().failures.remove(&endpoint);
    }

    pub fn set_blocks(&self, parent: &str, records: Vec<TreeRecord>) {
        self.state.lock().blocks.insert(parent.to_string(), records);
    }

    /// Hold node-type lookups until the returned gate has permits
    ///
    /// Each permit added releases one lookup.
    pub fn gate_node_type(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.node_type_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Every call as `(endpoint, argument)`
    pub fn calls(&self) -> Vec<(Endpoint, String)> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .count()
    }

    /// Arguments of the calls made to `endpoint`
    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .map(|(_, arg)| arg.clone())
            .collect()
    }

    fn record(&self, endpoint: Endpoint, arg: &str) -> ServiceResult<()> {
        let mut state = self.state.lock();
        state.calls.push((endpoint, arg.to_string()));
        match state.failures.get(&endpoint) {
            Some(reason) => Err(ServiceError::rejected(500, reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TraceService for FakeTraceService {
    async fn requirements_hierarchy(&self) -> ServiceResult<Vec<TreeRecord>> {
        self.record(Endpoint::Requirements, "")?;
        Ok(self.state.lock().requirements.clone())
    }

    async fn parents(&self) -> ServiceResult<Vec<ParentSummary>> {
        self.record(Endpoint::Parents, "")?;
        Ok(self.state.lock().parents.clone())
    }

    async fn parent_blocks(&self, parent: &ArtifactId) -> ServiceResult<Vec<TreeRecord>> {
        self.record(Endpoint::Blocks, parent.as_str())?;
        Ok(self
            .state
            .lock()
            .blocks
            .get(parent.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn traceability_links(&self) -> ServiceResult<TraceabilityLinks> {
        self.record(Endpoint::Links, "")?;
        let links = self.state.lock().links.clone();
        Ok(TraceabilityLinks {
            total_links: Some(links.len()),
            links,
        })
    }

    async fn node_type(&self, id: &ArtifactId) -> ServiceResult<NodeTypeInfo> {
        let gate = self.node_type_gate.lock().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.record(Endpoint::NodeType, id.as_str())?;
        self.state
            .lock()
            .node_types
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| ServiceError::rejected(404, "Node not found"))
    }

    async fn connect(&self, request: &ConnectRequest) -> ServiceResult<ConnectResponse> {
        self.record(
            Endpoint::Connect,
            &format!("{}->{}", request.source, request.target),
        )?;
        let scripted = self.state.lock().connect_response.clone();
        Ok(scripted.unwrap_or_else(|| ConnectResponse {
            success: true,
            relationship_type: Some("SATISFIES".to_string()),
            message: Some(format!("Connected {} to {}", request.source, request.target)),
        }))
    }

    async fn artifact_versions(&self, artifact: &ArtifactId) -> ServiceResult<VersionList> {
        self.record(Endpoint::Versions, artifact.as_str())?;
        let versions = self
            .state
            .lock()
            .versions
            .get(artifact.as_str())
            .cloned()
            .unwrap_or_default();
        Ok(VersionList {
            artifact_id: Some(artifact.clone()),
            count: Some(versions.len()),
            versions,
        })
    }

    async fn version_snapshot(&self, version_id: &str) -> ServiceResult<RelationshipSnapshot> {
        self.record(Endpoint::Snapshot, version_id)?;
        self.state
            .lock()
            .snapshots
            .get(version_id)
            .cloned()
            .ok_or_else(|| ServiceError::rejected(404, "Version not found"))
    }

    async fn update_code_reference(
        &self,
        update: &CodeReferenceUpdate,
    ) -> ServiceResult<CodeReferenceResponse> {
        self.record(Endpoint::CodeReference, update.block_sid.as_str())?;
        let scripted = self.state.lock().code_reference_response.clone();
        Ok(scripted.unwrap_or_else(|| CodeReferenceResponse {
            success: true,
            message: Some("Code reference updated".to_string()),
            updated_ref: Some(json!({
                "file": update.file_path,
                "line": update.line,
                "code": update.code,
            })),
        }))
    }
}

/// Populated collaborator
///
/// - requirements `R1 { R2, R3 }`; R1 has children
/// - containers `P1` (blocks `B1 { B2, Scope }`) and `P2` (block `C1`)
/// - link `R2 -> B2`
/// - `B2` versions 1 and 2, with snapshots
pub fn sample_service() -> FakeTraceService {
    FakeTraceService::new()
        .with_requirements(vec![requirement(
            "R1",
            "System shall sense",
            vec![
                requirement("R2", "Sense rate", vec![]),
                requirement("R3", "Sense range", vec![]),
            ],
        )])
        .with_parent(parent("P1", "controller.slx"))
        .with_parent(parent("P2", "plant.slx"))
        .with_blocks(
            "P1",
            vec![block(
                "B1",
                "Controller",
                vec![block("B2", "Gain", vec![]), decorative("Scope")],
            )],
        )
        .with_blocks("P2", vec![block("C1", "Plant", vec![])])
        .with_link(link("R2", "B2"))
        .with_node_type("R1", NodeTypeInfo::of(NodeType::Requirement).with_children(true))
        .with_node_type("R2", NodeTypeInfo::of(NodeType::Requirement))
        .with_node_type("R3", NodeTypeInfo::of(NodeType::Requirement))
        .with_node_type("P1", NodeTypeInfo::of(NodeType::LoadParent))
        .with_node_type("P2", NodeTypeInfo::of(NodeType::LoadParent))
        .with_node_type("B1", NodeTypeInfo::of(NodeType::Block).with_parent("P1"))
        .with_node_type("B2", NodeTypeInfo::of(NodeType::Block).with_parent("P1"))
        .with_node_type("C1", NodeTypeInfo::of(NodeType::Block).with_parent("P2"))
        .with_versions("B2", vec![version("B2", 1), version("B2", 2)])
        .with_snapshot(snapshot("B2", 1, &["B1"]))
        .with_snapshot(
            snapshot("B2", 2, &["R2"]).with_change(SnapshotChange::connection("R2", "B2")),
        )
}
