use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use trace_client::{ClientConfig, HttpTraceService, ServiceError, TraceService};
use trace_model::wire::{CodeReferenceUpdate, ConnectRequest, NodeType};
use trace_model::{ArtifactId, ArtifactKind, ArtifactNode, EdgeCategory};
use warp::http::StatusCode;
use warp::Filter;

fn service_for(addr: std::net::SocketAddr) -> HttpTraceService {
    let config = ClientConfig::default()
        .with_base_url(format!("http://{addr}/api"))
        .with_timeout(Duration::from_secs(5));
    HttpTraceService::new(&config).unwrap()
}

/// Fake backend serving the collaborator routes
async fn fake_backend() -> HttpTraceService {
    let hierarchy = warp::path!("api" / "requirements" / "hierarchy").map(|| {
        warp::reply::json(&json!([{
            "id": "R1", "name": "Top", "type": "Requirement",
            "outgoing": [{"id": "R2", "name": "Child", "type": "TRACES_TO"}],
            "children": [{"id": "R2", "name": "Child", "type": "Requirement", "children": []}]
        }]))
    });
    let parents = warp::path!("api" / "parents").map(|| {
        warp::reply::json(&json!([{"id": "P1", "filename": "model.slx", "block_count": 3}]))
    });
    let blocks = warp::path!("api" / "parents" / String / "blocks").map(|parent: String| {
        warp::reply::json(&json!([{
            "sid": 5, "name": format!("{parent}-Gain"), "type": "Gain",
            "generated_code": [{"file": "model.c", "line": 10}],
            "children": [{"sid": "6", "name": "Scope", "children": null}]
        }]))
    });
    let links = warp::path!("api" / "traceability" / "links").map(|| {
        warp::reply::json(&json!({
            "total_links": 1,
            "links": [{
                "requirement": {"id": "R1", "name": "Top", "type": "Requirement"},
                "block": {"sid": "5", "name": "Gain", "type": "Gain"},
                "relationship": "SATISFIES"
            }]
        }))
    });
    let node_type = warp::path!("api" / "node-type" / String).map(|id: String| {
        let (body, status) = match id.as_str() {
            "R1" => (
                json!({"type": "Requirement", "id": "R1", "has_children": true}),
                StatusCode::OK,
            ),
            "5" => (json!({"type": "Block", "id": "5", "parent_id": "P1"}), StatusCode::OK),
            _ => (json!({"error": "Node not found"}), StatusCode::NOT_FOUND),
        };
        warp::reply::with_status(warp::reply::json(&body), status)
    });
    let connect = warp::post()
        .and(warp::path!("api" / "connect"))
        .and(warp::body::json())
        .map(|req: Value| {
            if req["target"] == "BAD" {
                warp::reply::with_status(
                    warp::reply::json(&json!({
                        "error": "Could not create connection - nodes not found or incompatible types"
                    })),
                    StatusCode::NOT_FOUND,
                )
            } else {
                warp::reply::with_status(
                    warp::reply::json(&json!({
                        "success": true,
                        "message": format!("Connected {} to {}", req["source"], req["target"]),
                        "relationship_type": "SATISFIES"
                    })),
                    StatusCode::OK,
                )
            }
        });
    let versions = warp::path!("api" / "artifacts" / String / "versions").map(|id: String| {
        warp::reply::json(&json!({
            "artifact_id": id,
            "versions": [
                {"version_id": format!("{id}_v2"), "version_number": 2, "artifact_type": "block",
                 "tool": "simulink", "timestamp": "2025-01-02T00:00:00.000001",
                 "parent_version_id": format!("{id}_v1")},
                {"version_id": format!("{id}_v1"), "version_number": 1, "artifact_type": "block",
                 "tool": "simulink", "timestamp": "2025-01-01T00:00:00"}
            ],
            "count": 2
        }))
    });
    let snapshot = warp::path!("api" / "versions" / String / "snapshot").map(|id: String| {
        warp::reply::json(&json!({
            "version_id": id,
            "artifact_id": "5",
            "artifact_type": "block",
            "version_number": 2,
            "is_initial": false,
            "timestamp": "2025-01-02T00:00:00",
            "snapshot": {
                "connections": {"outgoing": ["6"], "incoming": [], "satisfies": ["R1"]},
                "change": {"type": "connection_added", "source": "5", "target": "R1"}
            }
        }))
    });
    let code_ref = warp::post()
        .and(warp::path!("api" / "code-references" / "update"))
        .and(warp::body::json())
        .map(|req: Value| {
            warp::reply::json(&json!({
                "success": true,
                "message": "Code reference updated",
                "updated_ref": {"file": req["file_path"], "line": req["line"], "code": req["code"]}
            }))
        });

    let routes = hierarchy
        .or(parents)
        .or(blocks)
        .or(links)
        .or(node_type)
        .or(connect)
        .or(versions)
        .or(snapshot)
        .or(code_ref);
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    service_for(addr)
}

/// Backend answering every route with a plain-text 502
async fn broken_backend() -> HttpTraceService {
    let routes = warp::any().map(|| warp::reply::with_status("upstream down", StatusCode::BAD_GATEWAY));
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    service_for(addr)
}

#[tokio::test]
async fn reads_decode_wire_shapes() {
    let svc = fake_backend().await;

    let requirements = ArtifactNode::forest(
        svc.requirements_hierarchy().await.unwrap(),
        ArtifactKind::Requirement,
    );
    assert_eq!(requirements[0].resolved_id(), Some("R1"));
    assert_eq!(requirements[0].children[0].resolved_id(), Some("R2"));
    assert!(requirements[0].attributes.contains_key("outgoing"));

    let parents = svc.parents().await.unwrap();
    assert_eq!(parents[0].filename.as_deref(), Some("model.slx"));
    assert_eq!(parents[0].block_count, 3);

    let blocks = ArtifactNode::forest(
        svc.parent_blocks(&ArtifactId::new("P1")).await.unwrap(),
        ArtifactKind::Block,
    );
    assert_eq!(blocks[0].resolved_id(), Some("5"));
    assert_eq!(blocks[0].label(), "P1-Gain");
    assert!(blocks[0].attributes.contains_key("generated_code"));

    let links = svc.traceability_links().await.unwrap();
    assert_eq!(links.total_links, Some(1));
    let edge = links.links[0].to_edge();
    assert_eq!(edge.category, EdgeCategory::Traceability);
    assert_eq!(edge.id.as_str(), "trace-R1-5");
}

#[tokio::test]
async fn node_type_lookup_and_not_found() {
    let svc = fake_backend().await;

    let req = svc.node_type(&ArtifactId::new("R1")).await.unwrap();
    assert!(req.is_cross_referenceable_parent());

    let block = svc.node_type(&ArtifactId::new("5")).await.unwrap();
    assert_eq!(block.node_type, NodeType::Block);
    assert_eq!(block.parent_id.map(ArtifactId::into_inner).as_deref(), Some("P1"));

    match svc.node_type(&ArtifactId::new("nope")).await.unwrap_err() {
        ServiceError::Rejected { status, reason } => {
            assert_eq!(status, 404);
            assert_eq!(reason, "Node not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn connect_success_and_rejection() {
    let svc = fake_backend().await;

    let ok = svc
        .connect(&ConnectRequest {
            source: ArtifactId::new("R1"),
            target: ArtifactId::new("5"),
        })
        .await
        .unwrap();
    assert!(ok.success);
    assert_eq!(ok.relationship_type.as_deref(), Some("SATISFIES"));

    let err = svc
        .connect(&ConnectRequest {
            source: ArtifactId::new("R1"),
            target: ArtifactId::new("BAD"),
        })
        .await
        .unwrap_err();
    assert!(err.user_reason().starts_with("Could not create connection"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn versions_and_snapshot() {
    let svc = fake_backend().await;

    let list = svc.artifact_versions(&ArtifactId::new("5")).await.unwrap();
    assert_eq!(list.count, Some(2));
    assert_eq!(list.versions[0].version_id, "5_v2");
    assert_eq!(list.versions[0].artifact_type.as_deref(), Some("block"));
    assert!(list.versions[1].parsed_timestamp().is_some());

    let snap = svc.version_snapshot("5_v2").await.unwrap();
    assert_eq!(snap.version_id, "5_v2");
    assert!(snap.connections.satisfies.contains("R1"));
    let change = snap.change.unwrap();
    assert_eq!(change.target.map(ArtifactId::into_inner).as_deref(), Some("R1"));
}

#[tokio::test]
async fn code_reference_update_round_trip() {
    let svc = fake_backend().await;
    let response = svc
        .update_code_reference(&CodeReferenceUpdate {
            block_sid: ArtifactId::new("5"),
            block_path: "<Root>/Gain".to_string(),
            file_path: "model.c".to_string(),
            ref_index: 0,
            line: Some(12),
            code: Some("y = 2 * u;".to_string()),
        })
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.updated_ref.unwrap()["line"], 12);
}

#[tokio::test]
async fn plain_text_failure_is_status_error() {
    let svc = broken_backend().await;
    match svc.parents().await.unwrap_err() {
        ServiceError::Status { status, reason } => {
            assert_eq!(status, 502);
            assert_eq!(reason, "upstream down");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn refused_connection_is_transport_error() {
    let config = ClientConfig::default()
        .with_base_url("http://127.0.0.1:9/api")
        .with_timeout(Duration::from_secs(2));
    let svc = HttpTraceService::new(&config).unwrap();

    let err = svc.parents().await.unwrap_err();
    assert!(matches!(err, ServiceError::Transport(_)));
}
