//! HTTP API tests against an in-process fake graph service.

use antrail::prelude::{GraphServiceClient, PlaybackConfig, ServiceConfig};
use antrail_web::{routes, AppState, WorkerConfig};
use axum::http::header;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;

const GRAPH: &str = r#"{
    "nodes": {
        "A": {"x": 0, "y": 0},
        "B": {"x": 10, "y": 0},
        "C": {"x": 10, "y": 10}
    },
    "edges": [
        {"from": "A", "to": "B", "weight": 2.0},
        {"from": "B", "to": "C", "weight": 3.0, "is_blocked": true}
    ]
}"#;

const OPTIMIZE: &str = r#"{
    "best_path": ["A", "B", "C"],
    "distance": 5.0,
    "iterations": [
        {"iteration": 1, "best_distance": Infinity, "best_path": null,
         "paths": [[["A", "B", "C"], 5.0]], "pheromone_levels": {"('B', 'A')": 4.0}},
        {"iteration": 2, "best_distance": 5.0, "best_path": ["A", "B", "C"],
         "paths": [[["A", "B", "C"], 5.0], [["A", "B"], 2.0]], "pheromone_levels": {}}
    ]
}"#;

async fn bind(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// An optimize run over a graph that no longer has node B.
const OPTIMIZE_ECHOING_GRAPH: &str = r#"{
    "best_path": ["A", "C"],
    "distance": 14.0,
    "iterations": [
        {"iteration": 1, "best_distance": 14.0, "best_path": ["A", "C"],
         "paths": [[["A", "C"], 14.0]], "pheromone_levels": {"('A', 'C')": 2.0}}
    ],
    "graph_edges": [{"from": "A", "to": "C", "weight": 14.0}],
    "node_positions": {"A": {"x": 0, "y": 0}, "C": {"x": 10, "y": 10}}
}"#;

async fn fake_service() -> String {
    fake_service_with(OPTIMIZE).await
}

async fn fake_service_with(optimize: &'static str) -> String {
    let json = [(header::CONTENT_TYPE, "application/json")];
    let app = Router::new()
        .route("/graph", get({ let json = json.clone(); move || async move { (json, GRAPH) } }))
        .route("/optimize", post(move || async move { (json, optimize) }));
    bind(app).await
}

async fn dashboard(service_url: String) -> String {
    let client = GraphServiceClient::new(ServiceConfig {
        url: service_url,
        timeout_secs: 5,
    })
    .unwrap();
    let state = AppState::new(
        client,
        WorkerConfig {
            playback: PlaybackConfig {
                seed: Some(3),
                ..PlaybackConfig::default()
            },
            router: None,
        },
    )
    .unwrap();
    let _ = state.reload_graph().await;
    bind(routes::create_router(state)).await
}

#[tokio::test(flavor = "multi_thread")]
async fn graph_is_served_after_startup_reload() {
    let base = dashboard(fake_service().await).await;
    let http = reqwest::Client::new();

    let graph: Value = http
        .get(format!("{}/api/graph", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(graph["nodes"].as_object().unwrap().len(), 3);
    assert_eq!(graph["edges"][1]["is_blocked"], json!(true));
}

#[tokio::test(flavor = "multi_thread")]
async fn optimize_loads_and_starts_playback() {
    let base = dashboard(fake_service().await).await;
    let http = reqwest::Client::new();

    let body: Value = http
        .post(format!("{}/api/optimize", base))
        .json(&json!({"start": "A", "end": "C"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["trace"]["iterations"], json!(2));
    assert_eq!(body["trace"]["best_path"], json!(["A", "B", "C"]));
    assert_eq!(body["frame"]["animating"], json!(true));
    assert_eq!(body["frame"]["iteration"], json!(1));

    let overlay: Value = http
        .get(format!("{}/api/overlay", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(overlay[0]["pheromone"], json!(4.0));
    assert_eq!(overlay[1]["blocked"], json!("graph"));

    let stop = http
        .post(format!("{}/api/playback/stop", base))
        .send()
        .await
        .unwrap();
    assert_eq!(stop.status(), 200);
    let frame: Value = stop.json().await.unwrap();
    assert_eq!(frame["state"]["state"], json!("ready"));
    assert_eq!(frame["agents"], json!([]));

    let again = http
        .post(format!("{}/api/playback/stop", base))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 409);
}

#[tokio::test(flavor = "multi_thread")]
async fn blocking_validates_against_the_graph() {
    let base = dashboard(fake_service().await).await;
    let http = reqwest::Client::new();

    let ok = http
        .post(format!("{}/api/blocked", base))
        .json(&json!({"from": "B", "to": "A"}))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);
    assert_eq!(ok.json::<Value>().await.unwrap(), json!([["A", "B"]]));

    let unknown = http
        .post(format!("{}/api/blocked", base))
        .json(&json!({"from": "A", "to": "Z"}))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), 422);

    let cleared = http
        .delete(format!("{}/api/blocked", base))
        .send()
        .await
        .unwrap();
    assert_eq!(cleared.json::<Value>().await.unwrap(), json!([]));
}

#[tokio::test(flavor = "multi_thread")]
async fn echoed_graph_drops_overrides_for_removed_nodes() {
    let base = dashboard(fake_service_with(OPTIMIZE_ECHOING_GRAPH).await).await;
    let http = reqwest::Client::new();

    let blocked = http
        .post(format!("{}/api/blocked", base))
        .json(&json!({"from": "A", "to": "B"}))
        .send()
        .await
        .unwrap();
    assert_eq!(blocked.json::<Value>().await.unwrap(), json!([["A", "B"]]));

    let optimized = http
        .post(format!("{}/api/optimize", base))
        .json(&json!({"start": "A", "end": "C", "autostart": false}))
        .send()
        .await
        .unwrap();
    assert_eq!(optimized.status(), 200);

    let graph: Value = http
        .get(format!("{}/api/graph", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(graph["nodes"].get("B").is_none());

    let remaining: Value = http
        .get(format!("{}/api/blocked", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(remaining, json!([]));
}

#[tokio::test(flavor = "multi_thread")]
async fn start_without_a_trace_conflicts() {
    let base = dashboard(fake_service().await).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/playback/start", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_service_is_a_bad_gateway() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let base = dashboard(dead).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/graph/reload", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("connection failed"));
}
