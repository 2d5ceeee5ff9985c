//! REST API endpoints.

use crate::error::ApiError;
use crate::state::{AppState, TraceSummary};
use antrail::prelude::{BlockedEdges, EdgeOverlay, Frame, GraphPayload, NewNode, NodeId};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Get the current graph.
pub async fn get_graph(State(state): State<AppState>) -> ApiResult<GraphPayload> {
    Ok(Json(state.graph().await?))
}

/// Refetch the graph from the service.
pub async fn reload_graph(State(state): State<AppState>) -> ApiResult<GraphPayload> {
    Ok(Json(state.reload_graph().await?))
}

/// Add a node and return the reloaded graph.
pub async fn add_node(
    State(state): State<AppState>,
    Json(node): Json<NewNode>,
) -> Result<(StatusCode, Json<GraphPayload>), ApiError> {
    let graph = state.add_node(node).await?;
    Ok((StatusCode::CREATED, Json(graph)))
}

/// Remove a node and return the reloaded graph.
pub async fn remove_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<GraphPayload> {
    Ok(Json(state.remove_node(NodeId::from(id)).await?))
}

/// An undirected edge named by its endpoints.
#[derive(Debug, Deserialize)]
pub struct EdgeRequest {
    pub from: NodeId,
    pub to: NodeId,
}

pub async fn get_blocked(State(state): State<AppState>) -> ApiResult<BlockedEdges> {
    Ok(Json(state.blocked().await?))
}

/// Block an edge of the current graph.
pub async fn block(
    State(state): State<AppState>,
    Json(edge): Json<EdgeRequest>,
) -> ApiResult<BlockedEdges> {
    Ok(Json(state.block(edge.from, edge.to).await?))
}

/// Unblock one edge, or every override when no body is sent.
pub async fn unblock(
    State(state): State<AppState>,
    edge: Option<Json<EdgeRequest>>,
) -> ApiResult<BlockedEdges> {
    let blocked = match edge {
        Some(Json(edge)) => state.unblock(edge.from, edge.to).await?,
        None => state.clear_blocked().await?,
    };
    Ok(Json(blocked))
}

/// Optimize request body.
#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub start: NodeId,
    pub end: NodeId,
    /// Start playback as soon as the trace is loaded.
    #[serde(default = "default_autostart")]
    pub autostart: bool,
}

fn default_autostart() -> bool {
    true
}

/// Optimize response.
#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub trace: TraceSummary,
    pub frame: Frame,
}

/// Run an optimization around the current overrides and load its trace.
pub async fn optimize(
    State(state): State<AppState>,
    Json(req): Json<OptimizeRequest>,
) -> ApiResult<OptimizeResponse> {
    if req.start == req.end {
        return Err(ApiError::BadRequest("start and end must differ".into()));
    }
    let trace = state.optimize(req.start, req.end).await?;
    let frame = if req.autostart && trace.iterations > 0 {
        state.start(None, None).await?
    } else {
        state.frame().await?
    };
    Ok(Json(OptimizeResponse { trace, frame }))
}

/// Start request body. Both fields keep the current setting when absent.
#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub best_only: Option<bool>,
    #[serde(default)]
    pub routed: Option<bool>,
}

pub async fn start(
    State(state): State<AppState>,
    req: Option<Json<StartRequest>>,
) -> ApiResult<Frame> {
    let req = req.map(|Json(req)| req).unwrap_or_default();
    Ok(Json(state.start(req.best_only, req.routed).await?))
}

pub async fn stop(State(state): State<AppState>) -> ApiResult<Frame> {
    Ok(Json(state.stop().await?))
}

pub async fn get_frame(State(state): State<AppState>) -> ApiResult<Frame> {
    Ok(Json(state.frame().await?))
}

/// Per-edge overlay for the iteration on screen.
pub async fn get_overlay(State(state): State<AppState>) -> ApiResult<Vec<EdgeOverlay>> {
    Ok(Json(state.overlay().await?))
}
