//! HTTP and WebSocket routes.

mod api;
mod ws;

use crate::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Graph
        .route("/api/graph", get(api::get_graph))
        .route("/api/graph/reload", post(api::reload_graph))
        .route("/api/nodes", post(api::add_node))
        .route("/api/nodes/:id", delete(api::remove_node))
        // Overrides
        .route(
            "/api/blocked",
            get(api::get_blocked).post(api::block).delete(api::unblock),
        )
        // Playback
        .route("/api/optimize", post(api::optimize))
        .route("/api/playback/start", post(api::start))
        .route("/api/playback/stop", post(api::stop))
        .route("/api/frame", get(api::get_frame))
        .route("/api/overlay", get(api::get_overlay))
        // WebSocket for live frames
        .route("/ws/frames", get(ws::frames_handler))
        // CORS for development
        .layer(CorsLayer::permissive())
        .with_state(state)
}
