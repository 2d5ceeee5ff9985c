//! # Antrail Web
//!
//! HTTP and WebSocket backend for watching ant colony optimization runs.
//! One worker thread owns the playback driver; handlers talk to it over a
//! command channel and every tick is broadcast to WebSocket subscribers.
//!
//! ## Quick Start
//!
//! ```bash
//! # Start the graph service on :5000, then
//! cargo run -p antrail-web -- --port 3000
//! ```
//!
//! ## API Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/api/graph` | Current graph |
//! | POST | `/api/graph/reload` | Refetch the graph from the service |
//! | POST | `/api/nodes` | Add a node, then reload |
//! | DELETE | `/api/nodes/:id` | Remove a node, then reload |
//! | GET | `/api/blocked` | Blocked-edge overrides |
//! | POST | `/api/blocked` | Block an edge |
//! | DELETE | `/api/blocked` | Unblock one edge, or all of them |
//! | POST | `/api/optimize` | Run an optimization and load its trace |
//! | POST | `/api/playback/start` | Start playback |
//! | POST | `/api/playback/stop` | Stop playback |
//! | GET | `/api/frame` | Current frame |
//! | GET | `/api/overlay` | Per-edge overlay for the iteration on screen |
//! | WS | `/ws/frames` | Live frames and overlays |
//!
//! Validation and sequencing failures answer 422, requests that do not fit
//! the playback state answer 409, and graph service failures answer 502.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::{AppState, Update, WorkerConfig};
