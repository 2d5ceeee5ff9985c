//! # Antrail
//!
//! Replays the iteration-by-iteration trace of an ant colony optimization run
//! as a continuous animation.
//!
//! The optimizer runs in an external service. Antrail takes the trace it
//! returns (candidate paths and pheromone levels per iteration) and turns it
//! into frames: agents walking each candidate path, a short pause at every
//! generation boundary, and per-edge pheromone intensities for the overlay.
//!
//! ## Quick Start
//!
//! ```rust
//! use antrail::prelude::*;
//! use std::time::Duration;
//!
//! let graph = GraphModel::new(
//!     vec![
//!         Node::planar("A", 0.0, 0.0),
//!         Node::planar("B", 10.0, 0.0),
//!         Node::planar("C", 10.0, 10.0),
//!     ],
//!     vec![Edge::new("A", "B", 2.0), Edge::new("B", "C", 3.0)],
//! ).unwrap();
//!
//! let trace = parse_trace(r#"{
//!     "best_path": ["A", "B", "C"],
//!     "distance": 5.0,
//!     "iterations": [{
//!         "iteration": 1,
//!         "best_distance": 5.0,
//!         "best_path": ["A", "B", "C"],
//!         "paths": [[["A", "B", "C"], 5.0]],
//!         "pheromone_levels": {"('B', 'A')": 4.0}
//!     }]
//! }"#).unwrap();
//!
//! let mut playback = PlaybackController::with_graph(graph, PlaybackConfig::default()).unwrap();
//! playback.load_trace(trace).unwrap();
//! playback.start().unwrap();
//!
//! while playback.is_animating() {
//!     playback.tick(Duration::from_millis(50)).unwrap();
//! }
//! assert_eq!(playback.state(), PlaybackState::Ready);
//! ```
//!
//! ## Architecture
//!
//! - [`antrail_core`] - graph and trace models, ingestion, pheromone sampling,
//!   blocked-edge overrides and edge overlays
//! - [`antrail_runtime`] - path resolver, ant simulator, playback controller
//!   and (feature `async`) the tokio driver
//! - `antrail_client` (feature `client`) - HTTP clients for the graph service
//!   and an OSRM-compatible router

// Re-export all subcrates
pub use antrail_core as core;
pub use antrail_runtime as runtime;

#[cfg(feature = "client")]
pub use antrail_client as client;

/// Prelude module for convenient imports.
///
/// ```rust
/// use antrail::prelude::*;
/// ```
pub mod prelude {
    pub use antrail_runtime::prelude::*;

    #[cfg(feature = "client")]
    pub use antrail_client::{
        ClientError, ClientResult,
        GraphServiceClient, ServiceConfig, OptimizeRequest, NewNode, HealthStatus,
        OsrmRouter, RouterConfig,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
