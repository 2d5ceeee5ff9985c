//! Antrail Core Prelude — convenient imports for common usage.
//!
//! ```rust
//! use antrail_core::prelude::*;
//! ```

// Re-export commonly used types
pub use crate::types::{
    NodeId, Point,
    CoordinateSystem, Coordinates,
    Node, Edge, EdgeKey,
    Distance,
};

pub use crate::graph::GraphModel;
pub use crate::trace::{CandidatePath, IterationSnapshot, OptimizationTrace};

// Ingestion
pub use crate::ingest::{
    parse_graph, parse_optimize_response, parse_trace,
    EdgePayload, GraphPayload, NodePayload, OptimizeResponse,
};

// Rendering helpers
pub use crate::pheromone::{intensity, intensity_for_key, BASELINE_INTENSITY};
pub use crate::blocked::BlockedEdges;
pub use crate::overlay::{edge_overlays, is_disallowed, BlockSource, EdgeOverlay};

// Re-export error types
pub use crate::error::{AntrailError, ResolutionFailure, Result, SequencingViolation, ValidationError};
