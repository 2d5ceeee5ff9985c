//! Error types for antrail operations.
//!
//! Validation and sequencing problems abort the action that triggered them.
//! Routing failures are a separate, expected outcome (see [`ResolutionFailure`])
//! and are never surfaced through [`AntrailError`].

use crate::types::{CoordinateSystem, NodeId};
use thiserror::Error;

/// Result type for antrail operations.
pub type Result<T> = std::result::Result<T, AntrailError>;

/// Errors that abort a playback or ingestion action.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AntrailError {
    /// The ingested trace or graph is structurally invalid.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The trace's iteration numbering is inconsistent.
    #[error("sequencing violation: {0}")]
    Sequencing(#[from] SequencingViolation),

    /// An operation was called in a state that does not allow it.
    #[error("invalid transition: cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: String,
    },

    /// Serialization failed on an outbound payload.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl AntrailError {
    pub fn invalid_transition(operation: &'static str, state: impl ToString) -> Self {
        AntrailError::InvalidTransition {
            operation,
            state: state.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AntrailError::Validation(_))
    }

    pub fn is_sequencing(&self) -> bool {
        matches!(self, AntrailError::Sequencing(_))
    }
}

impl From<serde_json::Error> for AntrailError {
    fn from(e: serde_json::Error) -> Self {
        AntrailError::Serialization(e.to_string())
    }
}

/// Structural problems found while ingesting a graph or trace.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("malformed coordinate for node {node}: {reason}")]
    MalformedCoordinate { node: NodeId, reason: String },

    #[error("graph mixes coordinate systems: node {node} is {found}, expected {expected}")]
    MixedCoordinates {
        node: NodeId,
        expected: CoordinateSystem,
        found: CoordinateSystem,
    },

    #[error("duplicate node: {0}")]
    DuplicateNode(NodeId),

    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("invalid weight {weight} on edge {from}-{to}")]
    InvalidWeight { from: NodeId, to: NodeId, weight: f64 },

    #[error("malformed pheromone key: {0:?}")]
    MalformedPheromoneKey(String),

    #[error("malformed number in {field}: {value:?}")]
    MalformedNumber { field: String, value: String },

    #[error("non-finite pheromone level on {0}")]
    NonFinitePheromone(String),
}

/// The producer broke the "iterations are numbered 1, 2, 3, ..." contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencingViolation {
    #[error("iteration at index {index} is numbered {found}, expected {expected}")]
    OutOfOrder { index: usize, expected: u32, found: u32 },

    #[error("trace has a best path but no iterations")]
    MissingIterations,
}

/// An external route lookup failed or timed out.
///
/// Expected and recoverable: the resolver falls back to a straight segment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("route unavailable: {reason}")]
pub struct ResolutionFailure {
    pub reason: String,
}

impl ResolutionFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
