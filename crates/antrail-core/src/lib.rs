//! # Antrail Core
//!
//! Shared types for replaying ant colony optimization traces.
//!
//! The optimizer itself runs elsewhere. This crate only describes what it
//! hands back and what the playback engine needs to know about the graph:
//!
//! - **GraphModel** - immutable snapshot of nodes and undirected, weighted edges
//! - **OptimizationTrace** - overall best path plus per-iteration candidate
//!   paths and pheromone levels
//! - **Ingestion** - typed, validating parsers for the graph service's JSON,
//!   tolerant of the non-finite "unreachable" tokens it emits
//! - **Pheromone sampling** - direction-independent intensity lookup
//! - **Blocked overrides** - user-maintained blocked pairs, kept apart from the
//!   graph's own flags
//! - **Overlays** - per-edge render classification
//!
//! ## Quick Start
//!
//! ```rust
//! use antrail_core::prelude::*;
//!
//! let trace = parse_trace(r#"{
//!     "best_path": ["A", "B"],
//!     "distance": 2.5,
//!     "iterations": [{
//!         "iteration": 1,
//!         "best_distance": 2.5,
//!         "best_path": ["A", "B"],
//!         "paths": [[["A", "B"], 2.5]],
//!         "pheromone_levels": {"('A', 'B')": 4.0}
//!     }]
//! }"#).unwrap();
//!
//! let level = intensity(Some(&trace), 0, &NodeId::from("B"), &NodeId::from("A"));
//! assert_eq!(level, 4.0);
//! ```

pub mod types;
pub mod graph;
pub mod trace;
pub mod ingest;
pub mod pheromone;
pub mod blocked;
pub mod overlay;
pub mod error;
pub mod prelude;
