//! # Antrail Runtime
//!
//! The iteration playback engine.
//!
//! Turns a discrete [`OptimizationTrace`](antrail_core::trace::OptimizationTrace)
//! into a continuous animation: agents walk the candidate paths of one
//! iteration, and when the last of them arrives the controller waits out a
//! short settle delay before moving on to the next iteration.
//!
//! - [`resolver`] maps an edge to the polyline agents follow on screen
//! - [`simulator`] spawns and advances agents
//! - [`scheduler`] hands out cancellable frame tokens and tracks the settle delay
//! - [`controller`] sequences iterations and exposes render state
//! - `async_runtime` (feature `async`) drives a controller from a tokio timer
//!   and feeds it routes from an external provider

pub mod config;
pub mod resolver;
pub mod simulator;
pub mod scheduler;
pub mod controller;
pub mod prelude;

#[cfg(feature = "async")]
pub mod async_runtime;
