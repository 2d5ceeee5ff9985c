//! Antrail Runtime Prelude — convenient imports for common usage.
//!
//! ```rust
//! use antrail_runtime::prelude::*;
//! ```

// Re-export configuration
pub use crate::config::{ConfigError, PathMode, PlaybackConfig, SpawnFilter};

// Re-export the engine
pub use crate::resolver::{EdgePathResolver, Polyline, RouteRequest};
pub use crate::simulator::{interpolate, Agent, AntSimulator};
pub use crate::scheduler::{FrameScheduler, FrameToken, Settle};
pub use crate::controller::{Frame, PlaybackController, PlaybackState, TickOutcome};

// Re-export async runtime when feature is enabled
#[cfg(feature = "async")]
pub use crate::async_runtime::{PlaybackDriver, RouteCompletion, RouteProvider, Wake};

// Re-export from core
pub use antrail_core::prelude::*;
