//! # Antrail Client
//!
//! The HTTP boundary of the playback engine.
//!
//! - [`GraphServiceClient`] talks to the graph/optimize service:
//!   `GET /graph`, `POST /optimize`, `POST /nodes`, `DELETE /nodes/{id}`
//!   and `GET /health`. Responses go through `antrail_core::ingest`, so
//!   callers only ever see validated models.
//! - [`OsrmRouter`] is a [`RouteProvider`](antrail_runtime::async_runtime::RouteProvider)
//!   backed by an OSRM-compatible routing server.
//!
//! # Example
//!
//! ```rust,ignore
//! use antrail_client::{GraphServiceClient, ServiceConfig};
//!
//! let client = GraphServiceClient::new(ServiceConfig::default())?;
//! let graph = client.get_graph().await?;
//! let response = client.optimize(&"A".into(), &"H".into(), &BlockedEdges::new()).await?;
//! ```

pub mod error;
pub mod service;
pub mod routing;

pub use error::{ClientError, ClientResult};
pub use service::{GraphServiceClient, HealthStatus, NewNode, OptimizeRequest, ServiceConfig};
pub use routing::{OsrmRouter, RouterConfig};
