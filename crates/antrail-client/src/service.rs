//! Client for the graph/optimize service.

use crate::error::{ClientError, ClientResult};
use antrail_core::blocked::BlockedEdges;
use antrail_core::graph::GraphModel;
use antrail_core::ingest::{parse_graph, parse_optimize_response, OptimizeResponse};
use antrail_core::types::NodeId;
use reqwest::{RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Where the graph service lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Body of `POST /optimize`.
///
/// `blocked_edges` carries the user's overrides only; edges the graph
/// already marks as blocked are the service's own business.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeRequest {
    pub start: NodeId,
    pub end: NodeId,
    pub blocked_edges: Vec<[NodeId; 2]>,
}

impl OptimizeRequest {
    pub fn new(start: NodeId, end: NodeId, overrides: &BlockedEdges) -> Self {
        Self {
            start,
            end,
            blocked_edges: overrides.to_request_pairs(),
        }
    }
}

/// Body of `POST /nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNode {
    pub id: NodeId,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the graph service.
pub struct GraphServiceClient {
    base: Url,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl GraphServiceClient {
    pub fn new(config: ServiceConfig) -> ClientResult<Self> {
        let base = Url::parse(&config.url)
            .map_err(|e| ClientError::Config(format!("service url {:?}: {}", config.url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "service url {:?} cannot carry a path",
                config.url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            base,
            timeout_secs: config.timeout_secs,
            client,
        })
    }

    /// Create with the default localhost endpoint.
    pub fn localhost() -> ClientResult<Self> {
        Self::new(ServiceConfig::default())
    }

    pub fn endpoint(&self) -> &str {
        self.base.as_str()
    }

    /// `GET /graph`.
    pub async fn get_graph(&self) -> ClientResult<GraphModel> {
        let body = self.send(self.client.get(self.url(&["graph"]))).await?;
        let graph = parse_graph(&body)?;
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph loaded"
        );
        Ok(graph)
    }

    /// `POST /optimize` from `start` to `end`, avoiding the user's overrides.
    pub async fn optimize(
        &self,
        start: &NodeId,
        end: &NodeId,
        overrides: &BlockedEdges,
    ) -> ClientResult<OptimizeResponse> {
        self.optimize_request(&OptimizeRequest::new(start.clone(), end.clone(), overrides))
            .await
    }

    pub async fn optimize_request(&self, request: &OptimizeRequest) -> ClientResult<OptimizeResponse> {
        let body = self
            .send(self.client.post(self.url(&["optimize"])).json(request))
            .await?;
        let response = parse_optimize_response(&body)?;
        info!(
            start = %request.start,
            end = %request.end,
            blocked = request.blocked_edges.len(),
            iterations = response.trace.len(),
            distance = %response.trace.distance,
            "optimize finished"
        );
        Ok(response)
    }

    /// Like [`optimize`](Self::optimize), also returning the raw body so it
    /// can be saved and replayed later.
    pub async fn optimize_raw(
        &self,
        request: &OptimizeRequest,
    ) -> ClientResult<(OptimizeResponse, String)> {
        let body = self
            .send(self.client.post(self.url(&["optimize"])).json(request))
            .await?;
        let response = parse_optimize_response(&body)?;
        Ok((response, body))
    }

    /// `POST /nodes`. Callers reload the graph afterwards.
    pub async fn add_node(&self, node: &NewNode) -> ClientResult<()> {
        self.send(self.client.post(self.url(&["nodes"])).json(node))
            .await?;
        info!(node = %node.id, "node added");
        Ok(())
    }

    /// `DELETE /nodes/{id}`. Callers reload the graph afterwards.
    pub async fn remove_node(&self, id: &NodeId) -> ClientResult<()> {
        self.send(self.client.delete(self.url(&["nodes", id.as_str()])))
            .await?;
        info!(node = %id, "node removed");
        Ok(())
    }

    /// `GET /health`.
    pub async fn health(&self) -> ClientResult<HealthStatus> {
        let body = self.send(self.client.get(self.url(&["health"]))).await?;
        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send a request and return the body of a successful response.
    ///
    /// Bodies are returned as text: the optimize payload is not strict JSON
    /// and must go through ingestion rather than a JSON decoder.
    async fn send(&self, request: RequestBuilder) -> ClientResult<String> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.base.as_str(), self.timeout_secs))?;

        let status = response.status();
        debug!(url = %response.url(), %status, "service responded");
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.base.as_str(), self.timeout_secs))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }
}
