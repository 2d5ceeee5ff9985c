//! Typed ingestion of the graph service's JSON payloads.
//!
//! Every payload goes through a schema-checked wire struct and comes out as
//! a [`GraphModel`] or [`OptimizationTrace`], or as a [`ValidationError`].
//! Two quirks of the producer are absorbed here and nowhere else:
//!
//! - Unreachable distances arrive as bare `Infinity` / `NaN` tokens, which
//!   are not JSON. They are quoted before parsing and turned into
//!   [`Distance::Unreachable`].
//! - Pheromone maps are keyed by a printed tuple such as `"('A', 'B')"`, in
//!   whichever direction the ant walked. Keys are parsed into canonical
//!   [`EdgeKey`]s.

use crate::error::{AntrailError, Result, ValidationError};
use crate::graph::GraphModel;
use crate::trace::{CandidatePath, IterationSnapshot, OptimizationTrace};
use crate::types::*;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Non-finite number tokens the producer writes in place of JSON numbers.
const NON_FINITE_TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

/// Wire form of a node, as served under `GET /graph`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Wire form of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgePayload {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
    #[serde(default)]
    pub is_blocked: bool,
}

/// Wire form of the whole graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
    pub nodes: BTreeMap<NodeId, NodePayload>,
    #[serde(default)]
    pub edges: Vec<EdgePayload>,
}

impl GraphPayload {
    /// Validate and convert into a [`GraphModel`].
    pub fn into_model(self) -> Result<GraphModel> {
        let nodes = self
            .nodes
            .into_iter()
            .map(|(id, payload)| node_from_payload(id, payload))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let edges = self
            .edges
            .into_iter()
            .map(|e| Edge {
                from: e.from,
                to: e.to,
                weight: e.weight,
                is_blocked: e.is_blocked,
            })
            .collect();
        GraphModel::new(nodes, edges)
    }

    /// The wire form of an existing model.
    pub fn from_model(graph: &GraphModel) -> Self {
        let nodes = graph
            .nodes()
            .map(|node| {
                let mut payload = NodePayload {
                    name: node.name.clone(),
                    ..NodePayload::default()
                };
                match node.coordinates {
                    Coordinates::Geographic { lat, lng } => {
                        payload.lat = Some(lat);
                        payload.lng = Some(lng);
                    }
                    Coordinates::Planar { x, y } => {
                        payload.x = Some(x);
                        payload.y = Some(y);
                    }
                }
                (node.id.clone(), payload)
            })
            .collect();
        let edges = graph
            .edges()
            .iter()
            .map(|e| EdgePayload {
                from: e.from.clone(),
                to: e.to.clone(),
                weight: e.weight,
                is_blocked: e.is_blocked,
            })
            .collect();
        Self { nodes, edges }
    }
}

/// A parsed `POST /optimize` response.
#[derive(Debug, Clone)]
pub struct OptimizeResponse {
    pub trace: OptimizationTrace,
    /// The graph the service optimized over, when it echoes one back.
    pub graph: Option<GraphModel>,
}

/// A number field that may carry a quoted non-finite token.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Token(String),
}

#[derive(Debug, Deserialize)]
struct RawIteration {
    iteration: u32,
    #[serde(default)]
    best_distance: Option<RawNumber>,
    #[serde(default)]
    best_path: Option<Vec<NodeId>>,
    #[serde(default)]
    paths: Vec<(Option<Vec<NodeId>>, Option<RawNumber>)>,
    #[serde(default)]
    pheromone_levels: BTreeMap<String, RawNumber>,
}

#[derive(Debug, Deserialize)]
struct RawTrace {
    #[serde(default, deserialize_with = "present")]
    best_path: Option<Option<Vec<NodeId>>>,
    #[serde(default, deserialize_with = "present")]
    distance: Option<Option<RawNumber>>,
    #[serde(default)]
    iterations: Option<Vec<RawIteration>>,
    #[serde(default)]
    total_iterations: Option<u32>,
    #[serde(default)]
    ants_per_iteration: Option<u32>,
    #[serde(default)]
    graph_edges: Option<Vec<EdgePayload>>,
    #[serde(default)]
    node_positions: Option<BTreeMap<NodeId, NodePayload>>,
}

/// Distinguish a missing key (`None`) from an explicit `null` (`Some(None)`).
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parse a `GET /graph` body.
pub fn parse_graph(text: &str) -> Result<GraphModel> {
    let payload: GraphPayload = serde_json::from_str(text).map_err(malformed)?;
    let graph = payload.into_model()?;
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph ingested"
    );
    Ok(graph)
}

/// Parse a trace, ignoring any graph echoed alongside it.
pub fn parse_trace(text: &str) -> Result<OptimizationTrace> {
    parse_optimize_response(text).map(|response| response.trace)
}

/// Parse a `POST /optimize` body.
pub fn parse_optimize_response(text: &str) -> Result<OptimizeResponse> {
    let text = quote_non_finite_tokens(text);
    let raw: RawTrace = serde_json::from_str(&text).map_err(malformed)?;

    let distance = match raw.distance {
        None => return Err(ValidationError::MissingField("distance".into()).into()),
        Some(value) => distance_from_raw("distance", value)?,
    };

    let best_path = match raw.best_path {
        None => return Err(ValidationError::MissingField("best_path".into()).into()),
        Some(Some(path)) => path,
        Some(None) if !distance.is_reachable() => Vec::new(),
        Some(None) => {
            return Err(ValidationError::Malformed(format!(
                "best_path is null but distance is {}",
                distance
            ))
            .into())
        }
    };

    let iterations = raw
        .iterations
        .unwrap_or_default()
        .into_iter()
        .map(iteration_from_raw)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let trace = OptimizationTrace {
        best_path,
        distance,
        iterations,
        total_iterations: raw.total_iterations,
        ants_per_iteration: raw.ants_per_iteration,
    };

    if let Some(violation) = trace.first_sequence_violation() {
        if trace.is_empty() {
            return Err(AntrailError::Sequencing(violation));
        }
        warn!(%violation, "trace iterations are out of sequence; playback will stop there");
    }

    let graph = match (raw.node_positions, raw.graph_edges) {
        (Some(nodes), Some(edges)) => Some(GraphPayload { nodes, edges }.into_model()?),
        _ => None,
    };

    debug!(
        iterations = trace.len(),
        distance = %trace.distance,
        with_graph = graph.is_some(),
        "trace ingested"
    );
    Ok(OptimizeResponse { trace, graph })
}

/// Parse a producer pheromone key into its canonical form.
///
/// Accepts printed tuples and lists (`"('A', 'B')"`, `"(A, B)"`,
/// `"[\"A\", \"B\"]"`) as well as a bare `"A,B"`. Quoted ids may contain
/// commas, as in `"('Ha Noi, VN', 'B')"`.
pub fn parse_pheromone_key(raw: &str) -> std::result::Result<EdgeKey, ValidationError> {
    let malformed = || ValidationError::MalformedPheromoneKey(raw.to_string());
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix(['(', '['])
        .and_then(|rest| rest.strip_suffix([')', ']']))
        .unwrap_or(trimmed);

    let parts = if inner.contains(['\'', '"']) {
        quoted_literals(inner).ok_or_else(malformed)?
    } else {
        inner.split(',').map(|part| part.trim().to_string()).collect()
    };
    match parts.as_slice() {
        [a, b] if !a.is_empty() && !b.is_empty() => Ok(EdgeKey::new(a.as_str(), b.as_str())),
        _ => Err(malformed()),
    }
}

/// Read a comma separated run of `'..'` / `".."` literals. Anything other
/// than whitespace between literals makes the whole run invalid.
fn quoted_literals(text: &str) -> Option<Vec<String>> {
    let mut literals = Vec::new();
    let mut chars = text.chars();
    let mut want_literal = true;

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' if want_literal => {
                let mut literal = String::new();
                loop {
                    match chars.next()? {
                        '\\' => literal.push(chars.next()?),
                        ch if ch == c => break,
                        ch => literal.push(ch),
                    }
                }
                literals.push(literal);
                want_literal = false;
            }
            ',' if !want_literal => want_literal = true,
            ch if ch.is_whitespace() => {}
            _ => return None,
        }
    }
    Some(literals)
}

/// Quote bare non-finite tokens outside of JSON strings so they parse as
/// strings and can be mapped to [`Distance::Unreachable`].
fn quote_non_finite_tokens(text: &str) -> Cow<'_, str> {
    if !NON_FINITE_TOKENS.iter().any(|token| text.contains(token)) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = NON_FINITE_TOKENS.iter().find(|t| rest.starts_with(**t)) {
            out.push('"');
            out.push_str(token);
            out.push('"');
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}

fn malformed(e: serde_json::Error) -> AntrailError {
    AntrailError::Validation(ValidationError::Malformed(e.to_string()))
}

fn distance_from_raw(
    field: &str,
    raw: Option<RawNumber>,
) -> std::result::Result<Distance, ValidationError> {
    match raw {
        None => Ok(Distance::Unreachable),
        Some(RawNumber::Number(v)) => Ok(Distance::from_f64(v)),
        Some(RawNumber::Token(token)) if is_non_finite_token(&token) => Ok(Distance::Unreachable),
        Some(RawNumber::Token(token)) => Err(ValidationError::MalformedNumber {
            field: field.to_string(),
            value: token,
        }),
    }
}

fn is_non_finite_token(token: &str) -> bool {
    matches!(
        token.trim().to_ascii_lowercase().as_str(),
        "infinity" | "-infinity" | "+infinity" | "inf" | "-inf" | "nan"
    )
}

fn iteration_from_raw(raw: RawIteration) -> std::result::Result<IterationSnapshot, ValidationError> {
    let field = format!("iterations[{}]", raw.iteration);

    let paths = raw
        .paths
        .into_iter()
        .map(|(nodes, distance)| {
            Ok(CandidatePath::new(
                nodes.unwrap_or_default(),
                distance_from_raw(&field, distance)?,
            ))
        })
        .collect::<std::result::Result<Vec<_>, ValidationError>>()?;

    let mut pheromone_levels = BTreeMap::new();
    for (raw_key, raw_level) in raw.pheromone_levels {
        let key = parse_pheromone_key(&raw_key)?;
        let level = match raw_level {
            RawNumber::Number(v) if v.is_finite() => v,
            _ => return Err(ValidationError::NonFinitePheromone(raw_key)),
        };
        // Both directions of one edge may be present; keep the stronger trail.
        pheromone_levels
            .entry(key)
            .and_modify(|existing: &mut f64| *existing = existing.max(level))
            .or_insert(level);
    }

    Ok(IterationSnapshot {
        iteration: raw.iteration,
        best_distance: distance_from_raw(&field, raw.best_distance)?,
        best_path: raw.best_path.unwrap_or_default(),
        paths,
        pheromone_levels,
    })
}

fn node_from_payload(id: NodeId, payload: NodePayload) -> std::result::Result<Node, ValidationError> {
    let malformed = |reason: &str| ValidationError::MalformedCoordinate {
        node: id.clone(),
        reason: reason.to_string(),
    };

    let coordinates = match (payload.lat, payload.lng, payload.x, payload.y) {
        (Some(lat), Some(lng), _, _) => {
            if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
                return Err(malformed("latitude must be within -90..=90"));
            }
            if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
                return Err(malformed("longitude must be within -180..=180"));
            }
            Coordinates::Geographic { lat, lng }
        }
        (Some(_), None, _, _) | (None, Some(_), _, _) => {
            return Err(malformed("lat and lng must be given together"));
        }
        (None, None, Some(x), Some(y)) => {
            if !x.is_finite() || !y.is_finite() {
                return Err(malformed("x and y must be finite"));
            }
            Coordinates::Planar { x, y }
        }
        (None, None, Some(_), None) | (None, None, None, Some(_)) => {
            return Err(malformed("x and y must be given together"));
        }
        (None, None, None, None) => {
            return Err(ValidationError::MissingField(format!("coordinates of node {}", id)));
        }
    };

    Ok(Node {
        id,
        coordinates,
        name: payload.name,
    })
}
