//! GraphModel: immutable snapshot of the graph served by the graph service.
//!
//! Backed by petgraph's undirected `Graph` with a HashMap index from our
//! `NodeId` to petgraph's `NodeIndex`. The model is never edited in place;
//! a reload builds a new one and replaces the old wholesale.

use crate::error::{Result, ValidationError};
use crate::types::*;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::Undirected;
use std::collections::{BTreeMap, HashMap};

/// An immutable graph snapshot.
#[derive(Debug, Clone)]
pub struct GraphModel {
    nodes: BTreeMap<NodeId, Node>,
    edges: Vec<Edge>,
    /// Edge weights hold the position of the edge in `edges`.
    topology: Graph<NodeId, usize, Undirected>,
    node_index: HashMap<NodeId, NodeIndex>,
    system: Option<CoordinateSystem>,
}

impl GraphModel {
    /// Build a validated graph.
    ///
    /// Rejects duplicate node ids, mixed coordinate systems, non-finite
    /// coordinates, edges to unknown nodes and non-finite or negative
    /// weights. Duplicate undirected edges are the producer's responsibility
    /// and are not checked.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self> {
        let mut by_id = BTreeMap::new();
        let mut topology = Graph::new_undirected();
        let mut node_index = HashMap::new();
        let mut system = None;

        for node in nodes {
            if !node.position().is_finite() {
                return Err(ValidationError::MalformedCoordinate {
                    node: node.id.clone(),
                    reason: "coordinate is not finite".into(),
                }
                .into());
            }
            let found = node.coordinates.system();
            match system {
                None => system = Some(found),
                Some(expected) if expected != found => {
                    return Err(ValidationError::MixedCoordinates {
                        node: node.id.clone(),
                        expected,
                        found,
                    }
                    .into());
                }
                Some(_) => {}
            }
            if by_id.contains_key(&node.id) {
                return Err(ValidationError::DuplicateNode(node.id.clone()).into());
            }
            let idx = topology.add_node(node.id.clone());
            node_index.insert(node.id.clone(), idx);
            by_id.insert(node.id.clone(), node);
        }

        for (position, edge) in edges.iter().enumerate() {
            if !edge.weight.is_finite() || edge.weight < 0.0 {
                return Err(ValidationError::InvalidWeight {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    weight: edge.weight,
                }
                .into());
            }
            let Some(&from) = node_index.get(&edge.from) else {
                return Err(ValidationError::UnknownNode(edge.from.clone()).into());
            };
            let Some(&to) = node_index.get(&edge.to) else {
                return Err(ValidationError::UnknownNode(edge.to.clone()).into());
            };
            topology.add_edge(from, to, position);
        }

        Ok(Self {
            nodes: by_id,
            edges,
            topology,
            node_index,
            system,
        })
    }

    /// A graph with no nodes; what the engine holds before the first load.
    pub fn empty() -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            topology: Graph::new_undirected(),
            node_index: HashMap::new(),
            system: None,
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn position(&self, id: &NodeId) -> Option<Point> {
        self.nodes.get(id).map(Node::position)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Look up the edge joining `a` and `b` in either direction.
    pub fn edge_between(&self, a: &NodeId, b: &NodeId) -> Option<&Edge> {
        let from = *self.node_index.get(a)?;
        let to = *self.node_index.get(b)?;
        self.topology
            .find_edge(from, to)
            .map(|idx| &self.edges[self.topology[idx]])
    }

    pub fn neighbors(&self, id: &NodeId) -> Vec<&NodeId> {
        let Some(&idx) = self.node_index.get(id) else {
            return Vec::new();
        };
        self.topology
            .neighbors(idx)
            .map(|n| &self.topology[n])
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn coordinate_system(&self) -> Option<CoordinateSystem> {
        self.system
    }
}

impl Default for GraphModel {
    fn default() -> Self {
        Self::empty()
    }
}
