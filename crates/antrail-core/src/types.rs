//! Shared types used across the playback engine and its collaborators.

use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Identifier of a node. Ids are opaque strings chosen by the graph service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A point on the render plane.
///
/// Geographic coordinates map longitude to `x` and latitude to `y`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation; `t = 0` yields `self`, `t = 1` yields `other`.
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Which coordinate system a node is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    Geographic,
    Planar,
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateSystem::Geographic => write!(f, "geographic"),
            CoordinateSystem::Planar => write!(f, "planar"),
        }
    }
}

/// Location of a node. A deployment populates exactly one system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinates {
    Geographic { lat: f64, lng: f64 },
    Planar { x: f64, y: f64 },
}

impl Coordinates {
    pub fn system(&self) -> CoordinateSystem {
        match self {
            Coordinates::Geographic { .. } => CoordinateSystem::Geographic,
            Coordinates::Planar { .. } => CoordinateSystem::Planar,
        }
    }

    pub fn to_point(&self) -> Point {
        match *self {
            Coordinates::Geographic { lat, lng } => Point::new(lng, lat),
            Coordinates::Planar { x, y } => Point::new(x, y),
        }
    }
}

/// A graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub coordinates: Coordinates,
    pub name: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, coordinates: Coordinates) -> Self {
        Self {
            id: id.into(),
            coordinates,
            name: None,
        }
    }

    pub fn geographic(id: impl Into<NodeId>, lat: f64, lng: f64) -> Self {
        Self::new(id, Coordinates::Geographic { lat, lng })
    }

    pub fn planar(id: impl Into<NodeId>, x: f64, y: f64) -> Self {
        Self::new(id, Coordinates::Planar { x, y })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn position(&self) -> Point {
        self.coordinates.to_point()
    }
}

/// A weighted edge. Logically undirected: `(a, b)` and `(b, a)` are the same edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
    /// Blocked by the graph service itself (not by the user's overrides).
    pub is_blocked: bool,
}

impl Edge {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>, weight: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            weight,
            is_blocked: false,
        }
    }

    pub fn blocked(mut self) -> Self {
        self.is_blocked = true;
        self
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.from.clone(), self.to.clone())
    }

    pub fn connects(&self, a: &NodeId, b: &NodeId) -> bool {
        (&self.from == a && &self.to == b) || (&self.from == b && &self.to == a)
    }
}

/// Canonical, order-independent identifier of an undirected edge.
///
/// The endpoints are sorted lexically on construction, so
/// `EdgeKey::new(a, b) == EdgeKey::new(b, a)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    low: NodeId,
    high: NodeId,
}

impl EdgeKey {
    /// Separator used by the textual form.
    pub const SEPARATOR: &'static str = "--";

    pub fn new(a: impl Into<NodeId>, b: impl Into<NodeId>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn between(a: &NodeId, b: &NodeId) -> Self {
        Self::new(a.clone(), b.clone())
    }

    /// The endpoints in canonical (sorted) order.
    pub fn endpoints(&self) -> (&NodeId, &NodeId) {
        (&self.low, &self.high)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        &self.low == id || &self.high == id
    }

    /// Whether `from -> to` walks the edge in canonical direction.
    pub fn is_canonical_direction(from: &NodeId, to: &NodeId) -> bool {
        from <= to
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.low, Self::SEPARATOR, self.high)
    }
}

/// A path length, or the explicit "no path exists" marker.
///
/// The graph service signals unreachability with a non-finite number. That
/// value never survives ingestion as a float: it becomes
/// [`Distance::Unreachable`], which orders after every finite distance and
/// displays as "no path".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distance {
    Finite(f64),
    Unreachable,
}

impl Distance {
    /// Map a raw number, treating any non-finite value as unreachable.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Distance::Finite(value)
        } else {
            Distance::Unreachable
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Distance::Finite(v) => Some(*v),
            Distance::Unreachable => None,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, Distance::Finite(_))
    }

    /// Numeric view for comparisons only; unreachable is `+inf`.
    pub fn as_f64(&self) -> f64 {
        self.value().unwrap_or(f64::INFINITY)
    }
}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Distance::Finite(a), Distance::Finite(b)) => a.partial_cmp(b),
            (Distance::Finite(_), Distance::Unreachable) => Some(Ordering::Less),
            (Distance::Unreachable, Distance::Finite(_)) => Some(Ordering::Greater),
            (Distance::Unreachable, Distance::Unreachable) => Some(Ordering::Equal),
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Finite(v) => write!(f, "{:.2}", v),
            Distance::Unreachable => write!(f, "no path"),
        }
    }
}

impl Serialize for Distance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Distance::Finite(v) => serializer.serialize_some(v),
            Distance::Unreachable => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_key_is_order_independent() {
        assert_eq!(EdgeKey::new("B", "A"), EdgeKey::new("A", "B"));
        let key = EdgeKey::new("B", "A");
        assert_eq!(key.endpoints(), (&NodeId::from("A"), &NodeId::from("B")));
        assert_eq!(key.to_string(), "A--B");
    }

    #[test]
    fn unreachable_orders_after_every_finite_distance() {
        let far = Distance::Finite(1.0e300);
        assert!(far < Distance::Unreachable);
        assert!(!(Distance::Unreachable < far));
        assert_eq!(Distance::from_f64(f64::NAN), Distance::Unreachable);
        assert_eq!(Distance::from_f64(f64::NEG_INFINITY), Distance::Unreachable);
    }

    #[test]
    fn unreachable_displays_as_no_path() {
        assert_eq!(Distance::Unreachable.to_string(), "no path");
        assert_eq!(Distance::Finite(5.0).to_string(), "5.00");
        assert_eq!(serde_json::to_string(&Distance::Unreachable).unwrap(), "null");
    }

    #[test]
    fn geographic_nodes_map_lng_to_x() {
        let node = Node::geographic("A", 21.0, 105.5);
        assert_eq!(node.position(), Point::new(105.5, 21.0));
    }

    #[test]
    fn lerp_hits_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, -4.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 0.5), Point::new(5.0, -2.0));
    }
}
