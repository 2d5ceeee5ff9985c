//! User-maintained blocked-edge overrides.
//!
//! Kept apart from the graph's own `is_blocked` flags. The two are unioned
//! for rendering, but only the overrides go back out in an optimize request.

use crate::types::{EdgeKey, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A set of unordered node pairs the user has blocked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockedEdges {
    pairs: BTreeSet<EdgeKey>,
}

impl BlockedEdges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block `a`-`b`. Self-loops are ignored. Returns whether the pair was new.
    pub fn insert(&mut self, a: impl Into<NodeId>, b: impl Into<NodeId>) -> bool {
        let (a, b) = (a.into(), b.into());
        if a == b {
            return false;
        }
        self.pairs.insert(EdgeKey::new(a, b))
    }

    /// Unblock `a`-`b`. Returns whether it was blocked.
    pub fn remove(&mut self, a: &NodeId, b: &NodeId) -> bool {
        self.pairs.remove(&EdgeKey::between(a, b))
    }

    pub fn contains(&self, a: &NodeId, b: &NodeId) -> bool {
        self.pairs.contains(&EdgeKey::between(a, b))
    }

    pub fn contains_key(&self, key: &EdgeKey) -> bool {
        self.pairs.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EdgeKey> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Keep only the pairs for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&EdgeKey) -> bool) {
        self.pairs.retain(|key| keep(key));
    }

    /// The `blocked_edges` field of an optimize request.
    pub fn to_request_pairs(&self) -> Vec<[NodeId; 2]> {
        self.pairs
            .iter()
            .map(|key| {
                let (a, b) = key.endpoints();
                [a.clone(), b.clone()]
            })
            .collect()
    }

    pub fn from_pairs<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<NodeId>,
        B: Into<NodeId>,
    {
        let mut blocked = Self::new();
        for (a, b) in pairs {
            blocked.insert(a, b);
        }
        blocked
    }
}

impl Serialize for BlockedEdges {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_request_pairs().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BlockedEdges {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs = Vec::<(NodeId, NodeId)>::deserialize(deserializer)?;
        Ok(Self::from_pairs(pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_unordered() {
        let mut blocked = BlockedEdges::new();
        assert!(blocked.insert("B", "A"));
        assert!(!blocked.insert("A", "B"));
        assert!(blocked.contains(&"A".into(), &"B".into()));
        assert_eq!(blocked.len(), 1);
        assert!(blocked.remove(&"A".into(), &"B".into()));
        assert!(blocked.is_empty());
    }

    #[test]
    fn self_loops_are_ignored() {
        let mut blocked = BlockedEdges::new();
        assert!(!blocked.insert("A", "A"));
        assert!(blocked.is_empty());
    }

    #[test]
    fn retain_drops_pairs_touching_a_node() {
        let mut blocked = BlockedEdges::from_pairs([("A", "B"), ("B", "C"), ("C", "D")]);
        let gone = NodeId::from("B");
        blocked.retain(|key| !key.contains(&gone));
        assert_eq!(blocked.len(), 1);
        assert!(blocked.contains(&"D".into(), &"C".into()));
    }

    #[test]
    fn serializes_as_request_pairs() {
        let blocked = BlockedEdges::from_pairs([("C", "B"), ("A", "B")]);
        assert_eq!(
            serde_json::to_string(&blocked).unwrap(),
            r#"[["A","B"],["B","C"]]"#
        );
        let back: BlockedEdges = serde_json::from_str(r#"[["B","A"],["C","B"]]"#).unwrap();
        assert_eq!(back, blocked);
    }
}
