//! Helpers shared by the service-backed commands.

use anyhow::{bail, Context, Result};
use antrail::prelude::*;

use crate::config::Config;

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to start async runtime")
}

pub fn service_client(config: &Config) -> Result<GraphServiceClient> {
    GraphServiceClient::new(config.service.clone())
        .with_context(|| format!("Cannot use service at {}", config.service.url))
}

/// Parse `--block` values. Both `A-B` and `A,B` are accepted; the comma
/// form is for node ids that contain dashes.
pub fn parse_blocked(specs: &[String]) -> Result<BlockedEdges> {
    let mut blocked = BlockedEdges::new();
    for raw in specs {
        let (a, b) = raw
            .split_once(',')
            .or_else(|| raw.split_once('-'))
            .map(|(a, b)| (a.trim(), b.trim()))
            .filter(|(a, b)| !a.is_empty() && !b.is_empty())
            .with_context(|| format!("Cannot read blocked edge {:?}, expected A-B", raw))?;
        if a == b {
            bail!("Blocked edge {:?} joins a node to itself", raw);
        }
        blocked.insert(NodeId::from(a), NodeId::from(b));
    }
    Ok(blocked)
}

pub fn format_path(path: &[NodeId]) -> String {
    path.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(" → ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_edges_accept_both_separators() {
        let blocked = parse_blocked(&["A-B".into(), "node-1,node-2".into()]).unwrap();
        assert_eq!(blocked.len(), 2);
        assert!(blocked.contains(&"B".into(), &"A".into()));
        assert!(blocked.contains(&"node-1".into(), &"node-2".into()));
    }

    #[test]
    fn malformed_blocked_edges_are_rejected() {
        assert!(parse_blocked(&["AB".into()]).is_err());
        assert!(parse_blocked(&["A-".into()]).is_err());
        assert!(parse_blocked(&["A-A".into()]).is_err());
    }

    #[test]
    fn paths_read_left_to_right() {
        let path: Vec<NodeId> = vec!["A".into(), "B".into(), "C".into()];
        assert_eq!(format_path(&path), "A → B → C");
    }
}
