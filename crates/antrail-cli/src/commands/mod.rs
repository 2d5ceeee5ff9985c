//! CLI command implementations.

pub mod common;
pub mod init;
pub mod graph;
pub mod optimize;
pub mod replay;
pub mod nodes;
