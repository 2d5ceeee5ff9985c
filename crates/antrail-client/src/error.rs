//! Client error types.

use antrail_core::error::AntrailError;
use thiserror::Error;

/// Errors talking to the graph service or the router.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The response arrived but failed validation.
    #[error(transparent)]
    Ingest(#[from] AntrailError),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub(crate) fn from_reqwest(e: reqwest::Error, endpoint: &str, timeout_secs: u64) -> Self {
        if e.is_connect() {
            ClientError::ConnectionFailed(format!(
                "cannot reach {}. Is the service running?",
                endpoint
            ))
        } else if e.is_timeout() {
            ClientError::Timeout(timeout_secs)
        } else {
            ClientError::InvalidResponse(e.to_string())
        }
    }

    /// Whether the remote end was unreachable or failed, as opposed to
    /// answering with something unusable.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ClientError::ConnectionFailed(_) | ClientError::Timeout(_) | ClientError::Api { .. }
        )
    }
}
