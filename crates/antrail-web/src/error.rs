//! Mapping of playback and client errors onto HTTP responses.

use antrail::prelude::{AntrailError, ClientError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    Playback(AntrailError),
    Client(ClientError),
    BadRequest(String),
    /// The playback worker has shut down.
    Unavailable,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Playback(AntrailError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            ApiError::Playback(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Client(ClientError::Ingest(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Client(ClientError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Client(_) => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Playback(e) => write!(f, "{}", e),
            ApiError::Client(e) => write!(f, "{}", e),
            ApiError::BadRequest(msg) => f.write_str(msg),
            ApiError::Unavailable => f.write_str("playback worker is not running"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AntrailError> for ApiError {
    fn from(e: AntrailError) -> Self {
        ApiError::Playback(e)
    }
}

impl From<ClientError> for ApiError {
    fn from(e: ClientError) -> Self {
        ApiError::Client(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antrail::prelude::ValidationError;

    #[test]
    fn statuses_follow_the_error_kind() {
        let conflict = ApiError::from(AntrailError::invalid_transition("stop", "idle"));
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let invalid = ApiError::from(AntrailError::Validation(ValidationError::UnknownNode(
            "Z".into(),
        )));
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let upstream = ApiError::from(ClientError::Timeout(30));
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
    }
}
