//! API error types.

use amora_game::GameError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Hard failures of a request. Gating refusals never come through here —
/// they are regular responses with `success: false`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request data.
    #[error("{0}")]
    Validation(String),

    /// Not logged in, bad token, or bad credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Logged in, but not allowed here.
    #[error("access denied")]
    Forbidden,

    /// A referenced resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Database or other infrastructure failure. The detail is logged, not
    /// echoed to the client.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::NotFound(what) => Self::NotFound(what),
            GameError::Invalid(message) => Self::Validation(message),
            GameError::Db(e) => Self::Internal(e),
            GameError::Sqlite(e) => Self::Internal(e.into()),
        }
    }
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Internal(e) => {
                error!("internal error: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let message = match &self {
            Self::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: code, message })).into_response()
    }
}
