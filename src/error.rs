//! Hub error types with HTTP status code mapping.
//!
//! [`HubError`] is the central error type for the hub. Most variants stay
//! inside the task that produced them (a client read loop or the pool
//! control loop) and end up as a log line; handshake rejections are turned
//! into a structured JSON response for the HTTP caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "origin not allowed: https://evil.example"
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Hub error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status               |
/// |-----------|-------------------|---------------------------|
/// | 1000–1999 | Handshake/Request | 403 Forbidden             |
/// | 2000–2999 | Payload           | 400 Bad Request           |
/// | 3000–3999 | Server/Transport  | 500 / 503                 |
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The request origin is not on the allow-list.
    #[error("origin not allowed: {0}")]
    OriginRejected(String),

    /// Inbound payload is not a valid JSON object.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A field required on the current path is missing or has the wrong type.
    #[error("invalid field `{0}`")]
    InvalidField(&'static str),

    /// Outbound envelope could not be encoded.
    #[error("serialize error: {0}")]
    Serialize(String),

    /// Read or write fault on the underlying connection.
    #[error("transport error: {0}")]
    Transport(String),

    /// The connection was already closed, by the peer or by
    /// [`ConnectionWriter::close`](crate::domain::ConnectionWriter::close).
    #[error("connection closed")]
    ConnectionClosed,

    /// The pool control loop has stopped and no longer services requests.
    #[error("pool stopped")]
    PoolStopped,
}

impl HubError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::OriginRejected(_) => 1001,
            Self::Decode(_) => 2001,
            Self::InvalidField(_) => 2002,
            Self::Serialize(_) => 3001,
            Self::Transport(_) => 3002,
            Self::ConnectionClosed => 3003,
            Self::PoolStopped => 3004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::OriginRejected(_) => StatusCode::FORBIDDEN,
            Self::Decode(_) | Self::InvalidField(_) => StatusCode::BAD_REQUEST,
            Self::PoolStopped => StatusCode::SERVICE_UNAVAILABLE,
            Self::Serialize(_) | Self::Transport(_) | Self::ConnectionClosed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<axum::Error> for HubError {
    fn from(err: axum::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
