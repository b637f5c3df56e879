//! Error types for the gateway.
//!
//! [`GatewayError`] unifies every failure a request can hit into a single
//! enum that converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode as HttpStatus;
use axum::response::{IntoResponse, Response};
use opcsim_types::{NodeIdParseError, StatusCode};

/// Errors that can occur while serving a gateway request.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The requested node does not exist, or is not the kind of node the
    /// route expects.
    #[error("not found: {0}")]
    NotFound(String),

    /// The node id in the request path could not be parsed.
    #[error("invalid node id: {0}")]
    InvalidNodeId(#[from] NodeIdParseError),

    /// The address space refused a write.
    #[error("write rejected: {0}")]
    Rejected(StatusCode),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// The HTTP status this error is reported with.
    pub const fn http_status(&self) -> HttpStatus {
        match self {
            Self::NotFound(_) => HttpStatus::NOT_FOUND,
            Self::InvalidNodeId(_) => HttpStatus::BAD_REQUEST,
            Self::Rejected(status) => match status {
                StatusCode::BadNodeIdUnknown => HttpStatus::NOT_FOUND,
                StatusCode::BadNotWritable | StatusCode::BadNotReadable => HttpStatus::FORBIDDEN,
                StatusCode::BadTypeMismatch => HttpStatus::UNPROCESSABLE_ENTITY,
                StatusCode::Good | StatusCode::BadInternalError => {
                    HttpStatus::INTERNAL_SERVER_ERROR
                }
            },
            Self::Internal(_) => HttpStatus::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let mut body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        if let Self::Rejected(code) = &self {
            body["statusCode"] = serde_json::json!(code.name());
        }

        (status, axum::Json(body)).into_response()
    }
}
