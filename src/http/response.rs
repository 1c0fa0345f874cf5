//! Error responses.
//!
//! # Design Decisions
//! - Every failure is a JSON body with a stable `error` kind
//! - Upstream failures are 502, upstream timeouts 504
//! - The upstream status is echoed when the upstream answered

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::bridge::BridgeError;

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

impl ErrorBody {
    pub fn new(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            upstream_status: None,
        }
    }
}

impl From<&BridgeError> for ErrorBody {
    fn from(e: &BridgeError) -> Self {
        Self {
            error: e.kind(),
            message: e.to_string(),
            upstream_status: e.upstream_status(),
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorBody::from(&self))).into_response()
    }
}

/// Fallback for unknown routes.
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new("not_found", "no such route")),
    )
        .into_response()
}
