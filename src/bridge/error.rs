//! Bridge error taxonomy.

use axum::http::StatusCode;
use thiserror::Error;

use crate::bridge::translate::TranslateError;
use crate::bridge::upstream::UpstreamError;

/// Terminal failure of one bridged request.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Request parameter rejected before any upstream call.
    #[error("invalid value for '{name}': {reason}")]
    InvalidRequestParameter { name: &'static str, reason: String },

    /// Connection failure or timeout talking to the upstream.
    #[error("{message}")]
    UpstreamUnreachable { message: String, timed_out: bool },

    /// Upstream answered with a non-2xx status.
    #[error("upstream returned HTTP {status}: {detail}")]
    UpstreamRejected { status: u16, detail: String },

    /// Upstream body could not be translated.
    #[error("malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),
}

impl BridgeError {
    /// HTTP status returned to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::InvalidRequestParameter { .. } => StatusCode::BAD_REQUEST,
            BridgeError::UpstreamUnreachable { timed_out: true, .. } => StatusCode::GATEWAY_TIMEOUT,
            BridgeError::UpstreamUnreachable { timed_out: false, .. }
            | BridgeError::UpstreamRejected { .. }
            | BridgeError::MalformedUpstreamResponse(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::InvalidRequestParameter { .. } => "invalid_request_parameter",
            BridgeError::UpstreamUnreachable { timed_out: true, .. } => "upstream_timeout",
            BridgeError::UpstreamUnreachable { timed_out: false, .. } => "upstream_unreachable",
            BridgeError::UpstreamRejected { .. } => "upstream_rejected",
            BridgeError::MalformedUpstreamResponse(_) => "malformed_upstream_response",
        }
    }

    /// Upstream HTTP status, when the upstream answered with an error.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            BridgeError::UpstreamRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<UpstreamError> for BridgeError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Timeout(_) => BridgeError::UpstreamUnreachable {
                message: e.to_string(),
                timed_out: true,
            },
            UpstreamError::Unreachable(_) | UpstreamError::Client(_) => {
                BridgeError::UpstreamUnreachable {
                    message: e.to_string(),
                    timed_out: false,
                }
            }
            UpstreamError::Rejected { status, detail } => {
                BridgeError::UpstreamRejected { status, detail }
            }
            UpstreamError::TooLarge(_) => BridgeError::MalformedUpstreamResponse(e.to_string()),
        }
    }
}

impl From<TranslateError> for BridgeError {
    fn from(e: TranslateError) -> Self {
        BridgeError::MalformedUpstreamResponse(e.to_string())
    }
}
