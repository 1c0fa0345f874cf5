//! Outbound SOAP call.
//!
//! # Responsibilities
//! - POST the envelope with the SOAP transport headers
//! - Bound the whole exchange (connect, send, body) with a deadline
//! - Report timeouts, transport failures and non-2xx statuses distinctly
//!
//! # Design Decisions
//! - One pooled `reqwest::Client` shared by all requests
//! - Exactly one attempt per call; no retries
//! - Body size is capped while streaming
//! - A non-2xx status is reported as such whatever the body size

use std::time::{Duration, Instant};

use axum::body::Bytes;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::time::timeout;

use crate::bridge::envelope::{SoapEnvelope, SOAP_ACTION};
use crate::bridge::translate::find_fault;
use crate::config::UpstreamConfig;

/// Content type of SOAP 1.1 requests.
pub const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Header naming the invoked operation.
pub const SOAP_ACTION_HEADER: &str = "SOAPAction";

/// Longest upstream body excerpt kept for diagnostics.
const EXCERPT_LEN: usize = 256;

/// Errors from the upstream exchange.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No response within the configured deadline.
    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, reset, etc.
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// Upstream answered with a non-2xx status.
    #[error("upstream returned HTTP {status}: {detail}")]
    Rejected { status: u16, detail: String },

    /// Body exceeded `max_response_bytes`.
    #[error("upstream response exceeds {0} bytes")]
    TooLarge(usize),

    #[error("failed to build upstream client: {0}")]
    Client(String),
}

/// A successful (2xx) upstream answer.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// HTTP client bound to the configured SOAP endpoint.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    url: String,
    deadline: Duration,
    max_body: usize,
}

impl UpstreamClient {
    /// Create a client from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.as_str())
            .no_proxy()
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            deadline: config.request_timeout(),
            max_body: config.max_response_bytes,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `envelope` and return the raw body of a 2xx response.
    pub async fn invoke(&self, envelope: &SoapEnvelope) -> Result<UpstreamResponse, UpstreamError> {
        let started = Instant::now();
        let result = match timeout(self.deadline, self.exchange(envelope)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(self.deadline)),
        };

        match &result {
            Ok(response) => tracing::debug!(
                url = %self.url,
                status = %response.status,
                bytes = response.body.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Upstream call completed"
            ),
            Err(e) => tracing::warn!(
                url = %self.url,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Upstream call failed"
            ),
        }
        result
    }

    async fn exchange(&self, envelope: &SoapEnvelope) -> Result<UpstreamResponse, UpstreamError> {
        let mut response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, HeaderValue::from_static(SOAP_CONTENT_TYPE))
            .header(SOAP_ACTION_HEADER, HeaderValue::from_static(SOAP_ACTION))
            .body(envelope.as_str().to_owned())
            .send()
            .await
            .map_err(|e| transport_error(&e, self.deadline))?;

        let status = response.status();
        if !status.is_success() {
            // The cap only bounds what is kept for diagnostics here.
            let body = read_capped(&mut response, self.max_body, self.deadline)
                .await
                .map(|(body, _)| body)
                .unwrap_or_default();
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
                detail: rejection_detail(status, &body),
            });
        }

        if let Some(len) = response.content_length() {
            if len > self.max_body as u64 {
                return Err(UpstreamError::TooLarge(self.max_body));
            }
        }
        let (body, truncated) = read_capped(&mut response, self.max_body, self.deadline).await?;
        if truncated {
            return Err(UpstreamError::TooLarge(self.max_body));
        }

        Ok(UpstreamResponse {
            status,
            body: Bytes::from(body),
        })
    }
}

/// Read at most `limit` bytes of the body; the flag reports a longer body.
async fn read_capped(
    response: &mut reqwest::Response,
    limit: usize,
    deadline: Duration,
) -> Result<(Vec<u8>, bool), UpstreamError> {
    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| transport_error(&e, deadline))?
    {
        let room = limit - body.len();
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            return Ok((body, true));
        }
        body.extend_from_slice(&chunk);
    }
    Ok((body, false))
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("url", &self.url)
            .field("deadline", &self.deadline)
            .field("max_body", &self.max_body)
            .finish()
    }
}

fn transport_error(e: &reqwest::Error, deadline: Duration) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Timeout(deadline)
    } else {
        UpstreamError::Unreachable(e.to_string())
    }
}

/// Prefer the SOAP faultstring, fall back to a short body excerpt.
fn rejection_detail(status: StatusCode, body: &[u8]) -> String {
    if let Some(fault) = find_fault(body) {
        return fault.to_string();
    }
    let text = String::from_utf8_lossy(body);
    let excerpt: String = text.trim().chars().take(EXCERPT_LEN).collect();
    if excerpt.is_empty() {
        status.canonical_reason().unwrap_or("no body").to_string()
    } else {
        excerpt
    }
}
