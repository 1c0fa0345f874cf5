//! Per-request orchestration.
//!
//! # States
//! ```text
//! RECEIVED → DATE_RESOLVED → ENVELOPE_BUILT → UPSTREAM_CALLED → TRANSLATED → RESPONDED
//!     any step ──failure──▶ FAILED
//! ```
//!
//! Nothing external is mutated before the upstream call, so a failure needs
//! no rollback. One request makes at most one upstream call.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;

use crate::bridge::date::{self, Clock, SystemClock};
use crate::bridge::envelope::build_envelope;
use crate::bridge::error::BridgeError;
use crate::bridge::translate::translate;
use crate::bridge::upstream::{UpstreamClient, UpstreamError};
use crate::config::BridgeConfig;
use crate::observability::metrics;

/// Query parameters of `GET /api/currency`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestParameters {
    pub date: Option<String>,
}

/// Request lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    DateResolved,
    EnvelopeBuilt,
    UpstreamCalled,
    Translated,
    Responded,
    Failed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Received => "RECEIVED",
            Stage::DateResolved => "DATE_RESOLVED",
            Stage::EnvelopeBuilt => "ENVELOPE_BUILT",
            Stage::UpstreamCalled => "UPSTREAM_CALLED",
            Stage::Translated => "TRANSLATED",
            Stage::Responded => "RESPONDED",
            Stage::Failed => "FAILED",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translated upstream answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Translated {
    /// The `On_date` actually sent upstream.
    pub date: String,
    /// JSON array of rate records.
    pub rates: Value,
}

/// A failed request and the last stage it reached.
#[derive(Debug)]
pub struct Failure {
    pub stage: Stage,
    pub error: BridgeError,
}

/// Runs the translation pipeline. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct BridgeHandler {
    upstream: UpstreamClient,
    clock: Arc<dyn Clock>,
    strict_dates: bool,
}

impl BridgeHandler {
    pub fn new(upstream: UpstreamClient, clock: Arc<dyn Clock>, strict_dates: bool) -> Self {
        Self {
            upstream,
            clock,
            strict_dates,
        }
    }

    /// Build a handler from configuration with the system clock.
    pub fn from_config(config: &BridgeConfig) -> Result<Self, UpstreamError> {
        Ok(Self::new(
            UpstreamClient::new(&config.upstream)?,
            Arc::new(SystemClock),
            config.validation.strict_dates,
        ))
    }

    /// Replace the clock, e.g. to pin "today" in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run one request through the pipeline.
    pub async fn handle(
        &self,
        params: &RequestParameters,
        request_id: &str,
    ) -> Result<Translated, Failure> {
        let mut stage = Stage::Received;
        let fail = |stage: Stage, error: BridgeError| {
            tracing::warn!(
                request_id = %request_id,
                stage = %stage,
                kind = error.kind(),
                upstream_status = error.upstream_status(),
                error = %error,
                "Request {}",
                Stage::Failed
            );
            Failure { stage, error }
        };

        let date = date::resolve(params.date.as_deref(), self.clock.as_ref());
        if self.strict_dates && !date::is_canonical(&date) {
            return Err(fail(
                stage,
                BridgeError::InvalidRequestParameter {
                    name: "date",
                    reason: format!("'{date}' is not a calendar date in yyyy-MM-dd form"),
                },
            ));
        }
        stage = advance(stage, Stage::DateResolved, request_id);

        let envelope = build_envelope(&date);
        stage = advance(stage, Stage::EnvelopeBuilt, request_id);

        let started = Instant::now();
        let response = match self.upstream.invoke(&envelope).await {
            Ok(response) => {
                metrics::record_upstream_call("ok", started);
                response
            }
            Err(e) => {
                metrics::record_upstream_call(upstream_outcome(&e), started);
                return Err(fail(stage, e.into()));
            }
        };
        stage = advance(stage, Stage::UpstreamCalled, request_id);

        let rates = translate(&response.body).map_err(|e| fail(stage, e.into()))?;
        advance(stage, Stage::Translated, request_id);

        Ok(Translated { date, rates })
    }
}

impl fmt::Debug for BridgeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeHandler")
            .field("upstream", &self.upstream)
            .field("strict_dates", &self.strict_dates)
            .finish()
    }
}

fn advance(from: Stage, to: Stage, request_id: &str) -> Stage {
    tracing::debug!(request_id = %request_id, from = %from, to = %to, "Stage transition");
    to
}

fn upstream_outcome(e: &UpstreamError) -> &'static str {
    match e {
        UpstreamError::Timeout(_) => "timeout",
        UpstreamError::Rejected { .. } => "rejected",
        UpstreamError::TooLarge(_) => "oversized",
        UpstreamError::Unreachable(_) | UpstreamError::Client(_) => "unreachable",
    }
}
