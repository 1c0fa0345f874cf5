//! `GET /api/currency` and `GET /health`.

use std::time::Instant;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::bridge::{BridgeError, RequestParameters, Stage, Translated};
use crate::http::request::RequestIdExt;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Response header naming the date the rates apply to.
pub const X_RATES_DATE: &str = "x-rates-date";

/// Translate one REST call into one `GetCursOnDate` SOAP call.
pub async fn get_currency(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<RequestParameters>, QueryRejection>,
) -> Response {
    let start = Instant::now();
    let request_id = headers.request_id();

    let response = match query {
        Ok(Query(params)) => match state.bridge.handle(&params, request_id).await {
            Ok(translated) => {
                tracing::info!(
                    request_id = %request_id,
                    date = %translated.date,
                    records = translated.rates.as_array().map_or(0, Vec::len),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Request {}",
                    Stage::Responded
                );
                rates_response(translated)
            }
            Err(failure) => failure.error.into_response(),
        },
        Err(rejection) => {
            tracing::warn!(request_id = %request_id, error = %rejection, "Rejected query string");
            BridgeError::InvalidRequestParameter {
                name: "query",
                reason: rejection.body_text(),
            }
            .into_response()
        }
    };

    metrics::record_request(response.status().as_u16(), start);
    response
}

fn rates_response(translated: Translated) -> Response {
    let mut response = (StatusCode::OK, Json(translated.rates)).into_response();
    if let Ok(value) = HeaderValue::from_str(&translated.date) {
        response.headers_mut().insert(X_RATES_DATE, value);
    }
    response
}

/// Liveness check. Does not touch the upstream.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
