//! Inbound request deadline.
//!
//! Backstop behind the upstream timeout: a request still running after
//! `timeouts.request_secs` is answered with a JSON 504 like every other
//! failure.

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::http::request::RequestIdExt;
use crate::http::response::ErrorBody;
use crate::observability::metrics;

/// Error kind reported when the backstop fires.
pub const REQUEST_TIMEOUT_KIND: &str = "request_timeout";

pub async fn enforce_deadline(
    State(limit): State<Duration>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let request_id = request.headers().request_id().to_string();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::error!(
                request_id = %request_id,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request exceeded the inbound deadline"
            );
            metrics::record_request(StatusCode::GATEWAY_TIMEOUT.as_u16(), start);
            deadline_exceeded(limit)
        }
    }
}

fn deadline_exceeded(limit: Duration) -> Response {
    (
        StatusCode::GATEWAY_TIMEOUT,
        Json(ErrorBody::new(
            REQUEST_TIMEOUT_KIND,
            format!("request not completed within {limit:?}"),
        )),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::header::CONTENT_TYPE, middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;

    fn app(limit: Duration) -> Router {
        Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .route("/fast", get(|| async { "ok" }))
            .layer(from_fn_with_state(limit, enforce_deadline))
    }

    #[tokio::test]
    async fn test_slow_request_gets_json_504() {
        let response = app(Duration::from_millis(50))
            .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], REQUEST_TIMEOUT_KIND);
        assert!(json["message"].as_str().unwrap().contains("50ms"));
    }

    #[tokio::test]
    async fn test_fast_request_passes_through() {
        let response = app(Duration::from_secs(1))
            .oneshot(Request::get("/fast").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
