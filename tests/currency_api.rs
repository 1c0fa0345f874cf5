//! End-to-end behaviour of `GET /api/currency` against a mock SOAP upstream.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

use currency_bridge::bridge::date::FixedClock;
use currency_bridge::HttpServer;

mod common;

fn expected_rates() -> Value {
    json!([
        {
            "Vname": "Австралийский доллар",
            "Vnom": 1,
            "Vcurs": 47.5627,
            "Vcode": 36,
            "VchCode": "AUD",
            "VunitRate": 47.5627
        },
        {
            "Vname": "Доллар США",
            "Vnom": 1,
            "Vcurs": 69.8947,
            "Vcode": 840,
            "VchCode": "USD",
            "VunitRate": 69.8947
        },
        {
            "Vname": "Японских иен",
            "Vnom": 100,
            "Vcurs": 53.2468,
            "Vcode": 392,
            "VchCode": "JPY",
            "VunitRate": 0.532468
        }
    ])
}

#[tokio::test]
async fn test_rates_for_explicit_date() {
    let upstream = common::start_mock_upstream(200, common::FIXTURE).await;
    let bridge = common::start_bridge(common::test_config(upstream.url())).await;

    let res = common::client()
        .get(bridge.url("/api/currency?date=2023-01-10"))
        .send()
        .await
        .expect("Bridge unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.headers()["x-rates-date"], "2023-01-10");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, expected_rates());

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1, "Exactly one upstream call per request");
    let soap = &requests[0];
    assert_eq!(
        soap.request_line(),
        "POST /DailyInfoWebServ/DailyInfo.asmx HTTP/1.1"
    );
    assert_eq!(soap.header("content-type"), Some("text/xml; charset=utf-8"));
    assert_eq!(
        soap.header("soapaction"),
        Some("http://web.cbr.ru/GetCursOnDate")
    );
    assert!(soap.body.contains("<On_date>2023-01-10</On_date>"));
    assert!(soap.body.contains(r#"<GetCursOnDate xmlns="http://web.cbr.ru/">"#));
}

#[tokio::test]
async fn test_missing_date_defaults_to_today() {
    let upstream = common::start_mock_upstream(200, common::FIXTURE).await;
    let clock = Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
    let bridge =
        common::start_bridge_with_clock(common::test_config(upstream.url()), clock).await;

    let res = common::client()
        .get(bridge.url("/api/currency"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-rates-date"], "2024-03-01");
    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].body.contains("<On_date>2024-03-01</On_date>"));
}

#[tokio::test]
async fn test_date_is_forwarded_unvalidated_by_default() {
    let upstream = common::start_mock_upstream(200, common::FIXTURE).await;
    let bridge = common::start_bridge(common::test_config(upstream.url())).await;

    let res = common::client()
        .get(bridge.url("/api/currency"))
        .query(&[("date", "2023-02-31")])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(upstream.requests()[0]
        .body
        .contains("<On_date>2023-02-31</On_date>"));
}

#[tokio::test]
async fn test_empty_date_is_forwarded_as_given() {
    let upstream = common::start_mock_upstream(200, common::FIXTURE).await;
    let clock = Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
    let bridge =
        common::start_bridge_with_clock(common::test_config(upstream.url()), clock).await;

    let res = common::client()
        .get(bridge.url("/api/currency?date="))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-rates-date"], "");
    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].body.contains("<On_date></On_date>"));
    assert!(!requests[0].body.contains("2024-03-01"));
}

#[tokio::test]
async fn test_identical_requests_give_identical_bodies() {
    let upstream = common::start_mock_upstream(200, common::FIXTURE).await;
    let bridge = common::start_bridge(common::test_config(upstream.url())).await;
    let client = common::client();

    let mut bodies = Vec::new();
    for _ in 0..3 {
        let res = client
            .get(bridge.url("/api/currency?date=2023-01-10"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        bodies.push(res.bytes().await.unwrap());
    }

    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[1], bodies[2]);
    assert_eq!(upstream.call_count(), 3);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let upstream = common::start_mock_upstream(200, common::FIXTURE).await;
    let bridge = common::start_bridge(common::test_config(upstream.url())).await;
    let client = common::client();

    let res = client
        .get(bridge.url("/api/currency?date=2023-01-10"))
        .header("x-request-id", "trace-me-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me-42");

    let res = client.get(bridge.url("/health")).send().await.unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}

#[tokio::test]
async fn test_health_does_not_call_upstream() {
    let upstream = common::start_mock_upstream(200, common::FIXTURE).await;
    let bridge = common::start_bridge(common::test_config(upstream.url())).await;

    let res = common::client()
        .get(bridge.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
    assert_eq!(upstream.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_route_and_method() {
    let config = common::test_config("http://127.0.0.1:9/DailyInfo.asmx".into());
    let app = HttpServer::new(config).unwrap().router();

    let res = app
        .clone()
        .oneshot(Request::get("/api/rates").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.headers().contains_key("x-request-id"));

    let res = app
        .oneshot(
            Request::post("/api/currency")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}
