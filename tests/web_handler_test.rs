#![cfg(feature = "web")]
//! HTTP API tests driven through the router with `tower::ServiceExt`.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use ihsg_analyzer::adapters::web::{build_router, AppState};
use ihsg_analyzer::domain::settings::DEFAULT_CAPITAL;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use common::*;

fn create_test_app() -> Router {
    let data_port = MockDataPort::new()
        .with_bars("^JKSE", uptrend("^JKSE", 30))
        .with_bars("BBCA.JK", uptrend("BBCA.JK", 120))
        .with_company(strong_company("BBCA.JK"))
        .with_bars("TLKM.JK", downtrend("TLKM.JK", 120))
        .with_bars("SHORT.JK", uptrend("SHORT.JK", 10))
        .with_error("DOWN.JK", "upstream timeout");

    build_router(AppState {
        data_port: Arc::new(data_port),
        settings: Arc::new(test_settings(&["BBCA.JK", "TLKM.JK"])),
    })
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let response = create_test_app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

mod health_and_tickers {
    use super::*;

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn tickers_lists_universe() {
        let (status, body) = get("/api/tickers").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["index"], "^JKSE");
        assert_eq!(body["tickers"], serde_json::json!(["BBCA.JK", "TLKM.JK"]));
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let (status, body) = get("/api/nothing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("/api/nothing"));
    }
}

mod analysis {
    use super::*;

    #[tokio::test]
    async fn full_report() {
        let (status, body) = get("/api/analysis/bbca.jk?period=6mo&risk_profile=aggressive").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ticker"], "BBCA.JK");
        assert_eq!(body["period"], "6mo");
        assert_eq!(body["technical"]["trend"]["trend"], "BULLISH");
        assert!(body["fundamental"]["score"]["total_score"].as_f64().unwrap() >= 80.0);
        assert_eq!(body["recommendation"]["risk_profile"], "aggressive");
    }

    #[tokio::test]
    async fn without_fundamentals() {
        let (status, body) = get("/api/analysis/TLKM.JK").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["fundamental"].is_null());
        assert_eq!(body["period"], "1y");
    }

    #[tokio::test]
    async fn short_history_still_analyzed() {
        let (status, body) = get("/api/analysis/SHORT.JK").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["technical"]["trend"]["trend"], "UNKNOWN");
        assert_eq!(body["technical"]["signals"]["signal"], "HOLD");
    }

    #[tokio::test]
    async fn bad_period_is_400() {
        let (status, body) = get("/api/analysis/BBCA.JK?period=2w").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("2w"));
    }

    #[tokio::test]
    async fn bad_risk_profile_is_400() {
        let (status, _) = get("/api/analysis/BBCA.JK?risk_profile=yolo").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_ticker_is_404() {
        let (status, body) = get("/api/analysis/XXXX.JK").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("XXXX.JK"));
    }

    #[tokio::test]
    async fn upstream_failure_is_502() {
        let (status, _) = get("/api/analysis/DOWN.JK").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}

mod indicators {
    use super::*;

    #[tokio::test]
    async fn readings_and_levels() {
        let (status, body) = get("/api/indicators/BBCA.JK?period=1y").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bars"], 120);
        assert!(!body["readings"].as_array().unwrap().is_empty());
        assert_eq!(body["fibonacci"]["levels"].as_array().unwrap().len(), 7);
        assert!(body["pivots"]["pivot"].is_number());
    }
}

mod market_and_portfolio {
    use super::*;

    #[tokio::test]
    async fn market_overview() {
        let (status, body) = get("/api/market").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["index"]["symbol"], "^JKSE");
        assert_eq!(body["sentiment"]["total_stocks"], 2);
        assert_eq!(body["comparison"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn portfolio_within_capital() {
        let (status, body) = get("/api/portfolio?capital=50000000&risk_profile=aggressive").await;
        assert_eq!(status, StatusCode::OK);
        let allocated = body["plan"]["total_allocated"].as_f64().unwrap();
        assert!(allocated <= 50_000_000.0);
        assert_eq!(body["plan"]["risk_profile"], "aggressive");
        assert_eq!(body["analyses"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn portfolio_default_capital() {
        let (status, body) = get("/api/portfolio").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plan"]["total_capital"].as_f64(), Some(DEFAULT_CAPITAL));
    }

    #[tokio::test]
    async fn negative_capital_is_400() {
        let (status, _) = get("/api/portfolio?capital=-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
