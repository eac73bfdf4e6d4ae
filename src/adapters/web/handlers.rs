//! HTTP request handlers for the web adapter.
//!
//! The data port is blocking, so every analysis runs on tokio's blocking pool.

use axum::{
    extract::{Path, Query, State},
    http::Uri,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::error::AnalyzerError;
use crate::domain::market::MarketOverview;
use crate::domain::period::Period;
use crate::domain::recommendation::RiskProfile;
use crate::domain::settings::DEFAULT_CAPITAL;
use crate::service::{self, IndicatorReport, PortfolioReport, StockReport};

use super::{AppState, WebError};

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisQuery {
    pub period: Option<String>,
    pub risk_profile: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IndicatorQuery {
    pub period: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarketQuery {
    pub risk_profile: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PortfolioQuery {
    pub capital: Option<f64>,
    pub risk_profile: Option<String>,
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TickerList {
    pub index: String,
    pub tickers: Vec<String>,
}

fn parse_period(raw: Option<&str>) -> Result<Period, AnalyzerError> {
    raw.map_or(Ok(Period::default()), str::parse)
}

fn parse_profile(raw: Option<&str>) -> Result<RiskProfile, AnalyzerError> {
    raw.map_or(Ok(RiskProfile::default()), str::parse)
}

async fn run_blocking<T, F>(state: Arc<AppState>, f: F) -> Result<T, WebError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, AnalyzerError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| WebError::internal(format!("analysis task failed: {}", e)))?
        .map_err(WebError::from)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn tickers(State(state): State<Arc<AppState>>) -> Json<TickerList> {
    Json(TickerList {
        index: state.settings.universe.index.clone(),
        tickers: state.settings.universe.tickers.clone(),
    })
}

pub async fn analysis(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<StockReport>, WebError> {
    let period = parse_period(query.period.as_deref())?;
    let profile = parse_profile(query.risk_profile.as_deref())?;
    let ticker = ticker.trim().to_uppercase();

    let report = run_blocking(state, move |s| {
        service::analyze_ticker(&*s.data_port, &s.settings, &ticker, period, profile)
    })
    .await?;
    Ok(Json(report))
}

pub async fn indicators(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(query): Query<IndicatorQuery>,
) -> Result<Json<IndicatorReport>, WebError> {
    let period = parse_period(query.period.as_deref())?;
    let ticker = ticker.trim().to_uppercase();

    let report = run_blocking(state, move |s| {
        service::indicator_report(&*s.data_port, &s.settings, &ticker, period)
    })
    .await?;
    Ok(Json(report))
}

pub async fn market(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MarketQuery>,
) -> Result<Json<MarketOverview>, WebError> {
    let profile = parse_profile(query.risk_profile.as_deref())?;

    let overview = run_blocking(state, move |s| {
        Ok(service::market_overview(&*s.data_port, &s.settings, profile))
    })
    .await?;
    Ok(Json(overview))
}

pub async fn portfolio(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PortfolioQuery>,
) -> Result<Json<PortfolioReport>, WebError> {
    let period = parse_period(query.period.as_deref())?;
    let profile = parse_profile(query.risk_profile.as_deref())?;
    let capital = query.capital.unwrap_or(DEFAULT_CAPITAL);

    let report = run_blocking(state, move |s| {
        service::build_portfolio(&*s.data_port, &s.settings, capital, profile, period)
    })
    .await?;
    Ok(Json(report))
}

pub async fn not_found(uri: Uri) -> WebError {
    WebError::not_found(format!("no route for {}", uri.path()))
}
