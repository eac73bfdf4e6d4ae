//! JSON HTTP API over the analysis service.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::domain::settings::AnalysisSettings;
use crate::ports::data_port::MarketDataPort;

pub struct AppState {
    pub data_port: Arc<dyn MarketDataPort + Send + Sync>,
    pub settings: Arc<AnalysisSettings>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/tickers", get(handlers::tickers))
        .route("/api/analysis/{ticker}", get(handlers::analysis))
        .route("/api/indicators/{ticker}", get(handlers::indicators))
        .route("/api/market", get(handlers::market))
        .route("/api/portfolio", get(handlers::portfolio))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
