#![allow(dead_code)]

use chrono::NaiveDate;
pub use ihsg_analyzer::domain::company::CompanyInfo;
use ihsg_analyzer::domain::error::AnalyzerError;
pub use ihsg_analyzer::domain::ohlcv::OhlcvBar;
use ihsg_analyzer::domain::period::Period;
use ihsg_analyzer::domain::settings::AnalysisSettings;
use ihsg_analyzer::ports::data_port::MarketDataPort;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub companies: HashMap<String, CompanyInfo>,
    pub errors: HashMap<String, String>,
    pub company_errors: HashMap<String, String>,
    pub calls: Mutex<Vec<(String, Period)>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            companies: HashMap::new(),
            errors: HashMap::new(),
            company_errors: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_company(mut self, info: CompanyInfo) -> Self {
        self.companies.insert(info.ticker.clone(), info);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn with_company_error(mut self, ticker: &str, reason: &str) -> Self {
        self.company_errors
            .insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn periods_for(&self, ticker: &str) -> Vec<Period> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == ticker)
            .map(|(_, p)| *p)
            .collect()
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch_ohlcv(&self, ticker: &str, period: Period) -> Result<Vec<OhlcvBar>, AnalyzerError> {
        self.calls
            .lock()
            .unwrap()
            .push((ticker.to_string(), period));
        if let Some(reason) = self.errors.get(ticker) {
            return Err(AnalyzerError::data_source(reason.clone()));
        }
        Ok(self.data.get(ticker).cloned().unwrap_or_default())
    }

    fn fetch_company_info(&self, ticker: &str) -> Result<Option<CompanyInfo>, AnalyzerError> {
        if let Some(reason) = self.company_errors.get(ticker) {
            return Err(AnalyzerError::data_source(reason.clone()));
        }
        Ok(self.companies.get(ticker).cloned())
    }
}

/// `count` daily bars compounding by `daily_pct` percent from `start_price`.
/// Highs and lows sit 1% either side of the close.
pub fn generate_bars(ticker: &str, start: &str, count: usize, start_price: f64, daily_pct: f64) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    let mut close = start_price;
    (0..count)
        .map(|i| {
            let open = close;
            close *= 1.0 + daily_pct / 100.0;
            OhlcvBar {
                ticker: ticker.to_string(),
                date: start + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume: 1_000_000 + (i as i64 % 7) * 50_000,
            }
        })
        .collect()
}

pub fn uptrend(ticker: &str, count: usize) -> Vec<OhlcvBar> {
    generate_bars(ticker, "2024-01-01", count, 5000.0, 1.0)
}

pub fn downtrend(ticker: &str, count: usize) -> Vec<OhlcvBar> {
    generate_bars(ticker, "2024-01-01", count, 5000.0, -1.0)
}

/// Cheap, profitable, lightly levered company paying a dividend.
pub fn strong_company(ticker: &str) -> CompanyInfo {
    CompanyInfo {
        name: Some(format!("{} Tbk", ticker.trim_end_matches(".JK"))),
        sector: Some("Consumer Defensive".to_string()),
        industry: Some("Packaged Foods".to_string()),
        market_cap: Some(150_000_000_000_000.0),
        pe_ratio: Some(8.0),
        pb_ratio: Some(1.0),
        dividend_yield: Some(4.0),
        roe: Some(22.0),
        debt_to_equity: Some(0.3),
        revenue: Some(100_000_000_000_000.0),
        net_income: Some(25_000_000_000_000.0),
        book_value: Some(4000.0),
        eps: Some(500.0),
        beta: Some(0.7),
        ..CompanyInfo::new(ticker)
    }
}

/// Defaults with no request delay and a small universe.
pub fn test_settings(tickers: &[&str]) -> AnalysisSettings {
    let mut settings = AnalysisSettings::default();
    settings.data.request_delay = Duration::ZERO;
    settings.data.cache_path = None;
    settings.universe.tickers = tickers.iter().map(|t| t.to_string()).collect();
    settings
}
