//! Orchestration shared by the CLI and the web adapter: fetch through a
//! `MarketDataPort`, run the domain analyses and assemble report types.

use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::company::CompanyInfo;
use crate::domain::error::AnalyzerError;
use crate::domain::fundamental::{comprehensive_fundamental_analysis, FundamentalAnalysis};
use crate::domain::indicator::{
    bollinger::mult_x100, calculate_atr, calculate_bollinger, calculate_cci, calculate_ema,
    calculate_ichimoku, calculate_macd, calculate_mfi, calculate_obv, calculate_rsi,
    calculate_sma, calculate_stochastic, calculate_vwap, calculate_williams_r,
    fibonacci_retracements, high_low, pivot_points, FibonacciLevels, IndicatorSeries,
    IndicatorValue, PivotPoints,
};
use crate::domain::market::{
    comparison_row, index_summary, market_sentiment, ComparisonRow, MarketOverview,
};
use crate::domain::ohlcv::{latest_change_pct, OhlcvBar};
use crate::domain::period::Period;
use crate::domain::recommendation::{
    build_portfolio as allocate, generate_recommendation, PortfolioPlan, RiskProfile,
    StockRecommendation,
};
use crate::domain::settings::AnalysisSettings;
use crate::domain::technical::{comprehensive_analysis, TechnicalAnalysis};
use crate::ports::data_port::MarketDataPort;

pub const SENTIMENT_PERIOD: Period = Period::FiveDays;
pub const INDEX_PERIOD: Period = Period::OneMonth;
pub const COMPARE_PERIOD: Period = Period::ThreeMonths;
/// A report needs at least a latest bar and the one before it.
pub const MIN_REPORT_BARS: usize = 2;
const OSCILLATOR_PERIOD: usize = 14;
const CCI_PERIOD: usize = 20;

/// Bars for one ticker; an empty answer is `NoData`.
pub fn fetch_bars(
    port: &dyn MarketDataPort,
    ticker: &str,
    period: Period,
) -> Result<Vec<OhlcvBar>, AnalyzerError> {
    let bars = port.fetch_ohlcv(ticker, period)?;
    if bars.is_empty() {
        return Err(AnalyzerError::NoData {
            ticker: ticker.to_string(),
        });
    }
    Ok(bars)
}

/// Company data for one ticker. Failures are logged and treated as absent
/// so the technical side of a report still renders.
pub fn fetch_company(port: &dyn MarketDataPort, ticker: &str) -> Option<CompanyInfo> {
    match port.fetch_company_info(ticker) {
        Ok(info) => info,
        Err(e) => {
            warn!(ticker, error = %e, "company info unavailable");
            None
        }
    }
}

/// Fetch several tickers in order, sleeping `delay` between requests.
/// Tickers that fail or return nothing are skipped with a warning.
pub fn fetch_many(
    port: &dyn MarketDataPort,
    tickers: &[String],
    period: Period,
    delay: Duration,
) -> (Vec<(String, Vec<OhlcvBar>)>, Vec<String>) {
    let mut fetched = Vec::new();
    let mut skipped = Vec::new();

    for (i, ticker) in tickers.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            thread::sleep(delay);
        }
        info!(ticker = %ticker, %period, "fetching");
        match fetch_bars(port, ticker, period) {
            Ok(bars) => fetched.push((ticker.clone(), bars)),
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "skipping ticker");
                skipped.push(ticker.clone());
            }
        }
    }

    (fetched, skipped)
}

// ---------------------------------------------------------------------------
// Single ticker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StockReport {
    pub ticker: String,
    pub name: String,
    pub period: Period,
    pub bars: usize,
    pub as_of: NaiveDate,
    pub latest_price: f64,
    pub change_pct: Option<f64>,
    pub technical: TechnicalAnalysis,
    pub fundamental: Option<FundamentalAnalysis>,
    pub recommendation: StockRecommendation,
}

pub fn analyze_bars(
    settings: &AnalysisSettings,
    ticker: &str,
    period: Period,
    bars: &[OhlcvBar],
    company: Option<CompanyInfo>,
    profile: RiskProfile,
) -> Result<StockReport, AnalyzerError> {
    let last = bars.last().ok_or_else(|| AnalyzerError::NoData {
        ticker: ticker.to_string(),
    })?;
    if bars.len() < MIN_REPORT_BARS {
        return Err(AnalyzerError::InsufficientData {
            ticker: ticker.to_string(),
            bars: bars.len(),
            minimum: MIN_REPORT_BARS,
        });
    }

    let technical = comprehensive_analysis(bars, &settings.technical);
    let fundamental = company
        .as_ref()
        .map(|info| comprehensive_fundamental_analysis(info, &settings.fundamental));
    let recommendation = generate_recommendation(
        ticker,
        &technical,
        fundamental.as_ref(),
        profile,
        settings.risk_settings(profile),
    );

    Ok(StockReport {
        ticker: ticker.to_string(),
        name: company
            .as_ref()
            .map(|c| c.display_name().to_string())
            .unwrap_or_else(|| ticker.to_string()),
        period,
        bars: bars.len(),
        as_of: last.date,
        latest_price: last.close,
        change_pct: latest_change_pct(bars),
        technical,
        fundamental,
        recommendation,
    })
}

pub fn analyze_ticker(
    port: &dyn MarketDataPort,
    settings: &AnalysisSettings,
    ticker: &str,
    period: Period,
    profile: RiskProfile,
) -> Result<StockReport, AnalyzerError> {
    let bars = fetch_bars(port, ticker, period)?;
    let company = fetch_company(port, ticker);
    info!(ticker, bars = bars.len(), fundamentals = company.is_some(), "analyzing");
    analyze_bars(settings, ticker, period, &bars, company, profile)
}

// ---------------------------------------------------------------------------
// Indicator dump
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorReading {
    pub name: String,
    pub value: Option<IndicatorValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorReport {
    pub ticker: String,
    pub period: Period,
    pub bars: usize,
    pub as_of: NaiveDate,
    pub readings: Vec<IndicatorReading>,
    /// Retracements across the period's high and low.
    pub fibonacci: FibonacciLevels,
    /// Floor pivots from the latest bar.
    pub pivots: PivotPoints,
    pub series: Vec<IndicatorSeries>,
}

pub fn indicator_series(bars: &[OhlcvBar], settings: &AnalysisSettings) -> Vec<IndicatorSeries> {
    let t = &settings.technical;
    let cloud = calculate_ichimoku(bars);
    vec![
        calculate_sma(bars, t.ma_short),
        calculate_sma(bars, t.ma_long),
        calculate_ema(bars, t.ma_short),
        calculate_rsi(bars, t.rsi_period),
        calculate_macd(bars, t.macd_fast, t.macd_slow, t.macd_signal),
        calculate_bollinger(bars, t.bollinger_period, mult_x100(t.bollinger_std)),
        calculate_stochastic(bars, t.stochastic_k, t.stochastic_d),
        calculate_atr(bars, t.atr_period),
        calculate_williams_r(bars, OSCILLATOR_PERIOD),
        calculate_cci(bars, CCI_PERIOD),
        calculate_mfi(bars, OSCILLATOR_PERIOD),
        calculate_obv(bars),
        calculate_vwap(bars),
        cloud.tenkan,
        cloud.kijun,
        cloud.senkou_a,
        cloud.senkou_b,
        cloud.chikou,
    ]
}

pub fn indicator_report(
    port: &dyn MarketDataPort,
    settings: &AnalysisSettings,
    ticker: &str,
    period: Period,
) -> Result<IndicatorReport, AnalyzerError> {
    let bars = fetch_bars(port, ticker, period)?;
    let last = bars.last().ok_or_else(|| AnalyzerError::NoData {
        ticker: ticker.to_string(),
    })?;

    let series = indicator_series(&bars, settings);
    let readings = series
        .iter()
        .map(|s| IndicatorReading {
            name: s.indicator_type.to_string(),
            value: s.latest().copied(),
        })
        .collect();
    let (high, low) = high_low(&bars);

    Ok(IndicatorReport {
        ticker: ticker.to_string(),
        period,
        bars: bars.len(),
        as_of: last.date,
        readings,
        fibonacci: fibonacci_retracements(high, low),
        pivots: pivot_points(last.high, last.low, last.close),
        series,
    })
}

// ---------------------------------------------------------------------------
// Market and portfolio
// ---------------------------------------------------------------------------

/// One row per ticker among the first `compare_limit` of the universe.
pub fn compare_stocks(
    port: &dyn MarketDataPort,
    settings: &AnalysisSettings,
    profile: RiskProfile,
) -> (Vec<ComparisonRow>, Vec<String>) {
    let limit = settings.universe.compare_limit;
    let tickers: Vec<String> = settings.universe.tickers.iter().take(limit).cloned().collect();
    let (fetched, mut skipped) = fetch_many(
        port,
        &tickers,
        COMPARE_PERIOD,
        settings.data.request_delay,
    );

    let mut rows = Vec::new();
    for (ticker, bars) in fetched {
        let company = fetch_company(port, &ticker);
        match analyze_bars(settings, &ticker, COMPARE_PERIOD, &bars, company, profile) {
            Ok(report) => rows.push(comparison_row(&report.recommendation, &report.name, &bars)),
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "skipping ticker");
                skipped.push(ticker);
            }
        }
    }
    (rows, skipped)
}

pub fn market_overview(
    port: &dyn MarketDataPort,
    settings: &AnalysisSettings,
    profile: RiskProfile,
) -> MarketOverview {
    let index_symbol = &settings.universe.index;
    let index = match fetch_bars(port, index_symbol, INDEX_PERIOD) {
        Ok(bars) => index_summary(index_symbol, &bars),
        Err(e) => {
            warn!(index = %index_symbol, error = %e, "index unavailable");
            None
        }
    };

    let (series, mut skipped) = fetch_many(
        port,
        &settings.universe.tickers,
        SENTIMENT_PERIOD,
        settings.data.request_delay,
    );
    let sentiment = market_sentiment(&series);

    let (comparison, compare_skipped) = compare_stocks(port, settings, profile);
    for ticker in compare_skipped {
        if !skipped.contains(&ticker) {
            skipped.push(ticker);
        }
    }

    MarketOverview {
        index,
        sentiment,
        comparison,
        skipped,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioReport {
    pub plan: PortfolioPlan,
    pub analyses: Vec<StockRecommendation>,
    pub skipped: Vec<String>,
}

pub fn build_portfolio(
    port: &dyn MarketDataPort,
    settings: &AnalysisSettings,
    capital: f64,
    profile: RiskProfile,
    period: Period,
) -> Result<PortfolioReport, AnalyzerError> {
    if !capital.is_finite() || capital <= 0.0 {
        return Err(AnalyzerError::invalid_argument(format!(
            "capital must be a positive amount, got {}",
            capital
        )));
    }

    let (fetched, mut skipped) = fetch_many(
        port,
        &settings.universe.tickers,
        period,
        settings.data.request_delay,
    );

    let mut analyses = Vec::new();
    for (ticker, bars) in fetched {
        let company = fetch_company(port, &ticker);
        match analyze_bars(settings, &ticker, period, &bars, company, profile) {
            Ok(report) => analyses.push(report.recommendation),
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "skipping ticker");
                skipped.push(ticker);
            }
        }
    }

    let plan = allocate(&analyses, capital, profile, settings.risk_settings(profile));
    info!(
        positions = plan.number_of_positions,
        allocated = plan.total_allocated,
        "portfolio built"
    );

    Ok(PortfolioReport {
        plan,
        analyses,
        skipped,
    })
}
