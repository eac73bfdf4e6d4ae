//! Yahoo Finance data adapter.
//!
//! Prices come from the v8 chart endpoint. Company data comes from the v10
//! quoteSummary endpoint, which needs a session cookie plus a crumb token;
//! both are fetched lazily and the crumb is reused until a 401 is seen.

use std::sync::Mutex;
use std::time::Duration;

use chrono::DateTime;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::company::CompanyInfo;
use crate::domain::error::AnalyzerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::period::Period;
use crate::domain::settings::validate_ticker;
use crate::ports::data_port::MarketDataPort;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const SUMMARY_MODULES: &str =
    "price,summaryProfile,summaryDetail,defaultKeyStatistics,financialData";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct YahooAdapter {
    client: Client,
    crumb: Mutex<Option<String>>,
}

impl YahooAdapter {
    pub fn new(user_agent: &str) -> Result<Self, AnalyzerError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AnalyzerError::data_source(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            crumb: Mutex::new(None),
        })
    }

    fn get_text(&self, ticker: &str, url: &str, query: &[(&str, &str)]) -> Result<(StatusCode, String), AnalyzerError> {
        debug!(ticker, url, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| AnalyzerError::data_source(format!("request for {} failed: {}", ticker, e)))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| AnalyzerError::data_source(format!("reading response for {} failed: {}", ticker, e)))?;
        Ok((status, body))
    }

    fn crumb(&self) -> Result<String, AnalyzerError> {
        if let Some(crumb) = self.cached_crumb() {
            return Ok(crumb);
        }

        // Sets the session cookie; the response itself is usually a 404.
        if let Err(e) = self.client.get(COOKIE_URL).send() {
            debug!(error = %e, "cookie request failed");
        }

        let (status, body) = self.get_text("crumb", CRUMB_URL, &[])?;
        let crumb = body.trim().to_string();
        if !status.is_success() || crumb.is_empty() || crumb.contains('<') {
            return Err(AnalyzerError::DataSourceStatus {
                ticker: "crumb".to_string(),
                status: status.as_u16(),
            });
        }

        if let Ok(mut guard) = self.crumb.lock() {
            *guard = Some(crumb.clone());
        }
        Ok(crumb)
    }

    fn cached_crumb(&self) -> Option<String> {
        self.crumb.lock().ok().and_then(|guard| guard.clone())
    }

    fn clear_crumb(&self) {
        if let Ok(mut guard) = self.crumb.lock() {
            *guard = None;
        }
    }

    fn quote_summary(&self, ticker: &str) -> Result<(StatusCode, String), AnalyzerError> {
        let crumb = self.crumb()?;
        let url = format!("{}/{}", SUMMARY_URL, ticker);
        self.get_text(
            ticker,
            &url,
            &[("modules", SUMMARY_MODULES), ("crumb", crumb.as_str())],
        )
    }
}

impl MarketDataPort for YahooAdapter {
    fn fetch_ohlcv(&self, ticker: &str, period: Period) -> Result<Vec<OhlcvBar>, AnalyzerError> {
        validate_ticker(ticker)?;
        let url = format!("{}/{}", CHART_URL, ticker);
        let (status, body) = self.get_text(
            ticker,
            &url,
            &[("range", period.as_str()), ("interval", "1d")],
        )?;

        if status == StatusCode::NOT_FOUND {
            warn!(ticker, "no chart data");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(AnalyzerError::DataSourceStatus {
                ticker: ticker.to_string(),
                status: status.as_u16(),
            });
        }

        let bars = parse_chart(ticker, &body)?;
        debug!(ticker, bars = bars.len(), "chart parsed");
        Ok(bars)
    }

    fn fetch_company_info(&self, ticker: &str) -> Result<Option<CompanyInfo>, AnalyzerError> {
        validate_ticker(ticker)?;
        let (mut status, mut body) = self.quote_summary(ticker)?;
        if status == StatusCode::UNAUTHORIZED {
            debug!(ticker, "crumb rejected, refreshing");
            self.clear_crumb();
            (status, body) = self.quote_summary(ticker)?;
        }

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AnalyzerError::DataSourceStatus {
                ticker: ticker.to_string(),
                status: status.as_u16(),
            });
        }

        parse_quote_summary(ticker, &body)
    }
}

// ---------------------------------------------------------------------------
// Chart payload
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartData>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

fn parse_error(ticker: &str, reason: impl ToString) -> AnalyzerError {
    AnalyzerError::DataSourceParse {
        ticker: ticker.to_string(),
        reason: reason.to_string(),
    }
}

/// Daily bars from a chart response. Rows with a missing price are dropped;
/// a missing volume counts as zero. Dates are in the exchange's time zone.
pub fn parse_chart(ticker: &str, body: &str) -> Result<Vec<OhlcvBar>, AnalyzerError> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| parse_error(ticker, e))?;

    if let Some(error) = response.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Ok(Vec::new());
        }
        return Err(AnalyzerError::data_source(format!(
            "Yahoo error for {}: {} {}",
            ticker,
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    let Some(data) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let offset = data.meta.map(|m| m.gmtoffset).unwrap_or(0);
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    let mut bars = Vec::with_capacity(data.timestamp.len());
    for (i, &ts) in data.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            at(&quote.open, i),
            at(&quote.high, i),
            at(&quote.low, i),
            at(&quote.close, i),
        ) else {
            continue;
        };
        let date = DateTime::from_timestamp(ts + offset, 0)
            .ok_or_else(|| parse_error(ticker, format!("invalid timestamp {}", ts)))?
            .date_naive();

        bars.push(OhlcvBar {
            ticker: ticker.to_string(),
            date,
            open,
            high,
            low,
            close,
            volume: at(&quote.volume, i).unwrap_or(0.0).round() as i64,
        });
    }

    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    Ok(bars)
}

// ---------------------------------------------------------------------------
// quoteSummary payload
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<SummaryResult>>,
    error: Option<YahooError>,
}

/// Yahoo wraps numbers as `{"raw": 1.2, "fmt": "1.20"}`, or `{}` when absent.
#[derive(Debug, Default, Deserialize)]
struct Raw {
    raw: Option<f64>,
}

fn raw(value: &Option<Raw>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw).filter(|v| v.is_finite())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryResult {
    price: Option<PriceModule>,
    summary_profile: Option<ProfileModule>,
    summary_detail: Option<DetailModule>,
    default_key_statistics: Option<KeyStatsModule>,
    financial_data: Option<FinancialModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
    market_cap: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProfileModule {
    sector: Option<String>,
    industry: Option<String>,
    long_business_summary: Option<String>,
    website: Option<String>,
    full_time_employees: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DetailModule {
    market_cap: Option<Raw>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<Raw>,
    dividend_yield: Option<Raw>,
    beta: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KeyStatsModule {
    price_to_book: Option<Raw>,
    book_value: Option<Raw>,
    trailing_eps: Option<Raw>,
    net_income_to_common: Option<Raw>,
    shares_outstanding: Option<Raw>,
    beta: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FinancialModule {
    return_on_equity: Option<Raw>,
    debt_to_equity: Option<Raw>,
    total_revenue: Option<Raw>,
    operating_cashflow: Option<Raw>,
}

/// Company data from a quoteSummary response. Yield and ROE are converted
/// to percent; Yahoo's debt-to-equity (a percentage) becomes a plain ratio.
pub fn parse_quote_summary(ticker: &str, body: &str) -> Result<Option<CompanyInfo>, AnalyzerError> {
    let response: SummaryResponse =
        serde_json::from_str(body).map_err(|e| parse_error(ticker, e))?;

    if let Some(error) = response.quote_summary.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Ok(None);
        }
        return Err(AnalyzerError::data_source(format!(
            "Yahoo error for {}: {} {}",
            ticker,
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    let Some(r) = response
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
    else {
        return Ok(None);
    };

    let price = r.price.unwrap_or_default();
    let profile = r.summary_profile.unwrap_or_default();
    let detail = r.summary_detail.unwrap_or_default();
    let stats = r.default_key_statistics.unwrap_or_default();
    let fin = r.financial_data.unwrap_or_default();
    let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());

    Ok(Some(CompanyInfo {
        ticker: ticker.to_string(),
        name: non_empty(price.long_name).or(non_empty(price.short_name)),
        sector: non_empty(profile.sector),
        industry: non_empty(profile.industry),
        description: non_empty(profile.long_business_summary),
        website: non_empty(profile.website),
        employees: profile.full_time_employees,
        market_cap: raw(&price.market_cap).or(raw(&detail.market_cap)),
        pe_ratio: raw(&detail.trailing_pe),
        pb_ratio: raw(&stats.price_to_book),
        dividend_yield: raw(&detail.dividend_yield).map(|v| v * 100.0),
        roe: raw(&fin.return_on_equity).map(|v| v * 100.0),
        debt_to_equity: raw(&fin.debt_to_equity).map(|v| v / 100.0),
        revenue: raw(&fin.total_revenue),
        net_income: raw(&stats.net_income_to_common),
        book_value: raw(&stats.book_value),
        eps: raw(&stats.trailing_eps),
        beta: raw(&detail.beta).or(raw(&stats.beta)),
        operating_cash_flow: raw(&fin.operating_cashflow),
        shares_outstanding: raw(&stats.shares_outstanding),
    }))
}
