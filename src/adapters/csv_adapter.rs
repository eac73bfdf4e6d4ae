//! CSV file data adapter.
//!
//! Reads `<dir>/<TICKER>.csv` price files and an optional
//! `<dir>/fundamentals.csv` with one row per ticker.

use crate::domain::company::CompanyInfo;
use crate::domain::error::AnalyzerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::period::{Lookback, Period};
use crate::domain::settings::validate_ticker;
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const FUNDAMENTALS_FILE: &str = "fundamentals.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    /// Every ticker with a price file, sorted.
    pub fn list_tickers(&self) -> Result<Vec<String>, AnalyzerError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            AnalyzerError::data_source(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if let Some(ticker) = name.strip_suffix(".csv") {
                if name != FUNDAMENTALS_FILE {
                    tickers.push(ticker.to_string());
                }
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, AnalyzerError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AnalyzerError::data_source(format!(
            "failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

fn parse_error(ticker: &str, reason: impl ToString) -> AnalyzerError {
    AnalyzerError::DataSourceParse {
        ticker: ticker.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a price file, sort it by date and keep the bars `period` selects,
/// counted back from the newest one. A repeated date keeps its last row.
pub fn parse_price_csv(ticker: &str, content: &str, period: Period) -> Result<Vec<OhlcvBar>, AnalyzerError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut by_date = BTreeMap::new();
    for result in rdr.deserialize::<PriceRow>() {
        let row = result.map_err(|e| parse_error(ticker, format!("CSV parse error: {}", e)))?;
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| parse_error(ticker, format!("invalid date '{}': {}", row.date, e)))?;
        by_date.insert(date, OhlcvBar {
            ticker: ticker.to_string(),
            date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.round() as i64,
        });
    }

    let mut bars: Vec<OhlcvBar> = by_date.into_values().collect();

    let Some(latest) = bars.last().map(|b| b.date) else {
        return Ok(bars);
    };
    let bars = match period.lookback(latest) {
        Lookback::Bars(n) => bars.split_off(bars.len().saturating_sub(n)),
        Lookback::Since(start) => bars.into_iter().filter(|b| b.date >= start).collect(),
        Lookback::All => bars,
    };
    Ok(bars)
}

impl MarketDataPort for CsvAdapter {
    fn fetch_ohlcv(&self, ticker: &str, period: Period) -> Result<Vec<OhlcvBar>, AnalyzerError> {
        validate_ticker(ticker)?;
        let path = self.csv_path(ticker);
        match read_optional(&path)? {
            Some(content) => parse_price_csv(ticker, &content, period),
            None => {
                debug!(ticker, path = %path.display(), "no price file");
                Ok(Vec::new())
            }
        }
    }

    fn fetch_company_info(&self, ticker: &str) -> Result<Option<CompanyInfo>, AnalyzerError> {
        let path = self.base_path.join(FUNDAMENTALS_FILE);
        let Some(content) = read_optional(&path)? else {
            return Ok(None);
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        for result in rdr.deserialize::<CompanyInfo>() {
            let info = result.map_err(|e| parse_error(ticker, format!("{}: {}", FUNDAMENTALS_FILE, e)))?;
            if info.ticker.eq_ignore_ascii_case(ticker) {
                return Ok(Some(info));
            }
        }
        Ok(None)
    }
}
