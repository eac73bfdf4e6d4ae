//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values, one point per bar

pub mod atr;
pub mod bollinger;
pub mod cci;
pub mod ema;
pub mod ichimoku;
pub mod levels;
pub mod macd;
pub mod mfi;
pub mod obv;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod vwap;
pub mod williams_r;

pub use atr::calculate_atr;
pub use bollinger::calculate_bollinger;
pub use cci::calculate_cci;
pub use ema::calculate_ema;
pub use ichimoku::{calculate_ichimoku, IchimokuCloud};
pub use levels::{fibonacci_retracements, pivot_points, FibonacciLevels, PivotPoints};
pub use macd::calculate_macd;
pub use mfi::calculate_mfi;
pub use obv::calculate_obv;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stochastic::calculate_stochastic;
pub use vwap::calculate_vwap;
pub use williams_r::calculate_williams_r;

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

impl IndicatorValue {
    pub fn as_simple(&self) -> Option<f64> {
        match self {
            IndicatorValue::Simple(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IchimokuLine {
    Tenkan,
    Kijun,
    SenkouA,
    SenkouB,
    Chikou,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    WilliamsR(usize),
    Cci(usize),
    Mfi(usize),
    Obv,
    Vwap,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    Ichimoku(IchimokuLine),
}

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    /// Value `offset` bars before the newest one, if that point is past warmup.
    pub fn valid_from_end(&self, offset: usize) -> Option<&IndicatorValue> {
        let idx = self.values.len().checked_sub(offset + 1)?;
        let point = &self.values[idx];
        point.valid.then_some(&point.value)
    }

    pub fn latest(&self) -> Option<&IndicatorValue> {
        self.valid_from_end(0)
    }

    pub fn latest_simple(&self) -> Option<f64> {
        self.latest().and_then(IndicatorValue::as_simple)
    }

    /// Simple values with warmup points mapped to `None`.
    pub fn simple_values(&self) -> Vec<Option<f64>> {
        self.values
            .iter()
            .map(|p| if p.valid { p.value.as_simple() } else { None })
            .collect()
    }
}

/// Highest high and lowest low across a window of bars.
pub(crate) fn high_low(window: &[OhlcvBar]) -> (f64, f64) {
    window.iter().fold((f64::MIN, f64::MAX), |(hh, ll), b| {
        (hh.max(b.high), ll.min(b.low))
    })
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::WilliamsR(period) => write!(f, "WILLR({})", period),
            IndicatorType::Cci(period) => write!(f, "CCI({})", period),
            IndicatorType::Mfi(period) => write!(f, "MFI({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Vwap => write!(f, "VWAP"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCH({},{})", k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BBANDS({},{})", period, mult)
            }
            IndicatorType::Ichimoku(line) => {
                let name = match line {
                    IchimokuLine::Tenkan => "TENKAN",
                    IchimokuLine::Kijun => "KIJUN",
                    IchimokuLine::SenkouA => "SENKOU_A",
                    IchimokuLine::SenkouB => "SENKOU_B",
                    IchimokuLine::Chikou => "CHIKOU",
                };
                write!(f, "ICHIMOKU_{}", name)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_bars {
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::NaiveDate;

    /// Flat bars (open = high = low = close) starting 2024-01-01, one per day.
    pub fn from_closes(prices: &[f64]) -> Vec<OhlcvBar> {
        let rows: Vec<_> = prices.iter().map(|&c| (c, c, c, 1000)).collect();
        from_hlcv(&rows)
    }

    /// Bars from (high, low, close, volume) tuples.
    pub fn from_hlcv(rows: &[(f64, f64, f64, i64)]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        rows.iter()
            .enumerate()
            .map(|(i, &(high, low, close, volume))| OhlcvBar {
                ticker: "TEST.JK".into(),
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high,
                low,
                close,
                volume,
            })
            .collect()
    }
}
