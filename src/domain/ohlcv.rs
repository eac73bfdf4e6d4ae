//! OHLCV bar representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Close-to-close percentage change per bar. The first bar has no previous
/// close and yields `None`, as does any bar following a zero close.
pub fn price_change_pct(bars: &[OhlcvBar]) -> Vec<Option<f64>> {
    let mut changes = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i == 0 || bars[i - 1].close == 0.0 {
            changes.push(None);
        } else {
            let prev = bars[i - 1].close;
            changes.push(Some((bar.close - prev) / prev * 100.0));
        }
    }
    changes
}

/// Percentage change of the most recent bar, if it has one.
pub fn latest_change_pct(bars: &[OhlcvBar]) -> Option<f64> {
    price_change_pct(bars).last().copied().flatten()
}

pub fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
