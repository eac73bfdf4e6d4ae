//! Commodity Channel Index.
//!
//! CCI = (TP - SMA(TP, n)) / (0.015 * mean absolute deviation of TP from SMA)
//! Zero deviation yields 0. Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

const LAMBERT: f64 = 0.015;

pub fn calculate_cci(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Cci(period));
    }

    let tp: Vec<f64> = bars.iter().map(OhlcvBar::typical_price).collect();
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        if i + 1 < period {
            values.push(IndicatorPoint {
                date: bar.date,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
            continue;
        }

        let window = &tp[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let mean_dev = window.iter().map(|x| (x - mean).abs()).sum::<f64>() / period as f64;
        let cci = if mean_dev == 0.0 {
            0.0
        } else {
            (tp[i] - mean) / (LAMBERT * mean_dev)
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid: true,
            value: IndicatorValue::Simple(cci),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Cci(period),
        values,
    }
}
