//! Slow Stochastic Oscillator.
//!
//! fast %K[i] = 100 * (C[i] - LL(k)) / (HH(k) - LL(k)), 50 when the range is flat
//! slow %K    = SMA(d) of fast %K
//! %D         = SMA(d) of slow %K
//!
//! Warmup: (k-1) + 2*(d-1) bars are invalid.

use crate::domain::indicator::{
    high_low, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_stochastic(bars: &[OhlcvBar], k_period: usize, d_period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Stochastic { k_period, d_period };
    if bars.is_empty() || k_period == 0 || d_period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let fast_k: Vec<Option<f64>> = (0..bars.len())
        .map(|i| {
            if i + 1 < k_period {
                return None;
            }
            let (hh, ll) = high_low(&bars[i + 1 - k_period..=i]);
            let range = hh - ll;
            if range == 0.0 {
                Some(50.0)
            } else {
                Some(100.0 * (bars[i].close - ll) / range)
            }
        })
        .collect();

    let slow_k = rolling_mean(&fast_k, d_period);
    let slow_d = rolling_mean(&slow_k, d_period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (slow_k[i], slow_d[i]) {
            (Some(k), Some(d)) => IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Stochastic { k, d },
            },
            _ => IndicatorPoint {
                date: bar.date,
                valid: false,
                value: IndicatorValue::Stochastic { k: 0.0, d: 0.0 },
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// Mean of the last `period` values; `None` unless all of them are present.
fn rolling_mean(input: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    (0..input.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &input[i + 1 - period..=i];
            let sum: Option<f64> = window.iter().copied().sum();
            sum.map(|s| s / period as f64)
        })
        .collect()
}
