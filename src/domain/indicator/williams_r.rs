//! Williams %R.
//!
//! %R = -100 * (HH(n) - C) / (HH(n) - LL(n)), -50 when the range is flat.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{
    high_low, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_williams_r(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::WilliamsR(period));
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i + 1 < period {
                return IndicatorPoint {
                    date: bar.date,
                    valid: false,
                    value: IndicatorValue::Simple(0.0),
                };
            }
            let (hh, ll) = high_low(&bars[i + 1 - period..=i]);
            let range = hh - ll;
            let wr = if range == 0.0 {
                -50.0
            } else {
                -100.0 * (hh - bar.close) / range
            };
            IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Simple(wr),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::WilliamsR(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::{from_closes, from_hlcv};

    #[test]
    fn williams_r_close_at_high_is_zero() {
        let bars = from_hlcv(&[(10.0, 5.0, 6.0, 1), (12.0, 6.0, 12.0, 1)]);
        let values = calculate_williams_r(&bars, 2).simple_values();
        assert_eq!(values[0], None);
        assert!(values[1].unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn williams_r_close_at_low_is_minus_hundred() {
        let bars = from_hlcv(&[(10.0, 5.0, 6.0, 1), (12.0, 4.0, 4.0, 1)]);
        let values = calculate_williams_r(&bars, 2).simple_values();
        assert!((values[1].unwrap() + 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn williams_r_flat_is_minus_fifty() {
        let series = calculate_williams_r(&from_closes(&[7.0; 5]), 3);
        assert_eq!(series.latest_simple(), Some(-50.0));
    }

    #[test]
    fn williams_r_stays_in_range() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + ((i * 13) % 17) as f64).collect();
        let rows: Vec<_> = prices.iter().map(|&c| (c + 2.0, c - 2.0, c, 1)).collect();
        let series = calculate_williams_r(&from_hlcv(&rows), 14);
        for v in series.simple_values().into_iter().flatten() {
            assert!((-100.0..=0.0).contains(&v), "%R {} out of range", v);
        }
    }
}
