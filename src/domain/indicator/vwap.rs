//! Cumulative Volume Weighted Average Price.
//!
//! VWAP[i] = sum(TP * V) / sum(V) from the first bar. Invalid while the
//! cumulative volume is zero.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_vwap(bars: &[OhlcvBar]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut pv = 0.0;
    let mut vol = 0.0;

    for bar in bars {
        let v = bar.volume as f64;
        pv += bar.typical_price() * v;
        vol += v;

        let valid = vol > 0.0;
        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: IndicatorValue::Simple(if valid { pv / vol } else { 0.0 }),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Vwap,
        values,
    }
}
