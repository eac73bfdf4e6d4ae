//! Money Flow Index.
//!
//! Raw money flow = TP * volume. A bar contributes positive flow when its TP
//! rises over the previous bar, negative flow when it falls, nothing when
//! unchanged. MFI = 100 - 100 / (1 + sum(pos) / sum(neg)) over the last n
//! flows; 100 when there is no negative flow.
//!
//! Warmup: first n bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_mfi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Mfi(period));
    }

    // flows[i] is the (positive, negative) flow of bar i; bar 0 has none.
    let mut flows = Vec::with_capacity(bars.len());
    flows.push((0.0, 0.0));
    for i in 1..bars.len() {
        let tp = bars[i].typical_price();
        let prev_tp = bars[i - 1].typical_price();
        let raw = tp * bars[i].volume as f64;
        flows.push(if tp > prev_tp {
            (raw, 0.0)
        } else if tp < prev_tp {
            (0.0, raw)
        } else {
            (0.0, 0.0)
        });
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i < period {
                return IndicatorPoint {
                    date: bar.date,
                    valid: false,
                    value: IndicatorValue::Simple(0.0),
                };
            }
            let (pos, neg) = flows[i + 1 - period..=i]
                .iter()
                .fold((0.0, 0.0), |(p, n), (fp, fnn)| (p + fp, n + fnn));
            let mfi = if neg == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + pos / neg)
            };
            IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Simple(mfi),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Mfi(period),
        values,
    }
}
