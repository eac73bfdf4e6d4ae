//! Ichimoku Kinko Hyo.
//!
//! Tenkan-sen = midpoint of the 9-bar range, Kijun-sen = midpoint of the
//! 26-bar range, Senkou Span A = (Tenkan + Kijun) / 2 and Senkou Span B =
//! midpoint of the 52-bar range, both plotted 26 bars ahead. Chikou Span is
//! the close plotted 26 bars behind.
//!
//! Every line is aligned to the input bars: the leading spans at bar i hold
//! the value computed at bar i-26, the lagging span holds close[i+26].

use serde::Serialize;

use crate::domain::indicator::{
    high_low, IchimokuLine, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const TENKAN_PERIOD: usize = 9;
pub const KIJUN_PERIOD: usize = 26;
pub const SENKOU_B_PERIOD: usize = 52;
pub const DISPLACEMENT: usize = 26;

#[derive(Debug, Clone, Serialize)]
pub struct IchimokuCloud {
    pub tenkan: IndicatorSeries,
    pub kijun: IndicatorSeries,
    pub senkou_a: IndicatorSeries,
    pub senkou_b: IndicatorSeries,
    pub chikou: IndicatorSeries,
}

pub fn calculate_ichimoku(bars: &[OhlcvBar]) -> IchimokuCloud {
    let tenkan = midpoints(bars, TENKAN_PERIOD);
    let kijun = midpoints(bars, KIJUN_PERIOD);
    let span_b_raw = midpoints(bars, SENKOU_B_PERIOD);

    let span_a_raw: Vec<Option<f64>> = tenkan
        .iter()
        .zip(&kijun)
        .map(|(t, k)| Some((t.as_ref()? + k.as_ref()?) / 2.0))
        .collect();

    let shift_forward = |raw: &[Option<f64>]| -> Vec<Option<f64>> {
        (0..bars.len())
            .map(|i| i.checked_sub(DISPLACEMENT).and_then(|src| raw[src]))
            .collect()
    };
    let chikou: Vec<Option<f64>> = (0..bars.len())
        .map(|i| bars.get(i + DISPLACEMENT).map(|b| b.close))
        .collect();

    IchimokuCloud {
        tenkan: to_series(bars, IchimokuLine::Tenkan, &tenkan),
        kijun: to_series(bars, IchimokuLine::Kijun, &kijun),
        senkou_a: to_series(bars, IchimokuLine::SenkouA, &shift_forward(&span_a_raw)),
        senkou_b: to_series(bars, IchimokuLine::SenkouB, &shift_forward(&span_b_raw)),
        chikou: to_series(bars, IchimokuLine::Chikou, &chikou),
    }
}

fn midpoints(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    (0..bars.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let (hh, ll) = high_low(&bars[i + 1 - period..=i]);
            Some((hh + ll) / 2.0)
        })
        .collect()
}

fn to_series(bars: &[OhlcvBar], line: IchimokuLine, raw: &[Option<f64>]) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::Ichimoku(line),
        values: bars
            .iter()
            .zip(raw)
            .map(|(bar, v)| IndicatorPoint {
                date: bar.date,
                valid: v.is_some(),
                value: IndicatorValue::Simple(v.unwrap_or(0.0)),
            })
            .collect(),
    }
}
