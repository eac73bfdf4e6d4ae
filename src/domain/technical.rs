//! Technical analysis: trend, support/resistance, signals and price targets.
//!
//! Every function is pure over a bar series sorted ascending by date.

use serde::Serialize;

use crate::domain::indicator::{
    bollinger::mult_x100, calculate_atr, calculate_bollinger, calculate_macd, calculate_rsi,
    calculate_sma, calculate_stochastic, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::scoring::round_dp;
use crate::domain::settings::TechnicalSettings;

/// Bars needed before trend and signal analysis run.
pub const MIN_ANALYSIS_BARS: usize = 50;
/// Bars needed before price targets are produced.
pub const MIN_TARGET_BARS: usize = 20;
pub const DEFAULT_SR_WINDOW: usize = 20;

const PRICE_TREND_LOOKBACK: usize = 20;
const PRICE_TREND_THRESHOLD_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
    Unknown,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Bullish => "BULLISH",
            Trend::Bearish => "BEARISH",
            Trend::Neutral => "NEUTRAL",
            Trend::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendSignal {
    MaBullish,
    MaBearish,
    MacdBullish,
    MacdBearish,
    PriceUptrend,
    PriceDowntrend,
}

impl TrendSignal {
    pub fn is_bullish(&self) -> bool {
        matches!(
            self,
            TrendSignal::MaBullish | TrendSignal::MacdBullish | TrendSignal::PriceUptrend
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub trend: Trend,
    pub strength: f64,
    pub signals: Vec<TrendSignal>,
    pub price_change_20d: Option<f64>,
}

impl TrendAnalysis {
    fn unknown() -> Self {
        Self {
            trend: Trend::Unknown,
            strength: 0.0,
            signals: Vec::new(),
            price_change_20d: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SupportResistance {
    /// Descending, at most five.
    pub resistance: Vec<f64>,
    /// Ascending, at most five.
    pub support: Vec<f64>,
    pub current_price: Option<f64>,
    pub nearest_resistance: Option<f64>,
    pub nearest_support: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalReason {
    RsiOversold,
    RsiOverbought,
    MacdBullishCross,
    MacdBearishCross,
    BbOversold,
    BbOverbought,
    MaBullishCross,
    MaBearishCross,
    StochOversold,
    StochOverbought,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalAnalysis {
    pub signal: Signal,
    pub confidence: f64,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub reasons: Vec<SignalReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceLevel {
    pub price: f64,
    /// Distance from the current price in percent, 2 dp.
    pub pct: f64,
}

impl PriceLevel {
    fn from_current(price: f64, current: f64) -> Self {
        let pct = if current == 0.0 {
            0.0
        } else {
            round_dp((price - current) / current * 100.0, 2)
        };
        Self { price, pct }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTargets {
    pub current_price: f64,
    pub atr: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit_1: Option<PriceLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit_2: Option<PriceLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit_3: Option<PriceLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<PriceLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss_2: Option<PriceLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support: Option<PriceLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resistance: Option<PriceLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdSnapshot {
    pub value: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerSnapshot {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StochasticSnapshot {
    pub k: f64,
    pub d: f64,
}

/// Latest indicator readings, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub macd: Option<MacdSnapshot>,
    pub bollinger: Option<BollingerSnapshot>,
    pub stochastic: Option<StochasticSnapshot>,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalAnalysis {
    pub trend: TrendAnalysis,
    pub signals: SignalAnalysis,
    pub support_resistance: SupportResistance,
    pub price_targets: Option<PriceTargets>,
    pub indicators: Option<IndicatorSnapshot>,
}

fn macd_pair(value: Option<&IndicatorValue>) -> Option<(f64, f64)> {
    match value? {
        IndicatorValue::Macd { line, signal, .. } => Some((*line, *signal)),
        _ => None,
    }
}

pub fn analyze_trend(bars: &[OhlcvBar], settings: &TechnicalSettings) -> TrendAnalysis {
    if bars.len() < MIN_ANALYSIS_BARS {
        return TrendAnalysis::unknown();
    }

    let mut signals = Vec::new();

    let ma_short = calculate_sma(bars, settings.ma_short).latest_simple();
    let ma_long = calculate_sma(bars, settings.ma_long).latest_simple();
    if let (Some(short), Some(long)) = (ma_short, ma_long) {
        signals.push(if short > long {
            TrendSignal::MaBullish
        } else {
            TrendSignal::MaBearish
        });
    }

    let macd = calculate_macd(
        bars,
        settings.macd_fast,
        settings.macd_slow,
        settings.macd_signal,
    );
    if let Some((line, signal)) = macd_pair(macd.latest()) {
        signals.push(if line > signal {
            TrendSignal::MacdBullish
        } else {
            TrendSignal::MacdBearish
        });
    }

    let latest = bars[bars.len() - 1].close;
    let base = bars[bars.len() - PRICE_TREND_LOOKBACK].close;
    let price_change = if base == 0.0 {
        0.0
    } else {
        (latest - base) / base * 100.0
    };
    if price_change > PRICE_TREND_THRESHOLD_PCT {
        signals.push(TrendSignal::PriceUptrend);
    } else if price_change < -PRICE_TREND_THRESHOLD_PCT {
        signals.push(TrendSignal::PriceDowntrend);
    }

    let bullish = signals.iter().filter(|s| s.is_bullish()).count();
    let bearish = signals.len() - bullish;
    let (trend, strength) = if bullish > bearish {
        (Trend::Bullish, bullish as f64 / signals.len() as f64 * 100.0)
    } else if bearish > bullish {
        (Trend::Bearish, bearish as f64 / signals.len() as f64 * 100.0)
    } else {
        (Trend::Neutral, 50.0)
    };

    TrendAnalysis {
        trend,
        strength: round_dp(strength, 2),
        signals,
        price_change_20d: Some(round_dp(price_change, 2)),
    }
}

/// Local extremes that equal the max high / min low of a centred window.
pub fn identify_support_resistance(bars: &[OhlcvBar], window: usize) -> SupportResistance {
    if window == 0 || bars.len() < window {
        return SupportResistance::default();
    }

    let half = window / 2;
    let mut resistance = Vec::new();
    let mut support = Vec::new();

    for i in window..bars.len().saturating_sub(window) {
        let span = &bars[i - half..i + window - half];
        let max_high = span.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let min_low = span.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        if bars[i].high == max_high {
            resistance.push(bars[i].high);
        }
        if bars[i].low == min_low {
            support.push(bars[i].low);
        }
    }

    resistance.sort_by(|a, b| b.total_cmp(a));
    resistance.dedup();
    resistance.truncate(5);
    support.sort_by(|a, b| a.total_cmp(b));
    support.dedup();
    support.truncate(5);

    let current = bars[bars.len() - 1].close;
    let nearest_resistance = resistance
        .iter()
        .copied()
        .filter(|r| *r > current)
        .fold(None, |acc: Option<f64>, r| Some(acc.map_or(r, |a| a.min(r))));
    let nearest_support = support
        .iter()
        .copied()
        .filter(|s| *s < current)
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));

    SupportResistance {
        resistance,
        support,
        current_price: Some(current),
        nearest_resistance,
        nearest_support,
    }
}

pub fn generate_signals(bars: &[OhlcvBar], settings: &TechnicalSettings) -> SignalAnalysis {
    if bars.len() < MIN_ANALYSIS_BARS {
        return SignalAnalysis {
            signal: Signal::Hold,
            confidence: 0.0,
            buy_signals: 0,
            sell_signals: 0,
            reasons: Vec::new(),
        };
    }

    let close = bars[bars.len() - 1].close;
    let mut buys = Vec::new();
    let mut sells = Vec::new();

    if let Some(rsi) = calculate_rsi(bars, settings.rsi_period).latest_simple() {
        if rsi < settings.rsi_oversold {
            buys.push(SignalReason::RsiOversold);
        } else if rsi > settings.rsi_overbought {
            sells.push(SignalReason::RsiOverbought);
        }
    }

    let macd = calculate_macd(
        bars,
        settings.macd_fast,
        settings.macd_slow,
        settings.macd_signal,
    );
    if let (Some((prev_line, prev_signal)), Some((line, signal))) =
        (macd_pair(macd.valid_from_end(1)), macd_pair(macd.latest()))
    {
        if prev_line <= prev_signal && line > signal {
            buys.push(SignalReason::MacdBullishCross);
        } else if prev_line >= prev_signal && line < signal {
            sells.push(SignalReason::MacdBearishCross);
        }
    }

    let bollinger = calculate_bollinger(
        bars,
        settings.bollinger_period,
        mult_x100(settings.bollinger_std),
    );
    if let Some(IndicatorValue::Bollinger { upper, lower, .. }) = bollinger.latest() {
        if close < *lower {
            buys.push(SignalReason::BbOversold);
        } else if close > *upper {
            sells.push(SignalReason::BbOverbought);
        }
    }

    let short = calculate_sma(bars, settings.ma_short);
    let long = calculate_sma(bars, settings.ma_long);
    let simple_at = |series: &crate::domain::indicator::IndicatorSeries, offset: usize| {
        series.valid_from_end(offset).and_then(IndicatorValue::as_simple)
    };
    if let (Some(prev_s), Some(prev_l), Some(s), Some(l)) = (
        simple_at(&short, 1),
        simple_at(&long, 1),
        simple_at(&short, 0),
        simple_at(&long, 0),
    ) {
        if prev_s <= prev_l && s > l {
            buys.push(SignalReason::MaBullishCross);
        } else if prev_s >= prev_l && s < l {
            sells.push(SignalReason::MaBearishCross);
        }
    }

    let stochastic = calculate_stochastic(bars, settings.stochastic_k, settings.stochastic_d);
    if let Some(IndicatorValue::Stochastic { k, d }) = stochastic.latest() {
        if *k < settings.stochastic_oversold && *d < settings.stochastic_oversold {
            buys.push(SignalReason::StochOversold);
        } else if *k > settings.stochastic_overbought && *d > settings.stochastic_overbought {
            sells.push(SignalReason::StochOverbought);
        }
    }

    let (buy_signals, sell_signals) = (buys.len(), sells.len());
    let total = buy_signals + sell_signals;
    let (signal, confidence) = if buy_signals > sell_signals {
        (Signal::Buy, buy_signals as f64 / total as f64 * 100.0)
    } else if sell_signals > buy_signals {
        (Signal::Sell, sell_signals as f64 / total as f64 * 100.0)
    } else {
        (Signal::Hold, 50.0)
    };

    let mut reasons = buys;
    reasons.extend(sells);

    SignalAnalysis {
        signal,
        confidence: round_dp(confidence, 2),
        buy_signals,
        sell_signals,
        reasons,
    }
}

pub fn calculate_price_targets(
    bars: &[OhlcvBar],
    signal: Signal,
    settings: &TechnicalSettings,
) -> Option<PriceTargets> {
    if bars.len() < MIN_TARGET_BARS {
        return None;
    }

    let p = bars[bars.len() - 1].close;
    let atr = calculate_atr(bars, settings.atr_period)
        .latest_simple()
        .unwrap_or(p * 0.02);
    let sr = identify_support_resistance(bars, DEFAULT_SR_WINDOW);
    let level = |price: f64| Some(PriceLevel::from_current(price, p));

    let mut targets = PriceTargets {
        current_price: p,
        atr,
        take_profit_1: None,
        take_profit_2: None,
        take_profit_3: None,
        stop_loss: None,
        stop_loss_2: None,
        support: None,
        resistance: None,
    };

    match signal {
        Signal::Buy => {
            targets.take_profit_1 = level(p + atr * 2.0);
            targets.take_profit_2 = level(p + atr * 3.0);
            targets.take_profit_3 = level(sr.nearest_resistance.unwrap_or(p * 1.10));
            targets.stop_loss = level(p - atr * 1.5);
            targets.stop_loss_2 = level(sr.nearest_support.unwrap_or(p * 0.95));
        }
        Signal::Sell => {
            targets.take_profit_1 = level(p - atr * 2.0);
            targets.take_profit_2 = level(p - atr * 3.0);
            targets.take_profit_3 = level(sr.nearest_support.unwrap_or(p * 0.90));
            targets.stop_loss = level(p + atr * 1.5);
            targets.stop_loss_2 = level(sr.nearest_resistance.unwrap_or(p * 1.05));
        }
        Signal::Hold => {
            targets.support = level(sr.nearest_support.unwrap_or(p * 0.95));
            targets.resistance = level(sr.nearest_resistance.unwrap_or(p * 1.05));
        }
    }

    Some(targets)
}

pub fn indicator_snapshot(bars: &[OhlcvBar], settings: &TechnicalSettings) -> IndicatorSnapshot {
    let rsi = calculate_rsi(bars, settings.rsi_period).latest_simple();
    let macd = calculate_macd(
        bars,
        settings.macd_fast,
        settings.macd_slow,
        settings.macd_signal,
    );
    let bollinger = calculate_bollinger(
        bars,
        settings.bollinger_period,
        mult_x100(settings.bollinger_std),
    );
    let stochastic = calculate_stochastic(bars, settings.stochastic_k, settings.stochastic_d);

    IndicatorSnapshot {
        rsi: rsi.map(|v| round_dp(v, 2)),
        macd: match macd.latest() {
            Some(IndicatorValue::Macd {
                line,
                signal,
                histogram,
            }) => Some(MacdSnapshot {
                value: round_dp(*line, 4),
                signal: round_dp(*signal, 4),
                histogram: round_dp(*histogram, 4),
            }),
            _ => None,
        },
        bollinger: match bollinger.latest() {
            Some(IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            }) => Some(BollingerSnapshot {
                upper: round_dp(*upper, 2),
                middle: round_dp(*middle, 2),
                lower: round_dp(*lower, 2),
            }),
            _ => None,
        },
        stochastic: match stochastic.latest() {
            Some(IndicatorValue::Stochastic { k, d }) => Some(StochasticSnapshot {
                k: round_dp(*k, 2),
                d: round_dp(*d, 2),
            }),
            _ => None,
        },
        ma_short: calculate_sma(bars, settings.ma_short)
            .latest_simple()
            .map(|v| round_dp(v, 2)),
        ma_long: calculate_sma(bars, settings.ma_long)
            .latest_simple()
            .map(|v| round_dp(v, 2)),
    }
}

pub fn comprehensive_analysis(bars: &[OhlcvBar], settings: &TechnicalSettings) -> TechnicalAnalysis {
    let trend = analyze_trend(bars, settings);
    let signals = generate_signals(bars, settings);
    let support_resistance = identify_support_resistance(bars, DEFAULT_SR_WINDOW);
    let price_targets = calculate_price_targets(bars, signals.signal, settings);
    let indicators = (bars.len() > MIN_ANALYSIS_BARS).then(|| indicator_snapshot(bars, settings));

    TechnicalAnalysis {
        trend,
        signals,
        support_resistance,
        price_targets,
        indicators,
    }
}
