//! Market-wide views: sentiment over a ticker list, the composite index
//! summary and side-by-side stock comparison rows.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::ohlcv::{latest_change_pct, OhlcvBar};
use crate::domain::recommendation::{Action, StockRecommendation};
use crate::domain::scoring::round_dp;
use crate::domain::technical::Signal;

const SENTIMENT_BAND_PCT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Bullish => "BULLISH",
            Sentiment::Bearish => "BEARISH",
            Sentiment::Neutral => "NEUTRAL",
        }
    }

    pub fn from_average_change(avg: f64) -> Self {
        if avg > SENTIMENT_BAND_PCT {
            Sentiment::Bullish
        } else if avg < -SENTIMENT_BAND_PCT {
            Sentiment::Bearish
        } else {
            Sentiment::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerChange {
    pub ticker: String,
    pub change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSentiment {
    pub average_change: f64,
    pub positive_ratio: f64,
    pub sentiment: Sentiment,
    pub total_stocks: usize,
    pub positive_stocks: usize,
    pub negative_stocks: usize,
    pub changes: Vec<TickerChange>,
}

/// Sentiment from each ticker's latest daily change. Tickers with fewer
/// than two bars are ignored; `None` when nothing is left.
pub fn market_sentiment(series: &[(String, Vec<OhlcvBar>)]) -> Option<MarketSentiment> {
    let raw: Vec<(&str, f64)> = series
        .iter()
        .filter_map(|(ticker, bars)| latest_change_pct(bars).map(|c| (ticker.as_str(), c)))
        .collect();

    if raw.is_empty() {
        return None;
    }

    // Rounding is for display only.
    let total = raw.len();
    let average = raw.iter().map(|(_, c)| c).sum::<f64>() / total as f64;
    let positive = raw.iter().filter(|(_, c)| *c > 0.0).count();

    Some(MarketSentiment {
        average_change: round_dp(average, 2),
        positive_ratio: round_dp(positive as f64 / total as f64, 4),
        sentiment: Sentiment::from_average_change(average),
        total_stocks: total,
        positive_stocks: positive,
        negative_stocks: total - positive,
        changes: raw
            .into_iter()
            .map(|(ticker, c)| TickerChange {
                ticker: ticker.to_string(),
                change_pct: round_dp(c, 2),
            })
            .collect(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSummary {
    pub symbol: String,
    pub date: NaiveDate,
    pub current: f64,
    pub change_pct: Option<f64>,
}

pub fn index_summary(symbol: &str, bars: &[OhlcvBar]) -> Option<IndexSummary> {
    let last = bars.last()?;
    Some(IndexSummary {
        symbol: symbol.to_string(),
        date: last.date,
        current: last.close,
        change_pct: latest_change_pct(bars).map(|c| round_dp(c, 2)),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub ticker: String,
    pub name: String,
    pub price: Option<f64>,
    pub change_pct: Option<f64>,
    pub technical_signal: Signal,
    pub technical_confidence: f64,
    pub fundamental_score: Option<f64>,
    pub fundamental_recommendation: Option<Action>,
    pub combined_score: f64,
    pub action: Action,
}

pub fn comparison_row(rec: &StockRecommendation, name: &str, bars: &[OhlcvBar]) -> ComparisonRow {
    ComparisonRow {
        ticker: rec.ticker.clone(),
        name: name.to_string(),
        price: bars.last().map(|b| b.close),
        change_pct: latest_change_pct(bars).map(|c| round_dp(c, 2)),
        technical_signal: rec.technical_signal,
        technical_confidence: rec.technical_confidence,
        fundamental_score: rec.fundamental_score,
        fundamental_recommendation: rec.fundamental_recommendation,
        combined_score: rec.combined_score.combined_score,
        action: rec.recommendation.action,
    }
}

/// Everything the market view shows. Missing parts stay empty rather than
/// failing the whole overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketOverview {
    pub index: Option<IndexSummary>,
    pub sentiment: Option<MarketSentiment>,
    pub comparison: Vec<ComparisonRow>,
    pub skipped: Vec<String>,
}
