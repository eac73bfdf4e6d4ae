//! Recommendation engine: combines technical and fundamental results into
//! a final action, risk management levels, insights and portfolio plans.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::AnalyzerError;
use crate::domain::fundamental::{FundamentalAnalysis, OverallValuation, Quality};
use crate::domain::scoring::{round_dp, Grade};
use crate::domain::technical::{Signal, SignalReason, TechnicalAnalysis, Trend};

/// Score used in place of a fundamental score when no company data exists.
pub const NEUTRAL_FUNDAMENTAL_SCORE: f64 = 50.0;
const TECHNICAL_WEIGHT: f64 = 0.4;
const FUNDAMENTAL_WEIGHT: f64 = 0.6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl RiskProfile {
    pub const ALL: [RiskProfile; 3] = [
        RiskProfile::Conservative,
        RiskProfile::Moderate,
        RiskProfile::Aggressive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskProfile::Conservative => "conservative",
            RiskProfile::Moderate => "moderate",
            RiskProfile::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskProfile {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        RiskProfile::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| AnalyzerError::UnknownRiskProfile(s.to_string()))
    }
}

/// Limits for one risk profile. Fractions are of capital or price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSettings {
    pub max_position_size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub max_portfolio_risk: f64,
    pub min_score: f64,
}

impl RiskSettings {
    pub fn defaults_for(profile: RiskProfile) -> Self {
        match profile {
            RiskProfile::Conservative => Self {
                max_position_size: 0.05,
                stop_loss: 0.08,
                take_profit: 0.15,
                max_portfolio_risk: 0.10,
                min_score: 70.0,
            },
            RiskProfile::Moderate => Self {
                max_position_size: 0.08,
                stop_loss: 0.10,
                take_profit: 0.20,
                max_portfolio_risk: 0.15,
                min_score: 60.0,
            },
            RiskProfile::Aggressive => Self {
                max_position_size: 0.12,
                stop_loss: 0.15,
                take_profit: 0.30,
                max_portfolio_risk: 0.20,
                min_score: 50.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    StrongBuy,
    Buy,
    Hold,
    WeakHold,
    Sell,
    Avoid,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::StrongBuy => "STRONG_BUY",
            Action::Buy => "BUY",
            Action::Hold => "HOLD",
            Action::WeakHold => "WEAK_HOLD",
            Action::Sell => "SELL",
            Action::Avoid => "AVOID",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Action::StrongBuy | Action::Buy)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Combined score and final action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CombinedScore {
    pub technical_score: f64,
    pub fundamental_score: f64,
    pub combined_score: f64,
    pub grade: Grade,
}

pub fn combined_score(technical: &TechnicalAnalysis, fundamental_score: f64) -> CombinedScore {
    let signal_score = match technical.signals.signal {
        Signal::Buy => 75.0,
        Signal::Sell => 25.0,
        Signal::Hold => 50.0,
    };
    let technical_score =
        (signal_score + technical.signals.confidence + technical.trend.strength) / 3.0;
    let combined = technical_score * TECHNICAL_WEIGHT + fundamental_score * FUNDAMENTAL_WEIGHT;

    CombinedScore {
        technical_score: round_dp(technical_score, 2),
        fundamental_score: round_dp(fundamental_score, 2),
        combined_score: round_dp(combined, 2),
        grade: Grade::from_score(combined),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalRecommendation {
    pub action: Action,
    pub reason: String,
    pub confidence: f64,
    pub time_horizon: &'static str,
}

/// `fundamental_score` gates AVOID; `combined` picks the action band.
pub fn final_recommendation(
    technical_signal: Signal,
    fundamental_action: Action,
    fundamental_score: f64,
    combined: f64,
    risk: &RiskSettings,
) -> FinalRecommendation {
    if fundamental_score < risk.min_score {
        return FinalRecommendation {
            action: Action::Avoid,
            reason: "Fundamental quality below minimum threshold".to_string(),
            confidence: 90.0,
            time_horizon: "N/A",
        };
    }

    let (action, reason, mut confidence, time_horizon) = match combined {
        s if s >= 80.0 => (
            Action::StrongBuy,
            "Excellent technical and fundamental indicators",
            s.min(95.0),
            "6-12 months",
        ),
        s if s >= 70.0 => (
            Action::Buy,
            "Good technical and fundamental indicators",
            (s + 10.0).min(85.0),
            "3-6 months",
        ),
        s if s >= 60.0 => (
            Action::Hold,
            "Average indicators, maintain current position",
            70.0,
            "1-3 months",
        ),
        s if s >= 40.0 => (
            Action::WeakHold,
            "Below average indicators, consider reducing",
            60.0,
            "1 month",
        ),
        s => (
            Action::Sell,
            "Poor indicators, consider exiting",
            (100.0 - s + 10.0).min(85.0),
            "Immediate",
        ),
    };
    let mut reason = reason.to_string();

    let agree = (technical_signal == Signal::Buy && fundamental_action.is_buy())
        || (technical_signal == Signal::Sell && fundamental_action == Action::Sell);
    let conflict = (technical_signal == Signal::Buy && fundamental_action == Action::Sell)
        || (technical_signal == Signal::Sell && fundamental_action.is_buy());

    if agree {
        confidence = (confidence + 10.0).min(95.0);
    } else if conflict {
        confidence = (confidence - 15.0).max(40.0);
        reason.push_str(" (Conflicting signals detected)");
    }

    FinalRecommendation {
        action,
        reason,
        confidence: round_dp(confidence, 1),
        time_horizon,
    }
}

// ---------------------------------------------------------------------------
// Risk management
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSizing {
    /// Fraction of capital.
    pub recommended_size: f64,
    pub size_multiplier: f64,
    pub reasoning: &'static str,
}

pub fn position_sizing(risk: &RiskSettings, risk_reward_ratio: f64) -> PositionSizing {
    let (size_multiplier, reasoning) = match risk_reward_ratio {
        r if r >= 3.0 => (1.2, "Excellent risk/reward ratio justifies larger position"),
        r if r >= 2.0 => (1.0, "Good risk/reward ratio supports normal position size"),
        r if r >= 1.5 => (0.8, "Moderate risk/reward ratio suggests smaller position"),
        _ => (
            0.5,
            "Poor risk/reward ratio requires significantly reduced position",
        ),
    };
    PositionSizing {
        recommended_size: round_dp(risk.max_position_size * size_multiplier, 4),
        size_multiplier,
        reasoning,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskManagement {
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Fraction of capital.
    pub max_position_size: f64,
    pub risk_amount: f64,
    pub reward_amount: f64,
    pub risk_reward_ratio: f64,
    pub atr: f64,
    pub position_sizing: PositionSizing,
}

/// Long-side levels from the profile, tightened by the technical stop and
/// first take-profit when those sit on the right side of the price.
pub fn risk_management(technical: &TechnicalAnalysis, risk: &RiskSettings) -> Option<RiskManagement> {
    let targets = technical.price_targets.as_ref()?;
    let p = targets.current_price;
    if p <= 0.0 {
        return None;
    }

    let mut stop_loss = p * (1.0 - risk.stop_loss);
    let mut take_profit = p * (1.0 + risk.take_profit);
    if let Some(level) = targets.stop_loss.filter(|l| l.price < p) {
        stop_loss = stop_loss.max(level.price);
    }
    if let Some(level) = targets.take_profit_1.filter(|l| l.price > p) {
        take_profit = take_profit.min(level.price);
    }

    let risk_amount = p - stop_loss;
    let reward_amount = take_profit - p;
    let risk_reward_ratio = if risk_amount > 0.0 {
        reward_amount / risk_amount
    } else {
        0.0
    };

    Some(RiskManagement {
        entry_price: p,
        stop_loss: round_dp(stop_loss, 2),
        take_profit: round_dp(take_profit, 2),
        max_position_size: risk.max_position_size,
        risk_amount: round_dp(risk_amount, 2),
        reward_amount: round_dp(reward_amount, 2),
        risk_reward_ratio: round_dp(risk_reward_ratio, 2),
        atr: round_dp(targets.atr, 2),
        position_sizing: position_sizing(risk, risk_reward_ratio),
    })
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsightKind {
    Technical,
    Fundamental,
    Recommendation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub insight: String,
    pub action: String,
    pub priority: Priority,
}

impl Insight {
    fn new(kind: InsightKind, insight: impl Into<String>, action: impl Into<String>, priority: Priority) -> Self {
        Self {
            kind,
            insight: insight.into(),
            action: action.into(),
            priority,
        }
    }
}

pub fn actionable_insights(
    technical: &TechnicalAnalysis,
    fundamental: Option<&FundamentalAnalysis>,
    recommendation: &FinalRecommendation,
    profile: RiskProfile,
) -> Vec<Insight> {
    use InsightKind::*;
    use Priority::*;

    let mut insights = Vec::new();

    match technical.trend.trend {
        Trend::Bullish => insights.push(Insight::new(
            Technical,
            "Uptrend detected with positive momentum",
            "Consider buying on dips",
            High,
        )),
        Trend::Bearish => insights.push(Insight::new(
            Technical,
            "Downtrend detected with negative momentum",
            "Consider selling on rallies or avoid",
            High,
        )),
        _ => {}
    }

    let reasons = &technical.signals.reasons;
    if reasons.contains(&SignalReason::RsiOversold) {
        insights.push(Insight::new(
            Technical,
            "RSI indicates oversold conditions",
            "Potential reversal opportunity",
            Medium,
        ));
    } else if reasons.contains(&SignalReason::RsiOverbought) {
        insights.push(Insight::new(
            Technical,
            "RSI indicates overbought conditions",
            "Consider taking profits",
            Medium,
        ));
    }

    let sr = &technical.support_resistance;
    if let Some(level) = sr.nearest_resistance {
        insights.push(Insight::new(
            Technical,
            format!("Nearest resistance at {}", level),
            "Watch for potential reversal at resistance",
            Medium,
        ));
    }
    if let Some(level) = sr.nearest_support {
        insights.push(Insight::new(
            Technical,
            format!("Nearest support at {}", level),
            "Consider buying near support levels",
            Medium,
        ));
    }

    if let Some(f) = fundamental {
        match f.valuation.overall.status {
            OverallValuation::Attractive => insights.push(Insight::new(
                Fundamental,
                "Stock appears attractively valued",
                "Good entry point for long-term investors",
                High,
            )),
            OverallValuation::Expensive => insights.push(Insight::new(
                Fundamental,
                "Stock appears expensive",
                "Wait for better entry price",
                Medium,
            )),
            OverallValuation::Fair => {}
        }

        if f.profitability.overall.status == Quality::Excellent {
            insights.push(Insight::new(
                Fundamental,
                "Company has excellent profitability",
                "Strong candidate for long-term holding",
                High,
            ));
        }

        match f.financial_health.overall.status {
            Quality::Excellent => insights.push(Insight::new(
                Fundamental,
                "Company has excellent financial health",
                "Lower risk profile suitable for conservative investors",
                High,
            )),
            Quality::Poor => insights.push(Insight::new(
                Fundamental,
                "Company has poor financial health",
                "Higher risk, requires careful monitoring",
                High,
            )),
            _ => {}
        }
    }

    if recommendation.action.is_buy() {
        insights.push(Insight::new(
            Recommendation,
            "Analysis supports buying opportunity",
            format!("Consider position sizing based on {} risk profile", profile),
            High,
        ));
    } else if recommendation.action == Action::Sell {
        insights.push(Insight::new(
            Recommendation,
            "Analysis suggests selling",
            "Consider reducing or exiting position",
            High,
        ));
    }

    insights
}

// ---------------------------------------------------------------------------
// Per-stock recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockRecommendation {
    pub ticker: String,
    pub recommendation: FinalRecommendation,
    pub combined_score: CombinedScore,
    pub technical_signal: Signal,
    pub technical_confidence: f64,
    /// `None` when no company data was available.
    pub fundamental_score: Option<f64>,
    pub fundamental_recommendation: Option<Action>,
    pub trend: Trend,
    pub risk_management: Option<RiskManagement>,
    pub insights: Vec<Insight>,
    pub risk_profile: RiskProfile,
}

pub fn generate_recommendation(
    ticker: &str,
    technical: &TechnicalAnalysis,
    fundamental: Option<&FundamentalAnalysis>,
    profile: RiskProfile,
    risk: &RiskSettings,
) -> StockRecommendation {
    let fundamental_score = fundamental.map(|f| f.score.total_score);
    let fundamental_action = fundamental.map(|f| f.recommendation.recommendation);

    let score = combined_score(
        technical,
        fundamental_score.unwrap_or(NEUTRAL_FUNDAMENTAL_SCORE),
    );
    let recommendation = final_recommendation(
        technical.signals.signal,
        fundamental_action.unwrap_or(Action::Hold),
        score.fundamental_score,
        score.combined_score,
        risk,
    );
    let insights = actionable_insights(technical, fundamental, &recommendation, profile);

    StockRecommendation {
        ticker: ticker.to_string(),
        combined_score: score,
        technical_signal: technical.signals.signal,
        technical_confidence: technical.signals.confidence,
        fundamental_score,
        fundamental_recommendation: fundamental_action,
        trend: technical.trend.trend,
        risk_management: risk_management(technical, risk),
        insights,
        risk_profile: profile,
        recommendation,
    }
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioPosition {
    pub ticker: String,
    pub action: Action,
    pub position_size: f64,
    pub position_percentage: f64,
    pub combined_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diversification {
    pub score: u32,
    pub status: &'static str,
    pub max_position: f64,
    pub number_of_positions: usize,
    pub recommendation: &'static str,
}

pub fn diversification(positions: &[PortfolioPosition]) -> Diversification {
    let n = positions.len();
    let max_position = positions
        .iter()
        .map(|p| p.position_percentage)
        .fold(0.0, f64::max);

    let (score, status) = match (max_position, n) {
        _ if n == 0 => (0, "No positions"),
        (m, n) if m <= 5.0 && n >= 15 => (100, "Excellent"),
        (m, n) if m <= 8.0 && n >= 10 => (80, "Good"),
        (m, n) if m <= 12.0 && n >= 7 => (60, "Moderate"),
        (m, n) if m <= 15.0 && n >= 5 => (40, "Poor"),
        _ => (20, "Very Poor"),
    };

    Diversification {
        score,
        status,
        max_position,
        number_of_positions: n,
        recommendation: if n < 10 {
            "Consider adding more positions"
        } else {
            "Good diversification"
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioPlan {
    pub positions: Vec<PortfolioPosition>,
    pub total_capital: f64,
    pub total_allocated: f64,
    pub remaining_capital: f64,
    pub number_of_positions: usize,
    pub risk_profile: RiskProfile,
    pub diversification: Diversification,
}

/// Greedy allocation: best combined scores first, each capped at the
/// profile's maximum position size, never exceeding `capital`. Stocks whose
/// own recommendation is AVOID are never funded.
pub fn build_portfolio(
    analyses: &[StockRecommendation],
    capital: f64,
    profile: RiskProfile,
    risk: &RiskSettings,
) -> PortfolioPlan {
    let mut qualified: Vec<&StockRecommendation> = analyses
        .iter()
        .filter(|a| a.combined_score.combined_score >= risk.min_score)
        .filter(|a| a.recommendation.action != Action::Avoid)
        .collect();
    qualified.sort_by(|a, b| {
        b.combined_score
            .combined_score
            .total_cmp(&a.combined_score.combined_score)
    });

    let max_position = capital * risk.max_position_size;
    let mut remaining = capital.max(0.0);
    let mut positions = Vec::new();

    for stock in qualified {
        if remaining <= 0.0 {
            break;
        }
        let size = max_position.min(remaining);
        if size <= 0.0 {
            continue;
        }
        positions.push(PortfolioPosition {
            ticker: stock.ticker.clone(),
            action: stock.recommendation.action,
            position_size: round_dp(size, 2),
            position_percentage: round_dp(size / capital * 100.0, 2),
            combined_score: stock.combined_score.combined_score,
        });
        remaining -= size;
    }

    PortfolioPlan {
        total_capital: capital,
        total_allocated: round_dp(capital.max(0.0) - remaining, 2),
        remaining_capital: round_dp(remaining, 2),
        number_of_positions: positions.len(),
        risk_profile: profile,
        diversification: diversification(&positions),
        positions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::technical::{
        PriceLevel, PriceTargets, SignalAnalysis, SupportResistance, TrendAnalysis,
    };

    fn technical(signal: Signal, confidence: f64, trend: Trend, strength: f64) -> TechnicalAnalysis {
        TechnicalAnalysis {
            trend: TrendAnalysis {
                trend,
                strength,
                signals: Vec::new(),
                price_change_20d: None,
            },
            signals: SignalAnalysis {
                signal,
                confidence,
                buy_signals: 0,
                sell_signals: 0,
                reasons: Vec::new(),
            },
            support_resistance: SupportResistance::default(),
            price_targets: None,
            indicators: None,
        }
    }

    fn targets(price: f64, atr: f64) -> PriceTargets {
        PriceTargets {
            current_price: price,
            atr,
            take_profit_1: None,
            take_profit_2: None,
            take_profit_3: None,
            stop_loss: None,
            stop_loss_2: None,
            support: None,
            resistance: None,
        }
    }

    fn moderate() -> RiskSettings {
        RiskSettings::defaults_for(RiskProfile::Moderate)
    }

    #[test]
    fn risk_profile_parses_case_insensitively() {
        assert_eq!("Aggressive".parse::<RiskProfile>().unwrap(), RiskProfile::Aggressive);
        assert!(matches!(
            "yolo".parse::<RiskProfile>(),
            Err(AnalyzerError::UnknownRiskProfile(name)) if name == "yolo"
        ));
        assert_eq!(RiskProfile::default(), RiskProfile::Moderate);
    }

    #[test]
    fn combined_score_weights() {
        let t = technical(Signal::Buy, 75.0, Trend::Bullish, 75.0);
        let score = combined_score(&t, 90.0);
        assert_eq!(score.technical_score, 75.0);
        assert_eq!(score.combined_score, 84.0);
        assert_eq!(score.grade, Grade::A);

        let t = technical(Signal::Hold, 50.0, Trend::Neutral, 50.0);
        assert_eq!(combined_score(&t, NEUTRAL_FUNDAMENTAL_SCORE).combined_score, 50.0);
    }

    #[test]
    fn avoid_below_profile_minimum() {
        let rec = final_recommendation(Signal::Buy, Action::Buy, 55.0, 85.0, &moderate());
        assert_eq!(rec.action, Action::Avoid);
        assert_eq!(rec.confidence, 90.0);
        assert_eq!(rec.time_horizon, "N/A");
    }

    #[test]
    fn action_bands_and_horizons() {
        let cases = [
            (85.0, Action::StrongBuy, 85.0, "6-12 months"),
            (72.0, Action::Buy, 82.0, "3-6 months"),
            (65.0, Action::Hold, 70.0, "1-3 months"),
            (45.0, Action::WeakHold, 60.0, "1 month"),
            (30.0, Action::Sell, 80.0, "Immediate"),
        ];
        let lenient = RiskSettings {
            min_score: 0.0,
            ..moderate()
        };
        for (combined, action, confidence, horizon) in cases {
            let rec = final_recommendation(Signal::Hold, Action::Hold, 80.0, combined, &lenient);
            assert_eq!(rec.action, action, "combined {combined}");
            assert_eq!(rec.confidence, confidence, "combined {combined}");
            assert_eq!(rec.time_horizon, horizon);
        }
    }

    #[test]
    fn agreement_and_conflict_adjust_confidence() {
        let agree = final_recommendation(Signal::Buy, Action::StrongBuy, 80.0, 72.0, &moderate());
        assert_eq!(agree.confidence, 92.0);
        assert!(!agree.reason.contains("Conflicting"));

        let conflict = final_recommendation(Signal::Sell, Action::Buy, 80.0, 72.0, &moderate());
        assert_eq!(conflict.confidence, 67.0);
        assert!(conflict.reason.ends_with("(Conflicting signals detected)"));
    }

    #[test]
    fn risk_management_uses_tighter_levels() {
        let mut t = technical(Signal::Buy, 75.0, Trend::Bullish, 75.0);
        let mut pt = targets(1000.0, 20.0);
        pt.stop_loss = Some(PriceLevel { price: 970.0, pct: -3.0 });
        pt.take_profit_1 = Some(PriceLevel { price: 1040.0, pct: 4.0 });
        t.price_targets = Some(pt);

        let rm = risk_management(&t, &moderate()).unwrap();
        assert_eq!(rm.stop_loss, 970.0);
        assert_eq!(rm.take_profit, 1040.0);
        assert_eq!(rm.risk_amount, 30.0);
        assert_eq!(rm.reward_amount, 40.0);
        assert_eq!(rm.risk_reward_ratio, 1.33);
        assert_eq!(rm.position_sizing.size_multiplier, 0.5);
        assert_eq!(rm.position_sizing.recommended_size, 0.04);
    }

    #[test]
    fn risk_management_profile_levels_without_technical_targets() {
        let mut t = technical(Signal::Hold, 50.0, Trend::Neutral, 50.0);
        t.price_targets = Some(targets(1000.0, 20.0));
        let rm = risk_management(&t, &moderate()).unwrap();
        assert_eq!(rm.stop_loss, 900.0);
        assert_eq!(rm.take_profit, 1200.0);
        assert_eq!(rm.risk_reward_ratio, 2.0);
        assert_eq!(rm.position_sizing.size_multiplier, 1.0);

        t.price_targets = None;
        assert!(risk_management(&t, &moderate()).is_none());
    }

    #[test]
    fn position_sizing_multipliers() {
        let risk = moderate();
        assert_eq!(position_sizing(&risk, 3.5).size_multiplier, 1.2);
        assert_eq!(position_sizing(&risk, 1.6).size_multiplier, 0.8);
        assert_eq!(position_sizing(&risk, 0.0).size_multiplier, 0.5);
    }

    #[test]
    fn insights_cover_trend_levels_and_action() {
        let mut t = technical(Signal::Buy, 80.0, Trend::Bullish, 80.0);
        t.signals.reasons = vec![SignalReason::RsiOversold];
        t.support_resistance.nearest_support = Some(950.0);
        let rec = FinalRecommendation {
            action: Action::Buy,
            reason: String::new(),
            confidence: 80.0,
            time_horizon: "3-6 months",
        };
        let insights = actionable_insights(&t, None, &rec, RiskProfile::Aggressive);
        let texts: Vec<&str> = insights.iter().map(|i| i.insight.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Uptrend detected with positive momentum",
                "RSI indicates oversold conditions",
                "Nearest support at 950",
                "Analysis supports buying opportunity",
            ]
        );
        assert!(insights[3].action.contains("aggressive"));
    }

    fn stock(ticker: &str, score: f64) -> StockRecommendation {
        let t = technical(Signal::Hold, 50.0, Trend::Neutral, 50.0);
        let mut rec = generate_recommendation(ticker, &t, None, RiskProfile::Moderate, &moderate());
        rec.combined_score.combined_score = score;
        rec.recommendation.action = Action::Buy;
        rec
    }

    #[test]
    fn portfolio_skips_avoided_stocks() {
        let t = technical(Signal::Buy, 90.0, Trend::Bullish, 90.0);
        let mut avoided = generate_recommendation("A.JK", &t, None, RiskProfile::Moderate, &moderate());
        avoided.combined_score.combined_score = 90.0;
        assert_eq!(avoided.recommendation.action, Action::Avoid);

        let analyses = vec![avoided, stock("B.JK", 65.0)];
        let plan = build_portfolio(&analyses, 100_000.0, RiskProfile::Moderate, &moderate());

        assert_eq!(plan.number_of_positions, 1);
        assert_eq!(plan.positions[0].ticker, "B.JK");
        assert!(plan.positions.iter().all(|p| p.action != Action::Avoid));
    }

    #[test]
    fn portfolio_sorts_and_caps_allocation() {
        let analyses = vec![stock("A.JK", 65.0), stock("B.JK", 90.0), stock("C.JK", 40.0)];
        let plan = build_portfolio(&analyses, 100_000.0, RiskProfile::Moderate, &moderate());

        let tickers: Vec<&str> = plan.positions.iter().map(|p| p.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["B.JK", "A.JK"]);
        assert_eq!(plan.positions[0].position_size, 8_000.0);
        assert_eq!(plan.positions[0].position_percentage, 8.0);
        assert_eq!(plan.total_allocated, 16_000.0);
        assert_eq!(plan.remaining_capital, 84_000.0);
        assert_eq!(plan.diversification.score, 20);
        assert_eq!(plan.diversification.status, "Very Poor");
    }

    #[test]
    fn portfolio_never_exceeds_capital() {
        let risk = RiskSettings {
            max_position_size: 0.4,
            min_score: 0.0,
            ..moderate()
        };
        let analyses: Vec<_> = (0..5).map(|i| stock(&format!("T{i}.JK"), 70.0)).collect();
        let plan = build_portfolio(&analyses, 1_000.0, RiskProfile::Aggressive, &risk);
        let total: f64 = plan.positions.iter().map(|p| p.position_size).sum();
        assert_eq!(plan.number_of_positions, 3);
        assert!(total <= 1_000.0 + 1e-9);
        assert_eq!(plan.remaining_capital, 0.0);
    }

    #[test]
    fn diversification_bands() {
        let positions = |n: usize, pct: f64| -> Vec<PortfolioPosition> {
            (0..n)
                .map(|i| PortfolioPosition {
                    ticker: format!("T{i}"),
                    action: Action::Buy,
                    position_size: pct * 10.0,
                    position_percentage: pct,
                    combined_score: 70.0,
                })
                .collect()
        };
        assert_eq!(diversification(&positions(15, 5.0)).score, 100);
        assert_eq!(diversification(&positions(12, 8.0)).score, 80);
        assert_eq!(diversification(&positions(7, 12.0)).score, 60);
        assert_eq!(diversification(&positions(5, 15.0)).score, 40);
        let empty = diversification(&[]);
        assert_eq!(empty.score, 0);
        assert_eq!(empty.status, "No positions");
    }
}
