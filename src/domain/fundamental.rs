//! Fundamental analysis: valuation, profitability, financial health,
//! dividend, intrinsic value and a 0-100 score.
//!
//! Ratios are judged against an industry benchmark picked from the company's
//! industry or sector. Missing figures never fail the analysis; they degrade
//! to an `Unavailable` status or the weakest band.

use serde::Serialize;

use crate::domain::company::CompanyInfo;
use crate::domain::recommendation::Action;
use crate::domain::scoring::{round_dp, Grade};
use crate::domain::settings::FundamentalThresholds;

const LARGE_CAP: f64 = 50e9;
const MID_CAP: f64 = 10e9;
const DCF_DISCOUNT_RATE: f64 = 0.10;
const DCF_GROWTH_RATE: f64 = 0.03;
const GRAHAM_MULTIPLIER: f64 = 22.5;
const BOOK_VALUE_MULTIPLE: f64 = 1.5;
const DEFAULT_BETA: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndustryBenchmark {
    pub name: &'static str,
    pub pe_range: (f64, f64),
    pub pb_range: (f64, f64),
    pub roe_avg: f64,
    pub debt_to_equity_max: f64,
}

/// Matched in order against the lower-cased industry, then sector.
const BENCHMARKS: [IndustryBenchmark; 5] = [
    IndustryBenchmark {
        name: "banking",
        pe_range: (8.0, 15.0),
        pb_range: (1.0, 2.0),
        roe_avg: 15.0,
        debt_to_equity_max: 10.0,
    },
    IndustryBenchmark {
        name: "consumer",
        pe_range: (15.0, 25.0),
        pb_range: (2.0, 5.0),
        roe_avg: 20.0,
        debt_to_equity_max: 1.0,
    },
    IndustryBenchmark {
        name: "infrastructure",
        pe_range: (12.0, 20.0),
        pb_range: (1.5, 3.0),
        roe_avg: 15.0,
        debt_to_equity_max: 2.0,
    },
    IndustryBenchmark {
        name: "mining",
        pe_range: (10.0, 20.0),
        pb_range: (1.0, 3.0),
        roe_avg: 15.0,
        debt_to_equity_max: 1.5,
    },
    IndustryBenchmark {
        name: "telecommunication",
        pe_range: (15.0, 25.0),
        pb_range: (2.0, 4.0),
        roe_avg: 20.0,
        debt_to_equity_max: 1.5,
    },
];

const DEFAULT_BENCHMARK: IndustryBenchmark = IndustryBenchmark {
    name: "default",
    pe_range: (10.0, 20.0),
    pb_range: (1.0, 3.0),
    roe_avg: 15.0,
    debt_to_equity_max: 1.5,
};

pub fn benchmark_for(info: &CompanyInfo) -> &'static IndustryBenchmark {
    let (industry, sector) = info.classification();
    BENCHMARKS
        .iter()
        .find(|b| industry.contains(b.name) || sector.contains(b.name))
        .unwrap_or(&DEFAULT_BENCHMARK)
}

/// A status with the sentence shown next to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment<S> {
    pub status: S,
    pub interpretation: &'static str,
}

/// A single metric, its value when known, and its assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricAssessment<S> {
    pub value: Option<f64>,
    pub status: S,
    pub interpretation: &'static str,
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValuationStatus {
    Undervalued,
    Fair,
    Overvalued,
    Unavailable,
}

impl ValuationStatus {
    fn points(&self) -> i32 {
        match self {
            ValuationStatus::Undervalued => 1,
            ValuationStatus::Overvalued => -1,
            ValuationStatus::Fair | ValuationStatus::Unavailable => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallValuation {
    Attractive,
    Fair,
    Expensive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketCapTier {
    LargeCap,
    MidCap,
    SmallCap,
    Unknown,
}

impl MarketCapTier {
    pub fn from_market_cap(market_cap: Option<f64>) -> Self {
        match market_cap {
            Some(cap) if cap > LARGE_CAP => MarketCapTier::LargeCap,
            Some(cap) if cap > MID_CAP => MarketCapTier::MidCap,
            Some(_) => MarketCapTier::SmallCap,
            None => MarketCapTier::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioAnalysis {
    pub value: Option<f64>,
    pub industry_range: (f64, f64),
    pub status: ValuationStatus,
    pub interpretation: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationAnalysis {
    pub pe: RatioAnalysis,
    pub pb: RatioAnalysis,
    pub market_cap: Option<f64>,
    pub market_cap_tier: MarketCapTier,
    pub overall: Assessment<OverallValuation>,
}

fn ratio_analysis(value: Option<f64>, range: (f64, f64), texts: [&'static str; 3]) -> RatioAnalysis {
    let (status, interpretation) = match value.filter(|v| *v > 0.0) {
        None => (ValuationStatus::Unavailable, "Ratio not available"),
        Some(v) if v < range.0 => (ValuationStatus::Undervalued, texts[0]),
        Some(v) if v > range.1 => (ValuationStatus::Overvalued, texts[1]),
        Some(_) => (ValuationStatus::Fair, texts[2]),
    };
    RatioAnalysis {
        value,
        industry_range: range,
        status,
        interpretation,
    }
}

pub fn analyze_valuation(info: &CompanyInfo, benchmark: &IndustryBenchmark) -> ValuationAnalysis {
    let pe = ratio_analysis(
        info.pe_ratio,
        benchmark.pe_range,
        [
            "Stock appears undervalued compared to industry",
            "Stock appears overvalued compared to industry",
            "P/E ratio is within industry range",
        ],
    );
    let pb = ratio_analysis(
        info.pb_ratio,
        benchmark.pb_range,
        [
            "Stock appears undervalued based on book value",
            "Stock appears overvalued based on book value",
            "P/B ratio is within industry range",
        ],
    );

    let overall = match pe.status.points() + pb.status.points() {
        s if s >= 1 => Assessment {
            status: OverallValuation::Attractive,
            interpretation: "Stock appears attractively valued",
        },
        s if s <= -1 => Assessment {
            status: OverallValuation::Expensive,
            interpretation: "Stock appears expensive",
        },
        _ => Assessment {
            status: OverallValuation::Fair,
            interpretation: "Stock appears fairly valued",
        },
    };

    ValuationAnalysis {
        pe,
        pb,
        market_cap: info.market_cap,
        market_cap_tier: MarketCapTier::from_market_cap(info.market_cap),
        overall,
    }
}

// ---------------------------------------------------------------------------
// Profitability and financial health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quality {
    Excellent,
    Good,
    Average,
    Poor,
}

impl Quality {
    /// Two points for each top-band metric, one for each second-band one.
    fn from_points(points: u32) -> Self {
        match points {
            p if p >= 3 => Quality::Excellent,
            2 => Quality::Good,
            1 => Quality::Average,
            _ => Quality::Poor,
        }
    }

    fn points(&self) -> u32 {
        match self {
            Quality::Excellent => 2,
            Quality::Good => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitabilityAnalysis {
    pub roe: MetricAssessment<Quality>,
    pub profit_margin: MetricAssessment<Quality>,
    pub overall: Assessment<Quality>,
}

/// Net income over revenue in percent; zero when revenue is not positive.
pub fn profit_margin(info: &CompanyInfo) -> f64 {
    match (info.net_income, info.revenue) {
        (Some(income), Some(revenue)) if revenue > 0.0 => income / revenue * 100.0,
        _ => 0.0,
    }
}

pub fn analyze_profitability(
    info: &CompanyInfo,
    benchmark: &IndustryBenchmark,
) -> ProfitabilityAnalysis {
    let roe_value = info.roe.unwrap_or(0.0);
    let (roe_status, roe_text) = match roe_value {
        v if v > benchmark.roe_avg => (
            Quality::Excellent,
            "Company generates excellent returns for shareholders",
        ),
        v if v > 10.0 => (Quality::Good, "Company generates good returns for shareholders"),
        v if v > 5.0 => (
            Quality::Average,
            "Company generates average returns for shareholders",
        ),
        _ => (Quality::Poor, "Company generates poor returns for shareholders"),
    };

    let margin = profit_margin(info);
    let (margin_status, margin_text) = match margin {
        m if m > 20.0 => (Quality::Excellent, "Company has excellent profit margins"),
        m if m > 10.0 => (Quality::Good, "Company has good profit margins"),
        m if m > 5.0 => (Quality::Average, "Company has average profit margins"),
        _ => (Quality::Poor, "Company has low profit margins"),
    };

    let status = Quality::from_points(roe_status.points() + margin_status.points());
    let interpretation = match status {
        Quality::Excellent => "Company has excellent profitability",
        Quality::Good => "Company has good profitability",
        Quality::Average => "Company has average profitability",
        Quality::Poor => "Company has poor profitability",
    };

    ProfitabilityAnalysis {
        roe: MetricAssessment {
            value: info.roe,
            status: roe_status,
            interpretation: roe_text,
        },
        profit_margin: MetricAssessment {
            value: Some(round_dp(margin, 2)),
            status: margin_status,
            interpretation: margin_text,
        },
        overall: Assessment {
            status,
            interpretation,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebtStatus {
    VeryHealthy,
    Healthy,
    Moderate,
    HighRisk,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolatilityRisk {
    LowRisk,
    Average,
    HighRisk,
    VeryHighRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialHealthAnalysis {
    pub debt_to_equity: MetricAssessment<DebtStatus>,
    pub beta: MetricAssessment<VolatilityRisk>,
    pub overall: Assessment<Quality>,
}

pub fn analyze_financial_health(
    info: &CompanyInfo,
    benchmark: &IndustryBenchmark,
) -> FinancialHealthAnalysis {
    let (dte_status, dte_text) = match info.debt_to_equity {
        None => (DebtStatus::Unavailable, "Debt to equity not available"),
        Some(v) if v < 0.5 => (DebtStatus::VeryHealthy, "Company has very low debt levels"),
        Some(v) if v < benchmark.debt_to_equity_max => {
            (DebtStatus::Healthy, "Company has manageable debt levels")
        }
        Some(v) if v < 2.0 => (DebtStatus::Moderate, "Company has moderate debt levels"),
        Some(_) => (DebtStatus::HighRisk, "Company has high debt levels"),
    };

    let beta = info.beta.unwrap_or(DEFAULT_BETA);
    let (beta_status, beta_text) = match beta {
        b if b < 0.8 => (VolatilityRisk::LowRisk, "Stock has lower volatility than market"),
        b if b < 1.2 => (
            VolatilityRisk::Average,
            "Stock has average volatility similar to market",
        ),
        b if b < 1.5 => (VolatilityRisk::HighRisk, "Stock has higher volatility than market"),
        _ => (VolatilityRisk::VeryHighRisk, "Stock has very high volatility"),
    };

    let dte_points = match dte_status {
        DebtStatus::VeryHealthy => 2,
        DebtStatus::Healthy => 1,
        _ => 0,
    };
    let beta_points = match beta_status {
        VolatilityRisk::LowRisk => 2,
        VolatilityRisk::Average => 1,
        _ => 0,
    };

    let status = Quality::from_points(dte_points + beta_points);
    let interpretation = match status {
        Quality::Excellent => "Company has excellent financial health",
        Quality::Good => "Company has good financial health",
        Quality::Average => "Company has average financial health",
        Quality::Poor => "Company has poor financial health",
    };

    FinancialHealthAnalysis {
        debt_to_equity: MetricAssessment {
            value: info.debt_to_equity,
            status: dte_status,
            interpretation: dte_text,
        },
        beta: MetricAssessment {
            value: Some(beta),
            status: beta_status,
            interpretation: beta_text,
        },
        overall: Assessment {
            status,
            interpretation,
        },
    }
}

// ---------------------------------------------------------------------------
// Dividend and intrinsic value
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DividendStatus {
    HighYield,
    GoodYield,
    ModerateYield,
    LowYield,
    NoDividend,
}

pub fn analyze_dividend(info: &CompanyInfo) -> MetricAssessment<DividendStatus> {
    let (status, interpretation) = match info.dividend_yield.unwrap_or(0.0) {
        y if y > 6.0 => (DividendStatus::HighYield, "Stock offers high dividend yield"),
        y if y > 3.0 => (DividendStatus::GoodYield, "Stock offers good dividend yield"),
        y if y > 1.0 => (
            DividendStatus::ModerateYield,
            "Stock offers moderate dividend yield",
        ),
        y if y > 0.0 => (DividendStatus::LowYield, "Stock offers low dividend yield"),
        _ => (DividendStatus::NoDividend, "Company does not pay dividends"),
    };
    MetricAssessment {
        value: info.dividend_yield,
        status,
        interpretation,
    }
}

/// Per-share value estimates; each method is skipped when its inputs are missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IntrinsicValue {
    pub graham_number: Option<f64>,
    pub pe_method: Option<f64>,
    pub book_value_method: Option<f64>,
    pub dcf_method: Option<f64>,
}

pub fn calculate_intrinsic_value(info: &CompanyInfo, fair_pe: f64) -> IntrinsicValue {
    let positive = |v: Option<f64>| v.filter(|x| *x > 0.0);
    let eps = positive(info.eps);
    let book = positive(info.book_value);

    IntrinsicValue {
        graham_number: eps
            .zip(book)
            .map(|(e, b)| round_dp((GRAHAM_MULTIPLIER * e * b).sqrt(), 2)),
        pe_method: eps.map(|e| round_dp(e * fair_pe, 2)),
        book_value_method: book.map(|b| round_dp(b * BOOK_VALUE_MULTIPLE, 2)),
        dcf_method: positive(info.operating_cash_flow)
            .zip(positive(info.shares_outstanding))
            .map(|(ocf, shares)| {
                let value = ocf * (1.0 + DCF_GROWTH_RATE) / (DCF_DISCOUNT_RATE - DCF_GROWTH_RATE);
                round_dp(value / shares, 2)
            }),
    }
}

// ---------------------------------------------------------------------------
// Threshold checklist
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckResult {
    Pass,
    Fail,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdCheck {
    pub metric: &'static str,
    pub value: Option<f64>,
    pub threshold: f64,
    pub result: CheckResult,
}

fn check(metric: &'static str, value: Option<f64>, threshold: f64, at_most: bool) -> ThresholdCheck {
    let result = match value {
        None => CheckResult::Unavailable,
        Some(v) if (at_most && v <= threshold) || (!at_most && v >= threshold) => CheckResult::Pass,
        Some(_) => CheckResult::Fail,
    };
    ThresholdCheck {
        metric,
        value,
        threshold,
        result,
    }
}

pub fn threshold_checklist(info: &CompanyInfo, thresholds: &FundamentalThresholds) -> Vec<ThresholdCheck> {
    let positive = |v: Option<f64>| v.filter(|x| *x > 0.0);
    vec![
        check("P/E", positive(info.pe_ratio), thresholds.pe_good, true),
        check("PBV", positive(info.pb_ratio), thresholds.pbv_good, true),
        check("ROE", info.roe, thresholds.roe_good, false),
        check("D/E", info.debt_to_equity, thresholds.debt_to_equity_good, true),
    ]
}

// ---------------------------------------------------------------------------
// Score and recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub valuation: u32,
    pub profitability: u32,
    pub financial_health: u32,
    pub dividend: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FundamentalScore {
    pub total_score: f64,
    pub grade: Grade,
    pub breakdown: ScoreBreakdown,
}

fn quality_points(quality: Quality) -> u32 {
    match quality {
        Quality::Excellent => 25,
        Quality::Good => 20,
        Quality::Average => 15,
        Quality::Poor => 5,
    }
}

pub fn fundamental_score(
    valuation: &ValuationAnalysis,
    profitability: &ProfitabilityAnalysis,
    health: &FinancialHealthAnalysis,
    dividend: &MetricAssessment<DividendStatus>,
) -> FundamentalScore {
    let breakdown = ScoreBreakdown {
        valuation: match valuation.overall.status {
            OverallValuation::Attractive => 25,
            OverallValuation::Fair => 15,
            OverallValuation::Expensive => 5,
        },
        profitability: quality_points(profitability.overall.status),
        financial_health: quality_points(health.overall.status),
        dividend: match dividend.status {
            DividendStatus::HighYield | DividendStatus::GoodYield => 20,
            DividendStatus::ModerateYield => 15,
            DividendStatus::LowYield => 10,
            DividendStatus::NoDividend => 5,
        },
    };
    let total = breakdown.valuation
        + breakdown.profitability
        + breakdown.financial_health
        + breakdown.dividend;

    FundamentalScore {
        total_score: total as f64,
        grade: Grade::from_score(total as f64),
        breakdown,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FundamentalRecommendation {
    pub recommendation: Action,
    pub reasoning: &'static str,
    pub confidence: f64,
}

pub fn fundamental_recommendation(score: f64) -> FundamentalRecommendation {
    let (recommendation, reasoning) = match score {
        s if s >= 80.0 => (
            Action::StrongBuy,
            "Excellent fundamentals with strong financial health and attractive valuation",
        ),
        s if s >= 70.0 => (Action::Buy, "Good fundamentals with solid financial metrics"),
        s if s >= 60.0 => (
            Action::Hold,
            "Average fundamentals, suitable for existing positions",
        ),
        s if s >= 40.0 => (
            Action::WeakHold,
            "Below average fundamentals, monitor closely",
        ),
        _ => (Action::Sell, "Poor fundamentals, consider reducing exposure"),
    };
    FundamentalRecommendation {
        recommendation,
        reasoning,
        confidence: score.clamp(50.0, 95.0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundamentalAnalysis {
    pub company: CompanyInfo,
    pub benchmark: IndustryBenchmark,
    pub valuation: ValuationAnalysis,
    pub profitability: ProfitabilityAnalysis,
    pub financial_health: FinancialHealthAnalysis,
    pub dividend: MetricAssessment<DividendStatus>,
    pub intrinsic_value: IntrinsicValue,
    pub thresholds: Vec<ThresholdCheck>,
    pub score: FundamentalScore,
    pub recommendation: FundamentalRecommendation,
}

pub fn comprehensive_fundamental_analysis(
    info: &CompanyInfo,
    thresholds: &FundamentalThresholds,
) -> FundamentalAnalysis {
    let benchmark = benchmark_for(info);
    let valuation = analyze_valuation(info, benchmark);
    let profitability = analyze_profitability(info, benchmark);
    let financial_health = analyze_financial_health(info, benchmark);
    let dividend = analyze_dividend(info);
    let score = fundamental_score(&valuation, &profitability, &financial_health, &dividend);

    FundamentalAnalysis {
        company: info.clone(),
        benchmark: *benchmark,
        intrinsic_value: calculate_intrinsic_value(info, thresholds.pe_good),
        thresholds: threshold_checklist(info, thresholds),
        recommendation: fundamental_recommendation(score.total_score),
        valuation,
        profitability,
        financial_health,
        dividend,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bank() -> CompanyInfo {
        CompanyInfo {
            ticker: "BBCA.JK".into(),
            name: Some("Bank Central Asia".into()),
            sector: Some("Financial Services".into()),
            industry: Some("Banks - Regional".into()),
            ..CompanyInfo::default()
        }
    }

    fn excellent() -> CompanyInfo {
        CompanyInfo {
            ticker: "GOOD.JK".into(),
            industry: Some("Consumer Defensive".into()),
            pe_ratio: Some(10.0),
            pb_ratio: Some(1.5),
            roe: Some(25.0),
            revenue: Some(1_000.0),
            net_income: Some(300.0),
            debt_to_equity: Some(0.2),
            beta: Some(0.6),
            dividend_yield: Some(4.0),
            market_cap: Some(80e9),
            ..CompanyInfo::default()
        }
    }

    #[test]
    fn benchmark_matches_industry_or_sector() {
        assert_eq!(benchmark_for(&excellent()).name, "consumer");

        let mut mine = CompanyInfo::new("ADRO.JK");
        mine.sector = Some("Coal Mining".into());
        assert_eq!(benchmark_for(&mine).name, "mining");

        // "Banks" does not contain "banking"
        assert_eq!(benchmark_for(&bank()).name, "default");
        assert_eq!(benchmark_for(&CompanyInfo::new("X")).name, "default");
    }

    #[test]
    fn valuation_statuses() {
        let mut info = CompanyInfo::new("X");
        info.pe_ratio = Some(8.0);
        info.pb_ratio = Some(2.0);
        let v = analyze_valuation(&info, &DEFAULT_BENCHMARK);
        assert_eq!(v.pe.status, ValuationStatus::Undervalued);
        assert_eq!(v.pb.status, ValuationStatus::Fair);
        assert_eq!(v.overall.status, OverallValuation::Attractive);

        info.pe_ratio = Some(30.0);
        info.pb_ratio = Some(-1.0);
        let v = analyze_valuation(&info, &DEFAULT_BENCHMARK);
        assert_eq!(v.pe.status, ValuationStatus::Overvalued);
        assert_eq!(v.pb.status, ValuationStatus::Unavailable);
        assert_eq!(v.overall.status, OverallValuation::Expensive);
    }

    #[test]
    fn market_cap_tiers() {
        assert_eq!(MarketCapTier::from_market_cap(Some(60e9)), MarketCapTier::LargeCap);
        assert_eq!(MarketCapTier::from_market_cap(Some(50e9)), MarketCapTier::MidCap);
        assert_eq!(MarketCapTier::from_market_cap(Some(10e9)), MarketCapTier::SmallCap);
        assert_eq!(MarketCapTier::from_market_cap(None), MarketCapTier::Unknown);
    }

    #[test]
    fn profit_margin_guards_revenue() {
        let mut info = CompanyInfo::new("X");
        info.net_income = Some(50.0);
        assert_eq!(profit_margin(&info), 0.0);
        info.revenue = Some(0.0);
        assert_eq!(profit_margin(&info), 0.0);
        info.revenue = Some(400.0);
        assert_relative_eq!(profit_margin(&info), 12.5);
    }

    #[test]
    fn profitability_points() {
        let mut info = CompanyInfo::new("X");
        info.roe = Some(12.0);
        info.revenue = Some(100.0);
        info.net_income = Some(25.0);
        let p = analyze_profitability(&info, &DEFAULT_BENCHMARK);
        assert_eq!(p.roe.status, Quality::Good);
        assert_eq!(p.profit_margin.status, Quality::Excellent);
        assert_eq!(p.overall.status, Quality::Excellent);

        let p = analyze_profitability(&CompanyInfo::new("Y"), &DEFAULT_BENCHMARK);
        assert_eq!(p.roe.status, Quality::Poor);
        assert_eq!(p.overall.status, Quality::Poor);
    }

    #[test]
    fn financial_health_defaults_beta() {
        let mut info = CompanyInfo::new("X");
        info.debt_to_equity = Some(1.0);
        let h = analyze_financial_health(&info, &DEFAULT_BENCHMARK);
        assert_eq!(h.debt_to_equity.status, DebtStatus::Healthy);
        assert_eq!(h.beta.value, Some(1.0));
        assert_eq!(h.beta.status, VolatilityRisk::Average);
        assert_eq!(h.overall.status, Quality::Good);

        info.debt_to_equity = None;
        info.beta = Some(1.7);
        let h = analyze_financial_health(&info, &DEFAULT_BENCHMARK);
        assert_eq!(h.debt_to_equity.status, DebtStatus::Unavailable);
        assert_eq!(h.beta.status, VolatilityRisk::VeryHighRisk);
        assert_eq!(h.overall.status, Quality::Poor);
    }

    #[test]
    fn dividend_bands() {
        let cases = [
            (Some(7.0), DividendStatus::HighYield),
            (Some(3.5), DividendStatus::GoodYield),
            (Some(1.5), DividendStatus::ModerateYield),
            (Some(0.5), DividendStatus::LowYield),
            (Some(0.0), DividendStatus::NoDividend),
            (None, DividendStatus::NoDividend),
        ];
        for (yield_pct, expected) in cases {
            let mut info = CompanyInfo::new("X");
            info.dividend_yield = yield_pct;
            assert_eq!(analyze_dividend(&info).status, expected, "{yield_pct:?}");
        }
    }

    #[test]
    fn intrinsic_value_methods() {
        let mut info = CompanyInfo::new("X");
        info.eps = Some(100.0);
        info.book_value = Some(900.0);
        info.operating_cash_flow = Some(7_000.0);
        info.shares_outstanding = Some(103.0);

        let iv = calculate_intrinsic_value(&info, 15.0);
        assert_relative_eq!(iv.graham_number.unwrap(), 1423.02, epsilon = 0.01);
        assert_eq!(iv.pe_method, Some(1500.0));
        assert_eq!(iv.book_value_method, Some(1350.0));
        // 7000 * 1.03 / 0.07 / 103
        assert_relative_eq!(iv.dcf_method.unwrap(), 1000.0, epsilon = 1e-6);

        info.eps = Some(-5.0);
        info.shares_outstanding = None;
        let iv = calculate_intrinsic_value(&info, 15.0);
        assert!(iv.graham_number.is_none());
        assert!(iv.pe_method.is_none());
        assert!(iv.dcf_method.is_none());
    }

    #[test]
    fn checklist_against_thresholds() {
        let mut info = CompanyInfo::new("X");
        info.pe_ratio = Some(12.0);
        info.pb_ratio = Some(3.0);
        info.roe = Some(15.0);
        let checks = threshold_checklist(&info, &FundamentalThresholds::default());
        let results: Vec<_> = checks.iter().map(|c| c.result).collect();
        assert_eq!(
            results,
            vec![
                CheckResult::Pass,
                CheckResult::Fail,
                CheckResult::Pass,
                CheckResult::Unavailable
            ]
        );
    }

    #[test]
    fn excellent_company_scores_95() {
        let analysis = comprehensive_fundamental_analysis(&excellent(), &FundamentalThresholds::default());
        assert_eq!(analysis.valuation.overall.status, OverallValuation::Attractive);
        assert_eq!(analysis.profitability.overall.status, Quality::Excellent);
        assert_eq!(analysis.financial_health.overall.status, Quality::Excellent);
        assert_eq!(analysis.score.total_score, 95.0);
        assert_eq!(analysis.score.grade, Grade::APlus);
        assert_eq!(analysis.recommendation.recommendation, Action::StrongBuy);
        assert_eq!(analysis.recommendation.confidence, 95.0);
    }

    #[test]
    fn empty_company_scores_low() {
        let analysis =
            comprehensive_fundamental_analysis(&CompanyInfo::new("X"), &FundamentalThresholds::default());
        // fair 15 + poor 5 + beta-only average 15 + no dividend 5
        assert_eq!(analysis.score.breakdown.financial_health, 15);
        assert_eq!(analysis.score.total_score, 40.0);
        assert_eq!(analysis.recommendation.recommendation, Action::WeakHold);
        assert_eq!(analysis.recommendation.confidence, 50.0);
    }

    #[test]
    fn recommendation_bands() {
        assert_eq!(fundamental_recommendation(85.0).recommendation, Action::StrongBuy);
        assert_eq!(fundamental_recommendation(70.0).recommendation, Action::Buy);
        assert_eq!(fundamental_recommendation(65.0).recommendation, Action::Hold);
        assert_eq!(fundamental_recommendation(40.0).recommendation, Action::WeakHold);
        let sell = fundamental_recommendation(20.0);
        assert_eq!(sell.recommendation, Action::Sell);
        assert_eq!(sell.confidence, 50.0);
    }
}
