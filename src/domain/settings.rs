//! Typed analysis settings read from a `ConfigPort`.
//!
//! Every key is optional; absent keys fall back to the defaults below.
//! `AnalysisSettings::from_config` validates before building, so the
//! numeric conversions here never see negative periods.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::domain::config_validation::validate_config;
use crate::domain::error::AnalyzerError;
use crate::domain::recommendation::{RiskProfile, RiskSettings};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_TICKERS: [&str; 10] = [
    "BBCA.JK", "BBRI.JK", "BBNI.JK", "BMRI.JK", "TLKM.JK", "UNVR.JK", "ASII.JK", "INDF.JK",
    "KLBF.JK", "HMSP.JK",
];
pub const DEFAULT_INDEX: &str = "^JKSE";

/// Portfolio capital in IDR when none is given.
pub const DEFAULT_CAPITAL: f64 = 100_000_000.0;
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8501";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    Yahoo,
    Csv,
}

impl FromStr for DataSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" | "yahoo_finance" => Ok(DataSourceKind::Yahoo),
            "csv" => Ok(DataSourceKind::Csv),
            other => Err(format!("unknown data source '{}' (expected yahoo or csv)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DataSettings {
    pub source: DataSourceKind,
    pub csv_dir: PathBuf,
    /// `None` disables the response cache (`cache_path = none` or
    /// `cache_duration = 0`).
    pub cache_path: Option<PathBuf>,
    pub cache_duration: Duration,
    pub request_delay: Duration,
    pub user_agent: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            source: DataSourceKind::Yahoo,
            csv_dir: PathBuf::from("data"),
            cache_path: Some(PathBuf::from("cache/market_data.sqlite")),
            cache_duration: Duration::from_secs(3600),
            request_delay: Duration::from_millis(100),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UniverseSettings {
    pub tickers: Vec<String>,
    pub index: String,
    pub compare_limit: usize,
}

impl Default for UniverseSettings {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
            index: DEFAULT_INDEX.to_string(),
            compare_limit: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalSettings {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub ma_short: usize,
    pub ma_long: usize,
    pub bollinger_period: usize,
    pub bollinger_std: f64,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    pub atr_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub stochastic_oversold: f64,
    pub stochastic_overbought: f64,
}

impl Default for TechnicalSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            ma_short: 20,
            ma_long: 50,
            bollinger_period: 20,
            bollinger_std: 2.0,
            stochastic_k: 14,
            stochastic_d: 3,
            atr_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            stochastic_oversold: 20.0,
            stochastic_overbought: 80.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundamentalThresholds {
    pub pe_good: f64,
    pub pbv_good: f64,
    pub roe_good: f64,
    pub debt_to_equity_good: f64,
}

impl Default for FundamentalThresholds {
    fn default() -> Self {
        Self {
            pe_good: 15.0,
            pbv_good: 2.0,
            roe_good: 15.0,
            debt_to_equity_good: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskProfiles {
    pub conservative: RiskSettings,
    pub moderate: RiskSettings,
    pub aggressive: RiskSettings,
}

impl RiskProfiles {
    pub fn get(&self, profile: RiskProfile) -> &RiskSettings {
        match profile {
            RiskProfile::Conservative => &self.conservative,
            RiskProfile::Moderate => &self.moderate,
            RiskProfile::Aggressive => &self.aggressive,
        }
    }
}

impl Default for RiskProfiles {
    fn default() -> Self {
        Self {
            conservative: RiskSettings::defaults_for(RiskProfile::Conservative),
            moderate: RiskSettings::defaults_for(RiskProfile::Moderate),
            aggressive: RiskSettings::defaults_for(RiskProfile::Aggressive),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSettings {
    pub data: DataSettings,
    pub universe: UniverseSettings,
    pub technical: TechnicalSettings,
    pub fundamental: FundamentalThresholds,
    pub risk: RiskProfiles,
    pub listen: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            data: DataSettings::default(),
            universe: UniverseSettings::default(),
            technical: TechnicalSettings::default(),
            fundamental: FundamentalThresholds::default(),
            risk: RiskProfiles::default(),
            listen: DEFAULT_LISTEN.to_string(),
        }
    }
}

impl AnalysisSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AnalyzerError> {
        validate_config(config)?;

        Ok(Self {
            data: data_settings(config)?,
            universe: universe_settings(config),
            technical: technical_settings(config),
            fundamental: fundamental_thresholds(config),
            risk: RiskProfiles {
                conservative: risk_settings(config, RiskProfile::Conservative),
                moderate: risk_settings(config, RiskProfile::Moderate),
                aggressive: risk_settings(config, RiskProfile::Aggressive),
            },
            listen: config
                .get_string("web", "listen")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
        })
    }

    pub fn risk_settings(&self, profile: RiskProfile) -> &RiskSettings {
        self.risk.get(profile)
    }
}

fn data_settings(config: &dyn ConfigPort) -> Result<DataSettings, AnalyzerError> {
    let d = DataSettings::default();

    let source = match config.get_string("data", "source") {
        Some(s) => s.parse().map_err(|reason| AnalyzerError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason,
        })?,
        None => d.source,
    };

    let cache_secs = config.get_int("data", "cache_duration", d.cache_duration.as_secs() as i64);
    let cache_path = match config.get_string("data", "cache_path") {
        _ if cache_secs == 0 => None,
        Some(p) if p.trim().is_empty() || p.trim().eq_ignore_ascii_case("none") => None,
        Some(p) => Some(PathBuf::from(p.trim())),
        None => d.cache_path,
    };
    let delay_ms = config.get_int("data", "request_delay_ms", d.request_delay.as_millis() as i64);

    Ok(DataSettings {
        source,
        csv_dir: config
            .get_string("data", "csv_dir")
            .map(|p| PathBuf::from(p.trim()))
            .unwrap_or(d.csv_dir),
        cache_path,
        cache_duration: Duration::from_secs(cache_secs.max(0) as u64),
        request_delay: Duration::from_millis(delay_ms.max(0) as u64),
        user_agent: config
            .get_string("data", "user_agent")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(d.user_agent),
    })
}

/// Split a comma-separated ticker list, upper-casing and dropping blanks.
pub fn parse_ticker_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Reject tickers that could escape a data directory or a URL path segment.
/// Letters, digits and `. ^ - = _` are allowed; `..` is not.
pub fn validate_ticker(ticker: &str) -> Result<(), AnalyzerError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '-' | '=' | '_');
    if ticker.is_empty() || !ticker.chars().all(allowed) || ticker.contains("..") {
        return Err(AnalyzerError::invalid_argument(format!("invalid ticker '{}'", ticker)));
    }
    Ok(())
}

fn universe_settings(config: &dyn ConfigPort) -> UniverseSettings {
    let d = UniverseSettings::default();
    UniverseSettings {
        tickers: config
            .get_string("universe", "tickers")
            .map(|s| parse_ticker_list(&s))
            .filter(|t| !t.is_empty())
            .unwrap_or(d.tickers),
        index: config
            .get_string("universe", "index")
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or(d.index),
        compare_limit: config.get_int("universe", "compare_limit", d.compare_limit as i64) as usize,
    }
}

fn technical_settings(config: &dyn ConfigPort) -> TechnicalSettings {
    let d = TechnicalSettings::default();
    let period = |key: &str, default: usize| config.get_int("technical", key, default as i64) as usize;
    let level = |key: &str, default: f64| config.get_double("technical", key, default);

    TechnicalSettings {
        rsi_period: period("rsi_period", d.rsi_period),
        macd_fast: period("macd_fast", d.macd_fast),
        macd_slow: period("macd_slow", d.macd_slow),
        macd_signal: period("macd_signal", d.macd_signal),
        ma_short: period("ma_short", d.ma_short),
        ma_long: period("ma_long", d.ma_long),
        bollinger_period: period("bollinger_period", d.bollinger_period),
        bollinger_std: level("bollinger_std", d.bollinger_std),
        stochastic_k: period("stochastic_k", d.stochastic_k),
        stochastic_d: period("stochastic_d", d.stochastic_d),
        atr_period: period("atr_period", d.atr_period),
        rsi_oversold: level("rsi_oversold", d.rsi_oversold),
        rsi_overbought: level("rsi_overbought", d.rsi_overbought),
        stochastic_oversold: level("stochastic_oversold", d.stochastic_oversold),
        stochastic_overbought: level("stochastic_overbought", d.stochastic_overbought),
    }
}

fn fundamental_thresholds(config: &dyn ConfigPort) -> FundamentalThresholds {
    let d = FundamentalThresholds::default();
    FundamentalThresholds {
        pe_good: config.get_double("fundamental", "pe_good_threshold", d.pe_good),
        pbv_good: config.get_double("fundamental", "pbv_good_threshold", d.pbv_good),
        roe_good: config.get_double("fundamental", "roe_good_threshold", d.roe_good),
        debt_to_equity_good: config.get_double(
            "fundamental",
            "debt_to_equity_good_threshold",
            d.debt_to_equity_good,
        ),
    }
}

pub(crate) fn risk_section(profile: RiskProfile) -> String {
    format!("risk.{}", profile.as_str())
}

fn risk_settings(config: &dyn ConfigPort, profile: RiskProfile) -> RiskSettings {
    let d = RiskSettings::defaults_for(profile);
    let section = risk_section(profile);
    RiskSettings {
        max_position_size: config.get_double(&section, "max_position_size", d.max_position_size),
        stop_loss: config.get_double(&section, "stop_loss", d.stop_loss),
        take_profit: config.get_double(&section, "take_profit", d.take_profit),
        max_portfolio_risk: config.get_double(&section, "max_portfolio_risk", d.max_portfolio_risk),
        min_score: config.get_double(&section, "min_score", d.min_score),
    }
}
