//! Configuration validation.
//!
//! Checks raw config values before they are turned into `AnalysisSettings`.
//! Absent keys are validated against their defaults, so an empty file passes.

use crate::domain::error::AnalyzerError;
use crate::domain::recommendation::{RiskProfile, RiskSettings};
use crate::domain::settings::{
    risk_section, DataSourceKind, FundamentalThresholds, TechnicalSettings, UniverseSettings,
};
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), AnalyzerError> {
    validate_data(config)?;
    validate_universe(config)?;
    validate_technical(config)?;
    validate_fundamental(config)?;
    for profile in RiskProfile::ALL {
        validate_risk_profile(config, profile)?;
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> AnalyzerError {
    AnalyzerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), AnalyzerError> {
    if let Some(source) = config.get_string("data", "source") {
        source
            .parse::<DataSourceKind>()
            .map_err(|reason| invalid("data", "source", reason))?;
    }
    if config.get_int("data", "cache_duration", 0) < 0 {
        return Err(invalid(
            "data",
            "cache_duration",
            "cache_duration must be non-negative",
        ));
    }
    if config.get_int("data", "request_delay_ms", 0) < 0 {
        return Err(invalid(
            "data",
            "request_delay_ms",
            "request_delay_ms must be non-negative",
        ));
    }
    Ok(())
}

fn validate_universe(config: &dyn ConfigPort) -> Result<(), AnalyzerError> {
    if let Some(tickers) = config.get_string("universe", "tickers") {
        if tickers.split(',').all(|t| t.trim().is_empty()) {
            return Err(invalid("universe", "tickers", "tickers must not be empty"));
        }
    }
    let d = UniverseSettings::default();
    if config.get_int("universe", "compare_limit", d.compare_limit as i64) < 1 {
        return Err(invalid(
            "universe",
            "compare_limit",
            "compare_limit must be at least 1",
        ));
    }
    Ok(())
}

fn validate_period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<i64, AnalyzerError> {
    let value = config.get_int("technical", key, default as i64);
    if value < 1 {
        return Err(invalid("technical", key, format!("{} must be at least 1", key)));
    }
    Ok(value)
}

fn validate_band(
    config: &dyn ConfigPort,
    low_key: &str,
    low_default: f64,
    high_key: &str,
    high_default: f64,
) -> Result<(), AnalyzerError> {
    let low = config.get_double("technical", low_key, low_default);
    let high = config.get_double("technical", high_key, high_default);
    if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) {
        return Err(invalid(
            "technical",
            low_key,
            format!("{} and {} must be between 0 and 100", low_key, high_key),
        ));
    }
    if low >= high {
        return Err(invalid(
            "technical",
            low_key,
            format!("{} must be below {}", low_key, high_key),
        ));
    }
    Ok(())
}

fn validate_technical(config: &dyn ConfigPort) -> Result<(), AnalyzerError> {
    let d = TechnicalSettings::default();

    validate_period(config, "rsi_period", d.rsi_period)?;
    let fast = validate_period(config, "macd_fast", d.macd_fast)?;
    let slow = validate_period(config, "macd_slow", d.macd_slow)?;
    validate_period(config, "macd_signal", d.macd_signal)?;
    let short = validate_period(config, "ma_short", d.ma_short)?;
    let long = validate_period(config, "ma_long", d.ma_long)?;
    validate_period(config, "bollinger_period", d.bollinger_period)?;
    validate_period(config, "stochastic_k", d.stochastic_k)?;
    validate_period(config, "stochastic_d", d.stochastic_d)?;
    validate_period(config, "atr_period", d.atr_period)?;

    if fast >= slow {
        return Err(invalid(
            "technical",
            "macd_fast",
            "macd_fast must be below macd_slow",
        ));
    }
    if short >= long {
        return Err(invalid(
            "technical",
            "ma_short",
            "ma_short must be below ma_long",
        ));
    }
    if config.get_double("technical", "bollinger_std", d.bollinger_std) <= 0.0 {
        return Err(invalid(
            "technical",
            "bollinger_std",
            "bollinger_std must be positive",
        ));
    }

    validate_band(
        config,
        "rsi_oversold",
        d.rsi_oversold,
        "rsi_overbought",
        d.rsi_overbought,
    )?;
    validate_band(
        config,
        "stochastic_oversold",
        d.stochastic_oversold,
        "stochastic_overbought",
        d.stochastic_overbought,
    )?;
    Ok(())
}

fn validate_fundamental(config: &dyn ConfigPort) -> Result<(), AnalyzerError> {
    let d = FundamentalThresholds::default();
    let keys = [
        ("pe_good_threshold", d.pe_good),
        ("pbv_good_threshold", d.pbv_good),
        ("roe_good_threshold", d.roe_good),
        ("debt_to_equity_good_threshold", d.debt_to_equity_good),
    ];
    for (key, default) in keys {
        if config.get_double("fundamental", key, default) <= 0.0 {
            return Err(invalid("fundamental", key, format!("{} must be positive", key)));
        }
    }
    Ok(())
}

fn validate_risk_profile(config: &dyn ConfigPort, profile: RiskProfile) -> Result<(), AnalyzerError> {
    let d = RiskSettings::defaults_for(profile);
    let section = risk_section(profile);

    let fractions = [
        ("max_position_size", d.max_position_size),
        ("stop_loss", d.stop_loss),
        ("take_profit", d.take_profit),
        ("max_portfolio_risk", d.max_portfolio_risk),
    ];
    for (key, default) in fractions {
        let value = config.get_double(&section, key, default);
        if value <= 0.0 || value > 1.0 {
            return Err(invalid(
                &section,
                key,
                format!("{} must be between 0 and 1", key),
            ));
        }
    }

    let min_score = config.get_double(&section, "min_score", d.min_score);
    if !(0.0..=100.0).contains(&min_score) {
        return Err(invalid(
            &section,
            "min_score",
            "min_score must be between 0 and 100",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn invalid_key(content: &str) -> String {
        match validate_config(&make_config(content)).unwrap_err() {
            AnalyzerError::ConfigInvalid { key, .. } => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn empty_config_passes() {
        assert!(validate_config(&make_config("")).is_ok());
    }

    #[test]
    fn full_valid_config_passes() {
        let config = make_config(
            r#"
[data]
source = yahoo
cache_duration = 600
request_delay_ms = 250

[universe]
tickers = BBCA.JK,TLKM.JK
index = ^JKSE
compare_limit = 3

[technical]
rsi_period = 14
macd_fast = 12
macd_slow = 26
macd_signal = 9
ma_short = 20
ma_long = 50
bollinger_std = 2

[fundamental]
pe_good_threshold = 15

[risk.moderate]
max_position_size = 0.08
min_score = 60
"#,
        );
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_data_source() {
        assert_eq!(invalid_key("[data]\nsource = excel\n"), "source");
    }

    #[test]
    fn negative_cache_duration() {
        assert_eq!(invalid_key("[data]\ncache_duration = -1\n"), "cache_duration");
    }

    #[test]
    fn blank_ticker_list() {
        assert_eq!(invalid_key("[universe]\ntickers = , ,\n"), "tickers");
    }

    #[test]
    fn zero_period_rejected() {
        assert_eq!(invalid_key("[technical]\nrsi_period = 0\n"), "rsi_period");
    }

    #[test]
    fn macd_fast_must_be_below_slow() {
        assert_eq!(
            invalid_key("[technical]\nmacd_fast = 30\nmacd_slow = 26\n"),
            "macd_fast"
        );
    }

    #[test]
    fn ma_short_must_be_below_long() {
        assert_eq!(invalid_key("[technical]\nma_short = 50\n"), "ma_short");
    }

    #[test]
    fn oversold_must_be_below_overbought() {
        assert_eq!(
            invalid_key("[technical]\nrsi_oversold = 75\n"),
            "rsi_oversold"
        );
        assert_eq!(
            invalid_key("[technical]\nstochastic_overbought = 120\n"),
            "stochastic_oversold"
        );
    }

    #[test]
    fn fundamental_thresholds_positive() {
        assert_eq!(
            invalid_key("[fundamental]\npbv_good_threshold = 0\n"),
            "pbv_good_threshold"
        );
    }

    #[test]
    fn risk_fraction_out_of_range() {
        let err = validate_config(&make_config("[risk.aggressive]\nstop_loss = 1.5\n")).unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::ConfigInvalid { section, key, .. }
                if section == "risk.aggressive" && key == "stop_loss"
        ));
    }

    #[test]
    fn risk_min_score_range() {
        assert_eq!(
            invalid_key("[risk.conservative]\nmin_score = 101\n"),
            "min_score"
        );
    }
}
