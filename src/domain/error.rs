//! Domain error types.

/// Top-level error type for the analyzer.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown period '{0}' (expected one of 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max)")]
    UnknownPeriod(String),

    #[error("unknown risk profile '{0}' (expected conservative, moderate or aggressive)")]
    UnknownRiskProfile(String),

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("data source returned status {status} for {ticker}")]
    DataSourceStatus { ticker: String, status: u16 },

    #[error("failed to parse data source response for {ticker}: {reason}")]
    DataSourceParse { ticker: String, reason: String },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("insufficient data for {ticker}: have {bars} bars, need {minimum}")]
    InsufficientData {
        ticker: String,
        bars: usize,
        minimum: usize,
    },

    #[error("cache error: {reason}")]
    Cache { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalyzerError {
    pub fn data_source(reason: impl Into<String>) -> Self {
        AnalyzerError::DataSource {
            reason: reason.into(),
        }
    }

    pub fn cache(reason: impl Into<String>) -> Self {
        AnalyzerError::Cache {
            reason: reason.into(),
        }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        AnalyzerError::InvalidArgument {
            reason: reason.into(),
        }
    }
}

impl From<&AnalyzerError> for std::process::ExitCode {
    fn from(err: &AnalyzerError) -> Self {
        let code: u8 = match err {
            AnalyzerError::Io(_) => 1,
            AnalyzerError::ConfigParse { .. }
            | AnalyzerError::ConfigInvalid { .. } => 2,
            AnalyzerError::DataSource { .. }
            | AnalyzerError::DataSourceStatus { .. }
            | AnalyzerError::DataSourceParse { .. }
            | AnalyzerError::Cache { .. } => 3,
            AnalyzerError::UnknownPeriod(_)
            | AnalyzerError::UnknownRiskProfile(_)
            | AnalyzerError::InvalidArgument { .. } => 4,
            AnalyzerError::NoData { .. } | AnalyzerError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = AnalyzerError::InsufficientData {
            ticker: "BBCA.JK".into(),
            bars: 12,
            minimum: 50,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data for BBCA.JK: have 12 bars, need 50"
        );
    }

    #[test]
    fn exit_codes_group_by_category() {
        use std::process::ExitCode;

        let cases = [
            (
                AnalyzerError::ConfigInvalid {
                    section: "data".into(),
                    key: "source".into(),
                    reason: "unknown".into(),
                },
                ExitCode::from(2),
            ),
            (AnalyzerError::data_source("timeout"), ExitCode::from(3)),
            (AnalyzerError::cache("locked"), ExitCode::from(3)),
            (AnalyzerError::UnknownPeriod("7w".into()), ExitCode::from(4)),
            (AnalyzerError::NoData { ticker: "X".into() }, ExitCode::from(5)),
        ];
        for (err, expected) in &cases {
            assert_eq!(ExitCode::from(err), *expected, "{err}");
        }
    }
}
