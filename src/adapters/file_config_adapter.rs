//! INI file configuration adapter.

use crate::domain::error::AnalyzerError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AnalyzerError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| AnalyzerError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, AnalyzerError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| AnalyzerError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// No file at all: every lookup falls back to its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
source = yahoo
user_agent = Mozilla/5.0 (X11; Linux x86_64)

[universe]
tickers = BBCA.JK, BBRI.JK
compare_limit = 3
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_string("data", "source"), Some("yahoo".to_string()));
        assert_eq!(
            adapter.get_string("data", "user_agent"),
            Some("Mozilla/5.0 (X11; Linux x86_64)".to_string())
        );
        assert_eq!(adapter.get_int("universe", "compare_limit", 5), 3);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Technical]\nRSI_Period = 21\n").unwrap();
        assert_eq!(adapter.get_int("technical", "rsi_period", 14), 21);
    }

    #[test]
    fn dotted_section_names() {
        let adapter =
            FileConfigAdapter::from_string("[risk.conservative]\nstop_loss = 0.05\n").unwrap();
        assert_eq!(adapter.get_double("risk.conservative", "stop_loss", 0.08), 0.05);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[data]\nsource = csv\n").unwrap();
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_missing_or_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[technical]\nrsi_period = abc\n").unwrap();
        assert_eq!(adapter.get_int("technical", "rsi_period", 14), 14);
        assert_eq!(adapter.get_int("technical", "missing", 42), 42);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[technical]\nbollinger_std = 2.5\n").unwrap();
        assert_eq!(adapter.get_double("technical", "bollinger_std", 2.0), 2.5);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[technical]\nbollinger_std = wide\n").unwrap();
        assert_eq!(adapter.get_double("technical", "bollinger_std", 2.0), 2.0);
    }

    #[test]
    fn empty_adapter_uses_defaults() {
        let adapter = FileConfigAdapter::empty();
        assert_eq!(adapter.get_string("data", "source"), None);
        assert_eq!(adapter.get_int("data", "cache_duration", 3600), 3600);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[web]\nlisten = 127.0.0.1:9000\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("web", "listen"),
            Some("127.0.0.1:9000".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/ihsg.ini");
        assert!(matches!(result, Err(AnalyzerError::ConfigParse { .. })));
    }
}
