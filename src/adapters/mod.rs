//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_cache;
#[cfg(feature = "web")]
pub mod web;
pub mod yahoo_adapter;

use tracing::info;

use crate::domain::error::AnalyzerError;
use crate::domain::settings::{DataSettings, DataSourceKind};
use crate::ports::data_port::MarketDataPort;

pub type SharedDataPort = Box<dyn MarketDataPort + Send + Sync>;

/// Build the configured data source, wrapped in the response cache when
/// one is configured.
pub fn build_data_port(settings: &DataSettings) -> Result<SharedDataPort, AnalyzerError> {
    let source: SharedDataPort = match settings.source {
        DataSourceKind::Yahoo => Box::new(yahoo_adapter::YahooAdapter::new(&settings.user_agent)?),
        DataSourceKind::Csv => Box::new(csv_adapter::CsvAdapter::new(settings.csv_dir.clone())),
    };
    info!(source = ?settings.source, "data source ready");

    with_cache(source, settings)
}

#[cfg(feature = "sqlite")]
fn with_cache(source: SharedDataPort, settings: &DataSettings) -> Result<SharedDataPort, AnalyzerError> {
    let Some(path) = &settings.cache_path else {
        return Ok(source);
    };
    let cache = sqlite_cache::SqliteCache::open(path, settings.cache_duration)?;
    info!(
        path = %path.display(),
        ttl_secs = settings.cache_duration.as_secs(),
        "response cache enabled"
    );
    Ok(Box::new(sqlite_cache::CachedDataPort::new(source, cache)))
}

#[cfg(not(feature = "sqlite"))]
fn with_cache(source: SharedDataPort, settings: &DataSettings) -> Result<SharedDataPort, AnalyzerError> {
    if settings.cache_path.is_some() {
        tracing::warn!("built without the sqlite feature; response cache disabled");
    }
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::period::Period;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn csv_source_without_cache() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BBCA.JK.csv"),
            "date,open,high,low,close,volume\n2024-01-02,9000,9100,8900,9050,1000\n",
        )
        .unwrap();
        let settings = DataSettings {
            source: DataSourceKind::Csv,
            csv_dir: dir.path().to_path_buf(),
            cache_path: None,
            ..DataSettings::default()
        };

        let port = build_data_port(&settings).unwrap();
        let bars = port.fetch_ohlcv("BBCA.JK", Period::Max).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 9050.0);
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn csv_source_with_cache_creates_database() {
        let dir = TempDir::new().unwrap();
        let cache_path = dir.path().join("cache").join("market.sqlite");
        let settings = DataSettings {
            source: DataSourceKind::Csv,
            csv_dir: dir.path().to_path_buf(),
            cache_path: Some(cache_path.clone()),
            ..DataSettings::default()
        };

        let port = build_data_port(&settings).unwrap();
        assert!(port.fetch_ohlcv("NONE.JK", Period::OneMonth).unwrap().is_empty());
        assert!(cache_path.exists());
    }
}
