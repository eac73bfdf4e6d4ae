//! SQLite response cache.
//!
//! `CachedDataPort` wraps another `MarketDataPort` and keeps its answers in
//! SQLite for a fixed time-to-live. Bars are stored as rows per
//! (ticker, period); company info as a JSON document per ticker.

use std::path::Path;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, warn};

use crate::domain::company::CompanyInfo;
use crate::domain::error::AnalyzerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::period::Period;
use crate::ports::data_port::MarketDataPort;

const KIND_OHLCV: &str = "ohlcv";
const KIND_COMPANY: &str = "company";

fn pool_error(e: r2d2::Error) -> AnalyzerError {
    AnalyzerError::cache(e.to_string())
}

fn query_error(e: rusqlite::Error) -> AnalyzerError {
    AnalyzerError::cache(e.to_string())
}

pub struct SqliteCache {
    pool: Pool<SqliteConnectionManager>,
    ttl: Duration,
}

impl SqliteCache {
    pub fn open<P: AsRef<Path>>(path: P, ttl: Duration) -> Result<Self, AnalyzerError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(4).build(manager).map_err(pool_error)?;
        let cache = Self { pool, ttl };
        cache.initialize_schema()?;
        Ok(cache)
    }

    pub fn in_memory(ttl: Duration) -> Result<Self, AnalyzerError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(pool_error)?;
        let cache = Self { pool, ttl };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<(), AnalyzerError> {
        let conn = self.pool.get().map_err(pool_error)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS fetch_log (
                kind TEXT NOT NULL,
                ticker TEXT NOT NULL,
                period TEXT NOT NULL,
                fetched_at INTEGER NOT NULL,
                PRIMARY KEY (kind, ticker, period)
            );
            CREATE TABLE IF NOT EXISTS ohlcv_cache (
                ticker TEXT NOT NULL,
                period TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (ticker, period, date)
            );
            CREATE TABLE IF NOT EXISTS company_cache (
                ticker TEXT PRIMARY KEY,
                payload TEXT NOT NULL
            );",
        )
        .map_err(query_error)
    }

    fn is_fresh(&self, kind: &str, ticker: &str, period: &str) -> Result<bool, AnalyzerError> {
        let conn = self.pool.get().map_err(pool_error)?;
        let fetched_at: Option<i64> = conn
            .query_row(
                "SELECT fetched_at FROM fetch_log WHERE kind = ?1 AND ticker = ?2 AND period = ?3",
                params![kind, ticker, period],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_error)?;

        Ok(match fetched_at {
            Some(at) => Utc::now().timestamp() - at < self.ttl.as_secs() as i64,
            None => false,
        })
    }

    pub fn get_bars(&self, ticker: &str, period: Period) -> Result<Option<Vec<OhlcvBar>>, AnalyzerError> {
        if !self.is_fresh(KIND_OHLCV, ticker, period.as_str())? {
            return Ok(None);
        }

        let conn = self.pool.get().map_err(pool_error)?;
        let mut stmt = conn
            .prepare(
                "SELECT date, open, high, low, close, volume
                 FROM ohlcv_cache
                 WHERE ticker = ?1 AND period = ?2
                 ORDER BY date ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![ticker, period.as_str()], |row| {
                let date_str: String = row.get(0)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        date_str.len(),
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(OhlcvBar {
                    ticker: ticker.to_string(),
                    date,
                    open: row.get(1)?,
                    high: row.get(2)?,
                    low: row.get(3)?,
                    close: row.get(4)?,
                    volume: row.get(5)?,
                })
            })
            .map_err(query_error)?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(row.map_err(query_error)?);
        }
        Ok(Some(bars))
    }

    pub fn put_bars(&self, ticker: &str, period: Period, bars: &[OhlcvBar]) -> Result<(), AnalyzerError> {
        let mut conn = self.pool.get().map_err(pool_error)?;
        let tx = conn.transaction().map_err(query_error)?;

        tx.execute(
            "DELETE FROM ohlcv_cache WHERE ticker = ?1 AND period = ?2",
            params![ticker, period.as_str()],
        )
        .map_err(query_error)?;
        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO ohlcv_cache (ticker, period, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    ticker,
                    period.as_str(),
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(query_error)?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO fetch_log (kind, ticker, period, fetched_at) VALUES (?1, ?2, ?3, ?4)",
            params![KIND_OHLCV, ticker, period.as_str(), Utc::now().timestamp()],
        )
        .map_err(query_error)?;

        tx.commit().map_err(query_error)
    }

    /// `Some(None)` is a cached "no company data" answer.
    pub fn get_company(&self, ticker: &str) -> Result<Option<Option<CompanyInfo>>, AnalyzerError> {
        if !self.is_fresh(KIND_COMPANY, ticker, "")? {
            return Ok(None);
        }

        let conn = self.pool.get().map_err(pool_error)?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM company_cache WHERE ticker = ?1",
                params![ticker],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_error)?;

        let Some(payload) = payload else {
            return Ok(None);
        };
        match serde_json::from_str(&payload) {
            Ok(info) => Ok(Some(info)),
            Err(e) => {
                warn!(ticker, error = %e, "discarding unreadable cached company info");
                Ok(None)
            }
        }
    }

    pub fn put_company(&self, ticker: &str, info: Option<&CompanyInfo>) -> Result<(), AnalyzerError> {
        let payload = serde_json::to_string(&info)
            .map_err(|e| AnalyzerError::cache(format!("serializing company info: {}", e)))?;

        let mut conn = self.pool.get().map_err(pool_error)?;
        let tx = conn.transaction().map_err(query_error)?;
        tx.execute(
            "INSERT OR REPLACE INTO company_cache (ticker, payload) VALUES (?1, ?2)",
            params![ticker, payload],
        )
        .map_err(query_error)?;
        tx.execute(
            "INSERT OR REPLACE INTO fetch_log (kind, ticker, period, fetched_at) VALUES (?1, ?2, '', ?3)",
            params![KIND_COMPANY, ticker, Utc::now().timestamp()],
        )
        .map_err(query_error)?;
        tx.commit().map_err(query_error)
    }
}

/// Read-through cache in front of another data port.
pub struct CachedDataPort<P> {
    inner: P,
    cache: SqliteCache,
}

impl<P: MarketDataPort> CachedDataPort<P> {
    pub fn new(inner: P, cache: SqliteCache) -> Self {
        Self { inner, cache }
    }
}

impl<P: MarketDataPort> MarketDataPort for CachedDataPort<P> {
    fn fetch_ohlcv(&self, ticker: &str, period: Period) -> Result<Vec<OhlcvBar>, AnalyzerError> {
        match self.cache.get_bars(ticker, period) {
            Ok(Some(bars)) => {
                debug!(ticker, %period, bars = bars.len(), "cache hit");
                return Ok(bars);
            }
            Ok(None) => {}
            Err(e) => warn!(ticker, %period, error = %e, "cache read failed"),
        }

        let bars = self.inner.fetch_ohlcv(ticker, period)?;
        // Empty answers are not pinned; the next call asks again.
        if !bars.is_empty() {
            if let Err(e) = self.cache.put_bars(ticker, period, &bars) {
                warn!(ticker, %period, error = %e, "cache write failed");
            }
        }
        Ok(bars)
    }

    fn fetch_company_info(&self, ticker: &str) -> Result<Option<CompanyInfo>, AnalyzerError> {
        match self.cache.get_company(ticker) {
            Ok(Some(info)) => {
                debug!(ticker, "company cache hit");
                return Ok(info);
            }
            Ok(None) => {}
            Err(e) => warn!(ticker, error = %e, "company cache read failed"),
        }

        let info = self.inner.fetch_company_info(ticker)?;
        if let Err(e) = self.cache.put_company(ticker, info.as_ref()) {
            warn!(ticker, error = %e, "company cache write failed");
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::from_closes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingPort {
        ohlcv_calls: AtomicUsize,
        company_calls: AtomicUsize,
    }

    impl MarketDataPort for CountingPort {
        fn fetch_ohlcv(&self, ticker: &str, _period: Period) -> Result<Vec<OhlcvBar>, AnalyzerError> {
            self.ohlcv_calls.fetch_add(1, Ordering::SeqCst);
            if ticker == "EMPTY.JK" {
                return Ok(Vec::new());
            }
            Ok(from_closes(&[100.0, 101.0, 102.5])
                .into_iter()
                .map(|b| OhlcvBar {
                    ticker: ticker.to_string(),
                    ..b
                })
                .collect())
        }

        fn fetch_company_info(&self, ticker: &str) -> Result<Option<CompanyInfo>, AnalyzerError> {
            self.company_calls.fetch_add(1, Ordering::SeqCst);
            if ticker == "NONE.JK" {
                return Ok(None);
            }
            let mut info = CompanyInfo::new(ticker);
            info.pe_ratio = Some(12.5);
            Ok(Some(info))
        }
    }

    fn cached(ttl_secs: u64) -> CachedDataPort<CountingPort> {
        let cache = SqliteCache::in_memory(Duration::from_secs(ttl_secs)).unwrap();
        CachedDataPort::new(CountingPort::default(), cache)
    }

    #[test]
    fn bars_within_ttl_skip_inner_port() {
        let port = cached(3600);
        let first = port.fetch_ohlcv("BBCA.JK", Period::OneYear).unwrap();
        let second = port.fetch_ohlcv("BBCA.JK", Period::OneYear).unwrap();

        assert_eq!(first, second);
        assert_eq!(second[2].close, 102.5);
        assert_eq!(second[0].ticker, "BBCA.JK");
        assert_eq!(port.inner.ohlcv_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn periods_are_cached_separately() {
        let port = cached(3600);
        port.fetch_ohlcv("BBCA.JK", Period::OneYear).unwrap();
        port.fetch_ohlcv("BBCA.JK", Period::FiveDays).unwrap();
        assert_eq!(port.inner.ohlcv_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn expired_entries_hit_inner_port() {
        let port = cached(0);
        port.fetch_ohlcv("BBCA.JK", Period::OneYear).unwrap();
        port.fetch_ohlcv("BBCA.JK", Period::OneYear).unwrap();
        assert_eq!(port.inner.ohlcv_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_results_are_not_cached() {
        let port = cached(3600);
        assert!(port.fetch_ohlcv("EMPTY.JK", Period::OneYear).unwrap().is_empty());
        port.fetch_ohlcv("EMPTY.JK", Period::OneYear).unwrap();
        assert_eq!(port.inner.ohlcv_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn company_info_and_absence_are_cached() {
        let port = cached(3600);
        let info = port.fetch_company_info("BBCA.JK").unwrap().unwrap();
        assert_eq!(info.pe_ratio, Some(12.5));
        assert_eq!(port.fetch_company_info("BBCA.JK").unwrap(), Some(info));

        assert!(port.fetch_company_info("NONE.JK").unwrap().is_none());
        assert!(port.fetch_company_info("NONE.JK").unwrap().is_none());
        assert_eq!(port.inner.company_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn broken_cache_falls_through_to_inner_port() {
        let port = cached(3600);
        port.cache
            .pool
            .get()
            .unwrap()
            .execute_batch("DROP TABLE fetch_log; DROP TABLE ohlcv_cache; DROP TABLE company_cache;")
            .unwrap();

        let bars = port.fetch_ohlcv("BBCA.JK", Period::OneYear).unwrap();
        assert_eq!(bars.len(), 3);
        let info = port.fetch_company_info("BBCA.JK").unwrap();
        assert_eq!(info.unwrap().pe_ratio, Some(12.5));

        port.fetch_ohlcv("BBCA.JK", Period::OneYear).unwrap();
        assert_eq!(port.inner.ohlcv_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn file_cache_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache").join("market_data.sqlite");
        let bars = from_closes(&[10.0, 11.0]);

        {
            let cache = SqliteCache::open(&path, Duration::from_secs(3600)).unwrap();
            cache.put_bars("TEST.JK", Period::OneMonth, &bars).unwrap();
        }
        let cache = SqliteCache::open(&path, Duration::from_secs(3600)).unwrap();
        assert_eq!(cache.get_bars("TEST.JK", Period::OneMonth).unwrap(), Some(bars));
        assert!(cache.get_bars("TEST.JK", Period::OneYear).unwrap().is_none());
    }
}
