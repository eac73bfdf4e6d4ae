//! Market data access port.

use crate::domain::company::CompanyInfo;
use crate::domain::error::AnalyzerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::period::Period;

pub trait MarketDataPort {
    /// Daily bars for `period`, ascending by date. An unknown ticker yields
    /// an empty vector, not an error.
    fn fetch_ohlcv(&self, ticker: &str, period: Period) -> Result<Vec<OhlcvBar>, AnalyzerError>;

    /// Company profile and ratios, `None` when the source has nothing.
    fn fetch_company_info(&self, ticker: &str) -> Result<Option<CompanyInfo>, AnalyzerError>;
}

impl<T: MarketDataPort + ?Sized> MarketDataPort for Box<T> {
    fn fetch_ohlcv(&self, ticker: &str, period: Period) -> Result<Vec<OhlcvBar>, AnalyzerError> {
        (**self).fetch_ohlcv(ticker, period)
    }

    fn fetch_company_info(&self, ticker: &str) -> Result<Option<CompanyInfo>, AnalyzerError> {
        (**self).fetch_company_info(ticker)
    }
}
