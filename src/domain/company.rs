//! Company profile and key financial figures.

use serde::{Deserialize, Serialize};

/// Ratios in percent (`dividend_yield`, `roe`) are already scaled to
/// percent; `debt_to_equity` is a plain ratio. Absent figures stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyInfo {
    pub ticker: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub roe: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub book_value: Option<f64>,
    pub eps: Option<f64>,
    pub beta: Option<f64>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub employees: Option<u64>,
    pub operating_cash_flow: Option<f64>,
    pub shares_outstanding: Option<f64>,
}

impl CompanyInfo {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Self::default()
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.ticker)
    }

    /// Lower-cased industry and sector, used for benchmark matching.
    pub fn classification(&self) -> (String, String) {
        let lower = |s: &Option<String>| s.as_deref().unwrap_or("").to_lowercase();
        (lower(&self.industry), lower(&self.sector))
    }
}
