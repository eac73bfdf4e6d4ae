//! Core domain types and analysis logic.

pub mod company;
pub mod config_validation;
pub mod error;
pub mod fundamental;
pub mod indicator;
pub mod market;
pub mod ohlcv;
pub mod period;
pub mod recommendation;
pub mod scoring;
pub mod settings;
pub mod technical;
