//! ihsg_analyzer: technical and fundamental analysis for stocks listed on
//! the Indonesia Stock Exchange.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], orchestration in [`service`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
pub mod service;
