//! Core domain types and logic.

pub mod price;
pub mod signal;
pub mod indicator;
pub mod position;
pub mod trade_log;
pub mod backtest;
pub mod metrics;
pub mod pipeline;
pub mod config_validation;
pub mod error;
