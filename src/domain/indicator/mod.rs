//! Technical indicators computed over a price series.

pub mod sma;

pub use sma::calculate_sma;
