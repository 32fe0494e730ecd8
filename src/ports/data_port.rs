//! Data access port trait for price and signal tables.

use crate::domain::error::NewsTraderError;
use crate::domain::price::PriceBar;
use crate::domain::signal::Signal;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `ticker` with `start_date <= date <= end_date`, sorted by date.
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, NewsTraderError>;

    /// Classified news rows for `ticker`. No rows is not an error.
    fn fetch_signals(&self, ticker: &str) -> Result<Vec<Signal>, NewsTraderError>;

    fn list_tickers(&self) -> Result<Vec<String>, NewsTraderError>;

    /// First date, last date and bar count of the stored price table.
    fn price_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, NewsTraderError>;
}
