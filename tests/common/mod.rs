#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use newstrader::domain::error::NewsTraderError;
use newstrader::domain::price::{PriceBar, PriceSeries};
use newstrader::domain::signal::{Impact, Signal, SignalSeries};
use newstrader::ports::data_port::DataPort;
use std::collections::HashMap;

/// Bars in the flat warm-up before any scenario-specific prices.
pub const HISTORY: usize = 200;
pub const FLAT_PRICE: f64 = 100.0;

pub struct MockDataPort {
    pub prices: HashMap<String, Vec<PriceBar>>,
    pub signals: HashMap<String, Vec<Signal>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
            signals: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.prices.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_signals(mut self, ticker: &str, signals: Vec<Signal>) -> Self {
        self.signals.insert(ticker.to_string(), signals);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    fn check(&self, ticker: &str) -> Result<(), NewsTraderError> {
        match self.errors.get(ticker) {
            Some(reason) => Err(NewsTraderError::Data {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, NewsTraderError> {
        self.check(ticker)?;
        Ok(self
            .prices
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn fetch_signals(&self, ticker: &str) -> Result<Vec<Signal>, NewsTraderError> {
        self.check(ticker)?;
        Ok(self.signals.get(ticker).cloned().unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, NewsTraderError> {
        let mut tickers: Vec<String> = self.prices.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }

    fn price_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, NewsTraderError> {
        self.check(ticker)?;
        Ok(self.prices.get(ticker).and_then(|bars| {
            let first = bars.first()?;
            let last = bars.last()?;
            Some((first.date, last.date, bars.len()))
        }))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn start_date() -> NaiveDate {
    date(2023, 1, 2)
}

/// Calendar date of bar `index` in a daily series starting at `start_date()`.
pub fn day(index: usize) -> NaiveDate {
    start_date() + Duration::days(index as i64)
}

/// A bar whose open, high, low and close are all `price`, so its typical
/// price equals its close.
pub fn flat_bar(date: NaiveDate, price: f64) -> PriceBar {
    PriceBar {
        date,
        open: price,
        high: price,
        low: price,
        close: price,
    }
}

/// Daily bars: `HISTORY` bars at `FLAT_PRICE` followed by `tail` closes.
pub fn history_with_tail(tail: &[f64]) -> Vec<PriceBar> {
    std::iter::repeat_n(FLAT_PRICE, HISTORY)
        .chain(tail.iter().copied())
        .enumerate()
        .map(|(i, price)| flat_bar(day(i), price))
        .collect()
}

pub fn series(bars: Vec<PriceBar>, ma_window: usize) -> PriceSeries {
    PriceSeries::new(bars, ma_window).unwrap()
}

pub fn signals_on(indices: &[usize]) -> SignalSeries {
    SignalSeries::from_dates(indices.iter().map(|&i| day(i)))
}

pub fn positive(date: NaiveDate) -> Signal {
    Signal {
        date,
        impact: Some(Impact::Positive),
        relevant: true,
    }
}

/// Tail for a take-profit run: signal on bar 205 (close above the average),
/// entry at 100 on bar 206, +16% on bar 208.
pub fn take_profit_tail() -> Vec<f64> {
    vec![100.0, 100.0, 100.0, 100.0, 100.0, 102.0, 100.0, 105.0, 116.0, 116.0]
}
