//! Daily price bars and the validated price series the engine walks.

use chrono::NaiveDate;

use super::error::NewsTraderError;
use super::indicator::calculate_sma;

pub const DEFAULT_MA_WINDOW: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    fn validate(&self) -> Result<(), NewsTraderError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(NewsTraderError::NonPositivePrice {
                    date: self.date,
                    field,
                    value,
                });
            }
        }

        if self.low > self.open.min(self.close) || self.high < self.open.max(self.close) {
            return Err(NewsTraderError::InconsistentBar {
                date: self.date,
                reason: format!(
                    "expected low <= open, close <= high (o={} h={} l={} c={})",
                    self.open, self.high, self.low, self.close
                ),
            });
        }
        Ok(())
    }
}

/// A chronologically ordered, de-duplicated daily series for one ticker,
/// with the closing-price moving average precomputed per bar.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
    moving_avg: Vec<Option<f64>>,
    ma_window: usize,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>, ma_window: usize) -> Result<Self, NewsTraderError> {
        if ma_window == 0 {
            return Err(NewsTraderError::InvalidWindow { window: ma_window });
        }

        for bar in &bars {
            bar.validate()?;
        }
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(NewsTraderError::NonMonotonicDates {
                    previous: pair[0].date,
                    date: pair[1].date,
                });
            }
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let moving_avg = calculate_sma(&closes, ma_window);

        Ok(Self {
            bars,
            moving_avg,
            ma_window,
        })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn ma_window(&self) -> usize {
        self.ma_window
    }

    pub fn get(&self, index: usize) -> Option<&PriceBar> {
        self.bars.get(index)
    }

    /// Moving average of close ending at `index`; `None` during warmup.
    pub fn moving_avg(&self, index: usize) -> Option<f64> {
        self.moving_avg.get(index).copied().flatten()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}
