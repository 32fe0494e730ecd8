//! Open positions, closed trades and exit reasons.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use super::price::PriceBar;

/// Mutually exclusive cause of a position being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    MaxHold,
    EndOfData,
}

impl ExitReason {
    pub const ALL: [ExitReason; 4] = [
        ExitReason::TakeProfit,
        ExitReason::StopLoss,
        ExitReason::MaxHold,
        ExitReason::EndOfData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::TakeProfit => "take_profit",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::MaxHold => "max_hold",
            ExitReason::EndOfData => "end_of_data",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single long position the engine may hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
}

impl Position {
    /// Opens at the typical price of `bar`, on that bar's date.
    pub fn open_at(bar: &PriceBar) -> Self {
        Self {
            entry_date: bar.date,
            entry_price: bar.typical_price(),
        }
    }

    /// Fractional return of `price` against the entry price.
    pub fn return_at(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price
    }

    /// Calendar days elapsed between entry and `date`.
    pub fn hold_days(&self, date: NaiveDate) -> i64 {
        (date - self.entry_date).num_days()
    }

    /// Closes at `bar`'s close, on `bar`'s date.
    pub fn close(self, bar: &PriceBar, reason: ExitReason) -> Trade {
        Trade {
            entry_date: self.entry_date,
            entry_price: self.entry_price,
            exit_date: bar.date,
            exit_price: bar.close,
            exit_reason: reason,
        }
    }
}

/// A closed position, one row of the trade log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn trade_return(&self) -> f64 {
        (self.exit_price - self.entry_price) / self.entry_price
    }

    pub fn hold_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
