//! Dated news signals and the per-date trigger lookup.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Classifier verdict on how a news item moves the company's prospects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Impact {
    Positive,
    Negative,
    Neutral,
}

impl FromStr for Impact {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POS" | "POSITIVE" => Ok(Impact::Positive),
            "NEG" | "NEGATIVE" => Ok(Impact::Negative),
            "NEU" | "NEUTRAL" => Ok(Impact::Neutral),
            other => Err(format!("unknown impact tag '{other}'")),
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Impact::Positive => write!(f, "POS"),
            Impact::Negative => write!(f, "NEG"),
            Impact::Neutral => write!(f, "NEU"),
        }
    }
}

/// One classified news event. `impact` is `None` when the upstream tag was
/// missing or unrecognised.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub date: NaiveDate,
    pub impact: Option<Impact>,
    pub relevant: bool,
}

impl Signal {
    pub fn is_trigger(&self) -> bool {
        self.relevant && self.impact == Some(Impact::Positive)
    }
}

/// Set of calendar dates carrying at least one qualifying signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalSeries {
    dates: BTreeSet<NaiveDate>,
}

impl SignalSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only positive, relevant rows; everything else is treated as absent.
    pub fn from_signals<'a, I>(signals: I) -> Self
    where
        I: IntoIterator<Item = &'a Signal>,
    {
        let dates = signals
            .into_iter()
            .filter(|s| s.is_trigger())
            .map(|s| s.date)
            .collect();
        Self { dates }
    }

    /// Builds a series from dates that are already known to be triggers.
    pub fn from_dates<I>(dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    pub fn is_triggered(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }
}
