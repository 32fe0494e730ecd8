//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for newstrader.
#[derive(Debug, thiserror::Error)]
pub enum NewsTraderError {
    #[error("price dates must be strictly increasing: {date} follows {previous}")]
    NonMonotonicDates { previous: NaiveDate, date: NaiveDate },

    #[error("non-positive {field} price {value} on {date}")]
    NonPositivePrice {
        date: NaiveDate,
        field: &'static str,
        value: f64,
    },

    #[error("inconsistent bar on {date}: {reason}")]
    InconsistentBar { date: NaiveDate, reason: String },

    #[error("invalid moving-average window {window}")]
    InvalidWindow { window: usize },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no price data for {ticker}")]
    NoData { ticker: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NewsTraderError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        NewsTraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// True for violations of the input-series invariants.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            NewsTraderError::NonMonotonicDates { .. }
                | NewsTraderError::NonPositivePrice { .. }
                | NewsTraderError::InconsistentBar { .. }
                | NewsTraderError::InvalidWindow { .. }
        )
    }
}

impl From<&NewsTraderError> for std::process::ExitCode {
    fn from(err: &NewsTraderError) -> Self {
        let code: u8 = match err {
            NewsTraderError::Io(_) => 1,
            NewsTraderError::ConfigParse { .. } | NewsTraderError::ConfigInvalid { .. } => 2,
            NewsTraderError::Data { .. } => 3,
            NewsTraderError::NonMonotonicDates { .. }
            | NewsTraderError::NonPositivePrice { .. }
            | NewsTraderError::InconsistentBar { .. }
            | NewsTraderError::InvalidWindow { .. } => 4,
            NewsTraderError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
