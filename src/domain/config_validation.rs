//! Configuration validation.
//!
//! Reads the risk parameters, evaluator settings, price window and report
//! options from a
//! [`ConfigPort`], rejecting malformed or out-of-range values before any
//! backtest runs. Absent keys take the historical defaults.

use crate::domain::backtest::StrategyConfig;
use crate::domain::error::NewsTraderError;
use crate::domain::metrics::MetricsConfig;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365 * 5;

/// Which slice of the stored price history a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Applied only without an explicit start date; 0 keeps everything.
    pub lookback_days: i64,
}

impl Default for DateWindow {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), NewsTraderError> {
    load_strategy_config(config).map(|_| ())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), NewsTraderError> {
    validate_strategy_config(config)?;
    load_metrics_config(config)?;
    load_date_window(config)?;
    load_report_html(config)?;
    Ok(())
}

pub fn load_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, NewsTraderError> {
    let defaults = StrategyConfig::default();

    let max_hold_days = read_int(config, "strategy", "max_hold_days", defaults.max_hold_days)?;
    if max_hold_days < 0 {
        return Err(NewsTraderError::config_invalid(
            "strategy",
            "max_hold_days",
            "max_hold_days must be non-negative",
        ));
    }

    let cool_off_days = read_int(
        config,
        "strategy",
        "cool_off_days",
        i64::from(defaults.cool_off_days),
    )?;
    let cool_off_days = u32::try_from(cool_off_days).map_err(|_| {
        NewsTraderError::config_invalid(
            "strategy",
            "cool_off_days",
            "cool_off_days must be a non-negative bar count",
        )
    })?;

    let ma_window = read_int(config, "strategy", "ma_window", defaults.ma_window as i64)?;
    let ma_window = usize::try_from(ma_window)
        .ok()
        .filter(|w| *w >= 1)
        .ok_or_else(|| {
            NewsTraderError::config_invalid("strategy", "ma_window", "ma_window must be at least 1")
        })?;

    let strategy = StrategyConfig {
        position_size: read_double(config, "strategy", "position_size", defaults.position_size)?,
        take_profit: read_double(config, "strategy", "take_profit", defaults.take_profit)?,
        stop_loss: read_double(config, "strategy", "stop_loss", defaults.stop_loss)?,
        max_hold_days,
        cool_off_days,
        ma_window,
    };
    strategy.validate()?;
    Ok(strategy)
}

pub fn load_metrics_config(config: &dyn ConfigPort) -> Result<MetricsConfig, NewsTraderError> {
    let defaults = MetricsConfig::default();
    let position_size = load_strategy_config(config)?.position_size;
    let periods_per_year = read_double(
        config,
        "metrics",
        "periods_per_year",
        defaults.periods_per_year,
    )?;
    if !(periods_per_year > 0.0 && periods_per_year.is_finite()) {
        return Err(NewsTraderError::config_invalid(
            "metrics",
            "periods_per_year",
            "periods_per_year must be positive",
        ));
    }
    Ok(MetricsConfig {
        position_size,
        periods_per_year,
    })
}

pub fn load_date_window(config: &dyn ConfigPort) -> Result<DateWindow, NewsTraderError> {
    let start_date = read_date(config, "backtest", "start_date")?;
    let end_date = read_date(config, "backtest", "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start >= end {
            return Err(NewsTraderError::config_invalid(
                "backtest",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }

    let lookback_days = read_int(config, "backtest", "lookback_days", DEFAULT_LOOKBACK_DAYS)?;
    if lookback_days < 0 {
        return Err(NewsTraderError::config_invalid(
            "backtest",
            "lookback_days",
            "lookback_days must be non-negative",
        ));
    }

    Ok(DateWindow {
        start_date,
        end_date,
        lookback_days,
    })
}

/// Whether `[report] html` asks for `performance.html` (default on).
pub fn load_report_html(config: &dyn ConfigPort) -> Result<bool, NewsTraderError> {
    read_bool(config, "report", "html", true)
}

/// Trimmed value of `key`, or `None` when it is absent or blank.
fn read_raw(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    if !config.has_value(section, key) {
        return None;
    }
    config.get_string(section, key).map(|raw| raw.trim().to_string())
}

fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, NewsTraderError> {
    match read_raw(config, section, key) {
        Some(raw) => raw.parse::<f64>().map_err(|_| {
            NewsTraderError::config_invalid(section, key, format!("'{raw}' is not a number"))
        }),
        None => Ok(default),
    }
}

fn read_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, NewsTraderError> {
    match read_raw(config, section, key) {
        Some(raw) => raw.parse::<i64>().map_err(|_| {
            NewsTraderError::config_invalid(section, key, format!("'{raw}' is not an integer"))
        }),
        None => Ok(default),
    }
}

fn read_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, NewsTraderError> {
    let Some(raw) = read_raw(config, section, key) else {
        return Ok(default);
    };
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(NewsTraderError::config_invalid(
            section,
            key,
            format!("'{raw}' is not a boolean"),
        )),
    }
}

fn read_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, NewsTraderError> {
    match read_raw(config, section, key) {
        Some(raw) => NaiveDate::parse_from_str(&raw, DATE_FORMAT)
            .map(Some)
            .map_err(|_| {
                NewsTraderError::config_invalid(
                    section,
                    key,
                    format!("invalid {key} format, expected YYYY-MM-DD"),
                )
            }),
        None => Ok(None),
    }
}
