//! Performance evaluation: trade-indexed equity curve and risk/return metrics.
//!
//! The equity curve compounds each trade's sized return from a base of 1.0
//! and records one point per trade at its exit date. Period returns are the
//! percentage changes between consecutive points, so the first trade
//! contributes no return. Undefined metrics are reported as `NaN`.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use super::position::{ExitReason, Trade};

pub const DEFAULT_PERIODS_PER_YEAR: f64 = 252.0;

/// Base wealth the drawdown series is compounded from.
const DRAWDOWN_BASE: f64 = 100.0;

/// Settings for the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    pub position_size: f64,
    /// Annualisation factor for CAGR and Sharpe.
    pub periods_per_year: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            position_size: 0.05,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// The single-row performance summary exported for a run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsRecord {
    #[serde(rename = "CAGR")]
    pub cagr: f64,
    #[serde(rename = "Sharpe")]
    pub sharpe: f64,
    #[serde(rename = "MaxDrawdown")]
    pub max_drawdown: f64,
}

impl MetricsRecord {
    pub fn undefined() -> Self {
        Self {
            cagr: f64::NAN,
            sharpe: f64::NAN,
            max_drawdown: f64::NAN,
        }
    }

    pub fn compute(trades: &[Trade], config: &MetricsConfig) -> Self {
        let curve = equity_curve(trades, config.position_size);
        if curve.len() < 2 {
            return Self::undefined();
        }

        let returns = period_returns(&curve);
        Self {
            cagr: cagr(&returns, config.periods_per_year),
            sharpe: sharpe_ratio(&returns, config.periods_per_year),
            max_drawdown: max_drawdown(&cumulative_sum(&returns)),
        }
    }

    pub fn is_defined(&self) -> bool {
        !(self.cagr.is_nan() && self.sharpe.is_nan() && self.max_drawdown.is_nan())
    }
}

/// Bitwise comparison so that two undefined records compare equal.
impl PartialEq for MetricsRecord {
    fn eq(&self, other: &Self) -> bool {
        self.cagr.to_bits() == other.cagr.to_bits()
            && self.sharpe.to_bits() == other.sharpe.to_bits()
            && self.max_drawdown.to_bits() == other.max_drawdown.to_bits()
    }
}

pub fn equity_curve(trades: &[Trade], position_size: f64) -> Vec<EquityPoint> {
    let mut equity = 1.0_f64;
    trades
        .iter()
        .map(|trade| {
            equity *= 1.0 + position_size * trade.trade_return();
            EquityPoint {
                date: trade.exit_date,
                equity,
            }
        })
        .collect()
}

pub fn period_returns(curve: &[EquityPoint]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| w[1].equity / w[0].equity - 1.0)
        .collect()
}

pub fn cumulative_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0_f64, |acc, &v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// Annualised compounded growth implied by `returns`, with
/// `returns.len() / periods_per_year` taken as the elapsed years.
pub fn cagr(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.is_empty() || periods_per_year <= 0.0 {
        return f64::NAN;
    }
    let years = returns.len() as f64 / periods_per_year;
    let ending: f64 = returns.iter().map(|r| 1.0 + r).product();
    ending.powf(1.0 / years) - 1.0
}

/// Mean over sample standard deviation, scaled by `sqrt(periods_per_year)`.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return f64::NAN;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();
    if !(stddev > 0.0 && stddev.is_finite()) {
        return f64::NAN;
    }
    mean / stddev * periods_per_year.sqrt()
}

/// Largest peak-to-trough decline of wealth compounded from `returns`.
///
/// Wealth starts at a fixed base that counts as the first peak. The result is
/// zero or negative.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return f64::NAN;
    }

    let mut wealth = DRAWDOWN_BASE;
    let mut peak = DRAWDOWN_BASE;
    let mut worst = 0.0_f64;

    for r in returns {
        wealth *= 1.0 + r;
        peak = peak.max(wealth);
        let dd = (wealth - peak) / peak;
        if dd < worst {
            worst = dd;
        }
    }

    worst
}

/// Descriptive statistics over the trade log, for summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeStats {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub win_rate: f64,
    pub avg_return: f64,
    pub avg_hold_days: f64,
    pub by_reason: HashMap<ExitReason, usize>,
}

impl TradeStats {
    pub fn compute(trades: &[Trade]) -> Self {
        let total_trades = trades.len();
        let mut by_reason = HashMap::new();
        let mut winning_trades = 0usize;
        let mut total_return = 0.0_f64;
        let mut total_hold = 0i64;

        for trade in trades {
            *by_reason.entry(trade.exit_reason).or_insert(0) += 1;
            let ret = trade.trade_return();
            if ret > 0.0 {
                winning_trades += 1;
            }
            total_return += ret;
            total_hold += trade.hold_days();
        }

        let (win_rate, avg_return, avg_hold_days) = if total_trades > 0 {
            let n = total_trades as f64;
            (
                winning_trades as f64 / n,
                total_return / n,
                total_hold as f64 / n,
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        Self {
            total_trades,
            winning_trades,
            win_rate,
            avg_return,
            avg_hold_days,
            by_reason,
        }
    }

    pub fn count(&self, reason: ExitReason) -> usize {
        self.by_reason.get(&reason).copied().unwrap_or(0)
    }
}
