//! Per-ticker orchestration: fetch, build series, simulate, evaluate.
//!
//! A ticker's run shares nothing with any other ticker's run, so many
//! tickers are processed in parallel with one whole run per task.

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::backtest::{run_backtest, StrategyConfig};
use crate::domain::config_validation::DateWindow;
use crate::domain::error::NewsTraderError;
use crate::domain::metrics::{MetricsConfig, MetricsRecord};
use crate::domain::price::{PriceBar, PriceSeries};
use crate::domain::signal::SignalSeries;
use crate::domain::trade_log::TradeLog;
use crate::ports::data_port::DataPort;

/// Everything a run needs besides the data itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSettings {
    pub strategy: StrategyConfig,
    pub metrics: MetricsConfig,
    pub window: DateWindow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerResult {
    pub ticker: String,
    pub bars: usize,
    pub triggers: usize,
    pub trades: TradeLog,
    pub metrics: MetricsRecord,
}

/// Simulates and evaluates already-loaded series.
pub fn evaluate_series(
    prices: &PriceSeries,
    signals: &SignalSeries,
    settings: &RunSettings,
) -> Result<(TradeLog, MetricsRecord), NewsTraderError> {
    let trades = run_backtest(prices, signals, &settings.strategy)?;
    let metrics = MetricsRecord::compute(trades.trades(), &settings.metrics);
    Ok((trades, metrics))
}

pub fn run_ticker(
    data_port: &dyn DataPort,
    ticker: &str,
    settings: &RunSettings,
) -> Result<TickerResult, NewsTraderError> {
    let window = &settings.window;
    let bars = data_port.fetch_prices(
        ticker,
        window.start_date.unwrap_or(NaiveDate::MIN),
        window.end_date.unwrap_or(NaiveDate::MAX),
    )?;
    let bars = apply_lookback(bars, window);

    let prices = PriceSeries::new(bars, settings.strategy.ma_window)?;
    let signals = SignalSeries::from_signals(&data_port.fetch_signals(ticker)?);
    if let (Some(first), Some(last)) = (prices.first_date(), prices.last_date()) {
        let outside = signals
            .dates()
            .filter(|d| *d < first || *d > last)
            .count();
        if outside > 0 {
            debug!(ticker, %first, %last, outside, "signal dates outside price window");
        }
    }

    let (trades, metrics) = evaluate_series(&prices, &signals, settings)?;
    info!(
        ticker,
        bars = prices.len(),
        triggers = signals.len(),
        trades = trades.len(),
        "ticker evaluated"
    );

    Ok(TickerResult {
        ticker: ticker.to_string(),
        bars: prices.len(),
        triggers: signals.len(),
        trades,
        metrics,
    })
}

/// Runs every ticker independently; results keep the input order.
pub fn run_tickers<D>(
    data_port: &D,
    tickers: &[String],
    settings: &RunSettings,
) -> Vec<(String, Result<TickerResult, NewsTraderError>)>
where
    D: DataPort + Sync,
{
    tickers
        .par_iter()
        .map(|ticker| (ticker.clone(), run_ticker(data_port, ticker, settings)))
        .collect()
}

/// Without an explicit start date, keeps only the last `lookback_days`
/// calendar days ending at the end date (or the last bar).
fn apply_lookback(mut bars: Vec<PriceBar>, window: &DateWindow) -> Vec<PriceBar> {
    if window.start_date.is_some() || window.lookback_days == 0 {
        return bars;
    }
    let anchor = match window.end_date.or_else(|| bars.last().map(|b| b.date)) {
        Some(anchor) => anchor,
        None => return bars,
    };
    // A lookback reaching past the calendar's start keeps everything.
    let cutoff = match Duration::try_days(window.lookback_days)
        .and_then(|span| anchor.checked_sub_signed(span))
    {
        Some(cutoff) => cutoff,
        None => return bars,
    };
    bars.retain(|b| b.date >= cutoff);
    bars
}
