//! HTML report adapter implementing ReportPort.
//!
//! Renders `performance.html` with the metrics row and the trade table
//! through an Askama template.

use std::fs;
use std::path::Path;

use askama::Template;

use crate::domain::error::NewsTraderError;
use crate::domain::metrics::MetricsRecord;
use crate::domain::trade_log::TradeLog;
use crate::ports::report_port::ReportPort;

pub const HTML_FILE: &str = "performance.html";

struct MetricCell {
    name: &'static str,
    value: String,
}

struct TradeRow {
    entry_date: String,
    entry_price: String,
    exit_date: String,
    exit_price: String,
    exit_reason: &'static str,
    trade_return: String,
}

#[derive(Template)]
#[template(path = "performance.html")]
struct PerformanceTemplate<'a> {
    ticker: &'a str,
    metrics: Vec<MetricCell>,
    trades: Vec<TradeRow>,
}

fn format_metric(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.4}", value)
    }
}

pub fn render(
    ticker: &str,
    trades: &TradeLog,
    metrics: &MetricsRecord,
) -> Result<String, NewsTraderError> {
    let template = PerformanceTemplate {
        ticker,
        metrics: vec![
            MetricCell {
                name: "CAGR",
                value: format_metric(metrics.cagr),
            },
            MetricCell {
                name: "Sharpe",
                value: format_metric(metrics.sharpe),
            },
            MetricCell {
                name: "MaxDrawdown",
                value: format_metric(metrics.max_drawdown),
            },
        ],
        trades: trades
            .iter()
            .map(|t| TradeRow {
                entry_date: t.entry_date.to_string(),
                entry_price: format!("{:.2}", t.entry_price),
                exit_date: t.exit_date.to_string(),
                exit_price: format!("{:.2}", t.exit_price),
                exit_reason: t.exit_reason.as_str(),
                trade_return: format!("{:.2}%", t.trade_return() * 100.0),
            })
            .collect(),
    };

    template
        .render()
        .map_err(|e| NewsTraderError::Io(std::io::Error::other(e.to_string())))
}

pub struct HtmlReportAdapter;

impl HtmlReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(
        &self,
        ticker: &str,
        trades: &TradeLog,
        metrics: &MetricsRecord,
        out_dir: &Path,
    ) -> Result<(), NewsTraderError> {
        let html = render(ticker, trades, metrics)?;
        fs::create_dir_all(out_dir)?;
        fs::write(out_dir.join(HTML_FILE), html)?;
        Ok(())
    }
}
