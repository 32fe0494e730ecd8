//! CSV report adapter implementing ReportPort.
//!
//! Writes `trades.csv` (one row per closed trade) and `metrics.csv` (one row,
//! undefined metrics as `NaN`) into the output directory.

use std::fs;
use std::path::Path;

use crate::domain::error::NewsTraderError;
use crate::domain::metrics::MetricsRecord;
use crate::domain::trade_log::TradeLog;
use crate::ports::report_port::ReportPort;

pub const TRADES_FILE: &str = "trades.csv";
pub const METRICS_FILE: &str = "metrics.csv";

const TRADE_HEADER: [&str; 5] = [
    "entry_date",
    "entry_price",
    "exit_date",
    "exit_price",
    "exit_reason",
];

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_error(path: &Path, e: csv::Error) -> NewsTraderError {
    NewsTraderError::Data {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

pub fn write_trades(trades: &TradeLog, path: &Path) -> Result<(), NewsTraderError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    // Written explicitly so an empty log still carries the header row.
    wtr.write_record(TRADE_HEADER)
        .map_err(|e| csv_error(path, e))?;
    for trade in trades {
        wtr.serialize(trade).map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_metrics(metrics: &MetricsRecord, path: &Path) -> Result<(), NewsTraderError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    wtr.serialize(metrics).map_err(|e| csv_error(path, e))?;
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        _ticker: &str,
        trades: &TradeLog,
        metrics: &MetricsRecord,
        out_dir: &Path,
    ) -> Result<(), NewsTraderError> {
        fs::create_dir_all(out_dir)?;
        write_trades(trades, &out_dir.join(TRADES_FILE))?;
        write_metrics(metrics, &out_dir.join(METRICS_FILE))?;
        Ok(())
    }
}
