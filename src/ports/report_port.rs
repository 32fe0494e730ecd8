//! Report generation port trait.

use std::path::Path;

use crate::domain::error::NewsTraderError;
use crate::domain::metrics::MetricsRecord;
use crate::domain::trade_log::TradeLog;

/// Port for persisting the outputs of one ticker's run.
pub trait ReportPort {
    fn write(
        &self,
        ticker: &str,
        trades: &TradeLog,
        metrics: &MetricsRecord,
        out_dir: &Path,
    ) -> Result<(), NewsTraderError>;
}
