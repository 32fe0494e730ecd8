//! CSV file data adapter.
//!
//! Layout: `<base>/<TICKER>/prices.csv` with header `date,open,high,low,close`
//! and `<base>/<TICKER>/signals.csv` with header `date,impact,relevance`.
//! Columns are located by header name; extra columns are ignored.

use crate::domain::config_validation::DATE_FORMAT;
use crate::domain::error::NewsTraderError;
use crate::domain::price::PriceBar;
use crate::domain::signal::{Impact, Signal};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub const PRICES_FILE: &str = "prices.csv";
pub const SIGNALS_FILE: &str = "signals.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn ticker_dir(&self, ticker: &str) -> PathBuf {
        self.base_path.join(ticker)
    }

    fn read_all_prices(&self, ticker: &str) -> Result<Vec<PriceBar>, NewsTraderError> {
        let path = self.ticker_dir(ticker).join(PRICES_FILE);
        let mut rdr = open_reader(&path)?;
        let columns = Columns::locate(&mut rdr, &path, &["date", "open", "high", "low", "close"])?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| NewsTraderError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            bars.push(PriceBar {
                date: parse_date(columns.field(&record, 0)?)?,
                open: parse_price(columns.field(&record, 1)?, "open")?,
                high: parse_price(columns.field(&record, 2)?, "high")?,
                low: parse_price(columns.field(&record, 3)?, "low")?,
                close: parse_price(columns.field(&record, 4)?, "close")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, NewsTraderError> {
        let mut bars = self.read_all_prices(ticker)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn fetch_signals(&self, ticker: &str) -> Result<Vec<Signal>, NewsTraderError> {
        let path = self.ticker_dir(ticker).join(SIGNALS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut rdr = open_reader(&path)?;
        let columns = Columns::locate(&mut rdr, &path, &["date", "impact", "relevance"])?;

        let mut signals = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| NewsTraderError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            signals.push(Signal {
                date: parse_date(columns.field(&record, 0)?)?,
                impact: columns.field(&record, 1)?.parse::<Impact>().ok(),
                relevant: parse_relevance(columns.field(&record, 2)?),
            });
        }
        Ok(signals)
    }

    fn list_tickers(&self) -> Result<Vec<String>, NewsTraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| NewsTraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| NewsTraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            if entry.path().join(PRICES_FILE).is_file() {
                tickers.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        tickers.sort();
        Ok(tickers)
    }

    fn price_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, NewsTraderError> {
        if !self.ticker_dir(ticker).join(PRICES_FILE).is_file() {
            return Ok(None);
        }
        let bars = self.read_all_prices(ticker)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}

/// Header positions of the required columns, in request order.
struct Columns(Vec<usize>);

impl Columns {
    fn locate(
        rdr: &mut csv::Reader<fs::File>,
        path: &Path,
        names: &[&str],
    ) -> Result<Self, NewsTraderError> {
        let headers = rdr.headers().map_err(|e| NewsTraderError::Data {
            reason: format!("failed to read header of {}: {}", path.display(), e),
        })?;
        let positions = names
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h.trim().eq_ignore_ascii_case(name))
                    .ok_or_else(|| NewsTraderError::Data {
                        reason: format!("missing {} column in {}", name, path.display()),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(positions))
    }

    fn field<'r>(&self, record: &'r csv::StringRecord, i: usize) -> Result<&'r str, NewsTraderError> {
        record
            .get(self.0[i])
            .map(str::trim)
            .ok_or_else(|| NewsTraderError::Data {
                reason: format!("short row: {:?}", record),
            })
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<fs::File>, NewsTraderError> {
    csv::Reader::from_path(path).map_err(|e| NewsTraderError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })
}

/// Accepts plain dates and timestamps whose first ten characters are a date.
fn parse_date(raw: &str) -> Result<NaiveDate, NewsTraderError> {
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, DATE_FORMAT).map_err(|e| NewsTraderError::Data {
        reason: format!("invalid date '{}': {}", raw, e),
    })
}

fn parse_price(raw: &str, field: &str) -> Result<f64, NewsTraderError> {
    raw.parse().map_err(|e| NewsTraderError::Data {
        reason: format!("invalid {} value '{}': {}", field, raw, e),
    })
}

fn parse_relevance(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "1.0" | "true" | "yes"
    )
}
