//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report_adapter::HtmlReportAdapter;
use crate::domain::config_validation::{
    load_date_window, load_metrics_config, load_report_html, load_strategy_config,
    validate_backtest_config,
};
use crate::domain::error::NewsTraderError;
use crate::domain::metrics::TradeStats;
use crate::domain::pipeline::{run_tickers, RunSettings, TickerResult};
use crate::domain::position::ExitReason;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "newstrader", about = "News-signal equity strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the backtest for one or more tickers
    Backtest {
        /// Ticker symbol; repeat or comma-separate for several
        #[arg(short, long, required = true)]
        ticker: Vec<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Root directory for reports (defaults to the data directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Validate configuration and inputs without writing reports
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file and print the resolved parameters
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers with price data
    ListTickers {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the stored price range for ticker(s)
    Info {
        #[arg(short, long, required = true)]
        ticker: Vec<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            ticker,
            config,
            data_dir,
            output,
            dry_run,
        } => run_backtest(
            &ticker,
            config.as_deref(),
            data_dir.as_deref(),
            output.as_deref(),
            dry_run,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListTickers { data_dir, config } => {
            run_list_tickers(data_dir.as_deref(), config.as_deref())
        }
        Command::Info {
            ticker,
            data_dir,
            config,
        } => run_info(&ticker, data_dir.as_deref(), config.as_deref()),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, ExitCode> {
    match path {
        None => Ok(FileConfigAdapter::empty()),
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path).map_err(|err| {
                eprintln!("error: {err}");
                ExitCode::from(&err)
            })
        }
    }
}

pub fn build_run_settings(config: &dyn ConfigPort) -> Result<RunSettings, NewsTraderError> {
    validate_backtest_config(config)?;
    Ok(RunSettings {
        strategy: load_strategy_config(config)?,
        metrics: load_metrics_config(config)?,
        window: load_date_window(config)?,
    })
}

/// `--data-dir` wins over `[data] dir`, which wins over the default.
pub fn resolve_data_dir(override_dir: Option<&Path>, config: &dyn ConfigPort) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    config
        .get_string("data", "dir")
        .filter(|s| !s.trim().is_empty())
        .map(|s| PathBuf::from(s.trim()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Splits comma-separated values, upper-cases, and drops blanks and repeats.
pub fn resolve_tickers(raw: &[String]) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for t in raw.iter().flat_map(|s| s.split(',')) {
        let t = t.trim().to_uppercase();
        if !t.is_empty() && !tickers.contains(&t) {
            tickers.push(t);
        }
    }
    tickers
}

fn run_backtest(
    raw_tickers: &[String],
    config_path: Option<&Path>,
    data_dir: Option<&Path>,
    output: Option<&Path>,
    dry_run: bool,
) -> ExitCode {
    // Stage 1: Load and validate config
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let settings = match build_run_settings(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 2: Resolve tickers and directories
    let tickers = resolve_tickers(raw_tickers);
    if tickers.is_empty() {
        eprintln!("error: no tickers given");
        return ExitCode::from(2);
    }
    let data_dir = resolve_data_dir(data_dir, &config);
    let out_root = output.map(Path::to_path_buf).unwrap_or_else(|| data_dir.clone());
    let write_html = match load_report_html(&config) {
        Ok(flag) => flag,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = CsvAdapter::new(data_dir);
    let mut reports: Vec<Box<dyn ReportPort>> = Vec::new();
    if !dry_run {
        reports.push(Box::new(CsvReportAdapter::new()));
        if write_html {
            reports.push(Box::new(HtmlReportAdapter::new()));
        }
    }

    run_backtest_pipeline(&data_port, &tickers, &settings, &out_root, &reports)
}

/// Runs all tickers, prints summaries, and writes each ticker's reports to
/// `<out_root>/<TICKER>/`.
pub fn run_backtest_pipeline<D>(
    data_port: &D,
    tickers: &[String],
    settings: &RunSettings,
    out_root: &Path,
    reports: &[Box<dyn ReportPort>],
) -> ExitCode
where
    D: DataPort + Sync,
{
    eprintln!(
        "Running backtest: {} ticker(s), TP {:+.1}%, SL {:+.1}%, max hold {}d, cool-off {} bars",
        tickers.len(),
        settings.strategy.take_profit * 100.0,
        settings.strategy.stop_loss * 100.0,
        settings.strategy.max_hold_days,
        settings.strategy.cool_off_days,
    );

    let results = run_tickers(data_port, tickers, settings);

    let mut first_error: Option<ExitCode> = None;
    let mut succeeded = 0usize;

    for (ticker, result) in results {
        let result = match result {
            Ok(r) => r,
            Err(e) => {
                if e.is_precondition_violation() {
                    eprintln!("error: {ticker}: rejected price data: {e}");
                } else {
                    eprintln!("error: {ticker}: {e}");
                }
                first_error.get_or_insert_with(|| (&e).into());
                continue;
            }
        };

        print_summary(&result);

        let out_dir = out_root.join(&result.ticker);
        for report in reports {
            if let Err(e) = report.write(&result.ticker, &result.trades, &result.metrics, &out_dir) {
                eprintln!("error: failed to write report for {ticker}: {e}");
                first_error.get_or_insert_with(|| (&e).into());
            }
        }
        if !reports.is_empty() {
            eprintln!("Reports written to: {}", out_dir.display());
        }
        succeeded += 1;
    }

    match first_error {
        Some(code) if succeeded == 0 => code,
        Some(_) => {
            eprintln!("warning: some tickers failed");
            ExitCode::from(1)
        }
        None => ExitCode::SUCCESS,
    }
}

pub fn print_summary(result: &TickerResult) {
    let stats = TradeStats::compute(&result.trades);

    eprintln!("\n=== {} ===", result.ticker);
    eprintln!("Bars:             {}", result.bars);
    eprintln!("Signal days:      {}", result.triggers);
    eprintln!("Total Trades:     {}", stats.total_trades);
    if stats.total_trades > 0 {
        eprintln!("Win Rate:         {:.1}%", stats.win_rate * 100.0);
        eprintln!("Avg Return:       {:.2}%", stats.avg_return * 100.0);
        eprintln!("Avg Hold:         {:.1} days", stats.avg_hold_days);
        let reasons: Vec<String> = ExitReason::ALL
            .iter()
            .map(|r| format!("{}={}", r, stats.count(*r)))
            .collect();
        eprintln!("Exits:            {}", reasons.join(", "));
    }
    if !result.metrics.is_defined() {
        eprintln!("Metrics:          n/a (fewer than two trades)");
        return;
    }
    eprintln!("CAGR:             {}", format_pct(result.metrics.cagr));
    eprintln!("Sharpe:           {}", format_ratio(result.metrics.sharpe));
    eprintln!("Max Drawdown:     {}", format_pct(result.metrics.max_drawdown));
}

fn format_pct(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.2}%", value * 100.0)
    }
}

fn format_ratio(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.2}", value)
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_config(Some(config_path)) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let settings = match build_run_settings(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let s = &settings.strategy;
    eprintln!("\nStrategy:");
    eprintln!("  position_size:    {}", s.position_size);
    eprintln!("  take_profit:      {}", s.take_profit);
    eprintln!("  stop_loss:        {}", s.stop_loss);
    eprintln!("  max_hold_days:    {}", s.max_hold_days);
    eprintln!("  cool_off_days:    {}", s.cool_off_days);
    eprintln!("  ma_window:        {}", s.ma_window);
    eprintln!("\nMetrics:");
    eprintln!("  periods_per_year: {}", settings.metrics.periods_per_year);

    let w = &settings.window;
    eprintln!("\nPrice window:");
    match (w.start_date, w.end_date) {
        (Some(start), Some(end)) => eprintln!("  {} to {}", start, end),
        (Some(start), None) => eprintln!("  from {}", start),
        (None, end) => {
            let anchor = end.map_or_else(|| "last bar".to_string(), |d| d.to_string());
            if w.lookback_days > 0 {
                eprintln!("  last {} days up to {}", w.lookback_days, anchor);
            } else {
                eprintln!("  full history up to {}", anchor);
            }
        }
    }
    eprintln!("  data dir: {}", resolve_data_dir(None, &config).display());

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_tickers(data_dir: Option<&Path>, config_path: Option<&Path>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let adapter = CsvAdapter::new(resolve_data_dir(data_dir, &config));

    let tickers = match adapter.list_tickers() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if tickers.is_empty() {
        eprintln!("No tickers found");
    } else {
        for ticker in &tickers {
            println!("{}", ticker);
        }
        eprintln!("{} tickers found", tickers.len());
    }
    ExitCode::SUCCESS
}

fn run_info(raw_tickers: &[String], data_dir: Option<&Path>, config_path: Option<&Path>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let adapter = CsvAdapter::new(resolve_data_dir(data_dir, &config));

    let mut code = ExitCode::SUCCESS;
    for ticker in resolve_tickers(raw_tickers) {
        match adapter.price_range(&ticker) {
            Ok(Some((first, last, count))) => {
                let signals = adapter
                    .fetch_signals(&ticker)
                    .map(|s| s.iter().filter(|s| s.is_trigger()).count());
                match signals {
                    Ok(n) => println!(
                        "{}: {} bars, {} to {}, {} qualifying signals",
                        ticker, count, first, last, n
                    ),
                    Err(e) => println!(
                        "{}: {} bars, {} to {} (signals unreadable: {})",
                        ticker, count, first, last, e
                    ),
                }
            }
            Ok(None) => {
                let err = NewsTraderError::NoData { ticker };
                eprintln!("error: {err}");
                code = (&err).into();
            }
            Err(e) => {
                eprintln!("error querying {}: {}", ticker, e);
                code = (&e).into();
            }
        }
    }
    code
}
