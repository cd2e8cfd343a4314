//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use crate::adapters::chart_svg::render_backtest_svg;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestResult, run_backtest as run_backtest_engine};
use crate::domain::batch::{
    orders_from_lists, parse_amounts, parse_symbols, run_simulation_batch, run_volatility_batch,
};
use crate::domain::config_validation::{lookback_years, positive_int, validate_config};
use crate::domain::error::SimError;
use crate::domain::simulation::{
    FinalValue, SimulationConfig, SimulationReport, SimulationSettings, SymbolResult,
    VolatilityReport, round_cents,
};
use crate::domain::strategy::{MaOption, WindowPair};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

pub const DEFAULT_CSV_DIR: &str = "data";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8000";

#[derive(Parser, Debug)]
#[command(name = "stratsim", about = "Investment strategy simulator")]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Read `<SYMBOL>.csv` files from this directory instead of the configured source
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare contribution or crossover strategies over monthly prices
    Simulate {
        #[arg(long)]
        symbols: String,
        #[arg(long)]
        amounts: String,
        /// monthly, lump_sum, both or ma_crossover
        #[arg(long, default_value = "both")]
        strategy: String,
        /// Last day of the lookback window (default: today)
        #[arg(long)]
        end_date: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Daily return statistics per symbol
    Volatility {
        #[arg(long)]
        symbols: String,
        #[arg(long)]
        end_date: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Golden/dead cross backtest on daily closes
    Backtest {
        symbol: String,
        /// 10_50, 20_60 or 50_200
        #[arg(long)]
        option: Option<String>,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        end_date: Option<NaiveDate>,
        /// Write an SVG chart to this path
        #[arg(long)]
        chart: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// List symbols available from the data source
    ListSymbols,
    /// Start the HTTP API
    Serve {
        #[arg(long)]
        listen: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };
    if let Err(e) = validate_config(&config) {
        return report_error(&e);
    }

    let data_dir = cli.data_dir.as_deref();
    match cli.command {
        Command::Simulate {
            symbols,
            amounts,
            strategy,
            end_date,
            format,
        } => run_simulate(&config, data_dir, &symbols, &amounts, &strategy, end_date, format),
        Command::Volatility {
            symbols,
            end_date,
            format,
        } => run_volatility(&config, data_dir, &symbols, end_date, format),
        Command::Backtest {
            symbol,
            option,
            start_date,
            end_date,
            chart,
            format,
        } => run_backtest(
            &config,
            data_dir,
            &symbol,
            option.as_deref(),
            start_date,
            end_date,
            chart.as_deref(),
            format,
        ),
        Command::ListSymbols => run_list_symbols(&config, data_dir),
        Command::Serve { listen } => run_serve(&config, data_dir, listen.as_deref()),
    }
}

fn report_error(err: &SimError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

/// Loads the INI file, or an empty configuration when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, SimError> {
    let Some(path) = path else {
        return Ok(FileConfigAdapter::empty());
    };
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path).map_err(|e| SimError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Simulation window inputs from `[simulation]`, with `--end-date` taking
/// precedence over the configured end date.
pub fn build_simulation_config(
    config: &dyn ConfigPort,
    end_override: Option<NaiveDate>,
) -> Result<SimulationConfig, SimError> {
    let lookback_years = lookback_years(config)?;
    let end_date = match end_override {
        Some(d) => Some(d),
        None => config.get_date("simulation", "end_date")?,
    };

    let short = positive_int(config, "simulation", "short_window", 3)?;
    let long = positive_int(config, "simulation", "long_window", 12)?;
    let crossover = WindowPair::new(short as usize, long as usize)?;

    Ok(SimulationConfig {
        lookback_years,
        end_date,
        crossover,
    })
}

pub fn build_simulation_settings(
    config: &dyn ConfigPort,
    end_override: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<SimulationSettings, SimError> {
    build_simulation_config(config, end_override)?.settings_at(today)
}

pub fn build_backtest_config(
    config: &dyn ConfigPort,
    option_override: Option<&str>,
    start_override: Option<NaiveDate>,
    end_override: Option<NaiveDate>,
) -> Result<BacktestConfig, SimError> {
    let option = match option_override.map(str::to_string).or_else(|| config.get_string("backtest", "option")) {
        Some(s) => MaOption::from_str(&s)?,
        None => MaOption::default(),
    };

    let start_date = match start_override {
        Some(d) => d,
        None => config
            .get_date("backtest", "start_date")?
            .unwrap_or(default_backtest_start()),
    };
    let end_date = match end_override {
        Some(d) => d,
        None => config
            .get_date("backtest", "end_date")?
            .unwrap_or(default_backtest_end()),
    };

    if start_date >= end_date {
        return Err(SimError::ConfigInvalid {
            section: "backtest".into(),
            key: "start_date".into(),
            reason: "start_date must be before end_date".into(),
        });
    }

    Ok(BacktestConfig {
        start_date,
        end_date,
        windows: option.windows(),
    })
}

fn default_backtest_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default()
}

fn default_backtest_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// `--data-dir` wins; otherwise `[data] source` picks csv (default) or sqlite.
pub fn resolve_data_port(
    config: &dyn ConfigPort,
    data_dir: Option<&Path>,
) -> Result<Box<dyn DataPort + Send + Sync>, SimError> {
    if let Some(dir) = data_dir {
        return Ok(Box::new(CsvAdapter::new(dir.to_path_buf())));
    }

    let source = config
        .get_string("data", "source")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| "csv".to_string());

    match source.as_str() {
        "csv" => {
            let dir = config
                .get_string("data", "csv_dir")
                .unwrap_or_else(|| DEFAULT_CSV_DIR.to_string());
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            Ok(Box::new(SqliteAdapter::from_config(config)?))
        }
        other => Err(SimError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("data source '{}' is not available in this build", other),
        }),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn run_simulate(
    config: &dyn ConfigPort,
    data_dir: Option<&Path>,
    symbols: &str,
    amounts: &str,
    strategy: &str,
    end_date: Option<NaiveDate>,
    format: OutputFormat,
) -> ExitCode {
    let symbols = match parse_symbols(symbols) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    let amounts = match parse_amounts(amounts) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    if symbols.len() != amounts.len() {
        eprintln!(
            "warning: {} symbols and {} amounts given; extra entries are ignored",
            symbols.len(),
            amounts.len()
        );
    }

    let settings = match build_simulation_settings(config, end_date, today()) {
        Ok(s) => s,
        Err(e) => return report_error(&e),
    };
    let data_port = match resolve_data_port(config, data_dir) {
        Ok(p) => p,
        Err(e) => return report_error(&e),
    };

    let orders = orders_from_lists(&symbols, &amounts, strategy);
    eprintln!(
        "Simulating {} symbol(s) from {} to {}...",
        orders.len(),
        settings.window.start,
        settings.window.end
    );
    let results = run_simulation_batch(data_port.as_ref(), &orders, &settings);

    match format {
        OutputFormat::Text => print!("{}", format_simulation_text(&results)),
        OutputFormat::Json => match print_json(&serde_json::json!({ "results": results })) {
            Ok(()) => {}
            Err(code) => return code,
        },
    }
    batch_exit_code(&results)
}

fn run_volatility(
    config: &dyn ConfigPort,
    data_dir: Option<&Path>,
    symbols: &str,
    end_date: Option<NaiveDate>,
    format: OutputFormat,
) -> ExitCode {
    let symbols = match parse_symbols(symbols) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    let settings = match build_simulation_settings(config, end_date, today()) {
        Ok(s) => s,
        Err(e) => return report_error(&e),
    };
    let data_port = match resolve_data_port(config, data_dir) {
        Ok(p) => p,
        Err(e) => return report_error(&e),
    };

    eprintln!("Computing return statistics for {} symbol(s)...", symbols.len());
    let results = run_volatility_batch(data_port.as_ref(), &symbols, &settings);

    match format {
        OutputFormat::Text => print!("{}", format_volatility_text(&results)),
        OutputFormat::Json => match print_json(&serde_json::json!({ "results": results })) {
            Ok(()) => {}
            Err(code) => return code,
        },
    }
    batch_exit_code(&results)
}

/// Success when at least one symbol succeeded; otherwise the first failure's code.
fn batch_exit_code<T>(results: &[SymbolResult<T>]) -> ExitCode {
    if results.is_empty() || results.iter().any(SymbolResult::is_success) {
        return ExitCode::SUCCESS;
    }
    eprintln!("error: every symbol failed");
    ExitCode::from(5)
}

fn print_json(value: &serde_json::Value) -> Result<(), ExitCode> {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{s}");
            Ok(())
        }
        Err(e) => {
            eprintln!("error: failed to serialize results: {e}");
            Err(ExitCode::from(1))
        }
    }
}

pub fn format_simulation_text(results: &[SymbolResult<SimulationReport>]) -> String {
    let mut out = String::new();
    for result in results {
        match result {
            SymbolResult::Success(report) => {
                let first = report.prices.first().map(|p| p.date.as_str()).unwrap_or("-");
                let last = report.prices.last().map(|p| p.date.as_str()).unwrap_or("-");
                out.push_str(&format!(
                    "{} [{}] {} months ({} to {})\n",
                    report.symbol,
                    report.strategy,
                    report.prices.len(),
                    first,
                    last
                ));
                match report.value {
                    FinalValue::Single { final_value } => {
                        out.push_str(&format!("  final value: {:.2}\n", final_value));
                    }
                    FinalValue::Both { final_values } => {
                        out.push_str(&format!("  monthly:  {:.2}\n", final_values.monthly));
                        out.push_str(&format!("  lump sum: {:.2}\n", final_values.lump_sum));
                    }
                }
            }
            SymbolResult::Failure(f) => {
                out.push_str(&format!("{} failed ({}): {}\n", f.symbol, f.kind, f.error));
            }
        }
    }
    out
}

pub fn format_volatility_text(results: &[SymbolResult<VolatilityReport>]) -> String {
    let mut out = String::new();
    for result in results {
        match result {
            SymbolResult::Success(report) => {
                let s = &report.summary;
                out.push_str(&format!(
                    "{}: min {:.6} q1 {:.6} median {:.6} q3 {:.6} max {:.6} std {:.6}\n",
                    report.symbol, s.min, s.q1, s.median, s.q3, s.max, s.std
                ));
            }
            SymbolResult::Failure(f) => {
                out.push_str(&format!("{} failed ({}): {}\n", f.symbol, f.kind, f.error));
            }
        }
    }
    out
}

pub fn format_backtest_text(result: &BacktestResult) -> String {
    let mut out = String::new();
    for trade in &result.trades {
        out.push_str("======= ROI =======\n");
        out.push_str(&format!("Buy date: {}\n", trade.buy_date));
        out.push_str(&format!("Sell date: {}\n", trade.sell_date));
        out.push_str(&format!("ROI (%): {:.2}\n", round_cents(trade.roi_pct)));
    }
    match result.average_roi {
        Some(avg) => {
            out.push_str("======= AVG ROI =======\n");
            out.push_str(&format!("{:.2}\n", round_cents(avg)));
        }
        None => out.push_str("\nNo valid ROI calculation interval\n"),
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn run_backtest(
    config: &dyn ConfigPort,
    data_dir: Option<&Path>,
    symbol: &str,
    option: Option<&str>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    chart: Option<&Path>,
    format: OutputFormat,
) -> ExitCode {
    let bt_config = match build_backtest_config(config, option, start_date, end_date) {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };
    let data_port = match resolve_data_port(config, data_dir) {
        Ok(p) => p,
        Err(e) => return report_error(&e),
    };

    let symbol = symbol.trim().to_uppercase();
    eprintln!(
        "Backtesting {} with {} from {} to {}...",
        symbol, bt_config.windows, bt_config.start_date, bt_config.end_date
    );

    let series = match data_port.fetch_prices(&symbol, bt_config.start_date, bt_config.end_date) {
        Ok(s) => s,
        Err(e) => return report_error(&e),
    };
    let result = match run_backtest_engine(&series, &bt_config) {
        Ok(r) => r,
        Err(e) => return report_error(&e),
    };

    match format {
        OutputFormat::Text => print!("{}", format_backtest_text(&result)),
        OutputFormat::Json => {
            let value = serde_json::json!({
                "symbol": result.symbol,
                "windows": result.windows.to_string(),
                "events": result.events,
                "trades": result.trades,
                "average_roi": result.average_roi.map(round_cents),
            });
            if let Err(code) = print_json(&value) {
                return code;
            }
        }
    }

    if let Some(path) = chart {
        if let Err(e) = fs::write(path, render_backtest_svg(&result)) {
            return report_error(&SimError::Io(e));
        }
        eprintln!("Chart written to {}", path.display());
    }

    ExitCode::SUCCESS
}

fn run_list_symbols(config: &dyn ConfigPort, data_dir: Option<&Path>) -> ExitCode {
    let data_port = match resolve_data_port(config, data_dir) {
        Ok(p) => p,
        Err(e) => return report_error(&e),
    };

    match data_port.list_symbols() {
        Ok(symbols) => {
            if symbols.is_empty() {
                eprintln!("No symbols found");
            }
            for s in &symbols {
                println!("{s}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}

fn run_serve(config: &dyn ConfigPort, data_dir: Option<&Path>, listen: Option<&str>) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use std::net::SocketAddr;
        use std::sync::Arc;

        let simulation = match build_simulation_config(config, None) {
            Ok(s) => s,
            Err(e) => return report_error(&e),
        };
        let data_port = match resolve_data_port(config, data_dir) {
            Ok(p) => Arc::from(p),
            Err(e) => return report_error(&e),
        };

        let listen = listen
            .map(str::to_string)
            .or_else(|| config.get_string("web", "listen"))
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let addr = match SocketAddr::from_str(listen.trim()) {
            Ok(a) => a,
            Err(_) => {
                return report_error(&SimError::ConfigInvalid {
                    section: "web".into(),
                    key: "listen".into(),
                    reason: format!("'{}' is not a socket address", listen),
                });
            }
        };

        let router = build_router(AppState {
            data_port,
            simulation,
            clock: Arc::new(today),
        });

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(r) => r,
            Err(e) => return report_error(&SimError::Io(e)),
        };

        eprintln!("Starting web server on {}", addr);
        let served = runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await
        });

        match served {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => report_error(&SimError::Io(e)),
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = (config, data_dir, listen);
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::Trade;
    use crate::domain::indicator::{IndicatorSeries, IndicatorType};

    fn empty_result(trades: Vec<Trade>, average_roi: Option<f64>) -> BacktestResult {
        let empty = |n| IndicatorSeries {
            indicator_type: IndicatorType::Sma(n),
            values: vec![],
        };
        BacktestResult {
            symbol: "TEST".into(),
            windows: MaOption::default().windows(),
            prices: vec![],
            short_ma: empty(20),
            long_ma: empty(60),
            events: vec![],
            trades,
            average_roi,
        }
    }

    #[test]
    fn cli_parses_simulate() {
        let cli = Cli::try_parse_from([
            "stratsim",
            "-c",
            "sim.ini",
            "simulate",
            "--symbols",
            "AAPL,MSFT",
            "--amounts",
            "1000,500",
            "--strategy",
            "monthly",
            "--end-date",
            "2024-06-30",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("sim.ini")));
        match cli.command {
            Command::Simulate {
                symbols,
                strategy,
                end_date,
                format,
                ..
            } => {
                assert_eq!(symbols, "AAPL,MSFT");
                assert_eq!(strategy, "monthly");
                assert_eq!(end_date, NaiveDate::from_ymd_opt(2024, 6, 30));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn cli_parses_backtest_positional_symbol() {
        let cli = Cli::try_parse_from(["stratsim", "backtest", "spy", "--option", "50_200"]).unwrap();
        match cli.command {
            Command::Backtest { symbol, option, .. } => {
                assert_eq!(symbol, "spy");
                assert_eq!(option.as_deref(), Some("50_200"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn backtest_text_lists_trades_and_average() {
        let d = |m| NaiveDate::from_ymd_opt(2023, m, 1).unwrap();
        let trades = vec![Trade {
            buy_date: d(1),
            sell_date: d(3),
            buy_price: 100.0,
            sell_price: 112.346,
            roi_pct: 12.346,
        }];
        let text = format_backtest_text(&empty_result(trades, Some(12.346)));
        assert!(text.contains("======= ROI =======\nBuy date: 2023-01-01\nSell date: 2023-03-01\nROI (%): 12.35\n"));
        assert!(text.ends_with("======= AVG ROI =======\n12.35\n"));
    }

    #[test]
    fn backtest_text_without_trades() {
        let text = format_backtest_text(&empty_result(vec![], None));
        assert_eq!(text, "\nNo valid ROI calculation interval\n");
    }
}
