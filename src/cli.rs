//! CLI definition and dispatch.

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::aggregate::{fetch_aggregated, Period};
use crate::domain::ath::ath_comparison;
use crate::domain::config_validation::{
    load_trend_params, validate_data_config, validate_trend_config, validate_watchlist_config,
};
use crate::domain::error::TrendwatchError;
use crate::domain::profit::{buy_every_close, max_profit_from_last_close, profitable_period_ratio};
use crate::domain::trend::{current_trend, Algorithm, ChartType, TrendParams};
use crate::domain::xirr::{solve_xirr, CashFlow};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "trendwatch", about = "Bar aggregation, trend and return analysis")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Aggregate daily bars into weekly or monthly bars
    Aggregate {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, default_value = "week")]
        period: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the table to a CSV file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        verbose: bool,
    },
    /// Classify the current trend of one symbol or the configured watchlist
    Trend {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long, default_value = "peaks")]
        algorithm: String,
        #[arg(long)]
        num_units: Option<usize>,
        #[arg(long)]
        uptrend_above: Option<f64>,
        #[arg(long)]
        downtrend_below: Option<f64>,
        #[arg(long, default_value = "weekly")]
        chart_type: String,
        /// Print the integer code (1, 0, -1) instead of the label
        #[arg(long)]
        numeric: bool,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        verbose: bool,
    },
    /// Solve the annualized rate for past cash flows and a current value
    Xirr {
        /// A cash flow as AMOUNT:AGE_IN_DAYS; repeatable
        #[arg(long = "flow", required = true)]
        flows: Vec<String>,
        #[arg(long)]
        current_value: f64,
    },
    /// Compare the last traded price against recent highs
    Ath {
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value_t = 95.0)]
        percentile: f64,
        #[arg(long, default_value_t = 365)]
        lookback_days: u64,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// How often buying a period's close beat a profit threshold
    ProfitOdds {
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "week")]
        period: String,
        #[arg(long, default_value_t = 1.0)]
        threshold: f64,
        #[arg(long, default_value_t = 52)]
        num_periods: usize,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Simulate buying one unit at every month's close
    BuyEveryClose {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Aggregate {
            symbol,
            start,
            end,
            period,
            data_dir,
            config,
            output,
            verbose,
        } => run_aggregate(
            &symbol,
            start,
            end,
            &period,
            data_dir.as_ref(),
            config.as_ref(),
            output.as_ref(),
            verbose,
        ),
        Command::Trend {
            symbol,
            algorithm,
            num_units,
            uptrend_above,
            downtrend_below,
            chart_type,
            numeric,
            as_of,
            data_dir,
            config,
            verbose,
        } => run_trend(
            symbol.as_deref(),
            &algorithm,
            num_units,
            uptrend_above,
            downtrend_below,
            &chart_type,
            numeric,
            as_of,
            data_dir.as_ref(),
            config.as_ref(),
            verbose,
        ),
        Command::Xirr {
            flows,
            current_value,
        } => run_xirr(&flows, current_value),
        Command::Ath {
            symbol,
            percentile,
            lookback_days,
            as_of,
            data_dir,
            config,
        } => run_ath(
            &symbol,
            percentile,
            lookback_days,
            as_of,
            data_dir.as_ref(),
            config.as_ref(),
        ),
        Command::ProfitOdds {
            symbol,
            period,
            threshold,
            num_periods,
            as_of,
            data_dir,
            config,
        } => run_profit_odds(
            &symbol,
            &period,
            threshold,
            num_periods,
            as_of,
            data_dir.as_ref(),
            config.as_ref(),
        ),
        Command::BuyEveryClose {
            symbol,
            start,
            as_of,
            data_dir,
            config,
        } => run_buy_every_close(
            &symbol,
            start,
            as_of,
            data_dir.as_ref(),
            config.as_ref(),
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, TrendwatchError> {
    FileConfigAdapter::from_file(path).map_err(|e| TrendwatchError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Data comes from `--data-dir` when given, otherwise from `[data] csv_dir`
/// in the config file.
fn resolve_data_port(
    data_dir: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
) -> Result<CsvAdapter, TrendwatchError> {
    if let Some(dir) = data_dir {
        return Ok(CsvAdapter::new(dir.clone()));
    }
    let config_path = config_path.ok_or_else(|| TrendwatchError::InvalidParam {
        name: "data_dir".to_string(),
        reason: "either --data-dir or --config is required".to_string(),
    })?;
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    let dir = config
        .get_string("data", "csv_dir")
        .unwrap_or_default();
    Ok(CsvAdapter::new(PathBuf::from(dir)))
}

fn resolve_as_of(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Utc::now().date_naive())
}

#[allow(clippy::too_many_arguments)]
fn run_aggregate(
    symbol: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
    period: &str,
    data_dir: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
    output: Option<&PathBuf>,
    verbose: bool,
) -> Result<(), TrendwatchError> {
    let period = Period::parse(period)?;
    let port = resolve_data_port(data_dir, config_path)?;
    let end = resolve_as_of(end);

    let bars = fetch_aggregated(&port, symbol, start, end, period, verbose)?;

    match output {
        Some(path) => {
            CsvReportAdapter.write_bars(&bars, path)?;
            eprintln!("Wrote {} rows to {}", bars.len(), path.display());
        }
        None => {
            println!("period,open,high,low,close,volume");
            for bar in &bars {
                println!(
                    "{},{},{},{},{},{}",
                    bar.key, bar.open, bar.high, bar.low, bar.close, bar.volume
                );
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_trend(
    symbol: Option<&str>,
    algorithm: &str,
    num_units: Option<usize>,
    uptrend_above: Option<f64>,
    downtrend_below: Option<f64>,
    chart_type: &str,
    numeric: bool,
    as_of: Option<NaiveDate>,
    data_dir: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
    verbose: bool,
) -> Result<(), TrendwatchError> {
    let algorithm = Algorithm::parse(algorithm)?;
    let chart = ChartType::parse(chart_type)?;
    let as_of = resolve_as_of(as_of);

    let mut params = TrendParams::default();
    if let Some(config_path) = config_path {
        let config = load_config(config_path)?;
        validate_trend_config(&config)?;
        params = load_trend_params(&config);
    }
    if let Some(n) = num_units {
        params.num_units = n;
    }
    if let Some(up) = uptrend_above {
        params.uptrend_if_above_percent = up;
    }
    if let Some(down) = downtrend_below {
        params.downtrend_if_below_percent = down;
    }
    params.validate()?;

    let symbols: Vec<String> = match symbol {
        Some(s) => vec![s.to_uppercase()],
        None => {
            let config_path = config_path.ok_or_else(|| TrendwatchError::InvalidParam {
                name: "symbol".to_string(),
                reason: "either --symbol or a config with [watchlist] symbols is required"
                    .to_string(),
            })?;
            let config = load_config(config_path)?;
            validate_watchlist_config(&config)?
        }
    };

    let port = resolve_data_port(data_dir, config_path)?;
    for symbol in &symbols {
        let report = match current_trend(&port, symbol, algorithm, &params, chart, as_of, verbose) {
            Ok(report) => report,
            // In batch mode one thin symbol must not sink the rest.
            Err(e @ TrendwatchError::InsufficientUnits { .. }) if symbols.len() > 1 => {
                eprintln!("Warning: skipping {symbol} ({e})");
                continue;
            }
            Err(e) => return Err(e),
        };
        if numeric {
            println!("{} {}", symbol, report.trend.code());
        } else {
            println!("{} {}", symbol, report.trend);
        }
    }
    Ok(())
}

fn parse_flow(input: &str) -> Result<CashFlow, TrendwatchError> {
    let invalid = |reason: String| TrendwatchError::InvalidParam {
        name: "flow".to_string(),
        reason,
    };
    let (amount, days) = input
        .split_once(':')
        .ok_or_else(|| invalid(format!("expected AMOUNT:AGE_IN_DAYS, got {input}")))?;
    let amount: f64 = amount
        .parse()
        .map_err(|e| invalid(format!("invalid amount in {input}: {e}")))?;
    if amount < 0.0 {
        return Err(invalid(format!("amount must be non-negative, got {amount}")));
    }
    let age_days: u32 = days
        .parse()
        .map_err(|e| invalid(format!("invalid age in {input}: {e}")))?;
    Ok(CashFlow::new(amount, age_days))
}

fn run_xirr(flows: &[String], current_value: f64) -> Result<(), TrendwatchError> {
    let flows: Vec<CashFlow> = flows
        .iter()
        .map(|f| parse_flow(f))
        .collect::<Result<_, _>>()?;
    let rate = solve_xirr(&flows, current_value);
    println!("{rate:.2}");
    Ok(())
}

fn run_ath(
    symbol: &str,
    percentile: f64,
    lookback_days: u64,
    as_of: Option<NaiveDate>,
    data_dir: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
) -> Result<(), TrendwatchError> {
    let port = resolve_data_port(data_dir, config_path)?;
    let as_of = resolve_as_of(as_of);
    let start = as_of - chrono::Days::new(lookback_days);

    let bars = port.fetch_daily(symbol, start, as_of)?;
    let comparison = ath_comparison(&bars, percentile)?.ok_or_else(|| TrendwatchError::NoData {
        symbol: symbol.to_string(),
    })?;

    println!(
        "{} ltp={} ath={} p{}_high={}",
        symbol,
        comparison.last_traded_price,
        comparison.all_time_high,
        percentile,
        comparison.percentile_high
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_profit_odds(
    symbol: &str,
    period: &str,
    threshold: f64,
    num_periods: usize,
    as_of: Option<NaiveDate>,
    data_dir: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
) -> Result<(), TrendwatchError> {
    if num_periods == 0 {
        return Err(TrendwatchError::InvalidParam {
            name: "num_periods".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    let period = Period::parse(period)?;
    let port = resolve_data_port(data_dir, config_path)?;
    let as_of = resolve_as_of(as_of);

    // One extra period so the oldest one still has a predecessor close.
    let days_per_period = match period {
        Period::Week => 7,
        Period::Month => 31,
    };
    let start = as_of - chrono::Days::new((num_periods as u64 + 1) * days_per_period);

    let bars = fetch_aggregated(&port, symbol, start, as_of, period, false)?;
    if bars.len() < 2 {
        return Err(TrendwatchError::NoData {
            symbol: symbol.to_string(),
        });
    }

    let profits = max_profit_from_last_close(&bars);
    let odds = profitable_period_ratio(&profits, threshold, num_periods);
    println!("{symbol} {odds:.1}");
    Ok(())
}

fn run_buy_every_close(
    symbol: &str,
    start: NaiveDate,
    as_of: Option<NaiveDate>,
    data_dir: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
) -> Result<(), TrendwatchError> {
    let port = resolve_data_port(data_dir, config_path)?;
    let as_of = resolve_as_of(as_of);

    let bars = fetch_aggregated(&port, symbol, start, as_of, Period::Month, false)?;
    let summary = buy_every_close(&bars, as_of).ok_or_else(|| TrendwatchError::NoData {
        symbol: symbol.to_string(),
    })?;

    println!(
        "{} invested={:.2} value={:.2} profit={:.2}% annualized={:.2}%",
        symbol,
        summary.invested,
        summary.current_value,
        summary.profit_percent,
        summary.annualized_rate_percent
    );
    Ok(())
}
