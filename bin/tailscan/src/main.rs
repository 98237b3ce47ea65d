//! TailScan CLI: weekly-tail decisions, backtests and threshold sweeps.
//!
//! Commands:
//! - `decide`   evaluate the latest (or a given) weekly close and print JSON
//! - `backtest` replay the full history and write trades.csv / summary.json
//! - `sweep`    replay several confidence thresholds in parallel

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use backtest::Backtester;
use common::{
    parse_timestamp, read_candles_csv, resample_weekly, CandleSeries, Environment, Settings,
    Timeframe,
};
use engine::Evaluator;

#[derive(Parser)]
#[command(name = "tailscan", about = "Weekly lower-tail reversal scanner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Daily candles (CSV: timestamp,open,high,low,close,volume).
    #[arg(long)]
    daily: PathBuf,

    /// Weekly candles. Resampled from the daily series when omitted.
    #[arg(long)]
    weekly: Option<PathBuf>,

    /// Settings TOML. Falls back to TAILSCAN_SETTINGS, then built-in defaults.
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one decision and print it as JSON.
    Decide {
        #[command(flatten)]
        data: DataArgs,

        /// Evaluation instant (RFC 3339 or unix seconds). Defaults to the
        /// latest weekly close.
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Replay the decision engine over the whole history.
    Backtest {
        #[command(flatten)]
        data: DataArgs,

        /// Output directory. Falls back to TAILSCAN_OUTPUT_DIR, then ./results.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Replay one variant per confidence threshold.
    Sweep {
        #[command(flatten)]
        data: DataArgs,

        /// Comma-separated thresholds, e.g. 0.1,0.2,0.3.
        #[arg(long, value_delimiter = ',', required = true)]
        thresholds: Vec<f64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let env = Environment::from_env();

    match cli.command {
        Commands::Decide { data, as_of } => {
            let settings = load_settings(&data, &env)?;
            let (daily, weekly) = load_series(&data)?;
            let evaluator = Evaluator::from_config(settings.engine)?;

            let live = match as_of {
                Some(raw) => {
                    let t = parse_timestamp(&raw)
                        .ok_or_else(|| anyhow!("invalid --as-of timestamp '{raw}'"))?;
                    engine::evaluate_as_of(&evaluator, &daily, &weekly, t)
                }
                None => engine::evaluate_latest(&evaluator, &daily, &weekly),
            };
            println!("{}", serde_json::to_string_pretty(&live)?);
        }
        Commands::Backtest { data, output_dir } => {
            let settings = load_settings(&data, &env)?;
            let (daily, weekly) = load_series(&data)?;
            let report = Backtester::from_settings(&settings)?.run(&daily, &weekly);

            let dir = output_dir.unwrap_or_else(|| env.output_dir.clone());
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create output dir {}", dir.display()))?;
            backtest::write_trades_csv(&dir.join("trades.csv"), &report.trades)?;
            backtest::write_summary_json(&dir.join("summary.json"), &report)?;

            let s = &report.summary;
            info!(
                signals = s.total_signals,
                successes = s.successes,
                accuracy = s.accuracy,
                avg_pnl_pct = s.average_pnl_pct,
                max_drawdown_pct = s.max_drawdown_pct,
                skipped = report.skipped.len(),
                "Backtest summary"
            );
        }
        Commands::Sweep { data, thresholds } => {
            let settings = load_settings(&data, &env)?;
            let (daily, weekly) = load_series(&data)?;
            let variants = backtest::threshold_variants(&settings, &thresholds);

            for outcome in backtest::run_sweep(&daily, &weekly, &variants)? {
                let s = &outcome.report.summary;
                println!(
                    "{:<16} signals={:<4} accuracy={:.3} avg_pnl={:+.4} max_dd={:.4}",
                    outcome.name, s.total_signals, s.accuracy, s.average_pnl_pct, s.max_drawdown_pct
                );
            }
        }
    }

    Ok(())
}

fn load_settings(data: &DataArgs, env: &Environment) -> Result<Settings> {
    match data.settings.as_ref().or(env.settings_path.as_ref()) {
        Some(path) => {
            info!(path = %path.display(), "Loading settings");
            Ok(Settings::load(path)?)
        }
        None => {
            info!("No settings file given, using defaults");
            Ok(Settings::default())
        }
    }
}

fn load_series(data: &DataArgs) -> Result<(CandleSeries, CandleSeries)> {
    let daily = read_series(&data.daily, Timeframe::Daily)?;
    let weekly = match &data.weekly {
        Some(path) => read_series(path, Timeframe::Weekly)?,
        None => resample_weekly(&daily).context("failed to resample daily candles to weekly")?,
    };
    info!(daily = daily.len(), weekly = weekly.len(), "Candles loaded");
    Ok((daily, weekly))
}

fn read_series(path: &Path, timeframe: Timeframe) -> Result<CandleSeries> {
    read_candles_csv(path, timeframe)
        .with_context(|| format!("failed to load {timeframe} candles from {}", path.display()))
}
