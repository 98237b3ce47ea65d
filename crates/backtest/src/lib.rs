pub mod export;
pub mod replay;
pub mod stats;
pub mod sweep;
pub mod trade;

pub use export::{trades_csv_string, write_summary_json, write_trades_csv};
pub use replay::{BacktestReport, Backtester, SkippedStep, StepDecision};
pub use stats::{equity_curve, max_drawdown, Summary};
pub use sweep::{run_sweep, threshold_variants, SweepOutcome, Variant};
pub use trade::OpenTrade;
