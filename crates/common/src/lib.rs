pub mod config;
pub mod error;
pub mod ingest;
pub mod series;
pub mod types;

pub use config::{AnalyzerConfig, BacktestConfig, EngineConfig, Environment, Settings};
pub use error::{DataError, Error, Result};
pub use ingest::{parse_timestamp, read_candles, read_candles_csv};
pub use series::{resample_weekly, CandleSeries, EvaluationWindow, PriorCandles, Snapshot};
pub use types::*;
