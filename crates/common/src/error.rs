use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::Timeframe;

/// Candle-data problems: the ingestion contract was violated, or a window is
/// too short for the computation asked of it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("candle series is empty")]
    Empty,

    #[error("insufficient history: need {needed} candles, have {available}")]
    InsufficientHistory { needed: usize, available: usize },

    #[error("malformed candle record {record}: {reason}")]
    Malformed { record: u64, reason: String },

    #[error("invalid candle at {timestamp}: {reason}")]
    InvalidCandle {
        timestamp: DateTime<Utc>,
        reason: String,
    },

    #[error("timestamps not ascending: {next} follows {previous}")]
    NonMonotonic {
        previous: DateTime<Utc>,
        next: DateTime<Utc>,
    },

    #[error("gap in {timeframe} series between {after} and {before}")]
    Gap {
        timeframe: Timeframe,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
