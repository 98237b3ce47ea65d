use std::io::Read;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::{Candle, CandleSeries, DataError, Result, Timeframe};

/// One CSV row: `timestamp,open,high,low,close,volume`.
///
/// `timestamp` is either RFC 3339 or integer unix seconds and marks the close
/// of the candle's bucket.
#[derive(Debug, Deserialize)]
struct CandleRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Load and validate a candle series from a CSV file.
///
/// Each row's timestamp is the close of its bucket. Daily rows may be stamped
/// at `00:00` of the following day or at `23:59:59` of the covered day.
pub fn read_candles_csv(path: impl AsRef<Path>, timeframe: Timeframe) -> Result<CandleSeries> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let series = read_candles(file, timeframe)?;
    debug!(path = %path.display(), %timeframe, candles = series.len(), "Loaded candle series");
    Ok(series)
}

/// Load and validate a candle series from any CSV source.
pub fn read_candles<R: Read>(source: R, timeframe: Timeframe) -> Result<CandleSeries> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);
    let mut candles = Vec::new();
    for (idx, row) in reader.deserialize::<CandleRow>().enumerate() {
        let record = idx as u64 + 1;
        let row = row.map_err(|e| DataError::Malformed {
            record,
            reason: e.to_string(),
        })?;
        candles.push(Candle {
            timestamp: parse_timestamp(&row.timestamp).ok_or_else(|| DataError::Malformed {
                record,
                reason: format!("unparseable timestamp '{}'", row.timestamp),
            })?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    Ok(CandleSeries::new(timeframe, candles)?)
}

/// Unix seconds or RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(secs) = raw.parse::<i64>() {
        return Utc.timestamp_opt(secs, 0).single();
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
