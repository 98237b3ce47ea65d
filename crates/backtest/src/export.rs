//! Trade tape and summary export.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use common::{Error, Result, TradeRecord};

use crate::{BacktestReport, OpenTrade, Summary};

/// One CSV row per closed trade.
pub fn write_trades_csv(path: &Path, trades: &[TradeRecord]) -> Result<()> {
    let file = File::create(path)?;
    write_trades(file, trades)?;
    info!(path = %path.display(), trades = trades.len(), "Wrote trades CSV");
    Ok(())
}

pub fn trades_csv_string(trades: &[TradeRecord]) -> Result<String> {
    let mut buffer = Vec::new();
    write_trades(&mut buffer, trades)?;
    String::from_utf8(buffer).map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

fn write_trades<W: Write>(sink: W, trades: &[TradeRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    if trades.is_empty() {
        // serde only emits the header alongside the first record
        writer.write_record([
            "entry_timestamp",
            "entry_price",
            "confidence",
            "holding_periods",
            "exit_timestamp",
            "exit_price",
            "pnl_pct",
            "success",
        ])?;
    }
    for trade in trades {
        writer.serialize(trade)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct SummaryFile<'a> {
    summary: &'a Summary,
    steps_evaluated: usize,
    steps_skipped: usize,
    long_decisions: usize,
    open_trade: Option<&'a OpenTrade>,
}

/// The aggregate record of a run, without the per-step detail.
pub fn write_summary_json(path: &Path, report: &BacktestReport) -> Result<()> {
    let file = SummaryFile {
        summary: &report.summary,
        steps_evaluated: report.steps_evaluated,
        steps_skipped: report.skipped.len(),
        long_decisions: report.long_decisions,
        open_trade: report.open_trade.as_ref(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), "Wrote summary JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn trade(pnl_pct: f64) -> TradeRecord {
        TradeRecord {
            entry_timestamp: Utc.with_ymd_and_hms(2024, 1, 7, 0, 0, 0).unwrap(),
            entry_price: 100.0,
            confidence: 0.25,
            holding_periods: 14,
            exit_timestamp: Utc.with_ymd_and_hms(2024, 4, 14, 0, 0, 0).unwrap(),
            exit_price: 100.0 * (1.0 + pnl_pct),
            pnl_pct,
            success: pnl_pct > 0.0,
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_trade() {
        let csv = trades_csv_string(&[trade(0.1), trade(-0.1)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "entry_timestamp,entry_price,confidence,holding_periods,exit_timestamp,exit_price,pnl_pct,success"
        );
        assert!(lines[1].starts_with("2024-01-07T00:00:00Z,100.0,0.25,14,2024-04-14T00:00:00Z,"));
        assert!(lines[1].ends_with(",true"));
        assert!(lines[2].ends_with(",false"));
    }

    #[test]
    fn empty_tape_still_has_header() {
        let csv = trades_csv_string(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("entry_timestamp,"));
    }

    #[test]
    fn summary_and_trades_written_to_disk() {
        let dir = std::env::temp_dir().join(format!("tailscan-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let trades = vec![trade(0.1)];
        let report = BacktestReport {
            summary: Summary::from_trades(&trades),
            trades,
            open_trade: None,
            skipped: vec![],
            decisions: vec![],
            steps_evaluated: 5,
            long_decisions: 1,
        };

        let path = dir.join("summary.json");
        write_summary_json(&path, &report).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["summary"]["total_signals"], 1);
        assert_eq!(value["steps_evaluated"], 5);
        assert!(value["open_trade"].is_null());

        let csv_path = dir.join("trades.csv");
        write_trades_csv(&csv_path, &report.trades).unwrap();
        assert_eq!(std::fs::read_to_string(&csv_path).unwrap().lines().count(), 2);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
