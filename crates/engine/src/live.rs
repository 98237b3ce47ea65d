//! One-shot evaluation for live use: the latest (or a chosen) weekly close.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use common::{AnalyzerResult, CandleSeries, DecisionResult, Snapshot};

use crate::{decide, Evaluator};

/// A decision together with the analyzer results it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct LiveDecision {
    pub as_of: DateTime<Utc>,
    pub decision: DecisionResult,
    pub analyzers: Vec<AnalyzerResult>,
}

/// Evaluate the market as visible at `t`. Candles after `t` are ignored.
pub fn evaluate_as_of(
    evaluator: &Evaluator,
    daily: &CandleSeries,
    weekly: &CandleSeries,
    t: DateTime<Utc>,
) -> LiveDecision {
    evaluate_snapshot(evaluator, Snapshot::as_of(daily, weekly, t))
}

/// Evaluate at the most recent weekly close.
pub fn evaluate_latest(
    evaluator: &Evaluator,
    daily: &CandleSeries,
    weekly: &CandleSeries,
) -> LiveDecision {
    match Snapshot::latest(daily, weekly) {
        Some(snapshot) => evaluate_snapshot(evaluator, snapshot),
        // unreachable: a CandleSeries is never empty
        None => evaluate_snapshot(evaluator, Snapshot::new(DateTime::<Utc>::MIN_UTC, &[], &[])),
    }
}

fn evaluate_snapshot(evaluator: &Evaluator, snapshot: Snapshot<'_>) -> LiveDecision {
    let as_of = snapshot.timestamp();
    let context = evaluator.context(snapshot);
    let decision = decide(&context);
    info!(
        as_of = %as_of,
        signal = %decision.signal,
        confidence = decision.confidence,
        "Decision"
    );
    LiveDecision {
        as_of,
        decision,
        analyzers: context.into_results(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use common::{Candle, EngineConfig, Signal, Timeframe};

    fn daily(n: i64) -> CandleSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let candles = (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.7).sin() * 5.0;
                Candle {
                    timestamp: start + Duration::days(i),
                    open: close - 0.5,
                    high: close + 1.5,
                    low: close - 2.0,
                    close,
                    volume: 1_000.0 + i as f64,
                }
            })
            .collect();
        CandleSeries::new(Timeframe::Daily, candles).unwrap()
    }

    #[test]
    fn latest_equals_as_of_last_weekly_close() {
        let evaluator = Evaluator::from_config(EngineConfig::default()).unwrap();
        let daily = daily(7 * 30);
        let weekly = common::resample_weekly(&daily).unwrap();
        let t = weekly.last().unwrap().timestamp;

        let latest = evaluate_latest(&evaluator, &daily, &weekly);
        let at = evaluate_as_of(&evaluator, &daily, &weekly, t);
        assert_eq!(latest.as_of, t);
        assert_eq!(
            serde_json::to_string(&latest).unwrap(),
            serde_json::to_string(&at).unwrap()
        );
        assert_eq!(latest.analyzers.len(), 3);
    }

    #[test]
    fn early_timestamp_holds() {
        let evaluator = Evaluator::from_config(EngineConfig::default()).unwrap();
        let daily = daily(7 * 30);
        let weekly = common::resample_weekly(&daily).unwrap();
        let t = weekly.candles()[3].timestamp;
        let live = evaluate_as_of(&evaluator, &daily, &weekly, t);
        assert_eq!(live.decision.signal, Signal::Hold);
        assert_eq!(live.decision.confidence, 0.0);
    }
}
