//! What-if sweeps: the same history replayed under several configurations.
//!
//! Variants share nothing mutable. Each gets its own evaluator and replay
//! state, runs on the rayon pool, and results are collected in input order
//! once every variant has finished.

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use common::{CandleSeries, Result, Settings};

use crate::{BacktestReport, Backtester};

/// A named configuration to replay.
#[derive(Debug, Clone)]
pub struct Variant {
    pub name: String,
    pub settings: Settings,
}

impl Variant {
    pub fn new(name: impl Into<String>, settings: Settings) -> Self {
        Self {
            name: name.into(),
            settings,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepOutcome {
    pub name: String,
    pub report: BacktestReport,
}

/// One variant per confidence threshold, everything else taken from `base`.
pub fn threshold_variants(base: &Settings, thresholds: &[f64]) -> Vec<Variant> {
    thresholds
        .iter()
        .map(|&threshold| {
            let mut settings = base.clone();
            settings.engine.confidence_threshold = threshold;
            Variant::new(format!("threshold={threshold}"), settings)
        })
        .collect()
}

/// Replay every variant. Fails before any replay starts if a variant's
/// configuration is invalid.
pub fn run_sweep(
    daily: &CandleSeries,
    weekly: &CandleSeries,
    variants: &[Variant],
) -> Result<Vec<SweepOutcome>> {
    let backtesters = variants
        .iter()
        .map(|v| Backtester::from_settings(&v.settings))
        .collect::<Result<Vec<_>>>()?;

    info!(variants = variants.len(), "Starting sweep");
    let outcomes = variants
        .par_iter()
        .zip(backtesters.par_iter())
        .map(|(variant, backtester)| SweepOutcome {
            name: variant.name.clone(),
            report: backtester.run(daily, weekly),
        })
        .collect();
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_variants_only_change_threshold() {
        let base = Settings::default();
        let variants = threshold_variants(&base, &[0.1, 0.9]);
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].name, "threshold=0.1");
        assert_eq!(variants[1].settings.engine.confidence_threshold, 0.9);
        assert_eq!(variants[1].settings.engine.analyzers, base.engine.analyzers);
        assert_eq!(variants[1].settings.backtest, base.backtest);
    }
}
