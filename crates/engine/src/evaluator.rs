use common::{DecisionResult, EngineConfig, Result, Snapshot};
use strategy::AnalyzerRegistry;

use crate::{decide, DecisionContext};

/// Analyzer registry plus engine configuration: the single code path shared by
/// live evaluation and backtest replay.
pub struct Evaluator {
    registry: AnalyzerRegistry,
    config: EngineConfig,
}

impl Evaluator {
    /// Validate `config` and build the analyzers it enables.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        let registry = AnalyzerRegistry::from_config(&config)?;
        Ok(Self { registry, config })
    }

    pub fn new(registry: AnalyzerRegistry, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn context<'a>(&'a self, snapshot: Snapshot<'a>) -> DecisionContext<'a> {
        DecisionContext::build(snapshot, &self.registry, &self.config)
    }

    pub fn evaluate(&self, snapshot: &Snapshot<'_>) -> DecisionResult {
        decide(&self.context(*snapshot))
    }

    /// Weekly candles the critical analyzer needs before it can report OK.
    pub fn required_history(&self) -> usize {
        self.registry.required_history()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use common::{Candle, Signal};

    fn week(i: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 7, 23, 59, 59).unwrap() + Duration::weeks(i),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    fn tail_only(threshold: f64) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.confidence_threshold = threshold;
        config.analyzers.retain(|name, _| name == "weekly_tail");
        config
    }

    /// Twenty flat weeks with range 10 and volume 100, then a hammer.
    fn hammer_history() -> Vec<Candle> {
        let mut weekly: Vec<Candle> = (0..20)
            .map(|i| week(i, 100.0, 105.0, 95.0, 100.0, 100.0))
            .collect();
        weekly.push(week(20, 100.0, 103.0, 90.0, 102.0, 180.0));
        weekly
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.critical_analyzer = "nope".into();
        assert!(Evaluator::from_config(config).is_err());
    }

    #[test]
    fn long_on_hammer_with_tail_only() {
        let evaluator = Evaluator::from_config(tail_only(0.1)).unwrap();
        let weekly = hammer_history();
        let snap = Snapshot::new(weekly[20].timestamp, &[], &weekly);
        let decision = evaluator.evaluate(&snap);
        assert_eq!(decision.signal, Signal::Long, "{decision:?}");
        assert!(decision.confidence >= 0.1);
    }

    #[test]
    fn hold_with_short_history() {
        let evaluator = Evaluator::from_config(tail_only(0.1)).unwrap();
        let weekly = hammer_history();
        let snap = Snapshot::new(weekly[20].timestamp, &[], &weekly[10..]);
        let decision = evaluator.evaluate(&snap);
        assert_eq!(decision.signal, Signal::Hold);
        assert_eq!(decision.confidence, 0.0);
    }

    #[test]
    fn empty_registry_reports_missing_critical() {
        let config = tail_only(0.1);
        let registry = AnalyzerRegistry::new("weekly_tail");
        let evaluator = Evaluator::new(registry, config);
        let weekly = hammer_history();
        let decision = evaluator.evaluate(&Snapshot::new(weekly[20].timestamp, &[], &weekly));
        assert_eq!(decision.signal, Signal::Hold);
        assert!(decision.reasons[0].contains("missing"));
    }
}
