use common::{AnalyzerResult, EngineConfig, Snapshot};
use strategy::AnalyzerRegistry;

/// Everything one decision may look at: the market as of a timestamp, the
/// analyzer results computed from that same snapshot, and the configuration.
///
/// Immutable once built. Nothing in it postdates `snapshot.timestamp()`.
#[derive(Debug, Clone)]
pub struct DecisionContext<'a> {
    snapshot: Snapshot<'a>,
    results: Vec<AnalyzerResult>,
    config: &'a EngineConfig,
}

impl<'a> DecisionContext<'a> {
    /// Assemble a context from results computed elsewhere, e.g. by external
    /// analyzers.
    pub fn new(
        snapshot: Snapshot<'a>,
        results: Vec<AnalyzerResult>,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            snapshot,
            results,
            config,
        }
    }

    /// Run every registered analyzer against `snapshot` and capture the
    /// results.
    pub fn build(
        snapshot: Snapshot<'a>,
        registry: &AnalyzerRegistry,
        config: &'a EngineConfig,
    ) -> Self {
        let results = registry.analyze_all(&snapshot);
        Self::new(snapshot, results, config)
    }

    pub fn snapshot(&self) -> &Snapshot<'a> {
        &self.snapshot
    }

    pub fn results(&self) -> &[AnalyzerResult] {
        &self.results
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    pub fn into_results(self) -> Vec<AnalyzerResult> {
        self.results
    }
}
