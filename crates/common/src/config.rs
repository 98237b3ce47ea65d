use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Per-analyzer settings: a weight plus named numeric thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Multiplier applied to the analyzer's score to get its contribution.
    pub weight: f64,
    #[serde(default)]
    pub thresholds: BTreeMap<String, f64>,
}

impl AnalyzerConfig {
    pub fn new(weight: f64, thresholds: &[(&str, f64)]) -> Self {
        Self {
            enabled: true,
            weight,
            thresholds: thresholds
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    pub fn threshold(&self, key: &str) -> Option<f64> {
        self.thresholds.get(key).copied()
    }
}

/// Weights and thresholds consumed by the analyzers and the decision engine.
///
/// Loaded once per run and passed by reference everywhere; nothing reads
/// configuration from ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum aggregated confidence for a LONG signal.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Analyzer whose health and direction gate every decision.
    #[serde(default = "default_critical_analyzer")]
    pub critical_analyzer: String,
    #[serde(default = "default_analyzers")]
    pub analyzers: BTreeMap<String, AnalyzerConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            critical_analyzer: default_critical_analyzer(),
            analyzers: default_analyzers(),
        }
    }
}

impl EngineConfig {
    /// Check global ranges and weights. Per-analyzer thresholds are checked
    /// when each analyzer is built from its entry.
    pub fn validate(&self) -> Result<()> {
        let t = self.confidence_threshold;
        if !t.is_finite() || !(0.0..=1.0).contains(&t) {
            return Err(Error::Config(format!(
                "confidence_threshold must be within [0, 1], got {t}"
            )));
        }

        match self.analyzers.get(&self.critical_analyzer) {
            Some(cfg) if cfg.enabled => {}
            Some(_) => {
                return Err(Error::Config(format!(
                    "critical analyzer '{}' is disabled",
                    self.critical_analyzer
                )))
            }
            None => {
                return Err(Error::Config(format!(
                    "critical analyzer '{}' has no configuration entry",
                    self.critical_analyzer
                )))
            }
        }

        let mut total = 0.0;
        for (name, cfg) in self.enabled_analyzers() {
            if !cfg.weight.is_finite() || !(0.0..=1.0).contains(&cfg.weight) {
                return Err(Error::Config(format!(
                    "weight for '{name}' must be within [0, 1], got {}",
                    cfg.weight
                )));
            }
            total += cfg.weight;
        }
        if total > 1.0 + 1e-9 {
            return Err(Error::Config(format!(
                "enabled analyzer weights sum to {total:.4}, must not exceed 1.0"
            )));
        }
        Ok(())
    }

    pub fn enabled_analyzers(&self) -> impl Iterator<Item = (&String, &AnalyzerConfig)> {
        self.analyzers.iter().filter(|(_, cfg)| cfg.enabled)
    }

    pub fn analyzer(&self, name: &str) -> Option<&AnalyzerConfig> {
        self.analyzers.get(name)
    }
}

/// Replay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Number of weekly steps a simulated trade is held.
    #[serde(default = "default_holding_periods")]
    pub holding_periods: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            holding_periods: default_holding_periods(),
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.holding_periods == 0 {
            return Err(Error::Config("holding_periods must be at least 1".into()));
        }
        Ok(())
    }
}

/// Top-level settings file (TOML).
///
/// Example `config/settings.toml`:
/// ```toml
/// [engine]
/// confidence_threshold = 0.10
/// critical_analyzer = "weekly_tail"
///
/// [engine.analyzers.weekly_tail]
/// weight = 0.5
///
/// [engine.analyzers.weekly_tail.thresholds]
/// atr_period = 14
/// volume_period = 20
/// min_tail_ratio = 0.3
/// min_tail_strength = 0.35
/// max_body_atr = 2.0
/// min_close_pos = 0.2
///
/// [backtest]
/// holding_periods = 14
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
}

impl Settings {
    /// Load and validate settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read settings at '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.engine.validate()?;
        settings.backtest.validate()?;
        Ok(settings)
    }
}

/// Process environment, read once at startup. Loads `.env` if present.
#[derive(Debug, Clone)]
pub struct Environment {
    pub settings_path: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Environment {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Environment {
            settings_path: optional_env("TAILSCAN_SETTINGS").map(PathBuf::from),
            output_dir: optional_env("TAILSCAN_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("results")),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn default_enabled() -> bool {
    true
}

fn default_confidence_threshold() -> f64 {
    0.10
}

fn default_critical_analyzer() -> String {
    "weekly_tail".to_string()
}

fn default_holding_periods() -> usize {
    14
}

fn default_analyzers() -> BTreeMap<String, AnalyzerConfig> {
    BTreeMap::from([
        (
            "weekly_tail".to_string(),
            AnalyzerConfig::new(
                0.5,
                &[
                    ("atr_period", 14.0),
                    ("volume_period", 20.0),
                    ("min_tail_ratio", 0.3),
                    ("min_tail_strength", 0.35),
                    ("max_body_atr", 2.0),
                    ("min_close_pos", 0.2),
                ],
            ),
        ),
        (
            "rsi".to_string(),
            AnalyzerConfig::new(
                0.25,
                &[("period", 14.0), ("oversold", 30.0), ("overbought", 70.0)],
            ),
        ),
        (
            "macd".to_string(),
            AnalyzerConfig::new(0.25, &[("fast", 12.0), ("slow", 26.0), ("signal", 9.0)]),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.engine.validate().unwrap();
        settings.backtest.validate().unwrap();
        assert_eq!(settings.backtest.holding_periods, 14);
        assert_eq!(settings.engine.critical_analyzer, "weekly_tail");
    }

    #[test]
    fn shipped_settings_match_defaults() {
        let settings =
            Settings::from_toml_str(include_str!("../../../config/settings.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn parses_partial_file_with_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [engine]
            confidence_threshold = 0.2

            [backtest]
            holding_periods = 4
            "#,
        )
        .unwrap();
        assert_eq!(settings.engine.confidence_threshold, 0.2);
        assert_eq!(settings.backtest.holding_periods, 4);
        assert!(settings.engine.analyzer("weekly_tail").is_some());
    }

    #[test]
    fn analyzer_entry_requires_weight() {
        let err = Settings::from_toml_str(
            r#"
            [engine.analyzers.weekly_tail.thresholds]
            atr_period = 14
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        let mut cfg = EngineConfig::default();
        cfg.confidence_threshold = 1.5;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_negative_weight() {
        let mut cfg = EngineConfig::default();
        cfg.analyzers.get_mut("rsi").unwrap().weight = -0.1;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_weights_above_one() {
        let mut cfg = EngineConfig::default();
        cfg.analyzers.get_mut("weekly_tail").unwrap().weight = 0.9;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn disabled_weights_do_not_count() {
        let mut cfg = EngineConfig::default();
        cfg.analyzers.get_mut("weekly_tail").unwrap().weight = 0.9;
        cfg.analyzers.get_mut("rsi").unwrap().enabled = false;
        cfg.analyzers.get_mut("macd").unwrap().enabled = false;
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_missing_critical_analyzer() {
        let mut cfg = EngineConfig::default();
        cfg.critical_analyzer = "fibonacci".into();
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_zero_holding_period() {
        let cfg = BacktestConfig { holding_periods: 0 };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }
}
