use tracing::{debug, info};

use common::{
    AnalyzerConfig, AnalyzerResult, AnalyzerState, EngineConfig, Error, Result, Snapshot,
};

use crate::indicators::{macd, rsi};
use crate::weekly_tail::{self, WeeklyTailAnalyzer, WeeklyTailParams};
use crate::Analyzer;

/// Holds the active analyzers and runs them all against one snapshot.
pub struct AnalyzerRegistry {
    analyzers: Vec<Box<dyn Analyzer>>,
    critical: String,
}

impl AnalyzerRegistry {
    /// An empty registry gated by `critical`. Use [`register`](Self::register)
    /// to plug analyzers in.
    pub fn new(critical: impl Into<String>) -> Self {
        Self {
            analyzers: Vec::new(),
            critical: critical.into(),
        }
    }

    /// Build every enabled analyzer named in the configuration.
    ///
    /// Unknown analyzer names and missing or invalid thresholds are
    /// configuration errors.
    pub fn from_config(cfg: &EngineConfig) -> Result<Self> {
        cfg.validate()?;
        let mut registry = Self::new(cfg.critical_analyzer.clone());

        for (name, analyzer_cfg) in cfg.enabled_analyzers() {
            let analyzer = build_analyzer(name, analyzer_cfg)?;
            info!(
                name = %analyzer.name(),
                weight = analyzer_cfg.weight,
                history = analyzer.required_history(),
                "Registered analyzer"
            );
            registry.register(analyzer);
        }

        Ok(registry)
    }

    pub fn register(&mut self, analyzer: Box<dyn Analyzer>) {
        self.analyzers.push(analyzer);
    }

    pub fn critical(&self) -> &str {
        &self.critical
    }

    pub fn names(&self) -> Vec<&str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Weekly candles the critical analyzer needs before its reading can be
    /// healthy. `1` if the critical analyzer is not registered.
    pub fn required_history(&self) -> usize {
        self.analyzers
            .iter()
            .find(|a| a.name() == self.critical)
            .map(|a| a.required_history())
            .unwrap_or(1)
    }

    /// Run every analyzer against the same snapshot, in registration order.
    ///
    /// Each result is stamped with its analyzer's name and normalised, so no
    /// unhealthy reading can carry a contribution past this point.
    pub fn analyze_all(&self, snapshot: &Snapshot<'_>) -> Vec<AnalyzerResult> {
        self.analyzers
            .iter()
            .map(|analyzer| {
                let mut result = analyzer.analyze(snapshot);
                result.analyzer = analyzer.name().to_string();
                let result = result.normalized();
                debug!(
                    analyzer = %result.analyzer,
                    status = %result.status,
                    state = %result.state,
                    contribution = result.contribution,
                    "Analyzer evaluated"
                );
                result
            })
            .collect()
    }
}

// ─── Analyzer builders ────────────────────────────────────────────────────────

fn build_analyzer(name: &str, cfg: &AnalyzerConfig) -> Result<Box<dyn Analyzer>> {
    match name {
        weekly_tail::NAME => Ok(Box::new(WeeklyTailAnalyzer::new(
            WeeklyTailParams::from_config(cfg)?,
        ))),
        RSI => {
            let period = param_period(RSI, cfg, "period")?;
            let oversold = param_f64(RSI, cfg, "oversold")?;
            let overbought = param_f64(RSI, cfg, "overbought")?;
            if !(oversold < 50.0 && 50.0 < overbought && overbought <= 100.0) || period < 2 {
                return Err(Error::Config(format!(
                    "{RSI}: need period >= 2 and oversold < 50 < overbought <= 100, \
                     got period={period} oversold={oversold} overbought={overbought}"
                )));
            }
            Ok(Box::new(RsiAnalyzer {
                weight: cfg.weight,
                period,
                oversold,
                overbought,
            }))
        }
        MACD => {
            let fast = param_period(MACD, cfg, "fast")?;
            let slow = param_period(MACD, cfg, "slow")?;
            let signal = param_period(MACD, cfg, "signal")?;
            if fast >= slow {
                return Err(Error::Config(format!(
                    "{MACD}: fast period ({fast}) must be less than slow period ({slow})"
                )));
            }
            Ok(Box::new(MacdAnalyzer {
                weight: cfg.weight,
                fast,
                slow,
                signal,
            }))
        }
        other => Err(Error::Config(format!("unknown analyzer '{other}'"))),
    }
}

/// A required non-negative finite threshold.
pub(crate) fn param_f64(analyzer: &str, cfg: &AnalyzerConfig, key: &str) -> Result<f64> {
    let value = cfg.threshold(key).ok_or_else(|| {
        Error::Config(format!("{analyzer}: missing threshold '{key}'"))
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Config(format!(
            "{analyzer}: threshold '{key}' must be a non-negative number, got {value}"
        )));
    }
    Ok(value)
}

/// Upper bound on any lookback period, in candles.
pub(crate) const MAX_PERIOD: usize = 100_000;

/// A required whole-number period in `1..=MAX_PERIOD`.
pub(crate) fn param_period(analyzer: &str, cfg: &AnalyzerConfig, key: &str) -> Result<usize> {
    let value = param_f64(analyzer, cfg, key)?;
    if value < 1.0 || value > MAX_PERIOD as f64 || value.fract() != 0.0 {
        return Err(Error::Config(format!(
            "{analyzer}: '{key}' must be a whole number in 1..={MAX_PERIOD}, got {value}"
        )));
    }
    Ok(value as usize)
}

// ─── Supporting analyzers ─────────────────────────────────────────────────────

const RSI: &str = "rsi";
const MACD: &str = "macd";

/// Daily RSI. Scores how oversold the market is: 1.0 at the oversold line,
/// 0.0 at 50 and above.
struct RsiAnalyzer {
    weight: f64,
    period: usize,
    oversold: f64,
    overbought: f64,
}

impl Analyzer for RsiAnalyzer {
    fn name(&self) -> &str {
        RSI
    }

    fn required_history(&self) -> usize {
        self.period + 1
    }

    fn analyze(&self, snapshot: &Snapshot<'_>) -> AnalyzerResult {
        let closes: Vec<f64> = snapshot.daily().iter().map(|c| c.close).collect();
        let Some(value) = rsi(&closes, self.period) else {
            return AnalyzerResult::disabled(
                RSI,
                format!("need {} daily closes, have {}", self.period + 1, closes.len()),
            );
        };
        if !value.is_finite() {
            return AnalyzerResult::error(RSI, format!("non-finite RSI {value}"));
        }

        let state = if value <= self.oversold {
            AnalyzerState::Up
        } else if value >= self.overbought {
            AnalyzerState::Down
        } else {
            AnalyzerState::Neutral
        };
        let score = ((50.0 - value) / (50.0 - self.oversold)).clamp(0.0, 1.0);

        AnalyzerResult::ok(
            RSI,
            state,
            score,
            (score * self.weight).clamp(0.0, 1.0),
            format!("daily RSI({}) at {value:.1}", self.period),
        )
        .with_metadata("rsi", value)
    }
}

/// Weekly MACD trend confirmation. Full score on a fresh bullish crossover,
/// half while MACD stays above its signal line.
struct MacdAnalyzer {
    weight: f64,
    fast: usize,
    slow: usize,
    signal: usize,
}

impl Analyzer for MacdAnalyzer {
    fn name(&self) -> &str {
        MACD
    }

    fn required_history(&self) -> usize {
        self.slow + self.signal
    }

    fn analyze(&self, snapshot: &Snapshot<'_>) -> AnalyzerResult {
        let closes: Vec<f64> = snapshot.weekly().iter().map(|c| c.close).collect();
        let Some(reading) = macd(&closes, self.fast, self.slow, self.signal) else {
            return AnalyzerResult::disabled(
                MACD,
                format!(
                    "need {} weekly closes, have {}",
                    self.required_history(),
                    closes.len()
                ),
            );
        };
        if !reading.histogram().is_finite() {
            return AnalyzerResult::error(MACD, "non-finite MACD");
        }

        let (state, score, reason) = if reading.crossed_up() {
            (AnalyzerState::Up, 1.0, "weekly MACD bullish crossover")
        } else if reading.macd > reading.signal {
            (AnalyzerState::Up, 0.5, "weekly MACD above signal")
        } else {
            (AnalyzerState::Down, 0.0, "weekly MACD below signal")
        };

        AnalyzerResult::ok(
            MACD,
            state,
            score,
            (score * self.weight).clamp(0.0, 1.0),
            reason,
        )
        .with_metadata("macd", reading.macd)
        .with_metadata("signal", reading.signal)
        .with_metadata("histogram", reading.histogram())
    }
}
