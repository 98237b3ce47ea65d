use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::DataError;

/// Bucket size of a candle series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Daily,
    Weekly,
}

impl Timeframe {
    /// Nominal distance between two consecutive candle timestamps.
    pub fn period(&self) -> Duration {
        match self {
            Timeframe::Daily => Duration::days(1),
            Timeframe::Weekly => Duration::weeks(1),
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timeframe::Daily => write!(f, "daily"),
            Timeframe::Weekly => write!(f, "weekly"),
        }
    }
}

/// One OHLCV observation.
///
/// `timestamp` is the instant the candle became final (bucket close), so a
/// candle is visible "as of t" exactly when `timestamp <= t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Check price sanity: finite positive prices, a consistent high/low
    /// envelope and a non-negative volume.
    pub fn validate(&self) -> Result<(), DataError> {
        let invalid = |reason: &str| DataError::InvalidCandle {
            timestamp: self.timestamp,
            reason: reason.to_string(),
        };

        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) || !self.volume.is_finite() {
            return Err(invalid("non-finite value"));
        }
        if prices.iter().any(|&p| p <= 0.0) {
            return Err(invalid("zero or negative price"));
        }
        if self.volume < 0.0 {
            return Err(invalid("negative volume"));
        }
        if self.high < self.low
            || self.high < self.open.max(self.close)
            || self.low > self.open.min(self.close)
        {
            return Err(invalid("high/low envelope does not contain open/close"));
        }
        Ok(())
    }
}

/// Health of an analyzer at one evaluation point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalyzerStatus {
    Ok,
    Degraded,
    Disabled,
    Error,
}

impl std::fmt::Display for AnalyzerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyzerStatus::Ok => write!(f, "OK"),
            AnalyzerStatus::Degraded => write!(f, "DEGRADED"),
            AnalyzerStatus::Disabled => write!(f, "DISABLED"),
            AnalyzerStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Semantic reading of an analyzer, independent of its health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalyzerState {
    Long,
    Short,
    Hold,
    Up,
    Down,
    Neutral,
}

impl std::fmt::Display for AnalyzerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyzerState::Long => write!(f, "LONG"),
            AnalyzerState::Short => write!(f, "SHORT"),
            AnalyzerState::Hold => write!(f, "HOLD"),
            AnalyzerState::Up => write!(f, "UP"),
            AnalyzerState::Down => write!(f, "DOWN"),
            AnalyzerState::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// The one shape every analyzer emits for an evaluation point.
///
/// Invariant: `status != Ok` implies `contribution == 0` and
/// `state == Neutral`. The constructors uphold it; results arriving from
/// elsewhere go through [`AnalyzerResult::normalized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerResult {
    /// Registered analyzer name, e.g. `"weekly_tail"`.
    pub analyzer: String,
    pub status: AnalyzerStatus,
    pub state: AnalyzerState,
    /// Raw strength of the reading, in [0, 1].
    pub score: f64,
    /// `score` multiplied by the analyzer's configured weight, in [0, 1].
    pub contribution: f64,
    pub reason: String,
    /// Intermediate values kept for diagnostics. Ordered for stable output.
    #[serde(default)]
    pub metadata: BTreeMap<String, f64>,
}

impl AnalyzerResult {
    /// A healthy reading.
    pub fn ok(
        analyzer: impl Into<String>,
        state: AnalyzerState,
        score: f64,
        contribution: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            analyzer: analyzer.into(),
            status: AnalyzerStatus::Ok,
            state,
            score,
            contribution,
            reason: reason.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// An unhealthy result: neutral and contributing nothing.
    pub fn unhealthy(
        analyzer: impl Into<String>,
        status: AnalyzerStatus,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            analyzer: analyzer.into(),
            status,
            state: AnalyzerState::Neutral,
            score: 0.0,
            contribution: 0.0,
            reason: reason.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn disabled(analyzer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::unhealthy(analyzer, AnalyzerStatus::Disabled, reason)
    }

    pub fn error(analyzer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::unhealthy(analyzer, AnalyzerStatus::Error, reason)
    }

    pub fn with_metadata(mut self, key: &str, value: f64) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status == AnalyzerStatus::Ok
    }

    /// Enforce the contract on a result of unknown provenance.
    ///
    /// Unhealthy results are forced neutral with zero contribution. A healthy
    /// result whose score or contribution is non-finite or outside [0, 1] is
    /// malformed and becomes `Error`.
    pub fn normalized(mut self) -> Self {
        if self.status == AnalyzerStatus::Ok {
            let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
            if !in_unit(self.score) || !in_unit(self.contribution) {
                self.reason = format!(
                    "malformed result (score={}, contribution={}): {}",
                    self.score, self.contribution, self.reason
                );
                self.status = AnalyzerStatus::Error;
            }
        }
        if self.status != AnalyzerStatus::Ok {
            self.state = AnalyzerState::Neutral;
            self.contribution = 0.0;
            if !self.score.is_finite() {
                self.score = 0.0;
            }
        }
        self
    }
}

/// Final trading signal. The system only ever goes long or stays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Long,
    Hold,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Long => write!(f, "LONG"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

/// Output of the decision engine for one evaluation point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub signal: Signal,
    /// Sum of healthy contributions, clamped to [0, 1].
    pub confidence: f64,
    /// Justifications ordered by descending contribution.
    pub reasons: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, f64>,
}

impl DecisionResult {
    pub fn hold(reason: impl Into<String>) -> Self {
        Self {
            signal: Signal::Hold,
            confidence: 0.0,
            reasons: vec![reason.into()],
            metadata: BTreeMap::new(),
        }
    }

    pub fn is_long(&self) -> bool {
        self.signal == Signal::Long
    }
}

/// A closed simulated trade. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub entry_timestamp: DateTime<Utc>,
    pub entry_price: f64,
    /// Decision confidence at entry.
    pub confidence: f64,
    pub holding_periods: usize,
    pub exit_timestamp: DateTime<Utc>,
    pub exit_price: f64,
    /// `(exit - entry) / entry`.
    pub pnl_pct: f64,
    pub success: bool,
}
