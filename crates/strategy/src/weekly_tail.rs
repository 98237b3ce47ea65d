//! Weekly lower-tail reversal detector.
//!
//! Looks for a bullish weekly candle with a long lower wick, measured against
//! recent volatility (ATR) and confirmed by volume. Both references are taken
//! from candles strictly before the evaluation candle, so the strength score
//! stays comparable across volatility regimes without peeking at itself.

use serde::{Deserialize, Serialize};

use common::{
    AnalyzerConfig, AnalyzerResult, AnalyzerState, Candle, DataError, Error, EvaluationWindow,
    Result, Snapshot,
};

use crate::indicators::{average_true_range, average_volume};
use crate::registry::{param_f64, param_period};
use crate::Analyzer;

pub const NAME: &str = "weekly_tail";

/// Floor applied to the volatility and volume references.
const EPSILON: f64 = 1e-9;

/// Tail strength that maps to a full score of 1.0.
const SCORE_SCALE: f64 = 5.0;

/// Tunable inputs of the weekly-tail analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTailParams {
    pub weight: f64,
    pub atr_period: usize,
    pub volume_period: usize,
    pub min_tail_ratio: f64,
    pub min_tail_strength: f64,
    pub max_body_atr: f64,
    pub min_close_pos: f64,
}

impl Default for WeeklyTailParams {
    fn default() -> Self {
        Self {
            weight: 0.5,
            atr_period: 14,
            volume_period: 20,
            min_tail_ratio: 0.3,
            min_tail_strength: 0.35,
            max_body_atr: 2.0,
            min_close_pos: 0.2,
        }
    }
}

impl WeeklyTailParams {
    /// Read every threshold from the analyzer's configuration entry. Missing
    /// or out-of-range values are configuration errors.
    pub fn from_config(cfg: &AnalyzerConfig) -> Result<Self> {
        let params = Self {
            weight: cfg.weight,
            atr_period: param_period(NAME, cfg, "atr_period")?,
            volume_period: param_period(NAME, cfg, "volume_period")?,
            min_tail_ratio: param_f64(NAME, cfg, "min_tail_ratio")?,
            min_tail_strength: param_f64(NAME, cfg, "min_tail_strength")?,
            max_body_atr: param_f64(NAME, cfg, "max_body_atr")?,
            min_close_pos: param_f64(NAME, cfg, "min_close_pos")?,
        };
        if params.min_close_pos > 1.0 {
            return Err(Error::Config(format!(
                "{NAME}: min_close_pos must be within [0, 1], got {}",
                params.min_close_pos
            )));
        }
        Ok(params)
    }
}

/// Intermediate measurements for one evaluation candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TailMetrics {
    pub body: f64,
    pub lower_wick: f64,
    pub upper_wick: f64,
    pub atr: f64,
    pub volume_reference: f64,
    pub tail_ratio: f64,
    pub body_atr: f64,
    pub body_factor: f64,
    pub volume_factor: f64,
    pub tail_strength: f64,
    pub close_position: f64,
}

impl TailMetrics {
    /// `min(tail_strength / 5, 1)`.
    pub fn score(&self) -> f64 {
        (self.tail_strength / SCORE_SCALE).clamp(0.0, 1.0)
    }
}

pub struct WeeklyTailAnalyzer {
    params: WeeklyTailParams,
}

impl WeeklyTailAnalyzer {
    pub fn new(params: WeeklyTailParams) -> Self {
        Self { params }
    }

    /// Measure the evaluation candle of `window` against its prior candles.
    ///
    /// Fails with a data error when the window is too short or contains an
    /// invalid candle, and with an analysis error when the arithmetic does not
    /// produce finite numbers.
    pub fn measure(&self, window: &EvaluationWindow<'_>) -> Result<TailMetrics> {
        let needed = self.required_history();
        if window.len() < needed {
            return Err(DataError::InsufficientHistory {
                needed,
                available: window.len(),
            }
            .into());
        }
        // The oldest ATR candle also reads the close just before it.
        let lookback = self.params.atr_period.max(self.params.volume_period);
        let checked = window.len().saturating_sub(lookback + 2);
        for candle in &window.as_slice()[checked..] {
            candle.validate()?;
        }

        let candle = window.current();
        let prior = window.prior();
        let atr = average_true_range(&prior, self.params.atr_period)
            .ok_or_else(|| Error::Analysis("ATR window unavailable".into()))?
            .max(EPSILON);
        let volume_reference = average_volume(&prior, self.params.volume_period)
            .ok_or_else(|| Error::Analysis("volume window unavailable".into()))?
            .max(EPSILON);

        let body = candle.body();
        let lower_wick = candle.lower_wick();
        let upper_wick = candle.upper_wick();

        let tail_ratio = lower_wick / atr;
        let body_atr = body / atr;
        let body_factor = 1.0 - 0.5 * body_atr.min(1.0);
        let volume_factor = (candle.volume / volume_reference).clamp(0.5, 2.0);
        let tail_strength = tail_ratio * body_factor * volume_factor;

        let range = candle.range();
        let close_position = if range > EPSILON {
            (candle.close - candle.low) / range
        } else {
            0.0
        };

        let metrics = TailMetrics {
            body,
            lower_wick,
            upper_wick,
            atr,
            volume_reference,
            tail_ratio,
            body_atr,
            body_factor,
            volume_factor,
            tail_strength,
            close_position,
        };

        let values = [tail_ratio, body_atr, volume_factor, tail_strength, close_position];
        if values.iter().any(|v| !v.is_finite()) || tail_strength < 0.0 {
            return Err(Error::Analysis(format!(
                "degenerate tail metrics at {}: {metrics:?}",
                candle.timestamp
            )));
        }
        Ok(metrics)
    }

    /// Names of the validation gates `candle` fails. Empty means LONG.
    pub fn failed_gates(&self, candle: &Candle, m: &TailMetrics) -> Vec<&'static str> {
        let p = &self.params;
        let mut failed = Vec::new();
        if m.tail_ratio < p.min_tail_ratio {
            failed.push("tail_ratio");
        }
        if m.tail_strength < p.min_tail_strength {
            failed.push("tail_strength");
        }
        if m.body_atr > p.max_body_atr {
            failed.push("body_atr");
        }
        if m.close_position < p.min_close_pos {
            failed.push("close_position");
        }
        if !candle.is_bullish() {
            failed.push("bullish");
        }
        if m.lower_wick <= m.upper_wick {
            failed.push("lower_wick_dominant");
        }
        failed
    }

    /// Full evaluation of one window.
    pub fn evaluate_window(&self, window: &EvaluationWindow<'_>) -> AnalyzerResult {
        let metrics = match self.measure(window) {
            Ok(m) => m,
            Err(Error::Data(e)) => return AnalyzerResult::disabled(NAME, e.to_string()),
            Err(e) => return AnalyzerResult::error(NAME, e.to_string()),
        };

        let candle = window.current();
        let score = metrics.score();
        let failed = self.failed_gates(candle, &metrics);

        let result = if failed.is_empty() {
            AnalyzerResult::ok(
                NAME,
                AnalyzerState::Long,
                score,
                (score * self.params.weight).clamp(0.0, 1.0),
                format!(
                    "weekly tail: ratio {:.2} ATR, strength {:.2}, close at {:.0}% of range",
                    metrics.tail_ratio,
                    metrics.tail_strength,
                    metrics.close_position * 100.0
                ),
            )
        } else {
            AnalyzerResult::ok(
                NAME,
                AnalyzerState::Hold,
                score,
                0.0,
                format!("weekly tail gates failed: {}", failed.join(", ")),
            )
        };

        result
            .with_metadata("atr", metrics.atr)
            .with_metadata("body_atr", metrics.body_atr)
            .with_metadata("body_factor", metrics.body_factor)
            .with_metadata("close_position", metrics.close_position)
            .with_metadata("tail_ratio", metrics.tail_ratio)
            .with_metadata("tail_strength", metrics.tail_strength)
            .with_metadata("volume_factor", metrics.volume_factor)
            .with_metadata("volume_reference", metrics.volume_reference)
    }
}

impl Analyzer for WeeklyTailAnalyzer {
    fn name(&self) -> &str {
        NAME
    }

    fn required_history(&self) -> usize {
        self.params.atr_period.max(self.params.volume_period) + 1
    }

    fn analyze(&self, snapshot: &Snapshot<'_>) -> AnalyzerResult {
        match snapshot.weekly_window() {
            Some(window) => self.evaluate_window(&window),
            None => AnalyzerResult::disabled(NAME, "no weekly candles visible"),
        }
    }
}
