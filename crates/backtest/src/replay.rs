//! Walk-forward replay of the decision engine over historical candles.
//!
//! One step per weekly candle, in ascending order. Each step builds a fresh
//! snapshot truncated at that candle's close and runs the same evaluator the
//! live path uses, so no result computed with a longer window is ever reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use common::{
    AnalyzerStatus, BacktestConfig, CandleSeries, DataError, DecisionResult, Result, Settings,
    Snapshot, TradeRecord,
};
use engine::{decide, Evaluator};

use crate::stats::Summary;
use crate::trade::OpenTrade;

/// A step at which no decision was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedStep {
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// The decision taken at one evaluated step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDecision {
    pub timestamp: DateTime<Utc>,
    pub decision: DecisionResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub summary: Summary,
    pub trades: Vec<TradeRecord>,
    /// Trade still inside its holding horizon when the data ran out.
    pub open_trade: Option<OpenTrade>,
    pub skipped: Vec<SkippedStep>,
    pub decisions: Vec<StepDecision>,
    pub steps_evaluated: usize,
    /// LONG decisions, including those ignored while a trade was open.
    pub long_decisions: usize,
}

pub struct Backtester {
    evaluator: Evaluator,
    config: BacktestConfig,
}

impl Backtester {
    pub fn new(evaluator: Evaluator, config: BacktestConfig) -> Self {
        Self { evaluator, config }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.backtest.validate()?;
        let evaluator = Evaluator::from_config(settings.engine.clone())?;
        Ok(Self::new(evaluator, settings.backtest.clone()))
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Replay every weekly step. Never fails: bad steps are skipped and
    /// reported.
    pub fn run(&self, daily: &CandleSeries, weekly: &CandleSeries) -> BacktestReport {
        let required = self.evaluator.required_history();
        let holding = self.config.holding_periods;
        let critical = self.evaluator.registry().critical();

        info!(
            steps = weekly.len(),
            required_history = required,
            holding_periods = holding,
            "Starting replay"
        );

        let mut trades = Vec::new();
        let mut open: Option<OpenTrade> = None;
        let mut skipped = Vec::new();
        let mut decisions = Vec::new();
        let mut long_decisions = 0;

        for (index, candle) in weekly.candles().iter().enumerate() {
            let t = candle.timestamp;

            if let Err(e) = candle.validate() {
                warn!(timestamp = %t, error = %e, "Skipping step with invalid candle");
                skipped.push(SkippedStep {
                    timestamp: t,
                    reason: e.to_string(),
                });
                continue;
            }

            let visible = index + 1;
            if visible < required {
                let reason = DataError::InsufficientHistory {
                    needed: required,
                    available: visible,
                };
                debug!(timestamp = %t, "Warm-up step skipped");
                skipped.push(SkippedStep {
                    timestamp: t,
                    reason: reason.to_string(),
                });
            } else {
                let context = self.evaluator.context(Snapshot::as_of(daily, weekly, t));
                let decision = decide(&context);
                let disabled = context
                    .results()
                    .iter()
                    .find(|r| r.analyzer == critical && r.status == AnalyzerStatus::Disabled);

                if let Some(result) = disabled {
                    warn!(timestamp = %t, reason = %result.reason, "Skipping step without usable data");
                    skipped.push(SkippedStep {
                        timestamp: t,
                        reason: result.reason.clone(),
                    });
                } else {
                    if decision.is_long() {
                        long_decisions += 1;
                        if open.is_none() {
                            let trade = OpenTrade::open(index, candle, decision.confidence, holding);
                            debug!(
                                timestamp = %t,
                                entry = trade.entry_price,
                                confidence = trade.confidence,
                                "Trade opened"
                            );
                            open = Some(trade);
                        }
                    }
                    decisions.push(StepDecision {
                        timestamp: t,
                        decision,
                    });
                }
            }

            if !open.as_ref().is_some_and(|trade| trade.is_due(index)) {
                continue;
            }
            if let Some(trade) = open.take() {
                let record = trade.close(candle);
                debug!(
                    timestamp = %t,
                    exit = record.exit_price,
                    pnl_pct = record.pnl_pct,
                    "Trade closed"
                );
                trades.push(record);
            }
        }

        let summary = Summary::from_trades(&trades);
        info!(
            trades = summary.total_signals,
            accuracy = summary.accuracy,
            skipped = skipped.len(),
            "Replay complete"
        );

        BacktestReport {
            summary,
            trades,
            open_trade: open,
            skipped,
            steps_evaluated: decisions.len(),
            decisions,
            long_decisions,
        }
    }
}
