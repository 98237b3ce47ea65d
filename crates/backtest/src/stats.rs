use serde::{Deserialize, Serialize};

use common::TradeRecord;

/// Aggregate performance of one replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Closed trades.
    pub total_signals: usize,
    pub successes: usize,
    /// `successes / total_signals`, or 0 without trades.
    pub accuracy: f64,
    pub average_pnl_pct: f64,
    /// Largest peak-to-trough decline of compounded trade outcomes, as a
    /// positive fraction.
    pub max_drawdown_pct: f64,
}

impl Summary {
    pub fn from_trades(trades: &[TradeRecord]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }
        let total = trades.len();
        let successes = trades.iter().filter(|t| t.success).count();
        let average_pnl_pct = trades.iter().map(|t| t.pnl_pct).sum::<f64>() / total as f64;
        Self {
            total_signals: total,
            successes,
            accuracy: successes as f64 / total as f64,
            average_pnl_pct,
            max_drawdown_pct: max_drawdown(&equity_curve(trades)),
        }
    }
}

/// Equity after each trade, compounding from 1.0. The first point is the
/// starting equity.
pub fn equity_curve(trades: &[TradeRecord]) -> Vec<f64> {
    let mut equity = 1.0;
    let mut curve = Vec::with_capacity(trades.len() + 1);
    curve.push(equity);
    for trade in trades {
        equity *= 1.0 + trade.pnl_pct;
        curve.push(equity);
    }
    curve
}

/// Maximum drawdown as a positive fraction of the running peak.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - eq) / peak);
        }
    }
    max_dd
}
