use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{Candle, TradeRecord};

/// A simulated long position waiting for its holding horizon to elapse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenTrade {
    /// Weekly step at which the trade was opened.
    pub entry_index: usize,
    pub entry_timestamp: DateTime<Utc>,
    pub entry_price: f64,
    pub confidence: f64,
    pub holding_periods: usize,
}

impl OpenTrade {
    /// Enter at the close of the signalling candle.
    pub fn open(index: usize, candle: &Candle, confidence: f64, holding_periods: usize) -> Self {
        Self {
            entry_index: index,
            entry_timestamp: candle.timestamp,
            entry_price: candle.close,
            confidence,
            holding_periods,
        }
    }

    /// True once the clock has advanced `holding_periods` steps past entry.
    pub fn is_due(&self, index: usize) -> bool {
        index >= self.entry_index + self.holding_periods
    }

    /// Exit at the close of `candle`.
    pub fn close(self, candle: &Candle) -> TradeRecord {
        let pnl_pct = (candle.close - self.entry_price) / self.entry_price;
        TradeRecord {
            entry_timestamp: self.entry_timestamp,
            entry_price: self.entry_price,
            confidence: self.confidence,
            holding_periods: self.holding_periods,
            exit_timestamp: candle.timestamp,
            exit_price: candle.close,
            pnl_pct,
            success: pnl_pct > 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn candle(week: i64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 7, 0, 0, 0).unwrap() + Duration::weeks(week),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn due_after_horizon() {
        let trade = OpenTrade::open(5, &candle(5, 100.0), 0.2, 3);
        assert!(!trade.is_due(5));
        assert!(!trade.is_due(7));
        assert!(trade.is_due(8));
    }

    #[test]
    fn close_computes_pnl() {
        let trade = OpenTrade::open(0, &candle(0, 100.0), 0.2, 2);
        let record = trade.close(&candle(2, 110.0));
        assert!((record.pnl_pct - 0.1).abs() < 1e-12);
        assert!(record.success);
        assert_eq!(record.exit_price, 110.0);
    }

    #[test]
    fn flat_exit_is_not_a_success() {
        let trade = OpenTrade::open(0, &candle(0, 100.0), 0.2, 2);
        let record = trade.close(&candle(2, 100.0));
        assert_eq!(record.pnl_pct, 0.0);
        assert!(!record.success);
    }
}
