//! Average True Range over prior candles.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! The average is a plain mean over the trailing window. It is only ever
//! computed from [`PriorCandles`], so the evaluation candle cannot leak in.

use common::{Candle, PriorCandles};

/// True range of `candle`. Without a previous close this is just high-low.
pub fn true_range(candle: &Candle, previous_close: Option<f64>) -> f64 {
    let high_low = candle.high - candle.low;
    match previous_close {
        Some(pc) => high_low
            .max((candle.high - pc).abs())
            .max((candle.low - pc).abs()),
        None => high_low,
    }
}

/// Mean true range of the last `period` prior candles.
///
/// Returns `None` when `period` is zero or fewer than `period` prior candles
/// exist. The oldest candle in the window uses the close just before it when
/// available.
pub fn average_true_range(prior: &PriorCandles<'_>, period: usize) -> Option<f64> {
    if period == 0 {
        return None;
    }
    let window = prior.trailing(period)?;
    let all = prior.as_slice();
    let offset = all.len() - period;

    let sum: f64 = window
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let previous_close = (offset + i).checked_sub(1).map(|j| all[j].close);
            true_range(candle, previous_close)
        })
        .sum();
    Some(sum / period as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use common::EvaluationWindow;

    fn make_ohlc(data: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        let base = Utc.with_ymd_and_hms(2024, 1, 7, 0, 0, 0).unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Candle {
                timestamp: base + Duration::weeks(i as i64),
                open,
                high,
                low,
                close,
                volume: 1_000.0,
            })
            .collect()
    }

    #[test]
    fn true_range_basic() {
        let c = make_ohlc(&[(102.0, 108.0, 100.0, 106.0)]);
        assert_eq!(true_range(&c[0], None), 8.0);
        assert_eq!(true_range(&c[0], Some(102.0)), 8.0);
    }

    #[test]
    fn true_range_gap_up() {
        let c = make_ohlc(&[(110.0, 115.0, 108.0, 112.0)]);
        assert_eq!(true_range(&c[0], Some(100.0)), 15.0);
    }

    #[test]
    fn atr_ignores_evaluation_candle() {
        let candles = make_ohlc(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 10
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 300.0, 1.0, 101.0),    // evaluation candle, huge range
        ]);
        let window = EvaluationWindow::new(&candles).unwrap();
        let atr = average_true_range(&window.prior(), 2).unwrap();
        assert!((atr - 8.5).abs() < 1e-12, "got {atr}");
    }

    #[test]
    fn atr_first_candle_without_previous_close() {
        let candles = make_ohlc(&[
            (100.0, 105.0, 95.0, 102.0), // TR = 10
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),
        ]);
        let window = EvaluationWindow::new(&candles).unwrap();
        let atr = average_true_range(&window.prior(), 2).unwrap();
        assert!((atr - 9.0).abs() < 1e-12, "got {atr}");
    }

    #[test]
    fn atr_needs_enough_prior_candles() {
        let candles = make_ohlc(&[(100.0, 105.0, 95.0, 102.0), (102.0, 108.0, 100.0, 106.0)]);
        let window = EvaluationWindow::new(&candles).unwrap();
        assert!(average_true_range(&window.prior(), 2).is_none());
        assert!(average_true_range(&window.prior(), 0).is_none());
    }
}
