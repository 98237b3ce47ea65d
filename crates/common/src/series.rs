use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Candle, DataError, Timeframe};

/// An ordered candle series that satisfies the ingestion contract: non-empty,
/// strictly ascending timestamps and no gap longer than one timeframe period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    timeframe: Timeframe,
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(timeframe: Timeframe, candles: Vec<Candle>) -> Result<Self, DataError> {
        if candles.is_empty() {
            return Err(DataError::Empty);
        }
        let period = timeframe.period();
        for pair in candles.windows(2) {
            let (previous, next) = (pair[0].timestamp, pair[1].timestamp);
            if next <= previous {
                return Err(DataError::NonMonotonic { previous, next });
            }
            if next - previous > period {
                return Err(DataError::Gap {
                    timeframe,
                    after: previous,
                    before: next,
                });
            }
        }
        Ok(Self { timeframe, candles })
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Every candle visible as of `t`, i.e. with `timestamp <= t`.
    pub fn as_of(&self, t: DateTime<Utc>) -> &[Candle] {
        let end = self.candles.partition_point(|c| c.timestamp <= t);
        &self.candles[..end]
    }
}

/// A view ending at the candle under evaluation.
///
/// Trailing statistics are taken from [`EvaluationWindow::prior`], which never
/// includes the evaluation candle itself.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationWindow<'a> {
    candles: &'a [Candle],
}

impl<'a> EvaluationWindow<'a> {
    /// Returns `None` for an empty slice.
    pub fn new(candles: &'a [Candle]) -> Option<Self> {
        if candles.is_empty() {
            None
        } else {
            Some(Self { candles })
        }
    }

    pub fn current(&self) -> &'a Candle {
        &self.candles[self.candles.len() - 1]
    }

    pub fn prior(&self) -> PriorCandles<'a> {
        PriorCandles {
            candles: &self.candles[..self.candles.len() - 1],
        }
    }

    /// Number of candles including the evaluation candle.
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn as_slice(&self) -> &'a [Candle] {
        self.candles
    }
}

/// Candles strictly before an evaluation point.
#[derive(Debug, Clone, Copy)]
pub struct PriorCandles<'a> {
    candles: &'a [Candle],
}

impl<'a> PriorCandles<'a> {
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// The most recent `n` prior candles, or `None` if fewer exist.
    pub fn trailing(&self, n: usize) -> Option<&'a [Candle]> {
        if n > self.candles.len() {
            return None;
        }
        Some(&self.candles[self.candles.len() - n..])
    }

    pub fn as_slice(&self) -> &'a [Candle] {
        self.candles
    }
}

/// The market as visible at one instant: daily and weekly candles with
/// `timestamp <= as_of`, truncated independently.
///
/// Every constructor truncates, so a snapshot can never expose a candle from
/// after its own timestamp.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    as_of: DateTime<Utc>,
    daily: &'a [Candle],
    weekly: &'a [Candle],
}

impl<'a> Snapshot<'a> {
    /// Truncate ascending candle slices to `as_of`.
    pub fn new(as_of: DateTime<Utc>, daily: &'a [Candle], weekly: &'a [Candle]) -> Self {
        let visible = |candles: &'a [Candle]| {
            let end = candles.partition_point(|c| c.timestamp <= as_of);
            &candles[..end]
        };
        Self {
            as_of,
            daily: visible(daily),
            weekly: visible(weekly),
        }
    }

    pub fn as_of(daily: &'a CandleSeries, weekly: &'a CandleSeries, t: DateTime<Utc>) -> Self {
        Self {
            as_of: t,
            daily: daily.as_of(t),
            weekly: weekly.as_of(t),
        }
    }

    /// Snapshot at the latest weekly close.
    pub fn latest(daily: &'a CandleSeries, weekly: &'a CandleSeries) -> Option<Self> {
        weekly.last().map(|c| Self::as_of(daily, weekly, c.timestamp))
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.as_of
    }

    pub fn daily(&self) -> &'a [Candle] {
        self.daily
    }

    pub fn weekly(&self) -> &'a [Candle] {
        self.weekly
    }

    pub fn weekly_window(&self) -> Option<EvaluationWindow<'a>> {
        EvaluationWindow::new(self.weekly)
    }
}

/// Aggregate a daily series into complete ISO weeks (Monday to Sunday, UTC).
///
/// A daily candle belongs to the week containing the last instant of its
/// bucket, so closes stamped `00:00` of the next day and closes stamped
/// `23:59:59` of the same day group identically. Partial weeks at either end
/// are dropped. The weekly timestamp is the close of the week's last daily
/// candle.
pub fn resample_weekly(daily: &CandleSeries) -> Result<CandleSeries, DataError> {
    let mut weeks: BTreeMap<(i32, u32), Vec<&Candle>> = BTreeMap::new();
    for candle in daily.candles() {
        let opened = (candle.timestamp - Duration::seconds(1)).iso_week();
        weeks
            .entry((opened.year(), opened.week()))
            .or_default()
            .push(candle);
    }

    let weekly: Vec<Candle> = weeks
        .into_values()
        .filter(|days| days.len() == 7)
        .map(|days| {
            let first = days[0];
            let last = days[days.len() - 1];
            Candle {
                timestamp: last.timestamp,
                open: first.open,
                high: days.iter().map(|c| c.high).fold(f64::MIN, f64::max),
                low: days.iter().map(|c| c.low).fold(f64::MAX, f64::min),
                close: last.close,
                volume: days.iter().map(|c| c.volume).sum(),
            }
        })
        .collect();

    CandleSeries::new(Timeframe::Weekly, weekly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(i: i64, close: f64) -> Candle {
        // 2024-01-02 00:00 closes the Monday 2024-01-01 bucket.
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::days(i);
        Candle {
            timestamp: ts,
            open: close - 1.0,
            high: close + 2.0,
            low: close - 3.0,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn series_rejects_empty() {
        assert_eq!(
            CandleSeries::new(Timeframe::Daily, vec![]),
            Err(DataError::Empty)
        );
    }

    #[test]
    fn series_rejects_non_monotonic() {
        let candles = vec![day(1, 10.0), day(0, 11.0)];
        assert!(matches!(
            CandleSeries::new(Timeframe::Daily, candles),
            Err(DataError::NonMonotonic { .. })
        ));
    }

    #[test]
    fn series_rejects_duplicate_timestamps() {
        let candles = vec![day(0, 10.0), day(0, 11.0)];
        assert!(matches!(
            CandleSeries::new(Timeframe::Daily, candles),
            Err(DataError::NonMonotonic { .. })
        ));
    }

    #[test]
    fn series_rejects_gap() {
        let candles = vec![day(0, 10.0), day(1, 11.0), day(3, 12.0)];
        assert!(matches!(
            CandleSeries::new(Timeframe::Daily, candles),
            Err(DataError::Gap { .. })
        ));
    }

    #[test]
    fn as_of_includes_candle_at_t() {
        let series =
            CandleSeries::new(Timeframe::Daily, (0..5).map(|i| day(i, 10.0)).collect()).unwrap();
        let t = series.candles()[2].timestamp;
        assert_eq!(series.as_of(t).len(), 3);
        assert_eq!(series.as_of(t - Duration::seconds(1)).len(), 2);
        assert!(series.as_of(t - Duration::days(30)).is_empty());
    }

    #[test]
    fn window_prior_excludes_current() {
        let candles: Vec<Candle> = (0..4).map(|i| day(i, 10.0 + i as f64)).collect();
        let window = EvaluationWindow::new(&candles).unwrap();
        assert_eq!(window.current().close, 13.0);
        assert_eq!(window.prior().len(), 3);
        assert_eq!(window.prior().trailing(2).unwrap()[1].close, 12.0);
        assert!(window.prior().trailing(4).is_none());
    }

    #[test]
    fn window_rejects_empty_slice() {
        assert!(EvaluationWindow::new(&[]).is_none());
    }

    #[test]
    fn resample_builds_complete_weeks_only() {
        // 17 days starting Monday 2024-01-01: two full weeks plus three days.
        let daily = CandleSeries::new(
            Timeframe::Daily,
            (0..17).map(|i| day(i, 100.0 + i as f64)).collect(),
        )
        .unwrap();
        let weekly = resample_weekly(&daily).unwrap();
        assert_eq!(weekly.len(), 2);

        let first = &weekly.candles()[0];
        assert_eq!(first.open, 99.0);
        assert_eq!(first.close, 106.0);
        assert_eq!(first.high, 108.0);
        assert_eq!(first.low, 97.0);
        assert_eq!(first.volume, 70.0);
        assert_eq!(first.timestamp, daily.candles()[6].timestamp);
    }

    #[test]
    fn resample_accepts_end_of_day_close_stamps() {
        // Same bars stamped 23:59:59 on the day they cover.
        let midnight: Vec<Candle> = (0..17).map(|i| day(i, 100.0 + i as f64)).collect();
        let end_of_day: Vec<Candle> = midnight
            .iter()
            .map(|c| Candle {
                timestamp: c.timestamp - Duration::seconds(1),
                ..c.clone()
            })
            .collect();

        let a = resample_weekly(&CandleSeries::new(Timeframe::Daily, midnight).unwrap()).unwrap();
        let b =
            resample_weekly(&CandleSeries::new(Timeframe::Daily, end_of_day).unwrap()).unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.candles().iter().zip(b.candles()) {
            assert_eq!(
                (x.open, x.high, x.low, x.close, x.volume),
                (y.open, y.high, y.low, y.close, y.volume)
            );
            assert_eq!(x.timestamp - Duration::seconds(1), y.timestamp);
        }
    }

    #[test]
    fn snapshot_truncates_both_series() {
        let daily: Vec<Candle> = (0..14).map(|i| day(i, 10.0)).collect();
        let weekly = vec![daily[6].clone(), daily[13].clone()];
        let snap = Snapshot::new(daily[6].timestamp, &daily, &weekly);
        assert_eq!(snap.daily().len(), 7);
        assert_eq!(snap.weekly().len(), 1);
        assert_eq!(snap.weekly_window().unwrap().current().timestamp, daily[6].timestamp);
    }
}
