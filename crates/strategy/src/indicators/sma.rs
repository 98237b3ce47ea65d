use common::PriorCandles;

/// Arithmetic mean. `None` for an empty slice.
pub fn sma(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean volume of the last `period` prior candles.
pub fn average_volume(prior: &PriorCandles<'_>, period: usize) -> Option<f64> {
    if period == 0 {
        return None;
    }
    let volumes: Vec<f64> = prior.trailing(period)?.iter().map(|c| c.volume).collect();
    sma(&volumes)
}
