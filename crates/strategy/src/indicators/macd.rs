/// MACD (Moving Average Convergence/Divergence).
///
/// MACD line = EMA(fast) − EMA(slow); signal line = EMA(MACD line, signal).
/// EMAs are seeded with the SMA of their first `period` inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdReading {
    pub macd: f64,
    pub signal: f64,
    pub previous_macd: f64,
    pub previous_signal: f64,
}

impl MacdReading {
    pub fn histogram(&self) -> f64 {
        self.macd - self.signal
    }

    /// MACD crossed above its signal line on the latest value.
    pub fn crossed_up(&self) -> bool {
        self.previous_macd <= self.previous_signal && self.macd > self.signal
    }
}

/// Compute the latest MACD reading from close prices (oldest first).
///
/// Needs at least `slow + signal` prices so that two signal-line values exist.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdReading> {
    if fast == 0 || signal == 0 || fast >= slow || closes.len() < slow + signal {
        return None;
    }

    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);

    // Both EMAs exist from index slow-1 onward.
    let macd_line: Vec<f64> = (slow - 1..closes.len())
        .map(|i| fast_ema[i - (fast - 1)] - slow_ema[i - (slow - 1)])
        .collect();
    let signal_line = ema_series(&macd_line, signal);

    let (&macd, &signal_now) = (macd_line.last()?, signal_line.last()?);
    let previous_macd = *macd_line.get(macd_line.len().checked_sub(2)?)?;
    let previous_signal = *signal_line.get(signal_line.len().checked_sub(2)?)?;

    Some(MacdReading {
        macd,
        signal: signal_now,
        previous_macd,
        previous_signal,
    })
}

/// EMA values starting at index `period - 1` of `data`.
fn ema_series(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let seed = data[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(data.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for &value in &data[period..] {
        prev = value * k + prev * (1.0 - k);
        out.push(prev);
    }
    out
}
