pub mod indicators;
pub mod registry;
pub mod weekly_tail;

pub use registry::AnalyzerRegistry;
pub use weekly_tail::{TailMetrics, WeeklyTailAnalyzer, WeeklyTailParams};

use common::{AnalyzerResult, Snapshot};

/// All analyzer implementations must satisfy this trait.
///
/// This is the plug-in boundary: the decision engine only ever sees the
/// [`AnalyzerResult`] an analyzer returns, never its internals.
pub trait Analyzer: Send + Sync {
    /// Registered name, matching the key of its configuration entry.
    fn name(&self) -> &str;

    /// Candles (including the evaluation candle) needed in the analyzer's own
    /// timeframe before it can report a healthy reading.
    fn required_history(&self) -> usize;

    /// Read the market as of `snapshot`.
    ///
    /// Must not fail past this boundary: every problem is reported as a
    /// non-`Ok` status inside the returned result.
    fn analyze(&self, snapshot: &Snapshot<'_>) -> AnalyzerResult;
}
