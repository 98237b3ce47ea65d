pub mod atr;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::{average_true_range, true_range};
pub use macd::{macd, MacdReading};
pub use rsi::rsi;
pub use sma::{average_volume, sma};
