//! Technical indicator series
//!
//! Pure functions over the closing-price series. Every function is total
//! over any input length and returns output positionally aligned with its
//! input: index `i` of the result annotates bar `i`, with `None` marking
//! indices where the window has insufficient history. No resampling or
//! interpolation is performed.

mod bollinger;
mod ema;
mod macd;
mod rsi;
mod sma;

pub use bollinger::{bollinger, BollingerSeries};
pub use ema::ema;
pub use macd::{macd, MacdSeries};
pub use rsi::rsi;
pub use sma::sma;

use crate::Period;

/// Default RSI lookback.
pub const RSI_PERIOD: Period = Period::new_const(14);
/// Default MACD fast EMA span.
pub const MACD_FAST: Period = Period::new_const(12);
/// Default MACD slow EMA span.
pub const MACD_SLOW: Period = Period::new_const(26);
/// Default MACD signal EMA span.
pub const MACD_SIGNAL: Period = Period::new_const(9);
/// Default Bollinger band lookback.
pub const BOLLINGER_PERIOD: Period = Period::new_const(20);
/// Default Bollinger band width in standard deviations.
pub const BOLLINGER_STD_DEV: f64 = 2.0;
