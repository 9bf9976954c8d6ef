//! Exponential Moving Average (EMA)
//!
//! Seeded by the SMA of the first `period` values, then:
//!
//! ```text
//! EMA_t = (P_t - EMA_{t-1}) * (2 / (period + 1)) + EMA_{t-1}
//! ```

use crate::Period;

/// Exponential moving average, SMA-seeded at index `period - 1`.
///
/// Output has the same length as the input; the first `period - 1` entries
/// are `None`. Non-finite input poisons the running average, which shows up
/// as `None` until the input itself recovers the seed (degradation, not a
/// panic).
pub fn ema(values: &[f64], period: Period) -> Vec<Option<f64>> {
    let period = period.get();
    let n = values.len();
    let mut result = vec![None; n];
    if n < period {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = values[..period].iter().sum::<f64>() / period as f64;
    if prev.is_finite() {
        result[period - 1] = Some(prev);
    }

    for i in period..n {
        prev = (values[i] - prev) * alpha + prev;
        if prev.is_finite() {
            result[i] = Some(prev);
        }
    }

    result
}
