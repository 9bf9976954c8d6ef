//! Relative Strength Index (RSI)
//!
//! Bounded momentum oscillator over per-bar close deltas:
//!
//! ```text
//! RS  = avg gain / avg loss      (simple averages over the window)
//! RSI = 100 - 100 / (1 + RS)
//! ```
//!
//! A window with zero average loss reports 50 (neutral) instead of pinning
//! to 100 or dividing by zero.

use crate::{Candle, Period};

/// RSI over the close series, windowed by simple averages of the per-bar
/// gains and losses.
///
/// Output has the same length as the input; the first `period` entries are
/// `None` (a window needs `period` deltas, i.e. `period + 1` bars). See
/// [`crate::indicators::RSI_PERIOD`] for the conventional lookback.
pub fn rsi(candles: &[Candle], period: Period) -> Vec<Option<f64>> {
    let period = period.get();
    let n = candles.len();
    let mut result = vec![None; n];
    if n <= period {
        return result;
    }

    let period_f64 = period as f64;

    for i in period..n {
        let window = &candles[i - period..=i];
        let mut gain = 0.0;
        let mut loss = 0.0;
        let mut degraded = false;

        for pair in window.windows(2) {
            let delta = pair[1].close - pair[0].close;
            if !delta.is_finite() {
                degraded = true;
                break;
            }
            if delta > 0.0 {
                gain += delta;
            } else {
                loss -= delta;
            }
        }
        if degraded {
            continue;
        }

        let avg_gain = gain / period_f64;
        let avg_loss = loss / period_f64;

        result[i] = Some(if avg_loss == 0.0 {
            50.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        });
    }

    result
}
