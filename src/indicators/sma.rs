//! Simple Moving Average (SMA)
//!
//! Unweighted mean of the trailing `period` values:
//!
//! ```text
//! SMA_t = (P_t + P_{t-1} + ... + P_{t-n+1}) / n
//! ```

use crate::Period;

/// Rolling arithmetic mean of the trailing `period` values.
///
/// Output has the same length as the input; the first `period - 1` entries
/// are `None`. A window containing a non-finite value yields `None` for that
/// index rather than propagating NaN.
pub fn sma(values: &[f64], period: Period) -> Vec<Option<f64>> {
    let period = period.get();
    let n = values.len();
    let mut result = vec![None; n];
    if n < period {
        return result;
    }

    let period_f64 = period as f64;

    let mut sum: f64 = values[..period].iter().sum();
    if sum.is_finite() {
        result[period - 1] = Some(sum / period_f64);
    }

    // Rolling sum for subsequent windows; recompute from scratch whenever a
    // non-finite value enters or leaves the window.
    for i in period..n {
        let old_val = values[i - period];
        let new_val = values[i];

        if old_val.is_finite() && new_val.is_finite() && sum.is_finite() {
            sum = sum - old_val + new_val;
            if sum.is_finite() {
                result[i] = Some(sum / period_f64);
            }
        } else {
            let window = &values[(i + 1 - period)..=i];
            sum = window.iter().sum();
            if window.iter().all(|v| v.is_finite()) {
                result[i] = Some(sum / period_f64);
            }
        }
    }

    result
}
