//! Moving Average Convergence Divergence (MACD)
//!
//! - MACD line: `EMA(close, fast) - EMA(close, slow)`
//! - Signal line: EMA of the MACD line's valid portion, re-aligned to the
//!   input length
//! - Histogram: `MACD - signal`, with the sign exposed for renderers

use crate::{indicators::ema, Candle, Direction, Period, Result, SignalError};

/// MACD output: three series, all positionally aligned with the input bars.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

impl MacdSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.macd.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }

    /// Up/down flag for the histogram bar at `index` (renderer color hint).
    /// `None` where the histogram has no value yet.
    pub fn histogram_direction(&self, index: usize) -> Option<Direction> {
        self.histogram.get(index).copied().flatten().map(|h| {
            if h >= 0.0 {
                Direction::Bullish
            } else {
                Direction::Bearish
            }
        })
    }
}

/// MACD over the close series.
///
/// Errors with [`SignalError::InvalidConfig`] when `fast >= slow`; total
/// over any input length otherwise. See [`crate::indicators::MACD_FAST`],
/// [`crate::indicators::MACD_SLOW`] and [`crate::indicators::MACD_SIGNAL`]
/// for the conventional 12/26/9 spans.
pub fn macd(
    candles: &[Candle],
    fast: Period,
    slow: Period,
    signal: Period,
) -> Result<MacdSeries> {
    if fast >= slow {
        return Err(SignalError::InvalidConfig(format!(
            "fast period ({}) must be less than slow period ({})",
            fast.get(),
            slow.get()
        )));
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let n = closes.len();

    let fast_ema = ema(&closes, fast);
    let slow_ema = ema(&closes, slow);

    let mut macd_line = vec![None; n];
    for i in 0..n {
        if let (Some(f), Some(s)) = (fast_ema[i], slow_ema[i]) {
            macd_line[i] = Some(f - s);
        }
    }

    // Signal line runs over the valid portion of the MACD line and is
    // left-padded back to the input length.
    let mut signal_line = vec![None; n];
    if let Some(offset) = macd_line.iter().position(Option::is_some) {
        let valid: Vec<f64> = macd_line[offset..]
            .iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        for (i, v) in ema(&valid, signal).into_iter().enumerate() {
            signal_line[offset + i] = v;
        }
    }

    let mut histogram = vec![None; n];
    for i in 0..n {
        if let (Some(m), Some(s)) = (macd_line[i], signal_line[i]) {
            histogram[i] = Some(m - s);
        }
    }

    Ok(MacdSeries {
        macd: macd_line,
        signal: signal_line,
        histogram,
    })
}
