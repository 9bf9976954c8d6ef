//! Shared context helpers for pattern rules
//!
//! Fixed geometric thresholds plus the trailing-window context (average body
//! size, strict trend checks) every rule evaluates against.

use crate::Candle;

// ============================================================
// THRESHOLDS
// ============================================================

/// Trailing window for the average body size, in bars, including the
/// evaluated bar.
pub const AVG_BODY_PERIOD: usize = 20;
/// Number of bars immediately preceding the evaluated bar that must show
/// strictly monotonic closes for trend context.
pub const TREND_LOOKBACK: usize = 3;
/// Confidence bonus applied when a rule's optional trend context is present.
pub const TREND_BONUS: f64 = 0.15;

/// Doji: body must stay below this fraction of the bar range.
pub const DOJI_MAX_BODY_RATIO: f64 = 0.1;
/// Doji: body must stay below this fraction of the average body.
pub const DOJI_MAX_BODY_VS_AVG: f64 = 0.2;
/// Doji sub-typing: a wick covering this fraction of the range dominates.
pub const DOJI_DOMINANT_WICK_RATIO: f64 = 0.6;
/// Doji sub-typing: a wick under this fraction of the range is negligible.
pub const DOJI_MINOR_WICK_RATIO: f64 = 0.1;
/// Doji sub-typing: both wicks above this fraction make the doji long-legged.
pub const DOJI_LONG_LEG_RATIO: f64 = 0.3;

/// Hammer family: body must exceed this multiple of the average body.
pub const HAMMER_MIN_BODY_VS_AVG: f64 = 0.3;
/// Hammer family: dominant wick must reach this multiple of the body.
pub const HAMMER_MIN_WICK_VS_BODY: f64 = 2.0;
/// Hammer family: opposite wick must stay under this multiple of the body.
pub const HAMMER_MAX_OPPOSITE_WICK_VS_BODY: f64 = 0.5;
/// Hammer family: range must exceed this multiple of the average body.
pub const HAMMER_MIN_RANGE_VS_AVG: f64 = 0.5;

/// Spinning top: body must stay under this multiple of the average body.
pub const SPINNING_TOP_MAX_BODY_VS_AVG: f64 = 0.5;
/// Spinning top: range must exceed this multiple of the average body.
pub const SPINNING_TOP_MIN_RANGE_VS_AVG: f64 = 0.8;

/// Marubozu: body must exceed this multiple of the average body.
pub const MARUBOZU_MIN_BODY_VS_AVG: f64 = 1.5;
/// Marubozu: each wick must stay under this fraction of the body.
pub const MARUBOZU_MAX_WICK_VS_BODY: f64 = 0.05;
/// Marubozu: body must cover this fraction of the full range.
pub const MARUBOZU_MIN_BODY_RATIO: f64 = 0.95;

/// Engulfing: current body must exceed this multiple of the previous body.
pub const ENGULFING_MIN_BODY_RATIO: f64 = 1.5;
/// Harami: current body must stay under this multiple of the previous body.
pub const HARAMI_MAX_BODY_RATIO: f64 = 0.5;
/// Star patterns: outer bodies must exceed this multiple of the middle body.
pub const STAR_BODY_DOMINANCE: f64 = 2.0;
/// Soldiers/crows: the trailing wick must stay under this fraction of the body.
pub const SOLDIER_MAX_WICK_VS_BODY: f64 = 0.3;

// ============================================================
// TRAILING CONTEXT
// ============================================================

/// Mean body size over the trailing window ending at (and including) `index`.
///
/// Uses up to [`AVG_BODY_PERIOD`] bars; shorter histories shrink the window
/// rather than padding it.
#[inline]
pub fn avg_body(candles: &[Candle], index: usize) -> f64 {
    let count = (index + 1).min(AVG_BODY_PERIOD);
    let start = index + 1 - count;
    let sum: f64 = candles[start..=index].iter().map(Candle::body).sum();
    sum / count as f64
}

/// True when the [`TREND_LOOKBACK`] bars immediately preceding `index` have
/// strictly decreasing closes. A single flat close breaks the trend; with
/// fewer than [`TREND_LOOKBACK`] prior bars there is no trend.
#[inline]
pub fn strict_downtrend(candles: &[Candle], index: usize) -> bool {
    if index < TREND_LOOKBACK {
        return false;
    }
    candles[index - TREND_LOOKBACK..index]
        .windows(2)
        .all(|pair| pair[0].close > pair[1].close)
}

/// True when the [`TREND_LOOKBACK`] bars immediately preceding `index` have
/// strictly increasing closes.
#[inline]
pub fn strict_uptrend(candles: &[Candle], index: usize) -> bool {
    if index < TREND_LOOKBACK {
        return false;
    }
    candles[index - TREND_LOOKBACK..index]
        .windows(2)
        .all(|pair| pair[0].close < pair[1].close)
}

/// Clamp a raw confidence value to `[0.0, cap]`.
#[inline]
pub fn clamp_confidence(value: f64, cap: f64) -> f64 {
    value.min(cap).max(0.0)
}

// ============================================================
// TESTS
// ============================================================
