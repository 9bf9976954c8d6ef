//! # candlesig
//!
//! Candlestick pattern signals and technical indicators over OHLC bar series.
//!
//! The crate has three layers: a validated [`CandleSeries`] of OHLC bars, a
//! [`patterns::Classifier`] that evaluates a fixed, ordered set of pattern
//! rules against the most recent bar, and an [`aggregator::SignalStore`] that
//! deduplicates and bounds the resulting signal history per symbol. The
//! [`indicators`] module computes SMA/EMA/RSI/MACD/Bollinger series aligned
//! 1:1 with the input bars.
//!
//! ## Quick Start
//!
//! ```rust
//! use candlesig::prelude::*;
//!
//! let candles: Vec<Candle> = (0..10)
//!     .map(|i| {
//!         let base = 100.0 + i as f64;
//!         Candle::new(base, base + 1.5, base - 1.5, base + 1.0, i as i64 * 60_000)
//!     })
//!     .collect();
//!
//! let series = CandleSeries::new("BTCUSDT", "1m", candles).unwrap();
//!
//! let classifier = ClassifierBuilder::new().with_all_defaults().build().unwrap();
//! let signals = classifier.classify(&series).unwrap();
//!
//! let mut store = SignalStore::new(SignalConfig::default()).unwrap();
//! for signal in signals {
//!     store.ingest(signal);
//! }
//! ```

pub mod aggregator;
pub mod indicators;
pub mod patterns;

pub mod prelude {
    pub use crate::{
        // Aggregator
        aggregator::{IngestOutcome, SignalAnalytics, SignalConfig, SignalStore},
        // Indicators
        indicators::{
            bollinger, ema, macd, rsi, sma, BollingerSeries, MacdSeries, BOLLINGER_PERIOD,
            BOLLINGER_STD_DEV, MACD_FAST, MACD_SIGNAL, MACD_SLOW, RSI_PERIOD,
        },
        // Patterns
        patterns::{
            classify_parallel, single_bar::*, three_bar::*, two_bar::*, BuiltinRule, Classifier,
            ClassifierBuilder, ClassifyError, PatternHit, PatternKind, PatternRule, PatternSignal,
            PatternType, RuleWindow, SymbolSignals, MIN_CANDLES,
        },
        // Core types
        BodyMetrics,
        Candle,
        CandleSeries,
        Confidence,
        Direction,
        Period,
        Result,
        SignalError,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, SignalError>;

/// Errors that can occur during classification, indicator setup, or
/// aggregator configuration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SignalError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Candle at index {index} is out of order: timestamps must strictly increase")]
    OutOfOrder { index: usize },

    #[error("Invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: &'static str },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Confidence score in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f64);

impl Confidence {
    /// Create a new Confidence, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(SignalError::InvalidValue(
                "Confidence cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(SignalError::OutOfRange {
                field: "Confidence",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Confidence from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Confidence {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Confidence {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Confidence::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(SignalError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// CANDLE
// ============================================================

/// Per-bar direction derived from open/close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
    Flat,
}

/// One OHLC price observation for a fixed time interval.
///
/// All timestamps in this crate are Unix **milliseconds**.
///
/// OHLC consistency (`high >= max(open, close)`, `low <= min(open, close)`)
/// is not enforced on construction: a violating bar yields negative wicks
/// and simply fails to match any pattern. Callers that want hard rejection
/// can opt in via [`Candle::validate`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    /// Bar open time, Unix milliseconds.
    pub timestamp: i64,
}

impl Candle {
    pub fn new(open: f64, high: f64, low: f64, close: f64, timestamp: i64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume: None,
            timestamp,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    #[inline]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    #[inline]
    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    #[inline]
    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    #[inline]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        if self.is_bullish() {
            Direction::Bullish
        } else if self.is_bearish() {
            Direction::Bearish
        } else {
            Direction::Flat
        }
    }

    /// Midpoint of the real body.
    #[inline]
    pub fn body_midpoint(&self) -> f64 {
        (self.open + self.close) / 2.0
    }

    /// Body as ratio of range. Returns None if range ≈ 0
    #[inline]
    pub fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.body() / range)
    }

    /// Full derived geometry for this bar.
    #[inline]
    pub fn metrics(&self) -> BodyMetrics {
        BodyMetrics {
            body: self.body(),
            upper_wick: self.upper_wick(),
            lower_wick: self.lower_wick(),
            range: self.range(),
            direction: self.direction(),
        }
    }

    /// Strict consistency check, opt-in for callers that reject bad feeds.
    pub fn validate(&self) -> Result<()> {
        if self.high < self.low {
            return Err(SignalError::InvalidCandle {
                index: 0,
                reason: "high < low",
            });
        }
        if self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan() {
            return Err(SignalError::InvalidCandle {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if self.open.is_infinite()
            || self.high.is_infinite()
            || self.low.is_infinite()
            || self.close.is_infinite()
        {
            return Err(SignalError::InvalidCandle {
                index: 0,
                reason: "infinite value in OHLC",
            });
        }
        Ok(())
    }
}

/// Derived per-bar geometry (not stored; recomputed on demand).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyMetrics {
    pub body: f64,
    pub upper_wick: f64,
    pub lower_wick: f64,
    pub range: f64,
    pub direction: Direction,
}

// ============================================================
// CANDLE SERIES
// ============================================================

/// Time-ordered sequence of bars for one symbol/timeframe.
///
/// Construction validates that timestamps strictly increase; price-level
/// consistency is deliberately not checked (see [`Candle`]). Bars are
/// immutable once appended, except that a live tick may fold into the last
/// bar via [`CandleSeries::apply_tick`].
#[derive(Debug, Clone)]
pub struct CandleSeries {
    symbol: String,
    timeframe: String,
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: impl Into<String>,
        candles: Vec<Candle>,
    ) -> Result<Self> {
        for (index, pair) in candles.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SignalError::OutOfOrder { index: index + 1 });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
            candles,
        })
    }

    /// Empty series, ready for incremental `push`.
    pub fn empty(symbol: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
            candles: Vec::new(),
        }
    }

    pub fn push(&mut self, candle: Candle) -> Result<()> {
        if let Some(last) = self.candles.last() {
            if candle.timestamp <= last.timestamp {
                return Err(SignalError::OutOfOrder {
                    index: self.candles.len(),
                });
            }
        }
        self.candles.push(candle);
        Ok(())
    }

    /// Fold a live price tick into the last bar (close always moves; high/low
    /// only extend). Returns false when the series is empty.
    pub fn apply_tick(&mut self, price: f64) -> bool {
        match self.candles.last_mut() {
            Some(last) => {
                last.close = price;
                last.high = last.high.max(price);
                last.low = last.low.min(price);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[inline]
    pub fn timeframe(&self) -> &str {
        &self.timeframe
    }

    #[inline]
    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    #[inline]
    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_validation() {
        assert!(Confidence::new(0.0).is_ok());
        assert!(Confidence::new(1.0).is_ok());
        assert!(Confidence::new(0.5).is_ok());
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(1.1).is_err());
        assert!(Confidence::new(f64::NAN).is_err());
        assert!(Confidence::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_period_validation() {
        assert!(Period::new(1).is_ok());
        assert!(Period::new(100).is_ok());
        assert!(Period::new(0).is_err());
    }

    #[test]
    fn test_candle_geometry() {
        let bar = Candle::new(100.0, 110.0, 90.0, 105.0, 0);
        assert_eq!(bar.body(), 5.0);
        assert_eq!(bar.range(), 20.0);
        assert_eq!(bar.upper_wick(), 5.0);
        assert_eq!(bar.lower_wick(), 10.0);
        assert!(bar.is_bullish());
        assert!(!bar.is_bearish());
        assert!((bar.body_ratio().unwrap() - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_flat_candle_direction() {
        let bar = Candle::new(100.0, 101.0, 99.0, 100.0, 0);
        assert_eq!(bar.direction(), Direction::Flat);
        assert_eq!(bar.metrics().direction, Direction::Flat);
    }

    #[test]
    fn test_metrics_tolerates_inconsistent_bar() {
        // high below the body: upper wick goes negative, nothing panics
        let bar = Candle::new(100.0, 99.0, 98.0, 101.0, 0);
        let m = bar.metrics();
        assert!(m.upper_wick < 0.0);
        assert_eq!(m.direction, Direction::Bullish);
    }

    #[test]
    fn test_candle_validate() {
        assert!(Candle::new(100.0, 110.0, 90.0, 105.0, 0).validate().is_ok());
        assert!(Candle::new(100.0, 90.0, 110.0, 105.0, 0).validate().is_err());
        assert!(Candle::new(f64::NAN, 110.0, 90.0, 105.0, 0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_series_rejects_out_of_order() {
        let candles = vec![
            Candle::new(100.0, 101.0, 99.0, 100.5, 2_000),
            Candle::new(100.5, 101.5, 99.5, 101.0, 1_000),
        ];
        let err = CandleSeries::new("TEST", "1m", candles).unwrap_err();
        assert!(matches!(err, SignalError::OutOfOrder { index: 1 }));
    }

    #[test]
    fn test_series_push_and_tick() {
        let mut series = CandleSeries::empty("TEST", "1m");
        assert!(!series.apply_tick(100.0));

        series
            .push(Candle::new(100.0, 101.0, 99.0, 100.5, 1_000))
            .unwrap();
        assert!(series
            .push(Candle::new(100.0, 101.0, 99.0, 100.5, 1_000))
            .is_err());

        assert!(series.apply_tick(102.5));
        let last = series.last().unwrap();
        assert_eq!(last.close, 102.5);
        assert_eq!(last.high, 102.5);
        assert_eq!(last.low, 99.0);
    }
}
