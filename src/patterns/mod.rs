//! Candlestick pattern classification
//!
//! A [`Classifier`] evaluates a fixed, ordered list of rules against the most
//! recent bar of a series. Every rule that fires appends a [`PatternSignal`];
//! several patterns may co-occur on one bar, and the rule order determines
//! the output order.
//!
//! # Rule catalogue
//!
//! - **Single-bar**: doji (dragonfly/gravestone/long-legged/standard),
//!   hammer, inverted hammer, hanging man, spinning top, marubozu
//! - **Two-bar**: bullish/bearish engulfing, bullish/bearish harami
//! - **Three-bar**: morning/evening star, three white soldiers,
//!   three black crows

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple rule types.
macro_rules! impl_with_defaults {
  ($($rule:ty),* $(,)?) => {
    $(impl $rule {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod single_bar;
pub mod three_bar;
pub mod two_bar;

pub use single_bar::*;
pub use three_bar::*;
pub use two_bar::*;

use rayon::prelude::*;

use crate::{Candle, CandleSeries, Result, SignalError};

/// Minimum series length before any classification is attempted.
pub const MIN_CANDLES: usize = 3;

// ============================================================
// PATTERN KINDS
// ============================================================

/// Bias of a pattern signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PatternType {
    Bullish,
    Bearish,
    Neutral,
}

/// The pattern families this crate detects, in fixed evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Doji,
    Hammer,
    InvertedHammer,
    HangingMan,
    SpinningTop,
    Marubozu,
    BullishEngulfing,
    BearishEngulfing,
    BullishHarami,
    BearishHarami,
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
}

impl PatternKind {
    /// All kinds, in evaluation order.
    pub const ALL: [PatternKind; 14] = [
        PatternKind::Doji,
        PatternKind::Hammer,
        PatternKind::InvertedHammer,
        PatternKind::HangingMan,
        PatternKind::SpinningTop,
        PatternKind::Marubozu,
        PatternKind::BullishEngulfing,
        PatternKind::BearishEngulfing,
        PatternKind::BullishHarami,
        PatternKind::BearishHarami,
        PatternKind::MorningStar,
        PatternKind::EveningStar,
        PatternKind::ThreeWhiteSoldiers,
        PatternKind::ThreeBlackCrows,
    ];

    /// Stable wire name of the pattern.
    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::Doji => "doji",
            PatternKind::Hammer => "hammer",
            PatternKind::InvertedHammer => "inverted_hammer",
            PatternKind::HangingMan => "hanging_man",
            PatternKind::SpinningTop => "spinning_top",
            PatternKind::Marubozu => "marubozu",
            PatternKind::BullishEngulfing => "bullish_engulfing",
            PatternKind::BearishEngulfing => "bearish_engulfing",
            PatternKind::BullishHarami => "bullish_harami",
            PatternKind::BearishHarami => "bearish_harami",
            PatternKind::MorningStar => "morning_star",
            PatternKind::EveningStar => "evening_star",
            PatternKind::ThreeWhiteSoldiers => "three_white_soldiers",
            PatternKind::ThreeBlackCrows => "three_black_crows",
        }
    }

    /// The typical bias of this pattern, or `None` when the bias depends on
    /// the bar itself (marubozu).
    pub fn typical_type(self) -> Option<PatternType> {
        match self {
            PatternKind::Hammer
            | PatternKind::InvertedHammer
            | PatternKind::BullishEngulfing
            | PatternKind::BullishHarami
            | PatternKind::MorningStar
            | PatternKind::ThreeWhiteSoldiers => Some(PatternType::Bullish),
            PatternKind::HangingMan
            | PatternKind::BearishEngulfing
            | PatternKind::BearishHarami
            | PatternKind::EveningStar
            | PatternKind::ThreeBlackCrows => Some(PatternType::Bearish),
            PatternKind::Doji | PatternKind::SpinningTop => Some(PatternType::Neutral),
            PatternKind::Marubozu => None,
        }
    }

    /// Bars required before the rule can be evaluated at an index.
    pub fn min_bars(self) -> usize {
        match self {
            PatternKind::Doji
            | PatternKind::Hammer
            | PatternKind::InvertedHammer
            | PatternKind::SpinningTop
            | PatternKind::Marubozu => 1,
            // uptrend requirement needs three prior bars
            PatternKind::HangingMan => 4,
            PatternKind::BullishEngulfing
            | PatternKind::BearishEngulfing
            | PatternKind::BullishHarami
            | PatternKind::BearishHarami => 2,
            PatternKind::MorningStar
            | PatternKind::EveningStar
            | PatternKind::ThreeWhiteSoldiers
            | PatternKind::ThreeBlackCrows => 3,
        }
    }
}

// ============================================================
// SIGNALS
// ============================================================

/// A detected pattern, carrying enough bar data for a renderer to place a
/// marker without re-reading the candle series. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PatternSignal {
    /// Deterministic id: `{symbol}:{timestamp}:{name}:{ordinal}` where the
    /// ordinal is the signal's position within its bar's batch. Identical
    /// input re-classified yields identical ids, so re-ingestion is
    /// idempotent.
    pub id: String,
    pub kind: PatternKind,
    pub pattern_type: PatternType,
    /// Heuristic strength in [0, 1]; not a calibrated probability.
    pub confidence: f64,
    pub description: String,
    pub symbol: String,
    pub timeframe: String,
    /// Timestamp of the bar the pattern completed on, Unix milliseconds.
    pub timestamp: i64,
    pub price: f64,
    pub high: f64,
    pub low: f64,
    /// Detection time, Unix milliseconds. Defaults to the bar timestamp so
    /// classification stays deterministic; override for wall-clock stamping.
    pub detected_at: i64,
}

impl PatternSignal {
    /// Stable wire name of the detected pattern.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn with_detected_at(mut self, detected_at: i64) -> Self {
        self.detected_at = detected_at;
        self
    }
}

/// Raw rule output before it is tied to a symbol/bar (internal currency
/// between rules and the classifier).
#[derive(Debug, Clone, Copy)]
pub struct PatternHit {
    pub kind: PatternKind,
    pub pattern_type: PatternType,
    pub confidence: f64,
    pub description: &'static str,
}

// ============================================================
// RULE TRAIT
// ============================================================

/// The slice of series state a rule evaluates against: the bar at `index`,
/// its predecessors, and the trailing average body size.
#[derive(Debug, Clone, Copy)]
pub struct RuleWindow<'a> {
    pub candles: &'a [Candle],
    pub index: usize,
    /// Mean body over up to 20 trailing bars, including the current one.
    pub avg_body: f64,
}

impl<'a> RuleWindow<'a> {
    pub fn at(candles: &'a [Candle], index: usize) -> Self {
        Self {
            candles,
            index,
            avg_body: helpers::avg_body(candles, index),
        }
    }

    /// The bar under evaluation.
    #[inline]
    pub fn current(&self) -> &Candle {
        &self.candles[self.index]
    }

    /// The bar `n` positions before the current one.
    #[inline]
    pub fn back(&self, n: usize) -> Option<&Candle> {
        self.index.checked_sub(n).map(|i| &self.candles[i])
    }

    /// Strictly decreasing closes over the three bars preceding this one.
    #[inline]
    pub fn is_downtrend(&self) -> bool {
        helpers::strict_downtrend(self.candles, self.index)
    }

    /// Strictly increasing closes over the three bars preceding this one.
    #[inline]
    pub fn is_uptrend(&self) -> bool {
        helpers::strict_uptrend(self.candles, self.index)
    }
}

/// A single pattern rule: pure check over a 1-3 bar window plus trailing
/// context, producing at most one hit.
pub trait PatternRule: Send + Sync {
    fn kind(&self) -> PatternKind;

    fn min_bars(&self) -> usize {
        self.kind().min_bars()
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================
// BUILTIN RULES - generated via macro
// ============================================================

/// Macro to generate the BuiltinRule enum without boilerplate
macro_rules! define_builtin_rules {
    (
        $(
            $variant:ident($rule:ty)
        ),* $(,)?
    ) => {
        /// All builtin rules - fast path via enum dispatch
        #[derive(Debug, Clone)]
        pub enum BuiltinRule {
            $($variant($rule)),*
        }

        impl BuiltinRule {
            #[inline]
            pub fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
                match self {
                    $(Self::$variant(r) => PatternRule::evaluate(r, window)),*
                }
            }

            #[inline]
            pub fn kind(&self) -> PatternKind {
                match self {
                    $(Self::$variant(r) => PatternRule::kind(r)),*
                }
            }

            #[inline]
            pub fn min_bars(&self) -> usize {
                match self {
                    $(Self::$variant(r) => PatternRule::min_bars(r)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(r) => PatternRule::validate_config(r)),*
                }
            }
        }
    };
}

define_builtin_rules! {
    // Single bar
    Doji(DojiRule),
    Hammer(HammerRule),
    InvertedHammer(InvertedHammerRule),
    HangingMan(HangingManRule),
    SpinningTop(SpinningTopRule),
    Marubozu(MarubozuRule),

    // Two bar
    BullishEngulfing(BullishEngulfingRule),
    BearishEngulfing(BearishEngulfingRule),
    BullishHarami(BullishHaramiRule),
    BearishHarami(BearishHaramiRule),

    // Three bar
    MorningStar(MorningStarRule),
    EveningStar(EveningStarRule),
    ThreeWhiteSoldiers(ThreeWhiteSoldiersRule),
    ThreeBlackCrows(ThreeBlackCrowsRule),
}

// ============================================================
// CLASSIFIER
// ============================================================

/// Classifier configuration
#[derive(Debug, Clone, Default)]
pub struct ClassifierConfig {
    /// Reject NaN/inf/inverted bars up front instead of letting them degrade
    /// to no-signal.
    pub validate_data: bool,
}

/// Evaluates the rule list against the most recent bar of a series.
///
/// Pure and synchronous: the same input always yields the same output, and
/// independent symbols may be classified concurrently (see
/// [`classify_parallel`]).
pub struct Classifier {
    rules: Vec<BuiltinRule>,
    config: ClassifierConfig,
}

impl Classifier {
    /// Classify the most recent bar of the series.
    ///
    /// Fails closed: fewer than [`MIN_CANDLES`] bars yields `Ok(vec![])`.
    /// Errors only when `validate_data` is enabled and a bar is malformed.
    pub fn classify(&self, series: &CandleSeries) -> Result<Vec<PatternSignal>> {
        self.classify_slice(series.symbol(), series.timeframe(), series.as_slice())
    }

    /// Classify the most recent bar of a raw slice.
    pub fn classify_slice(
        &self,
        symbol: &str,
        timeframe: &str,
        candles: &[Candle],
    ) -> Result<Vec<PatternSignal>> {
        if self.config.validate_data {
            validate_candles(candles)?;
        }
        if candles.len() < MIN_CANDLES {
            return Ok(Vec::new());
        }
        Ok(self.signals_at(symbol, timeframe, candles, candles.len() - 1))
    }

    /// Evaluate every bar of the series with its own trailing context.
    ///
    /// Historical counterpart of [`Classifier::classify`]: useful for
    /// annotating a whole chart at load time.
    pub fn scan(&self, series: &CandleSeries) -> Result<Vec<PatternSignal>> {
        let candles = series.as_slice();
        if self.config.validate_data {
            validate_candles(candles)?;
        }
        if candles.len() < MIN_CANDLES {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for index in (MIN_CANDLES - 1)..candles.len() {
            results.extend(self.signals_at(series.symbol(), series.timeframe(), candles, index));
        }
        Ok(results)
    }

    fn signals_at(
        &self,
        symbol: &str,
        timeframe: &str,
        candles: &[Candle],
        index: usize,
    ) -> Vec<PatternSignal> {
        let window = RuleWindow::at(candles, index);
        let bar = &candles[index];

        let mut results = Vec::new();
        for rule in &self.rules {
            if index + 1 < rule.min_bars() {
                continue;
            }
            if let Some(hit) = rule.evaluate(&window) {
                let ordinal = results.len();
                results.push(PatternSignal {
                    id: format!(
                        "{symbol}:{ts}:{name}:{ordinal}",
                        ts = bar.timestamp,
                        name = hit.kind.as_str()
                    ),
                    kind: hit.kind,
                    pattern_type: hit.pattern_type,
                    confidence: hit.confidence,
                    description: hit.description.to_string(),
                    symbol: symbol.to_string(),
                    timeframe: timeframe.to_string(),
                    timestamp: bar.timestamp,
                    price: bar.close,
                    high: bar.high,
                    low: bar.low,
                    detected_at: bar.timestamp,
                });
            }
        }
        results
    }

    fn validate(&self) -> Result<()> {
        for rule in &self.rules {
            rule.validate_config()?;
        }
        Ok(())
    }
}

fn validate_candles(candles: &[Candle]) -> Result<()> {
    for (i, candle) in candles.iter().enumerate() {
        candle.validate().map_err(|e| match e {
            SignalError::InvalidCandle { reason, .. } => {
                SignalError::InvalidCandle { index: i, reason }
            }
            other => other,
        })?;
    }
    Ok(())
}

// ============================================================
// BUILDER
// ============================================================

/// Generate an array of `BuiltinRule` variants using `Default::default()` for each inner type.
macro_rules! builtin_defaults {
  ($($variant:ident),* $(,)?) => {
    [$(BuiltinRule::$variant(Default::default())),*]
  };
}

/// Builder for [`Classifier`] instances.
pub struct ClassifierBuilder {
    rules: Vec<BuiltinRule>,
    config: ClassifierConfig,
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBuilder {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            config: ClassifierConfig::default(),
        }
    }

    /// Add every builtin rule, in the fixed evaluation order.
    pub fn with_all_defaults(self) -> Self {
        self.with_single_bar_defaults()
            .with_two_bar_defaults()
            .with_three_bar_defaults()
    }

    /// Add only the single-bar rules with defaults
    pub fn with_single_bar_defaults(mut self) -> Self {
        self.rules.extend(builtin_defaults![
            Doji,
            Hammer,
            InvertedHammer,
            HangingMan,
            SpinningTop,
            Marubozu,
        ]);
        self
    }

    /// Add only the two-bar rules with defaults
    pub fn with_two_bar_defaults(mut self) -> Self {
        self.rules.extend(builtin_defaults![
            BullishEngulfing,
            BearishEngulfing,
            BullishHarami,
            BearishHarami,
        ]);
        self
    }

    /// Add only the three-bar rules with defaults
    pub fn with_three_bar_defaults(mut self) -> Self {
        self.rules.extend(builtin_defaults![
            MorningStar,
            EveningStar,
            ThreeWhiteSoldiers,
            ThreeBlackCrows,
        ]);
        self
    }

    /// Add a rule at the end of the evaluation order
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, rule: BuiltinRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Enable/disable strict bar validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Build the classifier
    pub fn build(self) -> Result<Classifier> {
        let classifier = Classifier {
            rules: self.rules,
            config: self.config,
        };
        classifier.validate()?;
        Ok(classifier)
    }
}

// ============================================================
// PARALLEL CLASSIFICATION
// ============================================================

/// Signals produced for a single symbol
#[derive(Debug)]
pub struct SymbolSignals {
    pub symbol: String,
    pub signals: Vec<PatternSignal>,
}

/// Error from classifying a single symbol
#[derive(Debug)]
pub struct ClassifyError {
    pub symbol: String,
    pub error: SignalError,
}

/// Classify many symbols concurrently. Each series is independent, so the
/// work parallelizes with no shared mutable state.
pub fn classify_parallel<'a, I>(
    classifier: &Classifier,
    series: I,
) -> (Vec<SymbolSignals>, Vec<ClassifyError>)
where
    I: IntoParallelIterator<Item = &'a CandleSeries>,
{
    let results: Vec<_> = series
        .into_par_iter()
        .map(|s| {
            classifier
                .classify(s)
                .map(|signals| SymbolSignals {
                    symbol: s.symbol().to_string(),
                    signals,
                })
                .map_err(|error| ClassifyError {
                    symbol: s.symbol().to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_rule_counts() {
        let classifier = ClassifierBuilder::new().with_all_defaults().build().unwrap();
        assert_eq!(classifier.rules.len(), 14);

        let single = ClassifierBuilder::new()
            .with_single_bar_defaults()
            .build()
            .unwrap();
        assert_eq!(single.rules.len(), 6);
    }

    #[test]
    fn test_builder_preserves_order() {
        let classifier = ClassifierBuilder::new().with_all_defaults().build().unwrap();
        let kinds: Vec<PatternKind> = classifier.rules.iter().map(BuiltinRule::kind).collect();
        assert_eq!(kinds, PatternKind::ALL);
    }

    #[test]
    fn test_kind_wire_names_round_trip() {
        for kind in PatternKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            let back: PatternKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn test_classify_fails_closed_under_three_bars() {
        let classifier = ClassifierBuilder::new().with_all_defaults().build().unwrap();
        for n in 0..MIN_CANDLES {
            let candles: Vec<Candle> = (0..n)
                .map(|i| Candle::new(100.0, 101.0, 99.0, 100.5, i as i64))
                .collect();
            let series = CandleSeries::new("TEST", "1m", candles).unwrap();
            assert!(classifier.classify(&series).unwrap().is_empty());
        }
    }

    #[test]
    fn test_validate_data_rejects_nan() {
        let classifier = ClassifierBuilder::new()
            .with_all_defaults()
            .validate_data(true)
            .build()
            .unwrap();
        let candles = vec![
            Candle::new(100.0, 101.0, 99.0, 100.5, 0),
            Candle::new(f64::NAN, 101.0, 99.0, 100.5, 1),
            Candle::new(100.0, 101.0, 99.0, 100.5, 2),
        ];
        let series = CandleSeries::new("TEST", "1m", candles).unwrap();
        let err = classifier.classify(&series).unwrap_err();
        assert!(matches!(err, SignalError::InvalidCandle { index: 1, .. }));
    }
}
