//! Single-bar pattern rules
//!
//! Doji (with dragonfly/gravestone/long-legged sub-typing), the hammer
//! family, spinning top, and marubozu. All comparisons run against the
//! trailing average body carried by the [`RuleWindow`].

// `!(a < b)` comparisons are deliberate: NaN must fail every trigger.
#![allow(clippy::neg_cmp_op_on_partial_ord)]

use super::helpers::{self, clamp_confidence};
use crate::patterns::{PatternHit, PatternKind, PatternRule, PatternType, RuleWindow};
use crate::{Result, SignalError};

impl_with_defaults!(
    DojiRule,
    HammerRule,
    InvertedHammerRule,
    HangingManRule,
    SpinningTopRule,
    MarubozuRule,
);

// ============================================================
// DOJI
// ============================================================

/// Doji: body is a small fraction of both the bar range and the trailing
/// average body. Sub-typed by wick symmetry.
#[derive(Debug, Clone, Copy)]
pub struct DojiRule {
    pub max_body_ratio: f64,
    pub max_body_vs_avg: f64,
    pub dominant_wick_ratio: f64,
    pub minor_wick_ratio: f64,
    pub long_leg_ratio: f64,
}

impl Default for DojiRule {
    fn default() -> Self {
        Self {
            max_body_ratio: helpers::DOJI_MAX_BODY_RATIO,
            max_body_vs_avg: helpers::DOJI_MAX_BODY_VS_AVG,
            dominant_wick_ratio: helpers::DOJI_DOMINANT_WICK_RATIO,
            minor_wick_ratio: helpers::DOJI_MINOR_WICK_RATIO,
            long_leg_ratio: helpers::DOJI_LONG_LEG_RATIO,
        }
    }
}

impl PatternRule for DojiRule {
    fn kind(&self) -> PatternKind {
        PatternKind::Doji
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
        let m = window.current().metrics();

        // positive-form guards: NaN fails every comparison, so a malformed
        // bar degrades to no-signal instead of slipping through
        if !(m.range > 0.0) {
            return None;
        }
        let body_ratio = m.body / m.range;
        if !(body_ratio < self.max_body_ratio) {
            return None;
        }
        if !(m.body < window.avg_body * self.max_body_vs_avg) {
            return None;
        }

        let upper_ratio = m.upper_wick / m.range;
        let lower_ratio = m.lower_wick / m.range;

        let description = if lower_ratio > self.dominant_wick_ratio
            && upper_ratio < self.minor_wick_ratio
        {
            "Dragonfly doji: long lower shadow with open and close near the high"
        } else if upper_ratio > self.dominant_wick_ratio && lower_ratio < self.minor_wick_ratio {
            "Gravestone doji: long upper shadow with open and close near the low"
        } else if upper_ratio > self.long_leg_ratio && lower_ratio > self.long_leg_ratio {
            "Long-legged doji: deep shadows on both sides of a tiny body"
        } else {
            "Doji: open and close nearly equal, market indecision"
        };

        Some(PatternHit {
            kind: PatternRule::kind(self),
            pattern_type: PatternType::Neutral,
            confidence: clamp_confidence(0.7 + (1.0 - body_ratio) * 0.2, 0.9),
            description,
        })
    }

    fn validate_config(&self) -> Result<()> {
        if !(self.max_body_ratio > 0.0 && self.max_body_ratio <= 1.0) {
            return Err(SignalError::OutOfRange {
                field: "max_body_ratio",
                value: self.max_body_ratio,
                min: 0.0,
                max: 1.0,
            });
        }
        if !self.max_body_vs_avg.is_finite() || self.max_body_vs_avg <= 0.0 {
            return Err(SignalError::InvalidValue(
                "max_body_vs_avg must be finite and > 0",
            ));
        }
        Ok(())
    }
}

// ============================================================
// HAMMER FAMILY
// ============================================================

/// Hammer: meaningful body near the top of a wide bar with a dominant lower
/// shadow. A strict three-bar downtrend adds a confidence bonus but is not
/// required.
#[derive(Debug, Clone, Copy)]
pub struct HammerRule {
    pub min_body_vs_avg: f64,
    pub min_wick_vs_body: f64,
    pub max_opposite_wick_vs_body: f64,
    pub min_range_vs_avg: f64,
    pub trend_bonus: f64,
}

impl Default for HammerRule {
    fn default() -> Self {
        Self {
            min_body_vs_avg: helpers::HAMMER_MIN_BODY_VS_AVG,
            min_wick_vs_body: helpers::HAMMER_MIN_WICK_VS_BODY,
            max_opposite_wick_vs_body: helpers::HAMMER_MAX_OPPOSITE_WICK_VS_BODY,
            min_range_vs_avg: helpers::HAMMER_MIN_RANGE_VS_AVG,
            trend_bonus: helpers::TREND_BONUS,
        }
    }
}

impl PatternRule for HammerRule {
    fn kind(&self) -> PatternKind {
        PatternKind::Hammer
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
        let m = window.current().metrics();

        if !(m.body > window.avg_body * self.min_body_vs_avg) {
            return None;
        }
        if !(m.lower_wick >= self.min_wick_vs_body * m.body) {
            return None;
        }
        if !(m.upper_wick < self.max_opposite_wick_vs_body * m.body) {
            return None;
        }
        if !(m.range > window.avg_body * self.min_range_vs_avg) {
            return None;
        }

        // body > 0 is guaranteed by the body check above
        let mut confidence = 0.65 + m.lower_wick / m.body / 10.0;
        if window.is_downtrend() {
            confidence += self.trend_bonus;
        }

        Some(PatternHit {
            kind: PatternRule::kind(self),
            pattern_type: PatternType::Bullish,
            confidence: clamp_confidence(confidence, 0.95),
            description: "Hammer: small body with a long lower shadow after a decline",
        })
    }
}

/// Inverted hammer: hammer geometry with the wicks swapped.
#[derive(Debug, Clone, Copy)]
pub struct InvertedHammerRule {
    pub min_body_vs_avg: f64,
    pub min_wick_vs_body: f64,
    pub max_opposite_wick_vs_body: f64,
    pub min_range_vs_avg: f64,
    pub trend_bonus: f64,
}

impl Default for InvertedHammerRule {
    fn default() -> Self {
        Self {
            min_body_vs_avg: helpers::HAMMER_MIN_BODY_VS_AVG,
            min_wick_vs_body: helpers::HAMMER_MIN_WICK_VS_BODY,
            max_opposite_wick_vs_body: helpers::HAMMER_MAX_OPPOSITE_WICK_VS_BODY,
            min_range_vs_avg: helpers::HAMMER_MIN_RANGE_VS_AVG,
            trend_bonus: helpers::TREND_BONUS,
        }
    }
}

impl PatternRule for InvertedHammerRule {
    fn kind(&self) -> PatternKind {
        PatternKind::InvertedHammer
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
        let m = window.current().metrics();

        if !(m.body > window.avg_body * self.min_body_vs_avg) {
            return None;
        }
        if !(m.upper_wick >= self.min_wick_vs_body * m.body) {
            return None;
        }
        if !(m.lower_wick < self.max_opposite_wick_vs_body * m.body) {
            return None;
        }
        if !(m.range > window.avg_body * self.min_range_vs_avg) {
            return None;
        }

        let mut confidence = 0.6 + m.upper_wick / m.body / 10.0;
        if window.is_downtrend() {
            confidence += self.trend_bonus;
        }

        Some(PatternHit {
            kind: PatternRule::kind(self),
            pattern_type: PatternType::Bullish,
            confidence: clamp_confidence(confidence, 0.9),
            description: "Inverted hammer: small body with a long upper shadow",
        })
    }
}

/// Hanging man: hammer geometry that only signals after a strict three-bar
/// advance. No uptrend, no signal.
#[derive(Debug, Clone, Copy)]
pub struct HangingManRule {
    pub min_body_vs_avg: f64,
    pub min_wick_vs_body: f64,
    pub max_opposite_wick_vs_body: f64,
    pub min_range_vs_avg: f64,
}

impl Default for HangingManRule {
    fn default() -> Self {
        Self {
            min_body_vs_avg: helpers::HAMMER_MIN_BODY_VS_AVG,
            min_wick_vs_body: helpers::HAMMER_MIN_WICK_VS_BODY,
            max_opposite_wick_vs_body: helpers::HAMMER_MAX_OPPOSITE_WICK_VS_BODY,
            min_range_vs_avg: helpers::HAMMER_MIN_RANGE_VS_AVG,
        }
    }
}

impl PatternRule for HangingManRule {
    fn kind(&self) -> PatternKind {
        PatternKind::HangingMan
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
        if !window.is_uptrend() {
            return None;
        }

        let m = window.current().metrics();
        if !(m.body > window.avg_body * self.min_body_vs_avg) {
            return None;
        }
        if !(m.lower_wick >= self.min_wick_vs_body * m.body) {
            return None;
        }
        if !(m.upper_wick < self.max_opposite_wick_vs_body * m.body) {
            return None;
        }
        if !(m.range > window.avg_body * self.min_range_vs_avg) {
            return None;
        }

        Some(PatternHit {
            kind: PatternRule::kind(self),
            pattern_type: PatternType::Bearish,
            confidence: clamp_confidence(0.6 + m.lower_wick / m.body / 10.0, 0.85),
            description: "Hanging man: hammer geometry after an advance",
        })
    }
}

// ============================================================
// SPINNING TOP
// ============================================================

/// Spinning top: small body with shadows longer than the body on both sides.
#[derive(Debug, Clone, Copy)]
pub struct SpinningTopRule {
    pub max_body_vs_avg: f64,
    pub min_range_vs_avg: f64,
}

impl Default for SpinningTopRule {
    fn default() -> Self {
        Self {
            max_body_vs_avg: helpers::SPINNING_TOP_MAX_BODY_VS_AVG,
            min_range_vs_avg: helpers::SPINNING_TOP_MIN_RANGE_VS_AVG,
        }
    }
}

impl PatternRule for SpinningTopRule {
    fn kind(&self) -> PatternKind {
        PatternKind::SpinningTop
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
        let m = window.current().metrics();

        if !(m.body < window.avg_body * self.max_body_vs_avg) {
            return None;
        }
        if !(m.upper_wick > m.body && m.lower_wick > m.body) {
            return None;
        }
        if !(m.range > window.avg_body * self.min_range_vs_avg) {
            return None;
        }

        Some(PatternHit {
            kind: PatternRule::kind(self),
            pattern_type: PatternType::Neutral,
            confidence: 0.6,
            description: "Spinning top: small body between long shadows",
        })
    }
}

// ============================================================
// MARUBOZU
// ============================================================

/// Marubozu: an oversized body covering nearly the whole range, with
/// negligible shadows. Bias follows the bar direction.
#[derive(Debug, Clone, Copy)]
pub struct MarubozuRule {
    pub min_body_vs_avg: f64,
    pub max_wick_vs_body: f64,
    pub min_body_ratio: f64,
}

impl Default for MarubozuRule {
    fn default() -> Self {
        Self {
            min_body_vs_avg: helpers::MARUBOZU_MIN_BODY_VS_AVG,
            max_wick_vs_body: helpers::MARUBOZU_MAX_WICK_VS_BODY,
            min_body_ratio: helpers::MARUBOZU_MIN_BODY_RATIO,
        }
    }
}

impl PatternRule for MarubozuRule {
    fn kind(&self) -> PatternKind {
        PatternKind::Marubozu
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
        let bar = window.current();
        let m = bar.metrics();

        if !(m.body > window.avg_body * self.min_body_vs_avg) {
            return None;
        }
        if !(m.upper_wick < self.max_wick_vs_body * m.body) {
            return None;
        }
        if !(m.lower_wick < self.max_wick_vs_body * m.body) {
            return None;
        }
        // zero-range bar cannot dominate its range (division guard)
        if !(m.range > 0.0) {
            return None;
        }
        let body_ratio = m.body / m.range;
        if !(body_ratio > self.min_body_ratio) {
            return None;
        }

        // body > 0 here, so the bar is never flat
        let (pattern_type, description) = if bar.is_bullish() {
            (
                PatternType::Bullish,
                "Bullish marubozu: full-range advance with no shadows",
            )
        } else {
            (
                PatternType::Bearish,
                "Bearish marubozu: full-range decline with no shadows",
            )
        };

        Some(PatternHit {
            kind: PatternRule::kind(self),
            pattern_type,
            confidence: clamp_confidence(0.7 + body_ratio * 0.2, 0.9),
            description,
        })
    }

    fn validate_config(&self) -> Result<()> {
        if !(self.min_body_ratio > 0.0 && self.min_body_ratio <= 1.0) {
            return Err(SignalError::OutOfRange {
                field: "min_body_ratio",
                value: self.min_body_ratio,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }
}
