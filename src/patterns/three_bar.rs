//! Three-bar pattern rules
//!
//! Morning/evening star and three white soldiers / three black crows. Each
//! rule walks the window as `first` (index-2), `second` (index-1), `third`
//! (current).

// `!(a < b)` comparisons are deliberate: NaN must fail every trigger.
#![allow(clippy::neg_cmp_op_on_partial_ord)]

use super::helpers;
use crate::patterns::{PatternHit, PatternKind, PatternRule, PatternType, RuleWindow};

impl_with_defaults!(
    MorningStarRule,
    EveningStarRule,
    ThreeWhiteSoldiersRule,
    ThreeBlackCrowsRule,
);

// ============================================================
// MORNING STAR / EVENING STAR
// ============================================================

/// Morning star: a strong bearish bar, a small-bodied pause gapping below
/// both neighbors, then a bullish bar recovering past the first body's
/// midpoint.
#[derive(Debug, Clone, Copy)]
pub struct MorningStarRule {
    pub body_dominance: f64,
}

impl Default for MorningStarRule {
    fn default() -> Self {
        Self {
            body_dominance: helpers::STAR_BODY_DOMINANCE,
        }
    }
}

impl PatternRule for MorningStarRule {
    fn kind(&self) -> PatternKind {
        PatternKind::MorningStar
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
        let first = window.back(2)?;
        let second = window.back(1)?;
        let third = window.current();

        if !first.is_bearish() || !third.is_bullish() {
            return None;
        }

        let second_body = second.body();
        if !(first.body() > self.body_dominance * second_body) {
            return None;
        }
        if !(third.body() > self.body_dominance * second_body) {
            return None;
        }
        if !(third.close > first.body_midpoint()) {
            return None;
        }
        // middle bar sits below both neighbors
        if !(second.close < first.close && second.close < third.open) {
            return None;
        }

        Some(PatternHit {
            kind: PatternRule::kind(self),
            pattern_type: PatternType::Bullish,
            confidence: 0.8,
            description: "Morning star: bearish bar, small pause, strong bullish recovery",
        })
    }
}

/// Evening star: mirror of [`MorningStarRule`].
#[derive(Debug, Clone, Copy)]
pub struct EveningStarRule {
    pub body_dominance: f64,
}

impl Default for EveningStarRule {
    fn default() -> Self {
        Self {
            body_dominance: helpers::STAR_BODY_DOMINANCE,
        }
    }
}

impl PatternRule for EveningStarRule {
    fn kind(&self) -> PatternKind {
        PatternKind::EveningStar
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
        let first = window.back(2)?;
        let second = window.back(1)?;
        let third = window.current();

        if !first.is_bullish() || !third.is_bearish() {
            return None;
        }

        let second_body = second.body();
        if !(first.body() > self.body_dominance * second_body) {
            return None;
        }
        if !(third.body() > self.body_dominance * second_body) {
            return None;
        }
        if !(third.close < first.body_midpoint()) {
            return None;
        }
        // middle bar sits above both neighbors
        if !(second.close > first.close && second.close > third.open) {
            return None;
        }

        Some(PatternHit {
            kind: PatternRule::kind(self),
            pattern_type: PatternType::Bearish,
            confidence: 0.8,
            description: "Evening star: bullish bar, small pause, strong bearish reversal",
        })
    }
}

// ============================================================
// THREE WHITE SOLDIERS / THREE BLACK CROWS
// ============================================================

/// Three white soldiers: three bullish bars whose opens and closes each
/// strictly exceed the prior bar's, all with negligible upper shadows.
#[derive(Debug, Clone, Copy)]
pub struct ThreeWhiteSoldiersRule {
    pub max_wick_vs_body: f64,
}

impl Default for ThreeWhiteSoldiersRule {
    fn default() -> Self {
        Self {
            max_wick_vs_body: helpers::SOLDIER_MAX_WICK_VS_BODY,
        }
    }
}

impl PatternRule for ThreeWhiteSoldiersRule {
    fn kind(&self) -> PatternKind {
        PatternKind::ThreeWhiteSoldiers
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
        let first = window.back(2)?;
        let second = window.back(1)?;
        let third = window.current();

        if !first.is_bullish() || !second.is_bullish() || !third.is_bullish() {
            return None;
        }
        if !(second.open > first.open && second.close > first.close) {
            return None;
        }
        if !(third.open > second.open && third.close > second.close) {
            return None;
        }
        for bar in [first, second, third] {
            if !(bar.upper_wick() < self.max_wick_vs_body * bar.body()) {
                return None;
            }
        }

        Some(PatternHit {
            kind: PatternRule::kind(self),
            pattern_type: PatternType::Bullish,
            confidence: 0.85,
            description: "Three white soldiers: three advancing bars with rising opens and closes",
        })
    }
}

/// Three black crows: mirror of [`ThreeWhiteSoldiersRule`] with the
/// lower-shadow bound.
#[derive(Debug, Clone, Copy)]
pub struct ThreeBlackCrowsRule {
    pub max_wick_vs_body: f64,
}

impl Default for ThreeBlackCrowsRule {
    fn default() -> Self {
        Self {
            max_wick_vs_body: helpers::SOLDIER_MAX_WICK_VS_BODY,
        }
    }
}

impl PatternRule for ThreeBlackCrowsRule {
    fn kind(&self) -> PatternKind {
        PatternKind::ThreeBlackCrows
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
        let first = window.back(2)?;
        let second = window.back(1)?;
        let third = window.current();

        if !first.is_bearish() || !second.is_bearish() || !third.is_bearish() {
            return None;
        }
        if !(second.open < first.open && second.close < first.close) {
            return None;
        }
        if !(third.open < second.open && third.close < second.close) {
            return None;
        }
        for bar in [first, second, third] {
            if !(bar.lower_wick() < self.max_wick_vs_body * bar.body()) {
                return None;
            }
        }

        Some(PatternHit {
            kind: PatternRule::kind(self),
            pattern_type: PatternType::Bearish,
            confidence: 0.85,
            description: "Three black crows: three declining bars with falling opens and closes",
        })
    }
}
