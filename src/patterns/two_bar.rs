//! Two-bar pattern rules
//!
//! Engulfing and harami pairs. Both compare the current body against the
//! previous bar's body; the color requirements mean the previous body is
//! always non-zero, so the ratio arithmetic needs no extra guards.

// `!(a < b)` comparisons are deliberate: NaN must fail every trigger.
#![allow(clippy::neg_cmp_op_on_partial_ord)]

use super::helpers;
use crate::patterns::{PatternHit, PatternKind, PatternRule, PatternType, RuleWindow};

impl_with_defaults!(
    BullishEngulfingRule,
    BearishEngulfingRule,
    BullishHaramiRule,
    BearishHaramiRule,
);

// ============================================================
// ENGULFING
// ============================================================

/// Bullish engulfing: a bullish body that opens below the prior bearish
/// close, closes above the prior open, and is meaningfully larger.
#[derive(Debug, Clone, Copy)]
pub struct BullishEngulfingRule {
    pub min_body_ratio: f64,
}

impl Default for BullishEngulfingRule {
    fn default() -> Self {
        Self {
            min_body_ratio: helpers::ENGULFING_MIN_BODY_RATIO,
        }
    }
}

impl PatternRule for BullishEngulfingRule {
    fn kind(&self) -> PatternKind {
        PatternKind::BullishEngulfing
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
        let prev = window.back(1)?;
        let curr = window.current();

        if !prev.is_bearish() || !curr.is_bullish() {
            return None;
        }
        if !(curr.open < prev.close && curr.close > prev.open) {
            return None;
        }

        let prev_body = prev.body();
        let curr_body = curr.body();
        if !(curr_body > self.min_body_ratio * prev_body) {
            return None;
        }

        Some(PatternHit {
            kind: PatternRule::kind(self),
            pattern_type: PatternType::Bullish,
            confidence: 0.75 + (curr_body / prev_body / 10.0).min(0.2),
            description: "Bullish engulfing: current body engulfs the prior bearish body",
        })
    }
}

/// Bearish engulfing: mirror of [`BullishEngulfingRule`].
#[derive(Debug, Clone, Copy)]
pub struct BearishEngulfingRule {
    pub min_body_ratio: f64,
}

impl Default for BearishEngulfingRule {
    fn default() -> Self {
        Self {
            min_body_ratio: helpers::ENGULFING_MIN_BODY_RATIO,
        }
    }
}

impl PatternRule for BearishEngulfingRule {
    fn kind(&self) -> PatternKind {
        PatternKind::BearishEngulfing
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
        let prev = window.back(1)?;
        let curr = window.current();

        if !prev.is_bullish() || !curr.is_bearish() {
            return None;
        }
        if !(curr.open > prev.close && curr.close < prev.open) {
            return None;
        }

        let prev_body = prev.body();
        let curr_body = curr.body();
        if !(curr_body > self.min_body_ratio * prev_body) {
            return None;
        }

        Some(PatternHit {
            kind: PatternRule::kind(self),
            pattern_type: PatternType::Bearish,
            confidence: 0.75 + (curr_body / prev_body / 10.0).min(0.2),
            description: "Bearish engulfing: current body engulfs the prior bullish body",
        })
    }
}

// ============================================================
// HARAMI
// ============================================================

/// Bullish harami: a small bullish body strictly inside the prior bearish
/// body.
#[derive(Debug, Clone, Copy)]
pub struct BullishHaramiRule {
    pub max_body_ratio: f64,
}

impl Default for BullishHaramiRule {
    fn default() -> Self {
        Self {
            max_body_ratio: helpers::HARAMI_MAX_BODY_RATIO,
        }
    }
}

impl PatternRule for BullishHaramiRule {
    fn kind(&self) -> PatternKind {
        PatternKind::BullishHarami
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
        let prev = window.back(1)?;
        let curr = window.current();

        if !prev.is_bearish() || !curr.is_bullish() {
            return None;
        }
        // strictly inside the prior body, which spans [prev.close, prev.open]
        if !(curr.open > prev.close && curr.close < prev.open) {
            return None;
        }
        if !(curr.body() < self.max_body_ratio * prev.body()) {
            return None;
        }

        Some(PatternHit {
            kind: PatternRule::kind(self),
            pattern_type: PatternType::Bullish,
            confidence: 0.65,
            description: "Bullish harami: small bullish body inside the prior bearish body",
        })
    }
}

/// Bearish harami: mirror of [`BullishHaramiRule`].
#[derive(Debug, Clone, Copy)]
pub struct BearishHaramiRule {
    pub max_body_ratio: f64,
}

impl Default for BearishHaramiRule {
    fn default() -> Self {
        Self {
            max_body_ratio: helpers::HARAMI_MAX_BODY_RATIO,
        }
    }
}

impl PatternRule for BearishHaramiRule {
    fn kind(&self) -> PatternKind {
        PatternKind::BearishHarami
    }

    fn evaluate(&self, window: &RuleWindow<'_>) -> Option<PatternHit> {
        let prev = window.back(1)?;
        let curr = window.current();

        if !prev.is_bullish() || !curr.is_bearish() {
            return None;
        }
        // strictly inside the prior body, which spans [prev.open, prev.close]
        if !(curr.open < prev.close && curr.close > prev.open) {
            return None;
        }
        if !(curr.body() < self.max_body_ratio * prev.body()) {
            return None;
        }

        Some(PatternHit {
            kind: PatternRule::kind(self),
            pattern_type: PatternType::Bearish,
            confidence: 0.65,
            description: "Bearish harami: small bearish body inside the prior bullish body",
        })
    }
}
