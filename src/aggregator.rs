//! Signal aggregation
//!
//! [`SignalStore`] owns the mutable per-symbol signal history: it
//! deduplicates near-identical repeat events, bounds each symbol's history,
//! and computes rolling analytics. It is an explicitly owned store object,
//! never implicit global state; instantiate once per process and hand it to
//! readers and writers.
//!
//! # Concurrency
//!
//! Writes take `&mut self`, reads take `&self`, so the compiler enforces the
//! single-writer/consistent-read contract. Deployments with multiple
//! producers wrap the store in the lock of their choice.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::Utc;
use tracing::{debug, info};

use crate::patterns::{PatternKind, PatternSignal, PatternType};
use crate::{Confidence, Result, SignalError};

/// Repeat signals with the same pattern name inside this window collapse to
/// the first stored entry.
pub const DEDUP_WINDOW_MS: i64 = 60_000;

const HOUR_MS: i64 = 3_600_000;

// ============================================================
// CONFIGURATION
// ============================================================

/// Aggregator configuration: process-wide, hot-swappable via
/// [`SignalStore::set_config`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Confidence floor applied by [`SignalStore::query`].
    pub min_confidence: Confidence,
    /// Patterns visible to queries. Signals of disabled kinds are still
    /// stored, only filtered on the way out.
    pub enabled_patterns: HashSet<PatternKind>,
    pub show_bullish: bool,
    pub show_bearish: bool,
    pub show_neutral: bool,
    /// Per-symbol history bound; oldest entries evicted first.
    pub max_patterns: usize,
    pub alert_on_high_confidence: bool,
    pub high_confidence_threshold: Confidence,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            min_confidence: Confidence::new_const(0.6),
            enabled_patterns: PatternKind::ALL.into_iter().collect(),
            show_bullish: true,
            show_bearish: true,
            show_neutral: true,
            max_patterns: 100,
            alert_on_high_confidence: true,
            high_confidence_threshold: Confidence::new_const(0.85),
        }
    }
}

impl SignalConfig {
    /// Reject structurally invalid configuration at load time; nothing is
    /// silently clamped mid-stream.
    pub fn validate(&self) -> Result<()> {
        if self.max_patterns == 0 {
            return Err(SignalError::InvalidConfig(
                "max_patterns must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================
// OUTPUT TYPES
// ============================================================

/// Result of a single [`SignalStore::ingest`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Signal stored; `alert` is set when high-confidence alerting is
    /// enabled and the signal clears the threshold.
    Stored { alert: bool },
    /// Dropped: the same pattern was already stored for this symbol within
    /// the dedup window.
    Deduplicated,
}

impl IngestOutcome {
    #[inline]
    pub fn is_stored(self) -> bool {
        matches!(self, IngestOutcome::Stored { .. })
    }
}

/// Rolling analytics over one symbol's stored history.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SignalAnalytics {
    pub total: usize,
    pub bullish: usize,
    pub bearish: usize,
    pub neutral: usize,
    /// Mean confidence over the stored history; 0.0 when empty.
    pub avg_confidence: f64,
    /// Entries with `detected_at` inside the trailing hour. A set size, not
    /// a true rate.
    pub last_hour: usize,
}

// ============================================================
// STORE
// ============================================================

/// Bounded, deduplicated per-symbol signal history with rolling analytics.
#[derive(Debug)]
pub struct SignalStore {
    config: SignalConfig,
    histories: HashMap<String, VecDeque<PatternSignal>>,
}

impl SignalStore {
    pub fn new(config: SignalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            histories: HashMap::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Swap the configuration in place. The new config applies to subsequent
    /// ingests and queries; stored history is untouched.
    pub fn set_config(&mut self, config: SignalConfig) -> Result<()> {
        config.validate()?;
        info!(max_patterns = config.max_patterns, "signal store config swapped");
        self.config = config;
        Ok(())
    }

    /// Ingest one signal, deduplicating against the symbol's stored history.
    ///
    /// At most one entry per pattern name per [`DEDUP_WINDOW_MS`] survives;
    /// the first stored entry wins. Otherwise the signal is prepended
    /// (most-recent-first) and the history truncated to `max_patterns`.
    /// Out-of-order `detected_at` values never error; the window check is
    /// symmetric.
    pub fn ingest(&mut self, signal: PatternSignal) -> IngestOutcome {
        let history = self.histories.entry(signal.symbol.clone()).or_default();

        let duplicate = history.iter().any(|existing| {
            existing.kind == signal.kind
                && (existing.detected_at - signal.detected_at).abs() < DEDUP_WINDOW_MS
        });
        if duplicate {
            debug!(
                symbol = %signal.symbol,
                pattern = signal.name(),
                "dropped repeat signal inside dedup window"
            );
            return IngestOutcome::Deduplicated;
        }

        let alert = self.config.alert_on_high_confidence
            && signal.confidence >= self.config.high_confidence_threshold.get();
        if alert {
            info!(
                symbol = %signal.symbol,
                pattern = signal.name(),
                confidence = signal.confidence,
                "high-confidence signal"
            );
        }

        history.push_front(signal);
        history.truncate(self.config.max_patterns);
        IngestOutcome::Stored { alert }
    }

    /// Ingest a batch, preserving order.
    pub fn ingest_all(&mut self, signals: impl IntoIterator<Item = PatternSignal>) {
        for signal in signals {
            self.ingest(signal);
        }
    }

    /// The symbol's stored signals that pass the configured filters,
    /// most-recent-first. Filtering is pure and order-preserving.
    pub fn query(&self, symbol: &str) -> Vec<&PatternSignal> {
        match self.histories.get(symbol) {
            Some(history) => history.iter().filter(|s| self.passes_filters(s)).collect(),
            None => Vec::new(),
        }
    }

    fn passes_filters(&self, signal: &PatternSignal) -> bool {
        if signal.confidence < self.config.min_confidence.get() {
            return false;
        }
        if !self.config.enabled_patterns.contains(&signal.kind) {
            return false;
        }
        match signal.pattern_type {
            PatternType::Bullish => self.config.show_bullish,
            PatternType::Bearish => self.config.show_bearish,
            PatternType::Neutral => self.config.show_neutral,
        }
    }

    /// Rolling analytics with `now` taken from the system clock.
    pub fn analytics(&self, symbol: &str) -> SignalAnalytics {
        self.analytics_at(symbol, Utc::now().timestamp_millis())
    }

    /// Rolling analytics against an explicit `now` (Unix milliseconds).
    pub fn analytics_at(&self, symbol: &str, now_ms: i64) -> SignalAnalytics {
        let mut analytics = SignalAnalytics {
            total: 0,
            bullish: 0,
            bearish: 0,
            neutral: 0,
            avg_confidence: 0.0,
            last_hour: 0,
        };

        let Some(history) = self.histories.get(symbol) else {
            return analytics;
        };

        let mut confidence_sum = 0.0;
        for signal in history {
            analytics.total += 1;
            confidence_sum += signal.confidence;
            match signal.pattern_type {
                PatternType::Bullish => analytics.bullish += 1,
                PatternType::Bearish => analytics.bearish += 1,
                PatternType::Neutral => analytics.neutral += 1,
            }
            if signal.detected_at > now_ms - HOUR_MS {
                analytics.last_hour += 1;
            }
        }
        if analytics.total > 0 {
            analytics.avg_confidence = confidence_sum / analytics.total as f64;
        }

        analytics
    }

    /// Evict one symbol's history, or every symbol's.
    pub fn clear(&mut self, symbol: Option<&str>) {
        match symbol {
            Some(symbol) => {
                self.histories.remove(symbol);
            }
            None => self.histories.clear(),
        }
    }

    /// Symbols with stored history.
    pub fn symbols(&self) -> Vec<&str> {
        self.histories.keys().map(String::as_str).collect()
    }

    /// Stored (unfiltered) signal count for a symbol.
    pub fn len(&self, symbol: &str) -> usize {
        self.histories.get(symbol).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.histories.values().all(VecDeque::is_empty)
    }
}

// ============================================================
// TESTS
// ============================================================
