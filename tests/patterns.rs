//! Integration tests for pattern classification.
//!
//! Each pattern rule gets a focused scenario, plus the cross-cutting
//! contracts: fail-closed behavior, idempotence, confidence caps, and
//! multi-pattern co-occurrence on a single bar.

use candlesig::prelude::*;

/// Build a series from (open, high, low, close) tuples with minute-spaced
/// timestamps.
fn series(bars: &[(f64, f64, f64, f64)]) -> CandleSeries {
    let candles = bars
        .iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Candle::new(o, h, l, c, i as i64 * 60_000))
        .collect();
    CandleSeries::new("TEST", "1m", candles).unwrap()
}

fn classifier() -> Classifier {
    ClassifierBuilder::new().with_all_defaults().build().unwrap()
}

fn find(signals: &[PatternSignal], kind: PatternKind) -> Option<&PatternSignal> {
    signals.iter().find(|s| s.kind == kind)
}

// ============================================================
// FAIL-CLOSED / DETERMINISM
// ============================================================

#[test]
fn test_classify_returns_empty_under_three_bars() {
    let c = classifier();
    for n in 0..3 {
        let bars: Vec<(f64, f64, f64, f64)> =
            (0..n).map(|_| (100.0, 101.0, 99.0, 100.5)).collect();
        let signals = c.classify(&series(&bars)).unwrap();
        assert!(signals.is_empty(), "expected no signals for {n} bars");
    }
}

#[test]
fn test_classify_is_idempotent() {
    let mut bars: Vec<(f64, f64, f64, f64)> =
        (0..10).map(|i| (100.0 + i as f64, 105.5 + i as f64, 99.5 + i as f64, 105.0 + i as f64)).collect();
    bars.push((110.0, 111.0, 109.0, 110.05));

    let c = classifier();
    let s = series(&bars);
    let first = c.classify(&s).unwrap();
    let second = c.classify(&s).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_signal_ids_are_deterministic() {
    let mut bars: Vec<(f64, f64, f64, f64)> =
        (0..10).map(|_| (100.0, 105.5, 99.5, 105.0)).collect();
    bars.push((100.0, 101.0, 99.0, 100.05));

    let c = classifier();
    let s = series(&bars);
    let signals = c.classify(&s).unwrap();
    assert!(!signals.is_empty());
    for (ordinal, signal) in signals.iter().enumerate() {
        assert_eq!(
            signal.id,
            format!("TEST:{}:{}:{ordinal}", signal.timestamp, signal.name())
        );
    }
    assert_eq!(
        signals.iter().map(|s| s.id.clone()).collect::<Vec<_>>(),
        c.classify(&s)
            .unwrap()
            .iter()
            .map(|s| s.id.clone())
            .collect::<Vec<_>>()
    );
}

// ============================================================
// DOJI
// ============================================================

#[test]
fn test_doji_scenario_confidence() {
    // ten body-5 bars, then {open 100, high 101, low 99, close 100.05}:
    // body/range = 0.025, confidence = 0.7 + (1 - 0.025) * 0.2 = 0.895
    let mut bars: Vec<(f64, f64, f64, f64)> =
        (0..10).map(|_| (100.0, 105.5, 99.5, 105.0)).collect();
    bars.push((100.0, 101.0, 99.0, 100.05));

    let signals = classifier().classify(&series(&bars)).unwrap();
    let doji = find(&signals, PatternKind::Doji).expect("doji should fire");
    assert_eq!(doji.pattern_type, PatternType::Neutral);
    assert!((doji.confidence - 0.895).abs() < 1e-9);
}

#[test]
fn test_doji_requires_small_body_vs_average() {
    // body/range is doji-like but the body is not small against the average
    let mut bars: Vec<(f64, f64, f64, f64)> =
        (0..10).map(|_| (100.0, 100.3, 99.9, 100.1)).collect();
    bars.push((100.0, 103.0, 97.0, 100.4)); // body 0.4, range 6.0

    let signals = classifier().classify(&series(&bars)).unwrap();
    assert!(find(&signals, PatternKind::Doji).is_none());
}

#[test]
fn test_dragonfly_doji_description() {
    let mut bars: Vec<(f64, f64, f64, f64)> =
        (0..10).map(|_| (100.0, 105.5, 99.5, 105.0)).collect();
    // open ≈ close at the high, long lower shadow
    bars.push((100.0, 100.06, 98.0, 100.05));

    let signals = classifier().classify(&series(&bars)).unwrap();
    let doji = find(&signals, PatternKind::Doji).expect("dragonfly doji should fire");
    assert!(doji.description.to_lowercase().contains("dragonfly"));
}

#[test]
fn test_zero_range_bar_yields_no_doji() {
    let mut bars: Vec<(f64, f64, f64, f64)> =
        (0..10).map(|_| (100.0, 105.5, 99.5, 105.0)).collect();
    bars.push((100.0, 100.0, 100.0, 100.0));

    let signals = classifier().classify(&series(&bars)).unwrap();
    assert!(find(&signals, PatternKind::Doji).is_none());
}

// ============================================================
// HAMMER FAMILY
// ============================================================

fn hammer_context(no_trend: bool) -> Vec<(f64, f64, f64, f64)> {
    let second_close = if no_trend { 103.0 } else { 102.0 };
    vec![
        (104.0, 104.5, 102.5, 103.0),
        (second_close + 1.0, second_close + 1.5, second_close - 0.5, second_close),
        (102.0, 102.5, 100.5, 101.0),
    ]
}

#[test]
fn test_hammer_downtrend_bonus_hits_cap() {
    let mut bars = hammer_context(false);
    // body 0.5, lower wick 1.0, upper wick 0.1
    bars.push((100.5, 101.1, 99.5, 101.0));

    let signals = classifier().classify(&series(&bars)).unwrap();
    let hammer = find(&signals, PatternKind::Hammer).expect("hammer should fire");
    assert_eq!(hammer.pattern_type, PatternType::Bullish);
    // 0.65 + (1.0 / 0.5) / 10 + 0.15 = 1.0, clamped to the 0.95 cap
    assert!((hammer.confidence - 0.95).abs() < 1e-9);
}

#[test]
fn test_hammer_without_downtrend_skips_bonus() {
    let mut bars = hammer_context(true);
    bars.push((100.5, 101.1, 99.5, 101.0));

    let signals = classifier().classify(&series(&bars)).unwrap();
    let hammer = find(&signals, PatternKind::Hammer).expect("hammer should fire");
    assert!((hammer.confidence - 0.85).abs() < 1e-9);
}

#[test]
fn test_inverted_hammer_cap() {
    let mut bars = hammer_context(false);
    // body 0.5, upper wick 1.0, lower wick 0.1
    bars.push((101.0, 102.0, 100.4, 100.5));

    let signals = classifier().classify(&series(&bars)).unwrap();
    let inverted = find(&signals, PatternKind::InvertedHammer).expect("inverted hammer");
    // 0.6 + 0.2 + 0.15 = 0.95, clamped to the 0.9 cap
    assert!((inverted.confidence - 0.9).abs() < 1e-9);
}

#[test]
fn test_hanging_man_requires_uptrend() {
    // strict three-bar advance, then hammer geometry
    let mut bars = vec![
        (100.0, 101.5, 99.5, 101.0),
        (101.0, 102.5, 100.5, 102.0),
        (102.0, 103.5, 101.5, 103.0),
    ];
    bars.push((103.5, 104.1, 102.5, 104.0));

    let signals = classifier().classify(&series(&bars)).unwrap();
    let hanging = find(&signals, PatternKind::HangingMan).expect("hanging man should fire");
    assert_eq!(hanging.pattern_type, PatternType::Bearish);
    // 0.6 + (1.0 / 0.5) / 10 = 0.8, under the 0.85 cap
    assert!((hanging.confidence - 0.8).abs() < 1e-9);

    // the same geometry co-occurs as a plain hammer (no downtrend bonus)
    assert!(find(&signals, PatternKind::Hammer).is_some());
}

#[test]
fn test_hanging_man_absent_without_uptrend() {
    let mut bars = hammer_context(false);
    bars.push((100.5, 101.1, 99.5, 101.0));

    let signals = classifier().classify(&series(&bars)).unwrap();
    assert!(find(&signals, PatternKind::HangingMan).is_none());
}

// ============================================================
// SPINNING TOP / MARUBOZU
// ============================================================

#[test]
fn test_spinning_top() {
    let mut bars: Vec<(f64, f64, f64, f64)> = (0..3)
        .map(|_| (100.0, 101.2, 99.8, 101.0))
        .collect();
    // body 0.3 between 0.5-wide shadows
    bars.push((100.0, 100.8, 99.5, 100.3));

    let signals = classifier().classify(&series(&bars)).unwrap();
    let top = find(&signals, PatternKind::SpinningTop).expect("spinning top should fire");
    assert_eq!(top.pattern_type, PatternType::Neutral);
    assert_eq!(top.confidence, 0.6);
}

#[test]
fn test_marubozu_direction_follows_bar() {
    let context: Vec<(f64, f64, f64, f64)> = (0..3).map(|_| (100.0, 101.2, 99.8, 101.0)).collect();

    let mut bullish = context.clone();
    bullish.push((100.0, 103.05, 99.97, 103.0));
    let signals = classifier().classify(&series(&bullish)).unwrap();
    let m = find(&signals, PatternKind::Marubozu).expect("bullish marubozu");
    assert_eq!(m.pattern_type, PatternType::Bullish);
    // 0.7 + (3.0 / 3.08) * 0.2
    assert!((m.confidence - (0.7 + (3.0 / 3.08) * 0.2)).abs() < 1e-9);

    let mut bearish = context;
    bearish.push((103.0, 103.03, 99.95, 100.0));
    let signals = classifier().classify(&series(&bearish)).unwrap();
    let m = find(&signals, PatternKind::Marubozu).expect("bearish marubozu");
    assert_eq!(m.pattern_type, PatternType::Bearish);
}

// ============================================================
// ENGULFING / HARAMI
// ============================================================

#[test]
fn test_bullish_engulfing_boundary_does_not_fire() {
    // prev body 10, curr body 13: 13 < 1.5 * 10, so the pattern must not fire
    // even though the price containment checks pass
    let bars = vec![
        (100.0, 101.5, 99.0, 101.0),
        (101.0, 101.5, 99.0, 101.0),
        (110.0, 110.5, 99.5, 100.0),
        (99.0, 113.0, 98.0, 112.0),
    ];
    let signals = classifier().classify(&series(&bars)).unwrap();
    assert!(find(&signals, PatternKind::BullishEngulfing).is_none());
}

#[test]
fn test_bullish_engulfing_fires_above_ratio() {
    let bars = vec![
        (100.0, 101.5, 99.0, 101.0),
        (101.0, 101.5, 99.0, 101.0),
        (110.0, 110.5, 99.5, 100.0),
        (99.0, 117.0, 98.0, 115.5), // body 16.5 > 1.5 * 10
    ];
    let signals = classifier().classify(&series(&bars)).unwrap();
    let engulfing = find(&signals, PatternKind::BullishEngulfing).expect("engulfing");
    assert_eq!(engulfing.pattern_type, PatternType::Bullish);
    // 0.75 + min(1.65 / 10, 0.2) = 0.915
    assert!((engulfing.confidence - 0.915).abs() < 1e-9);
}

#[test]
fn test_bearish_engulfing() {
    let bars = vec![
        (100.0, 101.5, 99.0, 101.0),
        (101.0, 101.5, 99.0, 101.0),
        (100.0, 110.5, 99.5, 110.0),
        (111.0, 112.0, 93.0, 94.0), // bearish body 17 engulfing body 10
    ];
    let signals = classifier().classify(&series(&bars)).unwrap();
    let engulfing = find(&signals, PatternKind::BearishEngulfing).expect("engulfing");
    assert_eq!(engulfing.pattern_type, PatternType::Bearish);
}

#[test]
fn test_bullish_harami() {
    let bars = vec![
        (100.0, 101.5, 99.0, 101.0),
        (101.0, 101.5, 99.0, 101.0),
        (110.0, 110.5, 99.5, 100.0), // bearish body 10
        (102.0, 104.5, 101.5, 104.0), // bullish body 2, strictly inside
    ];
    let signals = classifier().classify(&series(&bars)).unwrap();
    let harami = find(&signals, PatternKind::BullishHarami).expect("harami");
    assert_eq!(harami.confidence, 0.65);
}

#[test]
fn test_harami_boundary_body_does_not_fire() {
    // curr body exactly half the prev body: the strict < fails
    let bars = vec![
        (100.0, 101.5, 99.0, 101.0),
        (101.0, 101.5, 99.0, 101.0),
        (110.0, 110.5, 99.5, 100.0),
        (102.0, 107.5, 101.5, 107.0), // body 5.0 = 0.5 * 10
    ];
    let signals = classifier().classify(&series(&bars)).unwrap();
    assert!(find(&signals, PatternKind::BullishHarami).is_none());
}

#[test]
fn test_bearish_harami() {
    let bars = vec![
        (100.0, 101.5, 99.0, 101.0),
        (101.0, 101.5, 99.0, 101.0),
        (100.0, 110.5, 99.5, 110.0), // bullish body 10
        (108.0, 108.5, 105.5, 106.0), // bearish body 2, strictly inside
    ];
    let signals = classifier().classify(&series(&bars)).unwrap();
    assert!(find(&signals, PatternKind::BearishHarami).is_some());
}

// ============================================================
// THREE-BAR PATTERNS
// ============================================================

#[test]
fn test_morning_star() {
    let bars = vec![
        (110.0, 110.5, 104.5, 105.0), // bearish body 5
        (104.0, 104.6, 103.4, 104.5), // small pause below both neighbors
        (105.0, 110.6, 104.4, 110.0), // bullish recovery past the midpoint
    ];
    let signals = classifier().classify(&series(&bars)).unwrap();
    let star = find(&signals, PatternKind::MorningStar).expect("morning star");
    assert_eq!(star.pattern_type, PatternType::Bullish);
    assert_eq!(star.confidence, 0.8);
}

#[test]
fn test_evening_star() {
    let bars = vec![
        (105.0, 110.5, 104.5, 110.0), // bullish body 5
        (111.0, 111.6, 110.4, 111.5), // small pause above both neighbors
        (111.0, 111.5, 104.5, 105.5), // bearish drop past the midpoint
    ];
    let signals = classifier().classify(&series(&bars)).unwrap();
    let star = find(&signals, PatternKind::EveningStar).expect("evening star");
    assert_eq!(star.pattern_type, PatternType::Bearish);
    assert_eq!(star.confidence, 0.8);
}

#[test]
fn test_morning_star_needs_dominant_outer_bodies() {
    // middle body too large relative to the outer bars
    let bars = vec![
        (110.0, 110.5, 104.5, 105.0),
        (104.0, 107.6, 103.4, 107.5),
        (105.0, 110.6, 104.4, 110.0),
    ];
    let signals = classifier().classify(&series(&bars)).unwrap();
    assert!(find(&signals, PatternKind::MorningStar).is_none());
}

#[test]
fn test_three_white_soldiers_scenario() {
    let bars = vec![
        (100.0, 105.1, 99.9, 105.0),
        (105.0, 111.1, 104.9, 111.0),
        (111.0, 118.1, 110.9, 118.0),
    ];
    let signals = classifier().classify(&series(&bars)).unwrap();
    let soldiers = find(&signals, PatternKind::ThreeWhiteSoldiers).expect("soldiers");
    assert_eq!(soldiers.pattern_type, PatternType::Bullish);
    assert_eq!(soldiers.confidence, 0.85);
}

#[test]
fn test_three_white_soldiers_rejects_long_upper_wicks() {
    let bars = vec![
        (100.0, 107.5, 99.9, 105.0), // upper wick 2.5 >= 0.3 * body 5
        (105.0, 111.1, 104.9, 111.0),
        (111.0, 118.1, 110.9, 118.0),
    ];
    let signals = classifier().classify(&series(&bars)).unwrap();
    assert!(find(&signals, PatternKind::ThreeWhiteSoldiers).is_none());
}

#[test]
fn test_three_black_crows() {
    let bars = vec![
        (118.0, 118.1, 110.9, 111.0),
        (111.0, 111.1, 104.9, 105.0),
        (105.0, 105.1, 99.9, 100.0),
    ];
    let signals = classifier().classify(&series(&bars)).unwrap();
    let crows = find(&signals, PatternKind::ThreeBlackCrows).expect("crows");
    assert_eq!(crows.pattern_type, PatternType::Bearish);
    assert_eq!(crows.confidence, 0.85);
}

// ============================================================
// CROSS-CUTTING PROPERTIES
// ============================================================

/// Per-kind confidence ceilings from the rule formulas.
fn cap(kind: PatternKind) -> f64 {
    match kind {
        PatternKind::Doji => 0.9,
        PatternKind::Hammer => 0.95,
        PatternKind::InvertedHammer => 0.9,
        PatternKind::HangingMan => 0.85,
        PatternKind::SpinningTop => 0.6,
        PatternKind::Marubozu => 0.9,
        PatternKind::BullishEngulfing | PatternKind::BearishEngulfing => 0.95,
        PatternKind::BullishHarami | PatternKind::BearishHarami => 0.65,
        PatternKind::MorningStar | PatternKind::EveningStar => 0.8,
        PatternKind::ThreeWhiteSoldiers | PatternKind::ThreeBlackCrows => 0.85,
    }
}

/// Deterministic pseudo-random walk, same flavor as the bench generator.
fn random_walk(n: usize) -> Vec<(f64, f64, f64, f64)> {
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;
    for i in 0..n {
        let change = ((i * 7 + 13) % 100) as f64 / 25.0 - 2.0;
        let volatility = 1.0 + ((i * 3) % 10) as f64 / 5.0;
        let o = price;
        let c = price + change;
        let h = o.max(c) + volatility * 0.5;
        let l = o.min(c) - volatility * 0.5;
        bars.push((o, h, l, c));
        price = c;
    }
    bars
}

#[test]
fn test_scan_confidences_stay_under_caps() {
    let s = series(&random_walk(500));
    let signals = classifier().scan(&s).unwrap();
    assert!(!signals.is_empty(), "walk should produce some signals");
    for signal in &signals {
        assert!(
            signal.confidence >= 0.0 && signal.confidence <= cap(signal.kind),
            "{} confidence {} above cap {}",
            signal.name(),
            signal.confidence,
            cap(signal.kind)
        );
    }
}

#[test]
fn test_signals_carry_bar_coordinates() {
    let mut bars: Vec<(f64, f64, f64, f64)> =
        (0..10).map(|_| (100.0, 105.5, 99.5, 105.0)).collect();
    bars.push((100.0, 101.0, 99.0, 100.05));

    let s = series(&bars);
    let signals = classifier().classify(&s).unwrap();
    let last = s.last().unwrap();
    for signal in &signals {
        assert_eq!(signal.symbol, "TEST");
        assert_eq!(signal.timeframe, "1m");
        assert_eq!(signal.timestamp, last.timestamp);
        assert_eq!(signal.price, last.close);
        assert_eq!(signal.high, last.high);
        assert_eq!(signal.low, last.low);
        assert_eq!(signal.detected_at, last.timestamp);
    }
}

#[test]
fn test_malformed_bar_degrades_to_no_signal() {
    let mut bars: Vec<(f64, f64, f64, f64)> =
        (0..5).map(|_| (100.0, 105.5, 99.5, 105.0)).collect();
    bars.push((f64::NAN, f64::NAN, f64::NAN, f64::NAN));

    let signals = classifier().classify(&series(&bars)).unwrap();
    assert!(signals.is_empty());
}

#[test]
fn test_classify_parallel() {
    let a = series(&random_walk(100));
    let mut down: Vec<(f64, f64, f64, f64)> = (0..50)
        .map(|i| {
            let base = 200.0 - i as f64 * 2.0;
            (base + 1.0, base + 2.0, base - 1.0, base - 0.5)
        })
        .collect();
    down.push((100.5, 101.1, 99.5, 101.0));
    let b = CandleSeries::new(
        "SYM2",
        "1m",
        down.iter()
            .enumerate()
            .map(|(i, &(o, h, l, c))| Candle::new(o, h, l, c, i as i64 * 60_000))
            .collect(),
    )
    .unwrap();

    let c = classifier();
    let all = vec![a, b];
    let (results, errors) = classify_parallel(&c, &all);
    assert_eq!(results.len(), 2);
    assert!(errors.is_empty());
}

#[test]
fn test_scan_matches_classify_on_last_bar() {
    let s = series(&random_walk(120));
    let c = classifier();
    let scanned = c.scan(&s).unwrap();
    let last_ts = s.last().unwrap().timestamp;
    let from_scan: Vec<_> = scanned.iter().filter(|x| x.timestamp == last_ts).collect();
    let direct = c.classify(&s).unwrap();
    assert_eq!(from_scan.len(), direct.len());
    for (a, b) in from_scan.iter().zip(direct.iter()) {
        assert_eq!(**a, *b);
    }
}
