//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Bound ordering: tunnel upper >= lower wherever both are defined
//! 2. Signal idempotence: same inputs, same decision
//! 3. Extrema spacing: emitted peaks are at least `peak_type` bars apart
//! 4. Daily trade cap: never more entries in a day than allowed
//! 5. Sizer output: always on the lot grid and inside the limits

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use tunnel_core::domain::PriceBar;
use tunnel_core::execution::SimulatedVenue;
use tunnel_core::indicators::{compute_indicator_states, tunnel_bounds, IndicatorParams};
use tunnel_core::signals::{extrema_indices, TunnelSignal};
use tunnel_core::sizers::{LotLimits, PipRiskSizer, Sizer};
use tunnel_core::{Backtester, StrategyConfig};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_returns(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.002..0.002_f64, len)
}

fn walk(returns: &[f64]) -> Vec<f64> {
    let mut price = 1.2000;
    returns
        .iter()
        .map(|r| {
            price += r;
            price
        })
        .collect()
}

fn hourly_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base = Utc.with_ymd_and_hms(2024, 2, 5, 0, 0, 0).unwrap();
    let mut prev = closes[0];
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let bar = PriceBar::new(
                base + Duration::hours(i as i64),
                prev,
                prev.max(close) + 0.0004,
                prev.min(close) - 0.0004,
                close,
                100.0,
            );
            prev = close;
            bar
        })
        .collect()
}

// ── 1. Bound ordering ────────────────────────────────────────────────

proptest! {
    #[test]
    fn upper_never_below_lower(
        closes in prop::collection::vec(0.5..2.0_f64, 5..120),
        period in 1usize..30,
        k in 0.0..4.0_f64,
    ) {
        prop_assume!(closes.len() >= period);
        let b = tunnel_bounds(&closes, period, k).unwrap();
        for (u, l) in b.upper.iter().zip(&b.lower) {
            if let (Some(u), Some(l)) = (u, l) {
                prop_assert!(u >= l);
            }
        }
    }
}

// ── 2. Signal idempotence ────────────────────────────────────────────

proptest! {
    #[test]
    fn signal_is_idempotent(returns in arb_returns(40..90), peak_type in 0usize..8) {
        let bars = hourly_bars(&walk(&returns));
        let params = IndicatorParams { period: 10, wavy_period: 8, ..Default::default() };
        let states = compute_indicator_states(&bars, &params).unwrap();
        let rule = TunnelSignal::new(peak_type, 50);
        for i in 0..bars.len() {
            prop_assert_eq!(
                rule.evaluate_at(&bars, &states, i),
                rule.evaluate_at(&bars, &states, i)
            );
        }
    }

    /// Decisions at bar t never change when later bars are appended.
    #[test]
    fn signal_ignores_future_bars(returns in arb_returns(60..90), cut in 30usize..55) {
        let bars = hourly_bars(&walk(&returns));
        let params = IndicatorParams { period: 10, wavy_period: 8, ..Default::default() };
        let full = compute_indicator_states(&bars, &params).unwrap();
        let prefix = compute_indicator_states(&bars[..cut], &params).unwrap();
        let rule = TunnelSignal::new(3, 40);
        for i in 0..cut {
            prop_assert_eq!(
                rule.evaluate_at(&bars, &full, i).kind(),
                rule.evaluate_at(&bars[..cut], &prefix, i).kind()
            );
        }
    }
}

// ── 3. Extrema spacing ───────────────────────────────────────────────

proptest! {
    #[test]
    fn emitted_peaks_respect_distance(
        values in prop::collection::vec(0.0..10.0_f64, 3..80),
        peak_type in 2usize..10,
    ) {
        let idx = extrema_indices(&values, peak_type, Ordering::Greater);
        for pair in idx.windows(2) {
            prop_assert!(pair[1] - pair[0] >= peak_type);
        }
        for &i in &idx {
            prop_assert!(i > 0 && i < values.len() - 1);
            prop_assert!(values[i] > values[i - 1] && values[i] > values[i + 1]);
        }
    }
}

// ── 4. Daily trade cap ───────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn entries_per_day_never_exceed_cap(
        returns in arb_returns(80..200),
        cap in 1u32..4,
    ) {
        let config = StrategyConfig {
            period: 10,
            wavy_period: 8,
            peak_type: 3,
            stop_loss_pips: 8.0,
            take_profit_pips: 8.0,
            max_trades_per_day: cap,
            ..Default::default()
        };
        let bars = hourly_bars(&walk(&returns));
        let bt = Backtester::new(config).unwrap();
        let report = bt.run("EURUSD", &bars, &mut SimulatedVenue::new()).unwrap();

        let mut per_day: HashMap<NaiveDate, u32> = HashMap::new();
        for t in &report.ledger {
            *per_day.entry(t.entry_time.date_naive()).or_default() += 1;
        }
        prop_assert!(per_day.values().all(|&n| n <= cap));
        prop_assert_eq!(report.summary.total_trades, report.ledger.len());
    }
}

// ── 5. Sizer output ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn size_on_grid_and_within_limits(
        equity in 100.0..1_000_000.0_f64,
        stop_pips in 1.0..500.0_f64,
        risk in 0.001..0.05_f64,
    ) {
        let limits = LotLimits { min_lot: 0.01, max_lot: 50.0, lot_step: 0.01 };
        let sizer = PipRiskSizer::new(risk, 10.0, limits).unwrap();
        let lots = sizer.size(equity, stop_pips).unwrap();
        prop_assert!(lots >= limits.min_lot - 1e-12);
        prop_assert!(lots <= limits.max_lot + 1e-9);
        let steps = lots / limits.lot_step;
        prop_assert!((steps - steps.round()).abs() < 1e-6);
    }
}
