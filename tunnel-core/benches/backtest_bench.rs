//! Criterion benchmarks for tunnel-core hot paths.
//!
//! Benchmarks:
//! 1. Indicator precompute (tunnel bounds, wavy band, tunnel lines)
//! 2. Extrema detection over the default lookback
//! 3. Full single-symbol backtest

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tunnel_core::domain::PriceBar;
use tunnel_core::execution::SimulatedVenue;
use tunnel_core::indicators::{compute_indicator_states, IndicatorParams};
use tunnel_core::signals::detect_extrema;
use tunnel_core::{Backtester, StrategyConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<PriceBar> {
    let base = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 1.1000 + (i as f64 * 0.05).sin() * 0.01 + i as f64 * 0.00001;
            PriceBar::new(
                base + Duration::hours(i as i64),
                close - 0.0002,
                close + 0.0008,
                close - 0.0009,
                close,
                1_000.0,
            )
        })
        .collect()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_precompute");
    for n in [1_000usize, 10_000] {
        let bars = make_bars(n);
        let params = IndicatorParams::default();
        group.bench_with_input(BenchmarkId::from_parameter(n), &bars, |b, bars| {
            b.iter(|| compute_indicator_states(black_box(bars), &params))
        });
    }
    group.finish();
}

fn bench_extrema(c: &mut Criterion) {
    let bars = make_bars(100);
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    c.bench_function("extrema_lookback_100", |b| {
        b.iter(|| detect_extrema(black_box(&highs), black_box(&lows), 5))
    });
}

fn bench_backtest(c: &mut Criterion) {
    let mut group = c.benchmark_group("backtest");
    group.sample_size(20);
    let bt = Backtester::new(StrategyConfig::default()).expect("default config is valid");
    for n in [1_000usize, 5_000] {
        let bars = make_bars(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &bars, |b, bars| {
            b.iter(|| {
                let mut venue = SimulatedVenue::new();
                bt.run("EURUSD", black_box(bars), &mut venue)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_indicators, bench_extrema, bench_backtest);
criterion_main!(benches);
