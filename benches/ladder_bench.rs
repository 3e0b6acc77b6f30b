//! Ladder and Sizing Benchmarks — Hot-Path Performance Validation
//!
//! Benchmarks the domain functions that run on every trade cycle for
//! every active selection.
//!
//! Run with: cargo bench --bench ladder_bench

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use betfair_exec_bot::domain::ladder;
use betfair_exec_bot::domain::schedule::StakeSchedule;
use betfair_exec_bot::domain::selection::{MarketSnapshot, MarketType, Selection, Side};
use betfair_exec_bot::domain::sizing::StakeSizer;

fn selection() -> Selection {
    Selection {
        unique_id: "sel-1".to_string(),
        race_id: "race-1".to_string(),
        race_time: Utc::now(),
        horse_id: "h-1".to_string(),
        horse_name: "Bench Runner".to_string(),
        market_id: "1.1".to_string(),
        selection_id: 42,
        side: Side::Back,
        market_type: MarketType::Win,
        requested_odds: 3.0,
        target_stake: 50.0,
        snapshot: MarketSnapshot {
            best_back_price: 3.05,
            best_back_size: 120.0,
            best_lay_price: 3.1,
            best_lay_size: 80.0,
            runner_count: 8,
            runner_count_at_creation: 8,
            short_priced_runner_removed: false,
            minutes_to_race: 25.0,
        },
        void_requested: false,
        valid: true,
        invalidated_at: None,
        invalidated_reason: None,
        cashed_out: false,
        fully_matched: false,
        size_matched: 12.5,
        average_price_matched: 3.1,
        processed_at: None,
        cash_out_queued: false,
        newly_invalidated: false,
    }
}

/// Benchmark snapping an arbitrary price onto the ladder.
fn bench_ladder_snap(c: &mut Criterion) {
    c.bench_function("ladder_snap", |b| {
        b.iter(|| {
            let _price = ladder::snap(black_box(3.14159));
        });
    });
}

/// Benchmark stepping a price by a tick count.
fn bench_ladder_ticks_away(c: &mut Criterion) {
    c.bench_function("ladder_ticks_away", |b| {
        b.iter(|| {
            let _price = ladder::ticks_away(black_box(3.05), black_box(-5));
        });
    });
}

/// Benchmark a full BACK sizing pass including 2dp flooring.
fn bench_size_back(c: &mut Criterion) {
    let sizer = StakeSizer::default();
    let sel = selection();

    c.bench_function("size_back", |b| {
        b.iter(|| {
            let _decision = sizer.size(black_box(&sel), black_box(50.0));
        });
    });
}

/// Benchmark a LAY sizing pass with liability conversion.
fn bench_size_lay(c: &mut Criterion) {
    let sizer = StakeSizer::default();
    let mut sel = selection();
    sel.side = Side::Lay;
    sel.requested_odds = 3.2;

    c.bench_function("size_lay", |b| {
        b.iter(|| {
            let _decision = sizer.size(black_box(&sel), black_box(50.0));
        });
    });
}

/// Benchmark a stake schedule lookup.
fn bench_schedule_fraction(c: &mut Criterion) {
    let schedule = StakeSchedule::default();

    c.bench_function("schedule_fraction", |b| {
        b.iter(|| {
            let _fraction = schedule.fraction(black_box(42.0));
        });
    });
}

criterion_group!(
    benches,
    bench_ladder_snap,
    bench_ladder_ticks_away,
    bench_size_back,
    bench_size_lay,
    bench_schedule_fraction,
);
criterion_main!(benches);
