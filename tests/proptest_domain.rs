//! Property-Based Tests — Domain Layer Invariants
//!
//! Uses `proptest` to verify that the ladder, sizer and schedule
//! maintain their invariants across random inputs.

use chrono::Utc;
use proptest::prelude::*;

use betfair_exec_bot::domain::ladder;
use betfair_exec_bot::domain::schedule::StakeSchedule;
use betfair_exec_bot::domain::selection::{MarketSnapshot, MarketType, Selection, Side};
use betfair_exec_bot::domain::sizing::{StakeSizer, fold_fill};

fn selection(side: Side) -> Selection {
    Selection {
        unique_id: "sel-1".to_string(),
        race_id: "race-1".to_string(),
        race_time: Utc::now(),
        horse_id: "h-1".to_string(),
        horse_name: "Test Runner".to_string(),
        market_id: "1.1".to_string(),
        selection_id: 42,
        side,
        market_type: MarketType::Win,
        requested_odds: 1.01,
        target_stake: 50.0,
        snapshot: MarketSnapshot {
            best_back_price: 3.0,
            best_back_size: 100.0,
            best_lay_price: 3.05,
            best_lay_size: 100.0,
            runner_count: 8,
            runner_count_at_creation: 8,
            short_priced_runner_removed: false,
            minutes_to_race: 30.0,
        },
        void_requested: false,
        valid: true,
        invalidated_at: None,
        invalidated_reason: None,
        cashed_out: false,
        fully_matched: false,
        size_matched: 0.0,
        average_price_matched: 0.0,
        processed_at: None,
        cash_out_queued: false,
        newly_invalidated: false,
    }
}

// ── Ladder Properties ───────────────────────────────────────

proptest! {
    /// Snapping always lands on the ladder, for any input.
    #[test]
    fn snap_always_lands_on_ladder(price in 0.0f64..2000.0) {
        let snapped = ladder::snap(price);
        prop_assert!(ladder::is_valid(snapped), "snap({price}) = {snapped} is off-ladder");
    }

    /// Snapping is idempotent.
    #[test]
    fn snap_is_idempotent(price in 1.0f64..1100.0) {
        let snapped = ladder::snap(price);
        prop_assert_eq!(ladder::snap(snapped), snapped);
    }

    /// `snap_down` never raises a price, `snap_up` never lowers one
    /// (within the ladder's range, where clamping cannot kick in).
    #[test]
    fn snap_directions_bracket_the_input(price in 1.01f64..1000.0) {
        let down = ladder::snap_down(price);
        let up = ladder::snap_up(price);
        prop_assert!(down <= price + 1e-9);
        prop_assert!(up >= price - 1e-9);
        prop_assert!(down <= up);
    }

    /// Tick stepping and tick distance agree with each other.
    #[test]
    fn ticks_between_inverts_ticks_away(price in 1.2f64..900.0, n in -10i64..10) {
        let start = ladder::snap(price);
        let stepped = ladder::ticks_away(start, n);
        // Clamping at the bounds can absorb steps; re-measure instead
        // of assuming n survived.
        let measured = ladder::ticks_between(start, stepped);
        prop_assert_eq!(ladder::ticks_away(start, measured), stepped);
    }
}

// ── Sizer Properties ────────────────────────────────────────

proptest! {
    /// A sized BACK stake never exceeds the remaining target and is
    /// always an exact 2-decimal amount.
    #[test]
    fn back_size_never_exceeds_remaining(
        target in 2.0f64..500.0,
        matched in 0.0f64..400.0,
        depth in 0.0f64..600.0,
    ) {
        let sizer = StakeSizer::default();
        let mut sel = selection(Side::Back);
        sel.target_stake = target;
        sel.size_matched = matched;
        sel.average_price_matched = if matched > 0.0 { 3.0 } else { 0.0 };
        sel.snapshot.best_back_size = depth;

        let decision = sizer.size(&sel, target);
        if decision.should_bet {
            prop_assert!(decision.size <= target - matched + 1e-9);
            prop_assert!(decision.size <= depth + 1e-9);
            prop_assert!(decision.size >= 1.0);
            let cents = decision.size * 100.0;
            prop_assert!((cents - cents.round()).abs() < 1e-6, "size {} not 2dp", decision.size);
        }
    }

    /// A sized LAY stake never pushes liability past the remaining
    /// liability: floor-rounding only ever undershoots.
    #[test]
    fn lay_liability_never_exceeds_remaining(
        target in 2.0f64..200.0,
        lay_price in 1.5f64..10.0,
    ) {
        let sizer = StakeSizer::default();
        let mut sel = selection(Side::Lay);
        sel.target_stake = target;
        sel.requested_odds = 12.0;
        sel.snapshot.best_lay_price = lay_price;
        sel.snapshot.best_lay_size = 10_000.0;

        let decision = sizer.size(&sel, target);
        if decision.should_bet {
            let target_liability = target * (sel.requested_odds - 1.0);
            let liability = decision.size * (decision.price - 1.0);
            prop_assert!(
                liability <= target_liability + 1e-6,
                "liability {liability} exceeds target {target_liability}"
            );
            prop_assert!(ladder::is_valid(decision.price));
        }
    }

    /// The emitted price is always on the ladder.
    #[test]
    fn sized_price_always_on_ladder(back_price in 1.02f64..999.0) {
        let sizer = StakeSizer::default();
        let mut sel = selection(Side::Back);
        sel.snapshot.best_back_price = back_price;
        let decision = sizer.size(&sel, 50.0);
        if decision.should_bet {
            prop_assert!(ladder::is_valid(decision.price));
        }
    }

    /// Folding fills conserves notional: the average times the size
    /// equals the sum of the parts.
    #[test]
    fn fold_fill_conserves_notional(
        size in 0.0f64..500.0,
        avg in 1.01f64..100.0,
        fill in 0.01f64..500.0,
        price in 1.01f64..100.0,
    ) {
        let (total, new_avg) = fold_fill(size, avg, fill, price);
        let before = size * avg + fill * price;
        prop_assert!((total * new_avg - before).abs() < 1e-6);
        prop_assert_eq!(total, size + fill);
    }
}

// ── Schedule Properties ─────────────────────────────────────

proptest! {
    /// The fraction never shrinks as the race approaches.
    #[test]
    fn schedule_fraction_monotone(m1 in -5.0f64..600.0, m2 in -5.0f64..600.0) {
        let schedule = StakeSchedule::default();
        let (nearer, further) = if m1 <= m2 { (m1, m2) } else { (m2, m1) };
        prop_assert!(schedule.fraction(nearer) >= schedule.fraction(further));
    }

    /// The fraction is always usable as a stake multiplier.
    #[test]
    fn schedule_fraction_in_unit_interval(minutes in -60.0f64..10_000.0) {
        let schedule = StakeSchedule::default();
        let fraction = schedule.fraction(minutes);
        prop_assert!(fraction > 0.0 && fraction <= 1.0);
    }
}
