//! Stake and liability sizing.
//!
//! Pure per-selection math answering one question each cycle: how much
//! additional stake is still owed, and at what price. BACK sizes on
//! stake, LAY sizes on liability (`stake × (price − 1)`), converted to
//! stake at the current best lay price.
//!
//! Everything rounds **down** to 2 decimals — a sized order must never
//! exceed the intended exposure. Sizing and average-price projection
//! are computed together so the fully-matched check can never disagree
//! with the order that was placed.
//!
//! Uses `Decimal` internally for the money math and `f64` at the
//! boundary, so callers never import `Decimal`.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use super::ladder;
use super::selection::{Selection, Side};

/// Outcome of sizing one selection for one cycle.
///
/// A "can't bet right now" case is a value, not an error: the next
/// cycle simply re-evaluates from fresh market state.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeDecision {
    /// Whether an order should be placed.
    pub should_bet: bool,
    /// Stake to request, floored to 2 decimals. Zero when skipping.
    pub size: f64,
    /// Ladder-valid price to place at. Zero when skipping.
    pub price: f64,
    /// Why the selection was skipped, when it was.
    pub reason: Option<String>,
}

impl SizeDecision {
    fn bet(size: Decimal, price: f64) -> Self {
        Self {
            should_bet: true,
            size: size.to_f64().unwrap_or(0.0),
            price,
            reason: None,
        }
    }

    fn skip(reason: impl Into<String>) -> Self {
        Self {
            should_bet: false,
            size: 0.0,
            price: 0.0,
            reason: Some(reason.into()),
        }
    }
}

/// Fold a new fill into an existing position, returning the updated
/// `(size, average_price)` pair.
///
/// Shared by sizing projection and reconciliation so both always agree
/// on what a position's average is.
pub fn fold_fill(size: f64, avg_price: f64, fill_size: f64, fill_price: f64) -> (f64, f64) {
    if fill_size <= 0.0 {
        return (size, avg_price);
    }
    if size <= 0.0 {
        return (fill_size, fill_price);
    }
    let total = size + fill_size;
    let avg = (size * avg_price + fill_size * fill_price) / total;
    (total, avg)
}

/// Stake sizer with the exchange's practical order limits.
#[derive(Debug, Clone)]
pub struct StakeSizer {
    /// Minimum order size the exchange accepts (currency units).
    min_stake: Decimal,
    /// Fully-matched tolerance; a rounding allowance, not a business
    /// rule.
    tolerance: Decimal,
}

impl Default for StakeSizer {
    fn default() -> Self {
        Self {
            min_stake: Decimal::ONE,
            tolerance: dec!(0.99),
        }
    }
}

impl StakeSizer {
    /// Create a sizer with explicit limits (both in currency units).
    pub fn new(min_stake: f64, tolerance: f64) -> Self {
        Self {
            min_stake: Decimal::from_f64(min_stake).unwrap_or(Decimal::ONE),
            tolerance: Decimal::from_f64(tolerance).unwrap_or(dec!(0.99)),
        }
    }

    /// Size one selection against a cycle target stake.
    ///
    /// `target_stake` is the schedule-scaled target for this cycle, not
    /// necessarily the selection's full target. Because the remainder is
    /// always `target − matched`, exposure placed under an earlier,
    /// smaller target is never reduced, only topped up.
    pub fn size(&self, selection: &Selection, target_stake: f64) -> SizeDecision {
        match selection.side {
            Side::Back => self.size_back(selection, target_stake),
            Side::Lay => self.size_lay(selection, target_stake),
        }
    }

    fn size_back(&self, selection: &Selection, target_stake: f64) -> SizeDecision {
        let price = ladder::snap(selection.snapshot.best_back_price);
        let target = to_decimal(target_stake);
        let matched = to_decimal(selection.size_matched);
        let avg = to_decimal(selection.average_price_matched);
        let requested = to_decimal(selection.requested_odds);
        let depth = floor_2dp(to_decimal(selection.snapshot.best_back_size));

        let remaining = target - matched;
        if remaining < self.min_stake {
            return SizeDecision::skip("Remaining stake below minimum");
        }

        let size = floor_2dp(remaining.min(depth));
        if size < self.min_stake {
            return SizeDecision::skip("Insufficient depth at best back price");
        }

        // The acceptability check is on the projected position average,
        // not the raw quote: an existing fill above the requested odds
        // buys room to take a slightly worse price, and with no fill at
        // all this reduces to `best_back >= requested_odds`.
        let price_dec = to_decimal(price);
        let projected_avg = if matched > Decimal::ZERO {
            (matched * avg + size * price_dec) / (matched + size)
        } else {
            price_dec
        };
        if projected_avg < requested {
            if matched > Decimal::ZERO {
                return SizeDecision::skip("Projected average below requested odds");
            }
            return SizeDecision::skip("Best back price below requested odds");
        }

        SizeDecision::bet(size, price)
    }

    fn size_lay(&self, selection: &Selection, target_stake: f64) -> SizeDecision {
        let price = ladder::snap(selection.snapshot.best_lay_price);
        if price <= 1.0 {
            return SizeDecision::skip("No lay price available");
        }
        if price > selection.requested_odds {
            return SizeDecision::skip("Best lay price above requested odds");
        }

        let target = to_decimal(target_stake);
        let requested = to_decimal(selection.requested_odds);
        let price_dec = to_decimal(price);
        let depth = floor_2dp(to_decimal(selection.snapshot.best_lay_size));

        let target_liability = target * (requested - Decimal::ONE);
        let matched_liability = to_decimal(selection.matched_liability());
        let remaining_liability = target_liability - matched_liability;
        if remaining_liability < self.min_stake {
            return SizeDecision::skip("Remaining liability below minimum");
        }

        let stake = remaining_liability / (price_dec - Decimal::ONE);
        let size = floor_2dp(stake.min(depth));
        if size < self.min_stake {
            return SizeDecision::skip("Insufficient depth at best lay price");
        }

        SizeDecision::bet(size, price)
    }

    /// Whether the selection's full target exposure has been reached,
    /// within the rounding tolerance.
    pub fn is_fully_matched(&self, selection: &Selection) -> bool {
        let matched = to_decimal(selection.size_matched);
        let target = to_decimal(selection.target_stake);
        match selection.side {
            Side::Back => matched >= target - self.tolerance,
            Side::Lay => {
                let requested = to_decimal(selection.requested_odds);
                let target_liability = target * (requested - Decimal::ONE);
                let matched_liability = to_decimal(selection.matched_liability());
                matched_liability >= target_liability - self.tolerance
            }
        }
    }
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

fn floor_2dp(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}
