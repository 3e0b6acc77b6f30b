//! Decision Engine - Batch State to Concrete Actions
//!
//! Pure function over the validity-annotated selection batch: no I/O,
//! no clock, no mutation. Produces three disjoint lists — orders to
//! place, market ids to cash out, and invalidations to persist — which
//! the executor then applies against the exchange and the stores.
//!
//! The cycle target handed to the sizer is the base stake scaled by
//! the ramp schedule, so exposure builds up across cycles as the race
//! approaches and is never clawed back.

use tracing::debug;

use crate::domain::schedule::StakeSchedule;
use crate::domain::selection::{MarketId, OrderRequest, Selection, Side, StrategyRef};
use crate::domain::sizing::StakeSizer;

/// Everything one cycle wants done, in one value.
#[derive(Debug, Clone, Default)]
pub struct CycleActions {
    /// Orders to place, one at most per selection.
    pub orders: Vec<OrderRequest>,
    /// Markets to close out, deduplicated across selections.
    pub cash_out_markets: Vec<MarketId>,
    /// `(unique_id, reason)` invalidations that fired this cycle.
    pub invalidations: Vec<(StrategyRef, String)>,
}

/// Turns a selection batch into cycle actions.
pub struct DecisionEngine {
    /// Stake and liability math.
    sizer: StakeSizer,
    /// Stake ramp over minutes-to-race.
    schedule: StakeSchedule,
    /// Minimum top-of-book size required to trust a quote.
    min_liquidity: f64,
}

impl DecisionEngine {
    /// Create a decision engine.
    pub fn new(sizer: StakeSizer, schedule: StakeSchedule, min_liquidity: f64) -> Self {
        Self {
            sizer,
            schedule,
            min_liquidity,
        }
    }

    /// Decide this cycle's actions for an annotated batch.
    pub fn decide(&self, selections: &[Selection]) -> CycleActions {
        let mut actions = CycleActions::default();

        for selection in selections {
            if selection.newly_invalidated {
                if let Some(reason) = &selection.invalidated_reason {
                    actions
                        .invalidations
                        .push((selection.unique_id.clone(), reason.clone()));
                }
            }

            if selection.cash_out_queued
                && self.market_has_matched_stake(selections, &selection.market_id)
                && !actions.cash_out_markets.contains(&selection.market_id)
            {
                actions.cash_out_markets.push(selection.market_id.clone());
            }

            if !selection.is_active() {
                continue;
            }

            let fraction = self.schedule.fraction(selection.snapshot.minutes_to_race);
            let cycle_target = selection.target_stake * fraction;
            let decision = self.sizer.size(selection, cycle_target);

            if !decision.should_bet {
                debug!(
                    unique_id = %selection.unique_id,
                    reason = decision.reason.as_deref().unwrap_or(""),
                    "Sizer skipped selection"
                );
                continue;
            }

            // A quote backed by almost no money is noise, not a price.
            let depth = match selection.side {
                Side::Back => selection.snapshot.best_back_size,
                Side::Lay => selection.snapshot.best_lay_size,
            };
            if depth < self.min_liquidity {
                debug!(
                    unique_id = %selection.unique_id,
                    depth,
                    min = self.min_liquidity,
                    "Top-of-book too thin, skipping"
                );
                continue;
            }

            actions.orders.push(OrderRequest {
                strategy_ref: selection.unique_id.clone(),
                market_id: selection.market_id.clone(),
                selection_id: selection.selection_id,
                side: selection.side,
                price: decision.price,
                size: decision.size,
                cycle_target,
            });
        }

        actions
    }

    /// Cash-out is only worth requesting for markets where something
    /// is actually matched; zero-matched invalid selections simply
    /// stop receiving orders.
    fn market_has_matched_stake(&self, selections: &[Selection], market_id: &str) -> bool {
        selections
            .iter()
            .any(|s| s.market_id == market_id && s.size_matched > 0.0)
    }
}
