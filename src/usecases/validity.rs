//! Validity Engine - Per-cycle Invalidation Triggers
//!
//! Evaluated over the whole selection batch before any sizing. A
//! selection transitions valid → invalid exactly once; re-evaluating
//! an already-invalid selection never flips the reason or timestamp,
//! and a trigger that reverts on a later cycle cannot resurrect it.
//!
//! Triggers:
//! - PLACE market runner count fell to <= 7 from >= 8 → cash out
//! - short-priced favourite withdrawn (WIN or PLACE) → cash out
//! - minutes-to-race < 1 (race in play) → matched stake stands, no cash-out
//! - external manual void request → cash out

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::selection::{
    InvalidationReason, MarketId, MarketType, Selection, StrategyRef,
};

/// Minutes-to-race below which a race counts as started.
const RACE_START_MINUTES: f64 = 1.0;

/// An invalidation that fired this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    /// Selection that was invalidated.
    pub unique_id: StrategyRef,
    /// Market the selection sits on.
    pub market_id: MarketId,
    /// Which trigger fired.
    pub reason: InvalidationReason,
}

/// Evaluates invalidation triggers over a selection batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidityEngine;

impl ValidityEngine {
    /// Annotate the batch in place and return the invalidations that
    /// fired this cycle.
    ///
    /// Already-invalid selections are a no-op transition, but ones
    /// whose cash-out has not yet gone through are re-queued so a
    /// failed cash-out is retried by re-evaluation on the next cycle.
    pub fn evaluate(
        &self,
        selections: &mut [Selection],
        now: DateTime<Utc>,
    ) -> Vec<Invalidation> {
        let mut fired = Vec::new();

        for selection in selections.iter_mut() {
            if !selection.valid {
                let pending_cash_out = selection
                    .invalidated_reason
                    .as_deref()
                    .and_then(InvalidationReason::parse)
                    .is_some_and(InvalidationReason::wants_cash_out);
                if pending_cash_out && !selection.cashed_out {
                    selection.cash_out_queued = true;
                }
                continue;
            }

            let Some(reason) = Self::trigger(selection) else {
                continue;
            };

            selection.invalidate(reason, now);
            selection.newly_invalidated = true;
            if reason.wants_cash_out() {
                selection.cash_out_queued = true;
            }

            info!(
                unique_id = %selection.unique_id,
                market_id = %selection.market_id,
                reason = %reason,
                size_matched = selection.size_matched,
                "Selection invalidated"
            );

            fired.push(Invalidation {
                unique_id: selection.unique_id.clone(),
                market_id: selection.market_id.clone(),
                reason,
            });
        }

        fired
    }

    /// First matching trigger for a still-valid selection.
    fn trigger(selection: &Selection) -> Option<InvalidationReason> {
        let snapshot = &selection.snapshot;

        if selection.market_type == MarketType::Place
            && snapshot.runner_count <= 7
            && snapshot.runner_count_at_creation >= 8
        {
            return Some(InvalidationReason::EightToSevenPlace);
        }
        if snapshot.short_priced_runner_removed {
            return Some(InvalidationReason::ShortPriceRemoved);
        }
        if snapshot.minutes_to_race < RACE_START_MINUTES {
            return Some(InvalidationReason::RaceStarted);
        }
        if selection.void_requested {
            return Some(InvalidationReason::ManualVoid);
        }
        None
    }
}
