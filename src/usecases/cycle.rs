//! Trade Cycle - Fixed-Interval Orchestration
//!
//! One cycle is the unit of progress for the whole engine:
//!
//! 1. Reconcile against the exchange's order list.
//! 2. Fetch the active selection batch, snapshots joined in.
//! 3. Refresh matched totals from the ledger plus live orders.
//! 4. Run validity triggers over the batch.
//! 5. Decide actions (pure).
//! 6. Execute them.
//!
//! A cycle-level error aborts the remainder of that cycle only; the
//! outer loop keeps ticking and the next cycle starts from a fresh
//! fetch. Nothing is retried inside a cycle — re-evaluation on the
//! next tick is the retry.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::ports::exchange::ExchangeClient;
use crate::ports::store::{BetHistoryStore, SelectionStore};

use super::decision::DecisionEngine;
use super::executor::Executor;
use super::validity::ValidityEngine;

/// Counters for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Orders accepted by the exchange this cycle.
    pub orders_placed: u64,
    /// Completed orders migrated into the bet history ledger.
    pub orders_matched: u64,
    /// Exchange calls that failed or were rejected.
    pub orders_failed: u64,
    /// Stale orders cancelled.
    pub orders_cancelled: u64,
    /// Markets successfully cashed out.
    pub cash_outs: u64,
    /// Invalidations that fired.
    pub invalidations: u64,
    /// Store writes that failed and were skipped over.
    pub persistence_failures: u64,
    /// Size of this cycle's active batch (snapshot, not a counter).
    pub active_selections: u64,
}

/// Session-lifetime aggregation of cycle summaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    /// Cycles completed, including empty ones.
    pub cycles: u64,
    /// Cycles that aborted with an error.
    pub cycles_failed: u64,
    /// Running totals across all cycles.
    pub totals: CycleSummary,
}

impl SessionStats {
    /// Fold one cycle's counters into the session totals.
    pub fn absorb(&mut self, summary: &CycleSummary) {
        self.cycles += 1;
        self.totals.orders_placed += summary.orders_placed;
        self.totals.orders_matched += summary.orders_matched;
        self.totals.orders_failed += summary.orders_failed;
        self.totals.orders_cancelled += summary.orders_cancelled;
        self.totals.cash_outs += summary.cash_outs;
        self.totals.invalidations += summary.invalidations;
        self.totals.persistence_failures += summary.persistence_failures;
    }

    /// Record a cycle that aborted before producing a summary.
    pub fn record_failure(&mut self) {
        self.cycles += 1;
        self.cycles_failed += 1;
    }
}

/// Runs the reconcile → evaluate → execute pipeline once per tick.
pub struct TradeCycle<E: ExchangeClient, S: SelectionStore, H: BetHistoryStore> {
    /// Selection source-of-record.
    store: Arc<S>,
    /// Invalidation triggers.
    validity: ValidityEngine,
    /// Pure action planner.
    decision: DecisionEngine,
    /// The only side-effecting component.
    executor: Executor<E, S, H>,
}

impl<E: ExchangeClient, S: SelectionStore, H: BetHistoryStore> TradeCycle<E, S, H> {
    /// Assemble a trade cycle from its stages.
    pub fn new(store: Arc<S>, decision: DecisionEngine, executor: Executor<E, S, H>) -> Self {
        Self {
            store,
            validity: ValidityEngine,
            decision,
            executor,
        }
    }

    /// Run one full cycle and return its counters.
    #[instrument(skip(self), name = "trade_cycle")]
    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        let start = Instant::now();
        let mut summary = CycleSummary::default();

        let live_orders = self.executor.reconcile(&mut summary).await?;

        let mut selections = self.store.fetch_active_selections().await?;
        if selections.is_empty() {
            debug!("No active selections, cycle idle");
            return Ok(summary);
        }
        summary.active_selections = selections.len() as u64;

        self.executor
            .refresh_matched(&mut selections, &live_orders)
            .await?;

        self.validity.evaluate(&mut selections, Utc::now());

        let actions = self.decision.decide(&selections);

        self.executor
            .execute(&actions, &mut selections, &live_orders, &mut summary)
            .await?;

        info!(
            selections = selections.len(),
            orders_placed = summary.orders_placed,
            orders_matched = summary.orders_matched,
            orders_failed = summary.orders_failed,
            orders_cancelled = summary.orders_cancelled,
            cash_outs = summary.cash_outs,
            invalidations = summary.invalidations,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Cycle complete"
        );

        Ok(summary)
    }
}
