//! Executor / Reconciler - The Only Side-Effecting Component
//!
//! Everything that touches the exchange or durable storage happens
//! here, in three passes per cycle:
//!
//! 1. `reconcile` — pull the venue's authoritative order list, migrate
//!    completed orders into the bet history ledger (idempotent, keyed
//!    by exchange order id), cancel orders stale past the business
//!    timeout, recording any partial fill first.
//! 2. `refresh_matched` — fold ledger records plus live matched
//!    portions into each selection's cached matched fields.
//! 3. `execute` — persist invalidations, run the batched cash-out,
//!    and place orders, re-deriving the remainder from the refreshed
//!    ledger view immediately before each placement so a crash and
//!    restart can never push total requested stake past target.
//!
//! Exchange call failures are logged with the intended parameters and
//! counted; bookkeeping is left untouched so the next cycle retries by
//! re-evaluation, never by an explicit retry loop.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::selection::{
    BetHistoryRecord, ExchangeOrder, OrderRequest, OrderStatus, Selection, StrategyRef,
};
use crate::domain::sizing::{StakeSizer, fold_fill};
use crate::ports::exchange::ExchangeClient;
use crate::ports::store::{BetHistoryStore, SelectionStore};

use super::cycle::CycleSummary;
use super::decision::CycleActions;

/// Applies cycle actions against the exchange and the stores.
pub struct Executor<E: ExchangeClient, S: SelectionStore, H: BetHistoryStore> {
    /// Exchange port.
    exchange: Arc<E>,
    /// Selection source-of-record.
    store: Arc<S>,
    /// Append-only bet history ledger.
    history: Arc<H>,
    /// Shared sizing math (same instance the decision engine uses).
    sizer: StakeSizer,
    /// Business staleness timeout for unmatched orders, in seconds.
    order_timeout_seconds: i64,
}

impl<E: ExchangeClient, S: SelectionStore, H: BetHistoryStore> Executor<E, S, H> {
    /// Create a new executor.
    pub fn new(
        exchange: Arc<E>,
        store: Arc<S>,
        history: Arc<H>,
        sizer: StakeSizer,
        order_timeout_seconds: i64,
    ) -> Self {
        Self {
            exchange,
            store,
            history,
            sizer,
            order_timeout_seconds,
        }
    }

    /// Synchronize the ledger with the exchange's order list.
    ///
    /// Returns the orders still live on the book, which downstream
    /// passes use both for matched totals and to avoid stacking a
    /// second order onto a selection that already has one working.
    #[instrument(skip(self, summary))]
    pub async fn reconcile(&self, summary: &mut CycleSummary) -> Result<Vec<ExchangeOrder>> {
        let orders = self.exchange.list_current_orders().await?;
        let now = Utc::now();
        let mut live = Vec::new();

        for order in orders {
            match order.status {
                OrderStatus::ExecutionComplete => {
                    if order.size_matched <= 0.0 {
                        // Lapsed or cancelled without ever matching.
                        continue;
                    }
                    if self.migrate_order(&order).await {
                        summary.orders_matched += 1;
                    }
                }
                OrderStatus::Executable => {
                    if order.age_seconds(now) < self.order_timeout_seconds {
                        live.push(order);
                        continue;
                    }
                    // Stale: record any partial fill before cancelling
                    // so a fill is never lost to the cancel.
                    if order.size_matched > 0.0 {
                        self.migrate_order(&order).await;
                    }
                    match self.exchange.cancel_order(&order).await {
                        Ok(()) => {
                            info!(
                                order_id = %order.order_id,
                                strategy_ref = %order.strategy_ref,
                                age_seconds = order.age_seconds(now),
                                size_matched = order.size_matched,
                                "Cancelled stale order"
                            );
                            summary.orders_cancelled += 1;
                        }
                        Err(e) => {
                            warn!(
                                order_id = %order.order_id,
                                error = %e,
                                "Failed to cancel stale order"
                            );
                            summary.orders_failed += 1;
                            // Still on the book as far as we know.
                            live.push(order);
                        }
                    }
                }
            }
        }

        Ok(live)
    }

    /// Fold ledger records and live matched portions into each
    /// selection's cached matched fields, and settle the fully-matched
    /// flag. Upserts only the rows that actually moved.
    pub async fn refresh_matched(
        &self,
        selections: &mut [Selection],
        live_orders: &[ExchangeOrder],
    ) -> Result<()> {
        let now = Utc::now();

        for selection in selections.iter_mut() {
            let (size, avg) =
                self.matched_position(&selection.unique_id, live_orders).await?;

            // Exchange truth only ever grows; a smaller reading means
            // the venue has not reported everything the cache has seen.
            if size < selection.size_matched {
                continue;
            }

            let fully = self.sizer.is_fully_matched(selection);
            let moved = size > selection.size_matched || fully != selection.fully_matched;

            selection.size_matched = size;
            if size > 0.0 {
                selection.average_price_matched = avg;
            }
            selection.fully_matched = self.sizer.is_fully_matched(selection);

            if moved {
                selection.processed_at = Some(now);
                if let Err(e) = self.store.upsert_bookkeeping(selection).await {
                    error!(
                        unique_id = %selection.unique_id,
                        error = %e,
                        "Failed to persist matched totals"
                    );
                }
            }
        }

        Ok(())
    }

    /// Apply one cycle's actions.
    #[instrument(skip_all, fields(
        orders = actions.orders.len(),
        cash_outs = actions.cash_out_markets.len(),
        invalidations = actions.invalidations.len(),
    ))]
    pub async fn execute(
        &self,
        actions: &CycleActions,
        selections: &mut [Selection],
        live_orders: &[ExchangeOrder],
        summary: &mut CycleSummary,
    ) -> Result<()> {
        let now = Utc::now();

        // Invalidations first: the source-of-record must stop feeding
        // these selections even if everything below fails.
        for (unique_id, reason) in &actions.invalidations {
            summary.invalidations += 1;
            if let Err(e) = self.store.mark_invalidated(unique_id, reason, now).await {
                // The exchange-side state may already have moved on;
                // losing the cycle here would strand it.
                error!(
                    unique_id = %unique_id,
                    reason = %reason,
                    error = %e,
                    "Failed to persist invalidation"
                );
                summary.persistence_failures += 1;
            }
        }

        self.run_cash_outs(actions, selections, summary, now).await;

        for request in &actions.orders {
            self.place_one(request, selections, live_orders, summary).await;
        }

        Ok(())
    }

    /// One batched cash-out call per cycle across all queued markets.
    async fn run_cash_outs(
        &self,
        actions: &CycleActions,
        selections: &mut [Selection],
        summary: &mut CycleSummary,
        now: chrono::DateTime<Utc>,
    ) {
        if actions.cash_out_markets.is_empty() {
            return;
        }

        let results = match self.exchange.cash_out_markets(&actions.cash_out_markets).await {
            Ok(results) => results,
            Err(e) => {
                warn!(
                    markets = ?actions.cash_out_markets,
                    error = %e,
                    "Cash-out call failed; re-queued next cycle"
                );
                return;
            }
        };

        for result in results {
            if !result.success {
                warn!(
                    market_id = %result.market_id,
                    message = result.message.as_deref().unwrap_or(""),
                    "Cash-out rejected by exchange"
                );
                continue;
            }
            summary.cash_outs += 1;
            info!(market_id = %result.market_id, "Market cashed out");

            for selection in selections
                .iter_mut()
                .filter(|s| s.market_id == result.market_id && s.cash_out_queued)
            {
                selection.cashed_out = true;
                selection.processed_at = Some(now);
                if let Err(e) = self.store.mark_cashed_out(&selection.unique_id).await {
                    error!(
                        unique_id = %selection.unique_id,
                        error = %e,
                        "Failed to persist cash-out flag"
                    );
                    summary.persistence_failures += 1;
                }
            }
        }
    }

    /// Place a single order, re-deriving the remainder from the
    /// ledger-refreshed selection immediately before the call.
    async fn place_one(
        &self,
        request: &OrderRequest,
        selections: &mut [Selection],
        live_orders: &[ExchangeOrder],
        summary: &mut CycleSummary,
    ) {
        // One working order per selection at a time.
        if live_orders
            .iter()
            .any(|o| o.strategy_ref == request.strategy_ref)
        {
            debug!(
                strategy_ref = %request.strategy_ref,
                "Selection already has a live order, skipping"
            );
            return;
        }

        let Some(selection) = selections
            .iter_mut()
            .find(|s| s.unique_id == request.strategy_ref)
        else {
            return;
        };
        if !selection.valid || selection.cashed_out || selection.fully_matched {
            return;
        }

        let decision = self.sizer.size(selection, request.cycle_target);
        if !decision.should_bet {
            debug!(
                strategy_ref = %request.strategy_ref,
                reason = decision.reason.as_deref().unwrap_or(""),
                "Nothing left to place after ledger refresh"
            );
            return;
        }

        let request = OrderRequest {
            size: decision.size,
            price: decision.price,
            ..request.clone()
        };

        match self.exchange.place_order(&request).await {
            Ok(result) if result.success => {
                summary.orders_placed += 1;
                info!(
                    strategy_ref = %request.strategy_ref,
                    market_id = %request.market_id,
                    side = %request.side,
                    price = request.price,
                    size = request.size,
                    size_matched = result.size_matched,
                    "Order placed"
                );
                if result.size_matched > 0.0 {
                    let (size, avg) = fold_fill(
                        selection.size_matched,
                        selection.average_price_matched,
                        result.size_matched,
                        result.average_price_matched,
                    );
                    selection.size_matched = size;
                    selection.average_price_matched = avg;
                }
                selection.fully_matched = self.sizer.is_fully_matched(selection);
                selection.processed_at = Some(Utc::now());
                if let Err(e) = self.store.upsert_bookkeeping(selection).await {
                    error!(
                        unique_id = %selection.unique_id,
                        error = %e,
                        "Failed to persist bookkeeping after placement"
                    );
                    summary.persistence_failures += 1;
                }
            }
            Ok(result) => {
                warn!(
                    strategy_ref = %request.strategy_ref,
                    market_id = %request.market_id,
                    price = request.price,
                    size = request.size,
                    message = result.message.as_deref().unwrap_or(""),
                    "Order rejected by exchange"
                );
                summary.orders_failed += 1;
            }
            Err(e) => {
                // Bookkeeping untouched: the next cycle recomputes from
                // the same baseline, which is the retry.
                warn!(
                    strategy_ref = %request.strategy_ref,
                    market_id = %request.market_id,
                    price = request.price,
                    size = request.size,
                    error = %e,
                    "Order placement failed"
                );
                summary.orders_failed += 1;
            }
        }
    }

    /// Ledger-derived matched position for one selection: bet history
    /// records folded with the matched portions of live orders.
    async fn matched_position(
        &self,
        strategy_ref: &StrategyRef,
        live_orders: &[ExchangeOrder],
    ) -> Result<(f64, f64)> {
        let mut size = 0.0;
        let mut avg = 0.0;

        for record in self.history.records_for(strategy_ref).await? {
            (size, avg) = fold_fill(size, avg, record.size_matched, record.average_price_matched);
        }
        for order in live_orders
            .iter()
            .filter(|o| o.strategy_ref == *strategy_ref && o.size_matched > 0.0)
        {
            // A partial fill migrated ahead of a failed cancel is
            // already a ledger record; each fill counts from exactly
            // one source.
            if self.history.contains_order(&order.order_id).await? {
                continue;
            }
            (size, avg) = fold_fill(size, avg, order.size_matched, order.average_price_matched);
        }

        Ok((size, avg))
    }

    /// Migrate an order's matched portion into the ledger. Returns
    /// true when a new record was written.
    async fn migrate_order(&self, order: &ExchangeOrder) -> bool {
        match self.history.contains_order(&order.order_id).await {
            Ok(true) => false,
            Ok(false) => {
                let record = BetHistoryRecord::from_order(order, Utc::now());
                match self.history.append(&record).await {
                    Ok(()) => {
                        info!(
                            order_id = %order.order_id,
                            strategy_ref = %order.strategy_ref,
                            size_matched = order.size_matched,
                            average_price = order.average_price_matched,
                            "Migrated order into bet history"
                        );
                        true
                    }
                    Err(e) => {
                        error!(
                            order_id = %order.order_id,
                            error = %e,
                            "Failed to append bet history record"
                        );
                        false
                    }
                }
            }
            Err(e) => {
                error!(
                    order_id = %order.order_id,
                    error = %e,
                    "Failed to query bet history ledger"
                );
                false
            }
        }
    }
}
