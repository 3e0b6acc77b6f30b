//! Store Ports - Selection Read Model and Bet History Ledger
//!
//! Two persistence boundaries with deliberately different shapes:
//! the selection store is a read model plus bookkeeping upserts, the
//! bet history store is an append-only ledger keyed by exchange order
//! id. Keeping them separate is what makes reconciliation explicit —
//! there is never one mutable record written from two directions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::selection::{BetHistoryRecord, Selection, StrategyRef};

/// Trait for the selection source-of-record.
///
/// `fetch_active_selections` is queried fresh once per cycle and joins
/// the live market snapshot onto each row; the engine never caches a
/// batch across cycles.
#[async_trait]
pub trait SelectionStore: Send + Sync + 'static {
    /// Fetch the batch of selections still in play, snapshots joined in.
    async fn fetch_active_selections(&self) -> anyhow::Result<Vec<Selection>>;

    /// Upsert the engine-owned bookkeeping fields, keyed by
    /// `(unique_id, market_id, selection_id)`.
    async fn upsert_bookkeeping(&self, selection: &Selection) -> anyhow::Result<()>;

    /// Persist an invalidation on the source-of-record.
    async fn mark_invalidated(
        &self,
        unique_id: &StrategyRef,
        reason: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    /// Mark a selection's market position as cashed out.
    async fn mark_cashed_out(&self, unique_id: &StrategyRef) -> anyhow::Result<()>;

    /// Check if the store is reachable and writable.
    async fn is_healthy(&self) -> bool;
}

/// Trait for the durable bet history ledger.
///
/// Append-only. Records are keyed by exchange order id, which is what
/// makes migration of completed orders idempotent across restarts.
#[async_trait]
pub trait BetHistoryStore: Send + Sync + 'static {
    /// Append one ledger record. Appending an order id that already
    /// exists is a no-op, not an error.
    async fn append(&self, record: &BetHistoryRecord) -> anyhow::Result<()>;

    /// All ledger records for one selection.
    async fn records_for(&self, strategy_ref: &StrategyRef)
        -> anyhow::Result<Vec<BetHistoryRecord>>;

    /// Whether an exchange order has already been migrated.
    async fn contains_order(&self, order_id: &str) -> anyhow::Result<bool>;

    /// Check if the ledger is reachable and writable.
    async fn is_healthy(&self) -> bool;
}
