//! Exchange Client Port - Venue Order Management Interface
//!
//! Defines the trait for querying, placing, cancelling and cashing out
//! orders on the betting exchange. The exchange is the authoritative
//! source for order and fill state; everything the engine keeps locally
//! is a cache reconciled against what this port reports.
//!
//! Network-level timeout and retry policy belongs to the implementing
//! adapter. The 5-minute order staleness rule is a business rule and
//! lives in the executor, not here.

use async_trait::async_trait;

use crate::domain::selection::{ExchangeOrder, MarketId, OrderRequest};

/// Result of an order placement attempt.
#[derive(Debug, Clone)]
pub struct PlacementResult {
    /// Whether the exchange accepted the order.
    pub success: bool,
    /// Exchange-assigned order ID when accepted.
    pub order_id: Option<String>,
    /// Size matched immediately at placement.
    pub size_matched: f64,
    /// Average price of the immediately matched portion.
    pub average_price_matched: f64,
    /// Venue error or status message, if any.
    pub message: Option<String>,
}

/// Result of a cash-out attempt for one market.
#[derive(Debug, Clone)]
pub struct CashOutResult {
    /// Market the cash-out targeted.
    pub market_id: MarketId,
    /// Whether the position was closed out.
    pub success: bool,
    /// Venue error message if the cash-out failed.
    pub message: Option<String>,
}

/// Trait for exchange order management providers.
///
/// Implementors connect to the venue's order API. Every placed order
/// carries the selection's `unique_id` as the customer strategy
/// reference so fills can be attributed back during reconciliation.
#[async_trait]
pub trait ExchangeClient: Send + Sync + 'static {
    /// List all current orders attributed to this strategy, both live
    /// and recently completed.
    async fn list_current_orders(&self) -> anyhow::Result<Vec<ExchangeOrder>>;

    /// Place a single order.
    ///
    /// # Errors
    /// Returns an error only for transport-level failures; a venue
    /// rejection comes back as `PlacementResult { success: false, .. }`.
    async fn place_order(&self, request: &OrderRequest) -> anyhow::Result<PlacementResult>;

    /// Cancel the unmatched remainder of a live order.
    async fn cancel_order(&self, order: &ExchangeOrder) -> anyhow::Result<()>;

    /// Close out positions on the given markets at current prices.
    ///
    /// One batched call per cycle; per-market outcomes are reported
    /// individually.
    async fn cash_out_markets(&self, market_ids: &[MarketId])
        -> anyhow::Result<Vec<CashOutResult>>;

    /// Check if the exchange connection is healthy.
    async fn is_healthy(&self) -> bool;
}
