//! Paper Exchange - In-process Venue Simulation
//!
//! `ExchangeClient` implementation for dry-run mode and scenario
//! tests. Keeps an order book of one quote per runner and fills
//! incoming orders against it immediately: full fill when the quote
//! covers the size, partial fill when it doesn't, resting order when
//! the price doesn't cross. Orders it reports look exactly like the
//! venue's, so the whole reconcile path runs unchanged in dry-run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::selection::{
    ExchangeOrder, MarketId, OrderRequest, OrderStatus, Side,
};
use crate::ports::exchange::{CashOutResult, ExchangeClient, PlacementResult};

/// The money available against one runner, per side.
#[derive(Debug, Clone, Copy, Default)]
struct Quote {
    back_price: f64,
    back_size: f64,
    lay_price: f64,
    lay_size: f64,
}

/// Simulated exchange with immediate fills against configured quotes.
#[derive(Default)]
pub struct PaperExchange {
    /// All orders ever placed, live and completed, keyed by id.
    orders: RwLock<HashMap<String, ExchangeOrder>>,
    /// One quote per `(market_id, selection_id)`.
    quotes: RwLock<HashMap<(MarketId, u64), Quote>>,
    /// Monotonic id source.
    next_id: AtomicU64,
}

impl PaperExchange {
    /// Create an empty paper exchange.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the available money against one runner.
    ///
    /// For a BACK order the `back_*` pair is what it can take; for a
    /// LAY order the `lay_*` pair.
    pub async fn set_quote(
        &self,
        market_id: &str,
        selection_id: u64,
        back_price: f64,
        back_size: f64,
        lay_price: f64,
        lay_size: f64,
    ) {
        self.quotes.write().await.insert(
            (market_id.to_string(), selection_id),
            Quote {
                back_price,
                back_size,
                lay_price,
                lay_size,
            },
        );
    }

    /// Force a resting order to complete with its current fill, the
    /// way a lapse or venue-side cancel would.
    pub async fn lapse_order(&self, order_id: &str) {
        if let Some(order) = self.orders.write().await.get_mut(order_id) {
            order.status = OrderStatus::ExecutionComplete;
        }
    }

    /// Number of orders currently resting on the book.
    pub async fn live_order_count(&self) -> usize {
        self.orders
            .read()
            .await
            .values()
            .filter(|o| o.status == OrderStatus::Executable)
            .count()
    }

    fn crosses(side: Side, requested: f64, quoted: f64) -> bool {
        match side {
            // A back matches lay money quoted at or above its price.
            Side::Back => quoted >= requested,
            Side::Lay => quoted <= requested,
        }
    }
}

#[async_trait]
impl ExchangeClient for PaperExchange {
    async fn list_current_orders(&self) -> Result<Vec<ExchangeOrder>> {
        Ok(self.orders.read().await.values().cloned().collect())
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<PlacementResult> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let order_id = format!("paper-{id}");

        let quote = self
            .quotes
            .read()
            .await
            .get(&(request.market_id.clone(), request.selection_id))
            .copied()
            .unwrap_or_default();

        let (quoted_price, quoted_size) = match request.side {
            Side::Back => (quote.back_price, quote.back_size),
            Side::Lay => (quote.lay_price, quote.lay_size),
        };

        let (size_matched, average_price_matched) =
            if quoted_size > 0.0 && Self::crosses(request.side, request.price, quoted_price) {
                (request.size.min(quoted_size), quoted_price)
            } else {
                (0.0, 0.0)
            };

        let status = if size_matched >= request.size {
            OrderStatus::ExecutionComplete
        } else {
            OrderStatus::Executable
        };

        let now = Utc::now();
        let order = ExchangeOrder {
            order_id: order_id.clone(),
            market_id: request.market_id.clone(),
            selection_id: request.selection_id,
            side: request.side,
            price_requested: request.price,
            size_requested: request.size,
            size_matched,
            average_price_matched,
            status,
            placed_at: now,
            matched_at: (size_matched > 0.0).then_some(now),
            strategy_ref: request.strategy_ref.clone(),
        };

        info!(
            order_id = %order_id,
            strategy_ref = %request.strategy_ref,
            size = request.size,
            size_matched,
            "Paper order placed"
        );

        self.orders.write().await.insert(order_id.clone(), order);

        Ok(PlacementResult {
            success: true,
            order_id: Some(order_id),
            size_matched,
            average_price_matched,
            message: None,
        })
    }

    async fn cancel_order(&self, order: &ExchangeOrder) -> Result<()> {
        if let Some(stored) = self.orders.write().await.get_mut(&order.order_id) {
            stored.status = OrderStatus::ExecutionComplete;
        }
        Ok(())
    }

    async fn cash_out_markets(&self, market_ids: &[MarketId]) -> Result<Vec<CashOutResult>> {
        let mut orders = self.orders.write().await;
        for market_id in market_ids {
            for order in orders
                .values_mut()
                .filter(|o| o.market_id == *market_id && o.status == OrderStatus::Executable)
            {
                order.status = OrderStatus::ExecutionComplete;
            }
        }

        Ok(market_ids
            .iter()
            .map(|market_id| CashOutResult {
                market_id: market_id.clone(),
                success: true,
                message: None,
            })
            .collect())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
