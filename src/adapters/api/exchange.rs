//! REST Exchange Adapter - ExchangeClient Port Implementation
//!
//! Implements the `ExchangeClient` port over the venue's betting REST
//! API using the shared `RestClient` for authenticated requests. Wire
//! DTOs are converted to domain types here; venue rejections become
//! unsuccessful results, never transport errors.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::domain::selection::{ExchangeOrder, MarketId, OrderRequest, OrderStatus, Side};
use crate::ports::exchange::{CashOutResult, ExchangeClient, PlacementResult};

use super::client::RestClient;
use super::types::{
    CancelExecutionReport, CashOutReport, CurrentOrderSummary, CurrentOrderSummaryReport,
    LimitOrder, PlaceExecutionReport, PlaceInstruction, PlaceOrdersRequest,
};

/// Exchange order management over the betting REST API.
pub struct RestExchangeClient {
    /// Shared client with auth, retry and concurrency limiting.
    client: Arc<RestClient>,
}

impl RestExchangeClient {
    /// Create a new REST exchange adapter.
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    /// Convert a wire order summary into the domain order type.
    ///
    /// Orders without a strategy reference belong to other tooling on
    /// the same account and are not ours to manage.
    fn to_domain(summary: CurrentOrderSummary) -> Option<ExchangeOrder> {
        let strategy_ref = summary.customer_strategy_ref?;
        let side = parse_side(&summary.side)?;
        let status = match summary.status.as_str() {
            "EXECUTABLE" => OrderStatus::Executable,
            "EXECUTION_COMPLETE" => OrderStatus::ExecutionComplete,
            other => {
                warn!(status = other, bet_id = %summary.bet_id, "Unknown order status");
                return None;
            }
        };

        Some(ExchangeOrder {
            order_id: summary.bet_id,
            market_id: summary.market_id,
            selection_id: summary.selection_id,
            side,
            price_requested: summary.price_size.price,
            size_requested: summary.price_size.size,
            size_matched: summary.size_matched,
            average_price_matched: summary.average_price_matched,
            status,
            placed_at: summary.placed_date,
            matched_at: summary.matched_date,
            strategy_ref,
        })
    }
}

fn parse_side(side: &str) -> Option<Side> {
    match side {
        "BACK" => Some(Side::Back),
        "LAY" => Some(Side::Lay),
        _ => None,
    }
}

fn side_str(side: Side) -> &'static str {
    match side {
        Side::Back => "BACK",
        Side::Lay => "LAY",
    }
}

#[async_trait]
impl ExchangeClient for RestExchangeClient {
    async fn list_current_orders(&self) -> Result<Vec<ExchangeOrder>> {
        let body = serde_json::json!({
            "orderProjection": "ALL",
            "dateRange": {},
        });

        let report: CurrentOrderSummaryReport = self
            .client
            .post("/listCurrentOrders/", &body)
            .await
            .context("Failed to list current orders")?;

        if report.more_available {
            warn!("Order list truncated by the venue; reconciling the first page only");
        }

        Ok(report
            .current_orders
            .into_iter()
            .filter_map(Self::to_domain)
            .collect())
    }

    #[instrument(skip(self, request), fields(
        strategy_ref = %request.strategy_ref,
        market_id = %request.market_id,
        price = request.price,
        size = request.size,
    ))]
    async fn place_order(&self, request: &OrderRequest) -> Result<PlacementResult> {
        let body = PlaceOrdersRequest {
            market_id: request.market_id.clone(),
            instructions: vec![PlaceInstruction {
                order_type: "LIMIT".to_string(),
                selection_id: request.selection_id,
                side: side_str(request.side).to_string(),
                limit_order: LimitOrder {
                    size: request.size,
                    price: request.price,
                    persistence_type: "LAPSE".to_string(),
                },
            }],
            customer_strategy_ref: request.strategy_ref.clone(),
        };

        let report: PlaceExecutionReport = self
            .client
            .post("/placeOrders/", &body)
            .await
            .context("Failed to place order")?;

        let instruction = report.instruction_reports.first();
        let success = report.status == "SUCCESS"
            && instruction.is_some_and(|r| r.status == "SUCCESS");

        let message = report
            .error_code
            .or_else(|| instruction.and_then(|r| r.error_code.clone()));

        if success {
            info!(
                bet_id = instruction.and_then(|r| r.bet_id.as_deref()).unwrap_or(""),
                "Order accepted by exchange"
            );
        }

        Ok(PlacementResult {
            success,
            order_id: instruction.and_then(|r| r.bet_id.clone()),
            size_matched: instruction.map_or(0.0, |r| r.size_matched),
            average_price_matched: instruction.map_or(0.0, |r| r.average_price_matched),
            message,
        })
    }

    #[instrument(skip(self, order), fields(order_id = %order.order_id))]
    async fn cancel_order(&self, order: &ExchangeOrder) -> Result<()> {
        let body = serde_json::json!({
            "marketId": order.market_id,
            "instructions": [{ "betId": order.order_id }],
        });

        let report: CancelExecutionReport = self
            .client
            .post("/cancelOrders/", &body)
            .await
            .context("Failed to cancel order")?;

        if report.status != "SUCCESS" {
            bail!(
                "Cancel rejected: {}",
                report.error_code.as_deref().unwrap_or("unknown")
            );
        }

        Ok(())
    }

    async fn cash_out_markets(&self, market_ids: &[MarketId]) -> Result<Vec<CashOutResult>> {
        let body = serde_json::json!({ "marketIds": market_ids });

        let reports: Vec<CashOutReport> = self
            .client
            .post("/cashOut/", &body)
            .await
            .context("Failed to cash out markets")?;

        Ok(reports
            .into_iter()
            .map(|report| CashOutResult {
                market_id: report.market_id,
                success: report.status == "SUCCESS",
                message: report.error_code,
            })
            .collect())
    }

    async fn is_healthy(&self) -> bool {
        self.client.health_check().await
    }
}
