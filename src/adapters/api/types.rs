//! Exchange API Wire Types
//!
//! Request and response DTOs for the betting API. Field names follow
//! the venue's camelCase JSON; conversions to domain types live in the
//! exchange adapter, not here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport-level API failure classes.
///
/// Venue *rejections* of an otherwise-delivered instruction are not
/// errors; they come back in the execution reports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-success HTTP status after retries.
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
    /// Request throttled and retries exhausted.
    #[error("Rate limited by exchange API")]
    RateLimited,
    /// Retries exhausted on transport failures.
    #[error("Max retries exceeded: {0}")]
    RetriesExhausted(String),
}

/// A price level: odds and the money available at them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceSize {
    pub price: f64,
    pub size: f64,
}

/// One order as reported by the order-query endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentOrderSummary {
    pub bet_id: String,
    pub market_id: String,
    pub selection_id: u64,
    pub side: String,
    pub status: String,
    pub price_size: PriceSize,
    #[serde(default)]
    pub size_matched: f64,
    #[serde(default)]
    pub average_price_matched: f64,
    pub placed_date: DateTime<Utc>,
    #[serde(default)]
    pub matched_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub customer_strategy_ref: Option<String>,
}

/// Order-query response envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentOrderSummaryReport {
    pub current_orders: Vec<CurrentOrderSummary>,
    #[serde(default)]
    pub more_available: bool,
}

/// Limit order leg of a place instruction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitOrder {
    pub size: f64,
    pub price: f64,
    pub persistence_type: String,
}

/// One place instruction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceInstruction {
    pub order_type: String,
    pub selection_id: u64,
    pub side: String,
    pub limit_order: LimitOrder,
}

/// Place request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrdersRequest {
    pub market_id: String,
    pub instructions: Vec<PlaceInstruction>,
    pub customer_strategy_ref: String,
}

/// Per-instruction placement outcome.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceInstructionReport {
    pub status: String,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub bet_id: Option<String>,
    #[serde(default)]
    pub size_matched: f64,
    #[serde(default)]
    pub average_price_matched: f64,
}

/// Place response envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceExecutionReport {
    pub status: String,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub instruction_reports: Vec<PlaceInstructionReport>,
}

/// Per-instruction cancellation outcome.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelInstructionReport {
    pub status: String,
    #[serde(default)]
    pub error_code: Option<String>,
}

/// Cancel response envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelExecutionReport {
    pub status: String,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub instruction_reports: Vec<CancelInstructionReport>,
}

/// Per-market cash-out outcome.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOutReport {
    pub market_id: String,
    pub status: String,
    #[serde(default)]
    pub error_code: Option<String>,
}
