//! Core trading domain types.
//!
//! Defines the entities the engine trades over: the `Selection` (one
//! desired position on one market, with its live snapshot and local
//! bookkeeping), the `ExchangeOrder` (the venue's authoritative view of
//! what actually happened) and the `BetHistoryRecord` (the durable,
//! append-only ledger row a completed order migrates into).
//!
//! The two sources of truth are deliberately two types: a Selection's
//! matched fields are a cache of exchange state, refreshed only by the
//! reconciler, never written from anywhere else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lightweight market identifier used at the ports boundary.
pub type MarketId = String;

/// Stable selection key, doubling as the exchange customer strategy
/// reference so fills can be attributed back to the selection.
pub type StrategyRef = String;

/// Order side on the exchange.
///
/// BACK wins if the outcome happens (risk = stake); LAY wins if it
/// does not (risk = liability).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Back,
    Lay,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Back => write!(f, "BACK"),
            Self::Lay => write!(f, "LAY"),
        }
    }
}

/// Market class a selection trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketType {
    Win,
    Place,
}

impl std::fmt::Display for MarketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Win => write!(f, "WIN"),
            Self::Place => write!(f, "PLACE"),
        }
    }
}

/// Exchange-side lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Still live on the book; may still fill.
    Executable,
    /// Terminal: fully matched, cancelled or lapsed.
    ExecutionComplete,
}

/// Why a selection was invalidated.
///
/// The closed set of per-cycle triggers. The canonical reason strings
/// are what gets persisted on the selection source-of-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidationReason {
    /// PLACE market lost its eighth runner.
    EightToSevenPlace,
    /// A short-priced favourite was withdrawn.
    ShortPriceRemoved,
    /// The race went in play.
    RaceStarted,
    /// External manual void / cash-out request.
    ManualVoid,
}

impl InvalidationReason {
    /// Whether this trigger also queues the market for cash-out.
    ///
    /// A started race is live; matched stake stands, so no cash-out.
    pub fn wants_cash_out(self) -> bool {
        !matches!(self, Self::RaceStarted)
    }

    /// Parse a persisted canonical reason string back into the enum.
    pub fn parse(reason: &str) -> Option<Self> {
        match reason {
            "Invalid 8 to 7 Place" => Some(Self::EightToSevenPlace),
            "Invalid Short Price Removed" => Some(Self::ShortPriceRemoved),
            "Race Started" => Some(Self::RaceStarted),
            "Manual Void" => Some(Self::ManualVoid),
            _ => None,
        }
    }
}

impl std::fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EightToSevenPlace => write!(f, "Invalid 8 to 7 Place"),
            Self::ShortPriceRemoved => write!(f, "Invalid Short Price Removed"),
            Self::RaceStarted => write!(f, "Race Started"),
            Self::ManualVoid => write!(f, "Manual Void"),
        }
    }
}

/// Top-of-book market snapshot joined onto a selection by the read
/// model. Refreshed every cycle; not owned by this system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Best available back price.
    pub best_back_price: f64,
    /// Size available at the best back price.
    pub best_back_size: f64,
    /// Best available lay price.
    pub best_lay_price: f64,
    /// Size available at the best lay price.
    pub best_lay_size: f64,
    /// Current number of active runners.
    pub runner_count: u32,
    /// Runner count when the selection was created upstream.
    pub runner_count_at_creation: u32,
    /// Whether a short-priced runner has been withdrawn.
    pub short_priced_runner_removed: bool,
    /// Minutes until the race starts (negative once in play).
    pub minutes_to_race: f64,
}

/// One desired position on one market.
///
/// Produced by the read-model query each cycle; the bookkeeping block
/// at the bottom is owned exclusively by this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    /// Stable key; sent to the exchange as the strategy reference.
    pub unique_id: StrategyRef,
    /// Race this selection belongs to.
    pub race_id: String,
    /// Scheduled start time of the race.
    pub race_time: DateTime<Utc>,
    /// Upstream horse identifier.
    pub horse_id: String,
    /// Display name of the horse.
    pub horse_name: String,
    /// Exchange market identifier.
    pub market_id: MarketId,
    /// Exchange runner identifier within the market.
    pub selection_id: u64,
    /// Order side the strategy wants.
    pub side: Side,
    /// WIN or PLACE market.
    pub market_type: MarketType,
    /// Minimum acceptable price for BACK, maximum for LAY.
    pub requested_odds: f64,
    /// Full target stake the strategy eventually wants matched.
    pub target_stake: f64,
    /// Live market snapshot (refreshed every cycle).
    pub snapshot: MarketSnapshot,
    /// External manual void / cash-out request flag.
    pub void_requested: bool,

    // ── Bookkeeping, owned by this engine ──────────────────────
    /// False once any invalidation trigger has fired.
    pub valid: bool,
    /// When the selection was invalidated, if ever.
    pub invalidated_at: Option<DateTime<Utc>>,
    /// Canonical reason string, persisted on the source-of-record.
    pub invalidated_reason: Option<String>,
    /// Whether the position was closed out at market.
    pub cashed_out: bool,
    /// Whether the target exposure has been reached.
    pub fully_matched: bool,
    /// Total stake matched so far (monotone while valid).
    pub size_matched: f64,
    /// Volume-weighted average matched price; only meaningful when
    /// `size_matched > 0`.
    pub average_price_matched: f64,
    /// Last time the engine touched this selection.
    pub processed_at: Option<DateTime<Utc>>,
    /// Set by the validity engine when the market should be closed
    /// out this cycle. Transient; reset by the next read.
    #[serde(default)]
    pub cash_out_queued: bool,
    /// Whether the invalidation fired this cycle (as opposed to being
    /// loaded already-invalid). Transient; drives what gets persisted.
    #[serde(default)]
    pub newly_invalidated: bool,
}

impl Selection {
    /// Mark the selection invalid. Idempotent: re-invalidating an
    /// already-invalid selection keeps the first reason and timestamp.
    pub fn invalidate(&mut self, reason: InvalidationReason, now: DateTime<Utc>) {
        if !self.valid {
            return;
        }
        self.valid = false;
        self.invalidated_at = Some(now);
        self.invalidated_reason = Some(reason.to_string());
    }

    /// Liability accumulated by the matched portion of a LAY position.
    pub fn matched_liability(&self) -> f64 {
        if self.size_matched <= 0.0 {
            return 0.0;
        }
        self.size_matched * (self.average_price_matched - 1.0)
    }

    /// Whether this selection may still receive new orders.
    pub fn is_active(&self) -> bool {
        self.valid && !self.cashed_out && !self.fully_matched && !self.cash_out_queued
    }
}

/// An order as reported by the exchange's order-query API.
///
/// Ground truth for what actually happened; local matched fields are a
/// cache of this, never assumed authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeOrder {
    /// Exchange-assigned order identifier.
    pub order_id: String,
    /// Market the order was placed on.
    pub market_id: MarketId,
    /// Runner the order was placed against.
    pub selection_id: u64,
    /// Order side.
    pub side: Side,
    /// Price the order was placed at.
    pub price_requested: f64,
    /// Size originally requested.
    pub size_requested: f64,
    /// Size matched so far.
    pub size_matched: f64,
    /// Volume-weighted average price of the matched portion.
    pub average_price_matched: f64,
    /// Exchange-side lifecycle status.
    pub status: OrderStatus,
    /// When the order was placed.
    pub placed_at: DateTime<Utc>,
    /// When the order last matched, if it has.
    pub matched_at: Option<DateTime<Utc>>,
    /// Customer strategy reference (= `Selection::unique_id`).
    pub strategy_ref: StrategyRef,
}

impl ExchangeOrder {
    /// Age of the order in whole seconds at `now`.
    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.placed_at).num_seconds()
    }
}

/// Append-only ledger row for one completed (or cancelled with partial
/// fill) exchange order.
///
/// Keyed by the exchange order id so migration is idempotent across
/// restarts: an order already in the ledger is never recorded twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetHistoryRecord {
    /// Record identifier.
    pub id: Uuid,
    /// Exchange order this record was migrated from (idempotency key).
    pub order_id: String,
    /// Selection the fill belongs to.
    pub strategy_ref: StrategyRef,
    /// Market the order was placed on.
    pub market_id: MarketId,
    /// Runner the order was placed against.
    pub selection_id: u64,
    /// Order side.
    pub side: Side,
    /// Matched size being recorded.
    pub size_matched: f64,
    /// Volume-weighted average price of the matched size.
    pub average_price_matched: f64,
    /// When the original order was placed.
    pub placed_at: DateTime<Utc>,
    /// When the record was written.
    pub recorded_at: DateTime<Utc>,
}

impl BetHistoryRecord {
    /// Build a ledger row from the matched portion of an exchange order.
    pub fn from_order(order: &ExchangeOrder, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id: order.order_id.clone(),
            strategy_ref: order.strategy_ref.clone(),
            market_id: order.market_id.clone(),
            selection_id: order.selection_id,
            side: order.side,
            size_matched: order.size_matched,
            average_price_matched: order.average_price_matched,
            placed_at: order.placed_at,
            recorded_at: now,
        }
    }
}

/// A concrete order the decision engine wants placed this cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Selection the order belongs to; sent as the strategy reference.
    pub strategy_ref: StrategyRef,
    /// Target market.
    pub market_id: MarketId,
    /// Target runner.
    pub selection_id: u64,
    /// Order side.
    pub side: Side,
    /// Ladder-valid price to place at.
    pub price: f64,
    /// Stake to request, already floored to 2 decimals.
    pub size: f64,
    /// Schedule-scaled target the size was derived from; the executor
    /// re-derives the remainder against the ledger just before placing.
    pub cycle_target: f64,
}
