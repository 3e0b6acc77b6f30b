//! Domain layer - Core business logic and models.
//!
//! This module contains the pure trading logic for the execution
//! engine. No external dependencies allowed here (hexagonal
//! architecture inner ring). All types are serializable and testable
//! in isolation.

pub mod ladder;
pub mod schedule;
pub mod selection;
pub mod sizing;

// Re-export core types for convenience
pub use schedule::{ScheduleStep, StakeSchedule};
pub use selection::{
    BetHistoryRecord, ExchangeOrder, InvalidationReason, MarketSnapshot, MarketType,
    OrderRequest, OrderStatus, Selection, Side,
};
pub use sizing::{SizeDecision, StakeSizer};
