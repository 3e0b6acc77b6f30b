//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the bot's core workflows. Each use case is a self-contained
//! business operation.
//!
//! Use cases:
//! - `ValidityEngine`: Per-cycle invalidation triggers
//! - `DecisionEngine`: Batch state to concrete actions (pure)
//! - `Executor`: Exchange and store side effects, reconciliation
//! - `TradeCycle`: Fixed-interval orchestration of the above

pub mod cycle;
pub mod decision;
pub mod executor;
pub mod validity;

pub use cycle::{CycleSummary, SessionStats, TradeCycle};
pub use decision::{CycleActions, DecisionEngine};
pub use executor::Executor;
pub use validity::ValidityEngine;
