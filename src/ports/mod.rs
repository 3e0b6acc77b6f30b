//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ExchangeClient`: order placement, cancellation and cash-out on the venue
//! - `SelectionStore`: the selection read model and bookkeeping upserts
//! - `BetHistoryStore`: the append-only bet history ledger

pub mod exchange;
pub mod store;
