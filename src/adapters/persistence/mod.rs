//! Persistence Adapters - JSONL-based File Storage
//!
//! Implements the store ports with append-only JSONL files for the
//! bet history ledger and an in-memory map standing in for the
//! upstream selection database. No database dependency — lightweight
//! and crash-recoverable.

pub mod history;
pub mod selections;

pub use history::JsonlBetHistory;
pub use selections::InMemorySelectionStore;
