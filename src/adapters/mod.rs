//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP client, file I/O, simulation). Each
//! sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `api`: Exchange betting REST API client and auth
//! - `paper`: In-process venue simulation for dry-run mode
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: JSONL bet history ledger and selection store

pub mod api;
pub mod metrics;
pub mod paper;
pub mod persistence;
