//! Health State - Liveness and Readiness Signals
//!
//! Shared flags polled by the /live and /ready probes. Readiness
//! depends on the exchange connection and the stores being writable;
//! liveness only on the process running.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared health state polled by readiness probes.
#[derive(Debug, Clone, Default)]
pub struct HealthState {
    /// Whether the exchange API answers.
    pub exchange_healthy: Arc<AtomicBool>,
    /// Whether the stores are reachable and writable.
    pub stores_healthy: Arc<AtomicBool>,
    /// Whether the cycle loop is running.
    pub engine_running: Arc<AtomicBool>,
}

impl HealthState {
    /// Create a new health state (all healthy by default).
    pub fn new() -> Self {
        Self {
            exchange_healthy: Arc::new(AtomicBool::new(true)),
            stores_healthy: Arc::new(AtomicBool::new(true)),
            engine_running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Check if the system is ready to trade.
    pub fn is_ready(&self) -> bool {
        self.engine_running.load(Ordering::Relaxed)
            && self.exchange_healthy.load(Ordering::Relaxed)
            && self.stores_healthy.load(Ordering::Relaxed)
    }

    /// Record the per-cycle health probe results.
    pub fn update(&self, exchange: bool, stores: bool) {
        self.exchange_healthy.store(exchange, Ordering::Relaxed);
        self.stores_healthy.store(stores, Ordering::Relaxed);
    }

    /// Flag whether the cycle loop is running.
    pub fn set_engine_running(&self, running: bool) {
        self.engine_running.store(running, Ordering::Relaxed);
    }
}
