//! Prometheus Metrics Registry - Execution Observability
//!
//! Registers and exposes Prometheus metrics for Grafana dashboards.
//! Covers cycle timing, order outcomes, cash-outs, invalidations and
//! persistence failures.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

use crate::usecases::CycleSummary;

/// Centralized Prometheus metrics for the execution bot.
///
/// All metrics follow the naming convention `betfair_bot_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Trade cycles completed.
    pub cycles_total: IntCounter,
    /// Trade cycles aborted with an error.
    pub cycles_failed_total: IntCounter,
    /// Cycle wall time histogram (seconds).
    pub cycle_duration_seconds: Histogram,
    /// Orders accepted by the exchange.
    pub orders_placed_total: IntCounter,
    /// Completed orders migrated into the bet history ledger.
    pub orders_matched_total: IntCounter,
    /// Exchange calls failed or rejected.
    pub orders_failed_total: IntCounter,
    /// Stale orders cancelled.
    pub orders_cancelled_total: IntCounter,
    /// Markets cashed out.
    pub cash_outs_total: IntCounter,
    /// Invalidations fired.
    pub invalidations_total: IntCounter,
    /// Store writes that failed and were skipped over.
    pub persistence_failures_total: IntCounter,
    /// Selections in the most recent batch.
    pub active_selections: IntGauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let cycles_total =
            IntCounter::new("betfair_bot_cycles_total", "Trade cycles completed")?;
        let cycles_failed_total = IntCounter::new(
            "betfair_bot_cycles_failed_total",
            "Trade cycles aborted with an error",
        )?;
        let cycle_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "betfair_bot_cycle_duration_seconds",
                "Wall time of one trade cycle",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        let orders_placed_total = IntCounter::new(
            "betfair_bot_orders_placed_total",
            "Orders accepted by the exchange",
        )?;
        let orders_matched_total = IntCounter::new(
            "betfair_bot_orders_matched_total",
            "Completed orders migrated into the bet history ledger",
        )?;
        let orders_failed_total = IntCounter::new(
            "betfair_bot_orders_failed_total",
            "Exchange calls failed or rejected",
        )?;
        let orders_cancelled_total = IntCounter::new(
            "betfair_bot_orders_cancelled_total",
            "Stale orders cancelled",
        )?;
        let cash_outs_total =
            IntCounter::new("betfair_bot_cash_outs_total", "Markets cashed out")?;
        let invalidations_total =
            IntCounter::new("betfair_bot_invalidations_total", "Invalidations fired")?;
        let persistence_failures_total = IntCounter::new(
            "betfair_bot_persistence_failures_total",
            "Store writes that failed and were skipped over",
        )?;
        let active_selections = IntGauge::new(
            "betfair_bot_active_selections",
            "Selections in the most recent batch",
        )?;

        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(cycles_failed_total.clone()))?;
        registry.register(Box::new(cycle_duration_seconds.clone()))?;
        registry.register(Box::new(orders_placed_total.clone()))?;
        registry.register(Box::new(orders_matched_total.clone()))?;
        registry.register(Box::new(orders_failed_total.clone()))?;
        registry.register(Box::new(orders_cancelled_total.clone()))?;
        registry.register(Box::new(cash_outs_total.clone()))?;
        registry.register(Box::new(invalidations_total.clone()))?;
        registry.register(Box::new(persistence_failures_total.clone()))?;
        registry.register(Box::new(active_selections.clone()))?;

        Ok(Self {
            registry,
            cycles_total,
            cycles_failed_total,
            cycle_duration_seconds,
            orders_placed_total,
            orders_matched_total,
            orders_failed_total,
            orders_cancelled_total,
            cash_outs_total,
            invalidations_total,
            persistence_failures_total,
            active_selections,
        })
    }

    /// Fold one cycle's counters into the exported metrics.
    pub fn record_cycle(&self, summary: &CycleSummary, duration_seconds: f64) {
        self.cycles_total.inc();
        self.cycle_duration_seconds.observe(duration_seconds);
        self.orders_placed_total.inc_by(summary.orders_placed);
        self.orders_matched_total.inc_by(summary.orders_matched);
        self.orders_failed_total.inc_by(summary.orders_failed);
        self.orders_cancelled_total.inc_by(summary.orders_cancelled);
        self.cash_outs_total.inc_by(summary.cash_outs);
        self.invalidations_total.inc_by(summary.invalidations);
        self.persistence_failures_total
            .inc_by(summary.persistence_failures);
        self.active_selections
            .set(summary.active_selections as i64);
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
