//! Betfair Exec Bot — Entry Point
//!
//! Initializes configuration, logging, the exchange client and the
//! trade cycle loop. Runs until SIGINT/SIGTERM.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Open stores (JSONL bet history ledger, selection store)
//! 4. Pick the exchange: paper simulation in dry-run, REST otherwise
//!    (credentials from BETFAIR_APP_KEY / BETFAIR_SESSION_TOKEN)
//! 5. Spawn the monitoring server (/live, /ready, /metrics)
//! 6. Run the fixed-interval trade cycle loop
//! 7. Wait for SIGINT → graceful shutdown with session stats

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::api::{ExchangeAuth, RestClient, RestClientConfig, RestExchangeClient};
use adapters::metrics::{HealthState, MetricsRegistry};
use adapters::paper::PaperExchange;
use adapters::persistence::{InMemorySelectionStore, JsonlBetHistory};
use config::AppConfig;
use domain::schedule::StakeSchedule;
use domain::selection::Selection;
use domain::sizing::StakeSizer;
use ports::exchange::ExchangeClient;
use ports::store::{BetHistoryStore, SelectionStore};
use usecases::{DecisionEngine, Executor, SessionStats, TradeCycle};

#[tokio::main]
async fn main() -> Result<()> {
    let config =
        config::loader::load_config("config.toml").context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.bot.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        dry_run = config.bot.dry_run,
        "Starting exec bot"
    );

    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // Stores
    let history = Arc::new(
        JsonlBetHistory::open(&config.persistence.data_dir)
            .await
            .context("Failed to open bet history ledger")?,
    );
    let store = Arc::new(InMemorySelectionStore::new());
    seed_selections(&store, &config.persistence.data_dir).await?;

    // Monitoring
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to build metrics registry")?);
    let health = HealthState::new();
    let monitoring_handle = if config.metrics.enabled {
        let handle = tokio::spawn(adapters::metrics::serve(
            config.metrics.bind_address.clone(),
            Arc::clone(&metrics),
            health.clone(),
            shutdown_tx.subscribe(),
        ));
        Some(handle)
    } else {
        None
    };

    // Cycle loop, against the paper venue or the real one
    let loop_shutdown = shutdown_tx.subscribe();
    let loop_handle = if config.bot.dry_run {
        warn!("Dry-run mode — orders go to the in-process paper exchange");
        let exchange = Arc::new(PaperExchange::new());
        tokio::spawn(run_loop(
            config.clone(),
            exchange,
            store,
            history,
            metrics,
            health,
            loop_shutdown,
        ))
    } else {
        let auth = Arc::new(
            ExchangeAuth::from_env().context("Failed to load exchange credentials from env")?,
        );
        let client = Arc::new(
            RestClient::new(
                Arc::clone(&auth),
                RestClientConfig {
                    base_url: config.api.base_url.clone(),
                    timeout: Duration::from_secs(config.api.timeout_seconds),
                    max_concurrent: config.api.max_concurrent_requests,
                    max_retries: config.api.retry_attempts,
                    retry_base_delay: Duration::from_millis(200),
                },
            )
            .context("Failed to create exchange client")?,
        );
        let exchange = Arc::new(RestExchangeClient::new(client));
        tokio::spawn(run_loop(
            config.clone(),
            exchange,
            store,
            history,
            metrics,
            health,
            loop_shutdown,
        ))
    };

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
    }

    let _ = shutdown_tx.send(());

    match tokio::time::timeout(Duration::from_secs(30), loop_handle).await {
        Ok(Ok(stats)) => info!(
            cycles = stats.cycles,
            cycles_failed = stats.cycles_failed,
            orders_placed = stats.totals.orders_placed,
            orders_matched = stats.totals.orders_matched,
            orders_cancelled = stats.totals.orders_cancelled,
            cash_outs = stats.totals.cash_outs,
            invalidations = stats.totals.invalidations,
            "Session complete"
        ),
        Ok(Err(e)) => error!(error = %e, "Cycle loop task failed"),
        Err(_) => warn!("Cycle loop did not stop within 30s"),
    }

    if let Some(handle) = monitoring_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Seed the selection store from `selections.json` if the upstream
/// strategy has dropped one in the data directory.
async fn seed_selections(store: &InMemorySelectionStore, data_dir: &str) -> Result<()> {
    let path = std::path::Path::new(data_dir).join("selections.json");
    if !path.exists() {
        warn!(path = %path.display(), "No selections file found, starting empty");
        return Ok(());
    }

    let content = tokio::fs::read_to_string(&path)
        .await
        .context("Failed to read selections file")?;
    let selections: Vec<Selection> =
        serde_json::from_str(&content).context("Failed to parse selections file")?;

    info!(count = selections.len(), "Seeded selections");
    store.seed(selections).await;
    Ok(())
}

/// Run the fixed-interval trade cycle until shutdown.
async fn run_loop<E: ExchangeClient>(
    config: AppConfig,
    exchange: Arc<E>,
    store: Arc<InMemorySelectionStore>,
    history: Arc<JsonlBetHistory>,
    metrics: Arc<MetricsRegistry>,
    health: HealthState,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> SessionStats {
    let sizer = StakeSizer::new(
        config.trading.min_stake,
        config.trading.fully_matched_tolerance,
    );
    let decision = DecisionEngine::new(
        sizer.clone(),
        StakeSchedule::new(config.schedule.clone()),
        config.trading.min_liquidity,
    );
    let executor = Executor::new(
        Arc::clone(&exchange),
        Arc::clone(&store),
        Arc::clone(&history),
        sizer,
        config.trading.order_timeout_seconds,
    );
    let cycle = TradeCycle::new(Arc::clone(&store), decision, executor);

    let mut stats = SessionStats::default();
    let mut interval =
        tokio::time::interval(Duration::from_secs(config.trading.cycle_interval_seconds));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    health.set_engine_running(true);
    info!(
        interval_s = config.trading.cycle_interval_seconds,
        "Trade cycle loop started"
    );

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                info!("Cycle loop received shutdown signal");
                break;
            }
            _ = interval.tick() => {
                let start = Instant::now();
                match cycle.run_cycle().await {
                    Ok(summary) => {
                        stats.absorb(&summary);
                        metrics.record_cycle(&summary, start.elapsed().as_secs_f64());
                    }
                    Err(e) => {
                        // Next cycle starts from a fresh fetch; no
                        // retry inside the tick.
                        error!(error = %e, "Cycle aborted");
                        stats.record_failure();
                        metrics.cycles_failed_total.inc();
                    }
                }
                health.update(
                    exchange.is_healthy().await,
                    store.is_healthy().await && history.is_healthy().await,
                );
            }
        }
    }

    health.set_engine_running(false);
    stats
}
