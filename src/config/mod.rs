//! Configuration Module - TOML-based Bot Configuration
//!
//! Loads and validates configuration from `config.toml`. All trading
//! thresholds and endpoints are externalized here - nothing is
//! hardcoded in the domain layer. Exchange credentials are the one
//! exception: they come from environment variables only and never
//! appear in the config file.

pub mod loader;

use serde::Deserialize;

use crate::domain::schedule::ScheduleStep;

/// Top-level bot configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the bot begins operation.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bot identity and metadata.
    pub bot: BotConfig,
    /// Trading thresholds and timing.
    pub trading: TradingConfig,
    /// Stake ramp steps over minutes-to-race.
    #[serde(default = "default_schedule")]
    pub schedule: Vec<ScheduleStep>,
    /// Exchange API endpoints.
    pub api: ApiConfig,
    /// Metrics and monitoring.
    pub metrics: MetricsConfig,
    /// Persistence configuration.
    pub persistence: PersistenceConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Human-readable bot name.
    pub name: String,
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Run against the in-process paper exchange instead of the venue.
    #[serde(default)]
    pub dry_run: bool,
}

/// Trading thresholds and cycle timing.
#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Exchange minimum stake per order.
    #[serde(default = "default_min_stake")]
    pub min_stake: f64,
    /// Matched total at or above which a selection counts as fully
    /// matched (absolute tolerance below target).
    #[serde(default = "default_tolerance")]
    pub fully_matched_tolerance: f64,
    /// Minimum top-of-book size required to act on a quote.
    #[serde(default = "default_min_liquidity")]
    pub min_liquidity: f64,
    /// Seconds before an unmatched order is cancelled as stale.
    #[serde(default = "default_order_timeout")]
    pub order_timeout_seconds: i64,
    /// Seconds between trade cycles.
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_seconds: u64,
}

/// API endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Exchange REST API base URL.
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Maximum concurrent in-flight requests.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    /// Transport-level retry attempts per request.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics export.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Metrics and health server bind address.
    #[serde(default = "default_metrics_addr")]
    pub bind_address: String,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Directory for JSONL bet history files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

// Default value functions for serde

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_stake() -> f64 {
    1.0
}

fn default_tolerance() -> f64 {
    0.99
}

fn default_min_liquidity() -> f64 {
    10.0
}

fn default_order_timeout() -> i64 {
    300
}

fn default_cycle_interval() -> u64 {
    10
}

fn default_timeout() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    4
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_schedule() -> Vec<ScheduleStep> {
    vec![
        ScheduleStep {
            within_minutes: 10.0,
            fraction: 1.0,
        },
        ScheduleStep {
            within_minutes: 30.0,
            fraction: 0.75,
        },
        ScheduleStep {
            within_minutes: 60.0,
            fraction: 0.5,
        },
        ScheduleStep {
            within_minutes: 180.0,
            fraction: 0.25,
        },
    ]
}
