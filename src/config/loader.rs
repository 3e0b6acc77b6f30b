//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
    let path = Path::new(path);

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: AppConfig =
        toml::from_str(&content).with_context(|| "Failed to parse config.toml")?;

    validate_config(&config)?;

    info!(
        bot = %config.bot.name,
        dry_run = config.bot.dry_run,
        min_stake = config.trading.min_stake,
        cycle_interval = config.trading.cycle_interval_seconds,
        "Configuration loaded successfully"
    );

    Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Positive numeric values where required
/// - A tolerance that cannot exceed the minimum stake
/// - A well-formed stake ramp (increasing windows, ramping fractions)
/// - Non-empty endpoint URLs
fn validate_config(config: &AppConfig) -> Result<()> {
    // Trading validation
    anyhow::ensure!(
        config.trading.min_stake > 0.0,
        "min_stake must be positive, got {}",
        config.trading.min_stake
    );
    anyhow::ensure!(
        config.trading.fully_matched_tolerance > 0.0
            && config.trading.fully_matched_tolerance <= config.trading.min_stake,
        "fully_matched_tolerance must be in (0, min_stake], got {}",
        config.trading.fully_matched_tolerance
    );
    anyhow::ensure!(
        config.trading.min_liquidity >= 0.0,
        "min_liquidity must not be negative"
    );
    anyhow::ensure!(
        config.trading.order_timeout_seconds > 0,
        "order_timeout_seconds must be positive, got {}",
        config.trading.order_timeout_seconds
    );
    anyhow::ensure!(
        config.trading.cycle_interval_seconds > 0,
        "cycle_interval_seconds must be positive"
    );

    // Schedule validation: windows strictly widen, fractions ramp
    // down as the race gets further away.
    anyhow::ensure!(
        !config.schedule.is_empty(),
        "At least one schedule step must be configured"
    );
    for (i, step) in config.schedule.iter().enumerate() {
        anyhow::ensure!(
            step.within_minutes > 0.0,
            "Schedule step {} has non-positive within_minutes",
            i
        );
        anyhow::ensure!(
            step.fraction > 0.0 && step.fraction <= 1.0,
            "Schedule step {} fraction must be in (0, 1], got {}",
            i,
            step.fraction
        );
        if let Some(prev) = i.checked_sub(1).map(|p| &config.schedule[p]) {
            anyhow::ensure!(
                step.within_minutes > prev.within_minutes,
                "Schedule steps must have strictly increasing within_minutes"
            );
            anyhow::ensure!(
                step.fraction <= prev.fraction,
                "Schedule fractions must not increase with distance from the race"
            );
        }
    }

    // API validation
    anyhow::ensure!(
        !config.api.base_url.is_empty(),
        "Exchange API base URL must not be empty"
    );
    anyhow::ensure!(
        config.api.max_concurrent_requests > 0,
        "max_concurrent_requests must be positive"
    );

    // Persistence validation
    anyhow::ensure!(
        !config.persistence.data_dir.is_empty(),
        "Persistence data_dir must not be empty"
    );

    Ok(())
}
