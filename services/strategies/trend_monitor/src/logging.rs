//! Logging setup and the emoji set used in service logs

use anyhow::{anyhow, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Standard emoji prefixes for monitor log lines
pub struct LogEmoji;

impl LogEmoji {
    pub const START: &'static str = "🚀";
    pub const SUCCESS: &'static str = "✅";
    pub const WARNING: &'static str = "⚠️";
    pub const STOP: &'static str = "🛑";
    pub const CHART: &'static str = "📊"; // Sweep summaries
    pub const ALERT: &'static str = "🚨"; // Alert sweep
    pub const SIGNAL: &'static str = "📡"; // Signal sweep
    pub const CLOCK: &'static str = "⏱️"; // Scheduling
}

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `default_level`
pub fn init_logging(service: &str, default_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    info!("{} Logging initialized for {}", LogEmoji::SUCCESS, service);
    Ok(())
}
