//! Trend Monitor Main Entry Point

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use trendline_config::{expand_path, load_config, resolve_config_path, service, ENV_PREFIX};
use trendline_monitor::logging::{init_logging, LogEmoji};
use trendline_monitor::{
    Coordinator, HttpPriceProvider, MemoryStore, MonitorConfig, MonitorContext, TracingSink,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = resolve_config_path(service::CONFIG_PATH_ENV, service::DEFAULT_CONFIG_PATH);
    let config: MonitorConfig = load_config(&config_path, ENV_PREFIX)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

    init_logging("trend_monitor", &config.log_level)?;
    info!("{} Starting Trendline Trend Monitor", LogEmoji::START);

    config.validate().context("Invalid monitor configuration")?;
    info!(
        "Configuration loaded: alert tick {}s, horizons {:?}, kernel {} bw={}",
        config.alerts.tick_secs,
        config.signals.horizons,
        config.signals.kernel.kernel,
        config.signals.kernel.bandwidth
    );

    let store = match &config.store.snapshot_path {
        Some(raw) => {
            let path = expand_path(raw)?;
            MemoryStore::with_snapshot(&path)
                .with_context(|| format!("Failed to open store snapshot {:?}", path))?
        }
        None => {
            info!("No snapshot path configured, store is in-memory only");
            MemoryStore::new()
        }
    };

    let provider =
        HttpPriceProvider::new(&config.provider).context("Failed to create price provider")?;
    let context = MonitorContext::new(Arc::new(store), Arc::new(TracingSink), Arc::new(provider));

    let coordinator =
        Arc::new(Coordinator::new(context, config).context("Failed to create coordinator")?);
    let (alerts, signals) = coordinator.start();

    info!("{} Trend Monitor running. Press Ctrl+C to stop.", LogEmoji::SUCCESS);

    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down Trend Monitor");
    coordinator.shutdown();

    let (alert_result, signal_result) = tokio::join!(alerts, signals);
    for (name, result) in [("alert", alert_result), ("signal", signal_result)] {
        if let Err(e) = result {
            error!("{} loop ended abnormally: {}", name, e);
        }
    }

    let metrics = coordinator.metrics();
    info!(
        "{} Final metrics: {} alert ticks, {} signal ticks, {} users processed, {} failed, {} messages sent",
        LogEmoji::CHART,
        metrics.alert_ticks,
        metrics.signal_ticks,
        metrics.users_processed,
        metrics.users_failed,
        metrics.events_sent
    );

    Ok(())
}
