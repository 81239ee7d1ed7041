//! Monitor configuration

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use trendline_config::service;
use trendline_regression::KernelSpec;
use trendline_types::Horizon;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_level: String,
    pub alerts: AlertSweepConfig,
    pub signals: SignalSweepConfig,
    pub provider: ProviderConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSweepConfig {
    /// Seconds between sweeps; per-user cooldowns are checked on every tick
    pub tick_secs: u64,
    pub user_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSweepConfig {
    pub horizons: Vec<Horizon>,
    /// Bars fetched per (symbol, horizon), including the open one
    pub bar_limit: usize,
    /// Delay after a horizon boundary before scanning
    pub settle_delay_secs: u64,
    pub user_timeout_secs: u64,
    /// Append a line per failed (symbol, horizon) to the user's message
    pub report_failures: bool,
    pub kernel: KernelSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub spot_url: String,
    pub futures_url: String,
    pub fetch_timeout_secs: u64,
    pub max_concurrent_fetches: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot file; `~` and `$VAR` are expanded. In-memory only when unset.
    pub snapshot_path: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_level: service::logging::DEFAULT_LEVEL.to_string(),
            alerts: AlertSweepConfig::default(),
            signals: SignalSweepConfig::default(),
            provider: ProviderConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Default for AlertSweepConfig {
    fn default() -> Self {
        Self {
            tick_secs: service::alerts::TICK_SECS,
            user_timeout_secs: service::alerts::USER_TIMEOUT_SECS,
        }
    }
}

impl Default for SignalSweepConfig {
    fn default() -> Self {
        Self {
            horizons: Horizon::ALL.to_vec(),
            bar_limit: service::signals::BAR_LIMIT,
            settle_delay_secs: service::signals::SETTLE_DELAY_SECS,
            user_timeout_secs: service::signals::USER_TIMEOUT_SECS,
            report_failures: false,
            kernel: KernelSpec::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            spot_url: service::provider::BINANCE_SPOT_URL.to_string(),
            futures_url: service::provider::BINANCE_FUTURES_URL.to_string(),
            fetch_timeout_secs: service::provider::FETCH_TIMEOUT_SECS,
            max_concurrent_fetches: service::provider::MAX_CONCURRENT_FETCHES,
        }
    }
}

impl AlertSweepConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    pub fn user_timeout(&self) -> Duration {
        Duration::from_secs(self.user_timeout_secs)
    }
}

impl SignalSweepConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn user_timeout(&self) -> Duration {
        Duration::from_secs(self.user_timeout_secs)
    }
}

impl ProviderConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl MonitorConfig {
    /// Reject settings the sweeps cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.alerts.tick_secs == 0 {
            return Err(invalid("alerts.tick_secs must be positive"));
        }
        if self.alerts.user_timeout_secs == 0 || self.signals.user_timeout_secs == 0 {
            return Err(invalid("user_timeout_secs must be positive"));
        }
        if self.signals.horizons.is_empty() {
            return Err(invalid("signals.horizons must name at least one horizon"));
        }
        // One open bar plus at least two closed ones to compare deltas
        if self.signals.bar_limit < 3 {
            return Err(invalid("signals.bar_limit must be at least 3"));
        }
        self.signals.kernel.validate()?;
        if self.provider.fetch_timeout_secs == 0 {
            return Err(invalid("provider.fetch_timeout_secs must be positive"));
        }
        if self.provider.max_concurrent_fetches == 0 {
            return Err(invalid("provider.max_concurrent_fetches must be positive"));
        }
        if self.provider.spot_url.trim().is_empty() || self.provider.futures_url.trim().is_empty()
        {
            return Err(invalid("provider URLs must not be empty"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> MonitorError {
    MonitorError::Configuration {
        message: message.to_string(),
    }
}
