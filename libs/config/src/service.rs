//! Service configuration and defaults
//!
//! This module contains default configuration values and constants
//! used across Trendline services for consistency.

/// Default location of the monitor's TOML file
pub const DEFAULT_CONFIG_PATH: &str = "config/trend_monitor.toml";

/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`]
pub const CONFIG_PATH_ENV: &str = "TRENDLINE_CONFIG_PATH";

/// Price-alert sweep defaults
pub mod alerts {
    /// Seconds between alert sweeps
    pub const TICK_SECS: u64 = 60;

    /// Upper bound on one user's evaluation
    pub const USER_TIMEOUT_SECS: u64 = 120;
}

/// Signal sweep defaults
pub mod signals {
    /// Bars requested per symbol
    pub const BAR_LIMIT: usize = 200;

    /// Seconds to wait after a horizon boundary before fetching, so the closing bar is final
    pub const SETTLE_DELAY_SECS: u64 = 5;

    /// Horizons checked when none are configured
    pub const HORIZONS: [&str; 3] = ["2h", "4h", "1d"];

    /// Upper bound on one user's scan across every symbol and horizon
    pub const USER_TIMEOUT_SECS: u64 = 300;
}

/// Market data provider defaults
pub mod provider {
    /// Per-request timeout (seconds)
    pub const FETCH_TIMEOUT_SECS: u64 = 30;

    /// Upper bound on in-flight fetches within one sweep
    pub const MAX_CONCURRENT_FETCHES: usize = 8;

    pub const BINANCE_SPOT_URL: &str = "https://api.binance.com";
    pub const BINANCE_FUTURES_URL: &str = "https://fapi.binance.com";
}

/// Logging defaults
pub mod logging {
    /// Filter used when `RUST_LOG` is unset
    pub const DEFAULT_LEVEL: &str = "info";
}
