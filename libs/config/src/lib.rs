//! # Trendline Centralized Configuration
//!
//! Configuration loading and default constants shared by Trendline services.
//!
//! ## Features
//!
//! - **Layered loading**: optional TOML file, then `TRENDLINE_*` environment overrides
//! - **Path expansion**: `~` and `$VAR` expansion for file locations
//! - **Service defaults**: sweep cadence, fetch limits and provider endpoints in one place
//!
//! ## Usage
//!
//! ```rust,no_run
//! use serde::Deserialize;
//! use trendline_config::{load_config, service, ENV_PREFIX};
//!
//! #[derive(Deserialize, Default)]
//! #[serde(default)]
//! struct MyConfig {
//!     tick_secs: u64,
//! }
//!
//! let config: MyConfig = load_config("config/my_service.toml", ENV_PREFIX).unwrap();
//! let tick = service::alerts::TICK_SECS;
//! ```

pub mod service;
pub mod service_config;

pub use service_config::{expand_path, load_config, resolve_config_path, ENV_PREFIX};
