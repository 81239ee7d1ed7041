//! # Trendline Types Library
//!
//! Shared type system for the Trendline alert and trend-signal services.
//!
//! ## Design Philosophy
//!
//! - **Immutable market data**: a [`PriceSeries`] is validated once on construction and never
//!   mutated afterwards
//! - **Closed sets over strings**: timeframes, horizons, markets and user configuration keys are
//!   enums with explicit parsers, so invalid input is rejected at the edge
//! - **Exact thresholds**: alert targets and thresholds use `rust_decimal::Decimal`; bar data
//!   stays `f64` because it only feeds floating-point regression math
//!
//! ## Quick Start
//!
//! ```rust
//! use trendline_types::{normalize_symbol, ConfigKey, Timeframe, UserConfig};
//!
//! assert_eq!(normalize_symbol("btc"), "BTC/USDT");
//! assert_eq!("4h".parse::<Timeframe>().unwrap(), Timeframe::H4);
//!
//! let mut config = UserConfig::default();
//! config.apply(ConfigKey::PriceThreshold, "0.02").unwrap();
//! ```
//!
//! ## Integration Points
//!
//! - **Regression engine**: consumes `PriceSeries::closes()`
//! - **Monitor service**: alert rules, subscriptions, user config and price snapshots
//! - **Stores**: every persisted entity derives `Serialize`/`Deserialize`

pub mod common;
pub mod market;
pub mod user;

pub use common::errors::{ConfigValueError, SeriesError};
pub use common::identifiers::{normalize_symbol, ChatId, Market};
pub use market::bars::{PriceBar, PriceSeries};
pub use market::timeframe::{Horizon, Timeframe};
pub use user::{AlertRule, ConfigKey, MonitorSubscription, Toggle, UserConfig};

pub use rust_decimal::Decimal;
