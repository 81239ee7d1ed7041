//! # Trend Monitor - Price Alerts and Kernel Regression Trend Signals
//!
//! ## Purpose
//!
//! Periodic per-user notification service. Two independent sweeps run against one
//! shared store, price provider and notification sink:
//!
//! - **Alert sweep**: checks each user's price alert rules every tick, rate limited by
//!   the user's own alert interval, and sends a message for every rule whose target the
//!   price is within threshold of
//! - **Signal sweep**: on 2h/4h/1d candle closes, runs kernel regression over each
//!   monitored symbol and sends one batched message of turning points per user
//!
//! ## Architecture Role
//!
//! ```text
//! HorizonSchedule ─┐                 ┌→ AlertEvaluator ─→ PriceProvider::fetch_snapshot
//!                  ├→ Coordinator ───┤
//! alert tick ──────┘        │        └→ SignalScanner ──→ PriceProvider::fetch_series
//!                           │                                 ↓
//!                           │                          RegressionEngine
//!                           ↓
//!                    NotificationSink
//! ```
//!
//! Every external collaborator sits behind a trait in [`MonitorContext`]:
//! [`store::Store`], [`provider::PriceProvider`] and [`sink::NotificationSink`].
//!
//! ## Failure Model
//!
//! - A failed fetch skips that symbol (alerts) or (symbol, horizon) pair (signals)
//! - A failed store read skips that user for this pass; the next pass retries
//! - Each fetch and each user is bounded by a timeout
//! - Nothing short of startup errors stops the process
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trendline_monitor::{
//!     Coordinator, HttpPriceProvider, MemoryStore, MonitorConfig, MonitorContext, TracingSink,
//! };
//!
//! # async fn run() -> trendline_monitor::Result<()> {
//! let config = MonitorConfig::default();
//! let context = MonitorContext::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(TracingSink),
//!     Arc::new(HttpPriceProvider::new(&config.provider)?),
//! );
//!
//! let coordinator = Arc::new(Coordinator::new(context, config)?);
//! let (alerts, signals) = coordinator.start();
//!
//! coordinator.shutdown();
//! let _ = tokio::join!(alerts, signals);
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod provider;
pub mod scanner;
pub mod schedule;
pub mod sink;
pub mod store;
pub mod testing;

pub use alerts::{AlertEvaluator, AlertOutcome, AlertTrigger};
pub use config::MonitorConfig;
pub use context::MonitorContext;
pub use coordinator::{Coordinator, SweepReport};
pub use error::{MonitorError, ProviderError, Result, SinkError, StoreError};
pub use metrics::{MetricsSnapshot, SweepMetrics};
pub use provider::{HttpPriceProvider, PriceProvider, PriceSnapshot};
pub use scanner::{ScanOutcome, ScannerConfig, SignalScanner, TrendEvent};
pub use schedule::HorizonSchedule;
pub use sink::{NotificationSink, TracingSink};
pub use store::{AlertStore, MemoryStore, MonitorStore, Store, UserConfigStore};

pub use rust_decimal::Decimal;
pub use trendline_types::{ChatId, Horizon};
