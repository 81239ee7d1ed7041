//! Error types for the trend monitor
//!
//! Every variant is recoverable: sweeps log it against the user or symbol it came from
//! and move on. Only startup turns one of these into a process exit.

use std::time::Duration;
use thiserror::Error;
use trendline_regression::RegressionError;
use trendline_types::{ChatId, ConfigValueError, Market};

/// Failures reported by a [`PriceProvider`](crate::provider::PriceProvider)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Unknown symbol {symbol} on {market} market")]
    BadSymbol { symbol: String, market: Market },

    #[error("Request for {symbol} timed out after {after:?}")]
    Timeout { symbol: String, after: Duration },

    #[error("Upstream error for {symbol}: {message}")]
    Upstream { symbol: String, message: String },

    #[error("Malformed response for {symbol}: {message}")]
    Decode { symbol: String, message: String },
}

/// Failures reported by the rule, subscription and config stores
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Failed to persist store snapshot: {message}")]
    Persistence { message: String },

    #[error("Rejected config value: {0}")]
    InvalidValue(#[from] ConfigValueError),
}

/// Failures reported by a [`NotificationSink`](crate::sink::NotificationSink)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SinkError {
    #[error("Failed to deliver to chat {chat}: {message}")]
    Delivery { chat: ChatId, message: String },
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Regression error: {0}")]
    Regression(#[from] RegressionError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("{what} timed out after {after:?}")]
    Timeout { what: String, after: Duration },
}

pub type Result<T> = std::result::Result<T, MonitorError>;
