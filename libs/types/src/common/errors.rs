//! Error types for series construction and user configuration validation
//!
//! These are value-level errors: callers report them back to whoever supplied the
//! input and carry on. None of them is fatal to a running service.

use thiserror::Error;

/// Errors that can occur while building a [`PriceSeries`](crate::PriceSeries)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeriesError {
    /// Provider returned no bars at all
    #[error("Series for {symbol} is empty")]
    Empty { symbol: String },

    /// Bars are not in strictly increasing timestamp order
    #[error("Bar {index} of {symbol} does not advance the timestamp")]
    NonIncreasingTimestamp { symbol: String, index: usize },
}

/// Errors produced when a user configuration update is rejected
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigValueError {
    /// Key is not one of the recognised configuration fields
    #[error("Unknown config key '{key}'")]
    UnknownKey { key: String },

    /// Toggle fields only accept `on` or `off`
    #[error("Invalid value '{value}' for {key}: expected 'on' or 'off'")]
    InvalidToggle { key: &'static str, value: String },

    /// Value could not be parsed as a number
    #[error("Invalid value '{value}' for {key}: not a number")]
    NotANumber { key: &'static str, value: String },

    /// Numeric value parsed but falls outside the accepted range
    #[error("Value {value} for {key} is out of range [{min}, {max}]")]
    OutOfRange {
        key: &'static str,
        value: String,
        min: String,
        max: String,
    },
}
