//! Identifiers and error types shared by every Trendline crate

pub mod errors;
pub mod identifiers;
