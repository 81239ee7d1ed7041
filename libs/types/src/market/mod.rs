//! Market data types

pub mod bars;
pub mod timeframe;
