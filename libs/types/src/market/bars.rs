//! OHLCV bars and the immutable series a provider returns for one fetch

use crate::common::errors::SeriesError;
use crate::market::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One time-bucketed price record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Bar open time (UTC)
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Ordered bars for one (symbol, timeframe) fetch.
///
/// Timestamps are strictly increasing. The final bar is the one still forming on the
/// exchange; everything before it is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, rejecting empty input and non-increasing timestamps
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<PriceBar>,
    ) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(SeriesError::Empty { symbol });
        }

        if let Some(index) = bars
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(SeriesError::NonIncreasingTimestamp {
                symbol,
                index: index + 1,
            });
        }

        Ok(Self {
            symbol,
            timeframe,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar (still open)
    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Close prices of all bars
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(start + Duration::hours(i as i64), c, c, c, c, 1.0))
            .collect()
    }

    #[test]
    fn test_series_creation() {
        let series = PriceSeries::new("BTC/USDT", Timeframe::H1, bars(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
        assert_eq!(series.last().unwrap().close, 3.0);
    }

    #[test]
    fn test_rejects_empty_series() {
        let err = PriceSeries::new("BTC/USDT", Timeframe::H1, vec![]).unwrap_err();
        assert!(matches!(err, SeriesError::Empty { .. }));
    }

    #[test]
    fn test_rejects_out_of_order_bars() {
        let mut input = bars(&[1.0, 2.0, 3.0]);
        input.swap(1, 2);
        let err = PriceSeries::new("BTC/USDT", Timeframe::H1, input).unwrap_err();
        assert_eq!(
            err,
            SeriesError::NonIncreasingTimestamp {
                symbol: "BTC/USDT".to_string(),
                index: 2
            }
        );
    }

    #[test]
    fn test_rejects_duplicate_timestamps() {
        let mut input = bars(&[1.0, 2.0]);
        input[1].timestamp = input[0].timestamp;
        assert!(PriceSeries::new("BTC/USDT", Timeframe::H1, input).is_err());
    }
}
