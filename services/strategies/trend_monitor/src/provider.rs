//! Market data provider seam
//!
//! The monitor only ever asks for two things: a bounded window of recent bars and the
//! current price. [`HttpPriceProvider`] answers both from Binance-compatible REST
//! endpoints; tests plug in [`FakeProvider`](crate::testing::FakeProvider).

use crate::config::ProviderConfig;
use crate::error::{MonitorError, ProviderError};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;
use trendline_types::{Market, PriceBar, PriceSeries, Timeframe};

/// Latest traded price for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub symbol: String,
    pub current_price: Decimal,
    pub exchange: String,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Exchange name shown to users
    fn name(&self) -> &str;

    /// Most recent `limit` bars, oldest first. The last bar is still open.
    async fn fetch_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
        market: Market,
    ) -> Result<PriceSeries, ProviderError>;

    async fn fetch_snapshot(
        &self,
        symbol: &str,
        market: Market,
    ) -> Result<PriceSnapshot, ProviderError>;
}

/// Run `fetch` with an upper bound, mapping expiry to [`ProviderError::Timeout`]
pub async fn with_timeout<T, F>(symbol: &str, after: Duration, fetch: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(after, fetch).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            symbol: symbol.to_string(),
            after,
        }),
    }
}

/// `binance` -> `Binance`
pub fn exchange_label(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `BTC/USDT` -> `BTCUSDT`; a settlement suffix such as `:USDT` is dropped
pub fn exchange_symbol(symbol: &str) -> String {
    let pair = symbol.split(':').next().unwrap_or(symbol);
    pair.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: String,
}

/// Binance REST client without a retry layer
pub struct HttpPriceProvider {
    client: reqwest::Client,
    spot_url: String,
    futures_url: String,
    timeout: Duration,
}

impl HttpPriceProvider {
    pub const NAME: &'static str = "binance";

    pub fn new(config: &ProviderConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(config.max_concurrent_fetches)
            .timeout(config.fetch_timeout())
            .tcp_nodelay(true)
            .build()
            .map_err(|e| MonitorError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            spot_url: config.spot_url.trim_end_matches('/').to_string(),
            futures_url: config.futures_url.trim_end_matches('/').to_string(),
            timeout: config.fetch_timeout(),
        })
    }

    fn endpoint(&self, market: Market, resource: &str) -> String {
        match market {
            Market::Spot => format!("{}/api/v3/{}", self.spot_url, resource),
            Market::Futures => format!("{}/fapi/v1/{}", self.futures_url, resource),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        symbol: &str,
        market: Market,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.map_transport_error(symbol, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(ProviderError::BadSymbol {
                symbol: symbol.to_string(),
                market,
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Upstream {
                symbol: symbol.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        response.json::<T>().await.map_err(|e| ProviderError::Decode {
            symbol: symbol.to_string(),
            message: e.to_string(),
        })
    }

    fn map_transport_error(&self, symbol: &str, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout {
                symbol: symbol.to_string(),
                after: self.timeout,
            }
        } else {
            ProviderError::Upstream {
                symbol: symbol.to_string(),
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl PriceProvider for HttpPriceProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
        market: Market,
    ) -> Result<PriceSeries, ProviderError> {
        let url = self.endpoint(market, "klines");
        let query = [
            ("symbol", exchange_symbol(symbol)),
            ("interval", timeframe.as_str().to_string()),
            ("limit", limit.to_string()),
        ];
        let rows: Vec<serde_json::Value> = self.get_json(symbol, market, &url, &query).await?;
        parse_klines(symbol, timeframe, &rows)
    }

    async fn fetch_snapshot(
        &self,
        symbol: &str,
        market: Market,
    ) -> Result<PriceSnapshot, ProviderError> {
        let url = self.endpoint(market, "ticker/price");
        let query = [("symbol", exchange_symbol(symbol))];
        let ticker: TickerPrice = self.get_json(symbol, market, &url, &query).await?;

        let current_price = Decimal::from_str(&ticker.price).map_err(|e| ProviderError::Decode {
            symbol: symbol.to_string(),
            message: format!("price '{}': {}", ticker.price, e),
        })?;

        Ok(PriceSnapshot {
            symbol: symbol.to_string(),
            current_price,
            exchange: Self::NAME.to_string(),
            timestamp: Utc::now(),
        })
    }
}

/// Decode Binance kline rows: `[open_time_ms, "open", "high", "low", "close", "volume", ...]`
pub fn parse_klines(
    symbol: &str,
    timeframe: Timeframe,
    rows: &[serde_json::Value],
) -> Result<PriceSeries, ProviderError> {
    let decode_error = |index: usize, what: &str| ProviderError::Decode {
        symbol: symbol.to_string(),
        message: format!("kline {}: {}", index, what),
    };

    let mut bars = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let fields = row
            .as_array()
            .filter(|fields| fields.len() >= 6)
            .ok_or_else(|| decode_error(index, "expected an array of at least 6 fields"))?;

        let open_time = fields[0]
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| decode_error(index, "invalid open time"))?;

        let mut values = [0.0f64; 5];
        for (slot, field) in values.iter_mut().zip(&fields[1..6]) {
            *slot = number_field(field).ok_or_else(|| decode_error(index, "invalid price field"))?;
        }
        let [open, high, low, close, volume] = values;

        bars.push(PriceBar::new(open_time, open, high, low, close, volume));
    }

    PriceSeries::new(symbol, timeframe, bars).map_err(|e| ProviderError::Decode {
        symbol: symbol.to_string(),
        message: e.to_string(),
    })
}

// Binance sends prices as strings; accept plain numbers too
fn number_field(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        other => other.as_f64(),
    }
}
