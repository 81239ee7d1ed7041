//! Testing utilities for the monitor
//!
//! In-process fakes for the provider, sink and store seams, so sweeps can be driven
//! deterministically without network access.

use crate::error::{ProviderError, SinkError, StoreError};
use crate::provider::{PriceProvider, PriceSnapshot};
use crate::sink::NotificationSink;
use crate::store::{AlertStore, MemoryStore, MonitorStore, UserConfigStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use trendline_types::{
    AlertRule, ChatId, ConfigKey, Market, PriceBar, PriceSeries, Timeframe, UserConfig,
};

/// Series with one bar per `timeframe` step from 2024-01-01, OHLC all equal to the close.
///
/// Panics on an empty `closes`.
pub fn series_from_closes(symbol: &str, timeframe: Timeframe, closes: &[f64]) -> PriceSeries {
    let start: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let step = ChronoDuration::from_std(timeframe.duration()).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar::new(start + step * i as i32, close, close, close, close, 1.0))
        .collect();
    PriceSeries::new(symbol, timeframe, bars).unwrap()
}

/// Provider answering from canned closes and prices
#[derive(Default)]
pub struct FakeProvider {
    closes: RwLock<HashMap<(String, Timeframe), Vec<f64>>>,
    prices: RwLock<HashMap<String, Decimal>>,
    failing: RwLock<HashSet<String>>,
    delays: RwLock<HashMap<String, Duration>>,
    series_calls: AtomicUsize,
    snapshot_calls: AtomicUsize,
    markets: Mutex<Vec<Market>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_closes(&self, symbol: &str, timeframe: Timeframe, closes: &[f64]) {
        self.closes
            .write()
            .insert((symbol.to_string(), timeframe), closes.to_vec());
    }

    pub fn set_price(&self, symbol: &str, price: Decimal) {
        self.prices.write().insert(symbol.to_string(), price);
    }

    /// Every request for `symbol` fails with an upstream error
    pub fn fail_symbol(&self, symbol: &str) {
        self.failing.write().insert(symbol.to_string());
    }

    /// Every request for `symbol` sleeps for `delay` first
    pub fn delay_symbol(&self, symbol: &str, delay: Duration) {
        self.delays.write().insert(symbol.to_string(), delay);
    }

    pub fn series_calls(&self) -> usize {
        self.series_calls.load(Ordering::SeqCst)
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    /// Markets requested so far, in call order
    pub fn markets_requested(&self) -> Vec<Market> {
        self.markets.lock().clone()
    }

    async fn before_request(&self, symbol: &str, market: Market) -> Result<(), ProviderError> {
        self.markets.lock().push(market);
        let delay = self.delays.read().get(symbol).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.read().contains(symbol) {
            return Err(ProviderError::Upstream {
                symbol: symbol.to_string(),
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PriceProvider for FakeProvider {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
        market: Market,
    ) -> Result<PriceSeries, ProviderError> {
        self.series_calls.fetch_add(1, Ordering::SeqCst);
        self.before_request(symbol, market).await?;

        let closes = self
            .closes
            .read()
            .get(&(symbol.to_string(), timeframe))
            .cloned()
            .ok_or_else(|| ProviderError::BadSymbol {
                symbol: symbol.to_string(),
                market,
            })?;
        let start = closes.len().saturating_sub(limit);
        Ok(series_from_closes(symbol, timeframe, &closes[start..]))
    }

    async fn fetch_snapshot(
        &self,
        symbol: &str,
        market: Market,
    ) -> Result<PriceSnapshot, ProviderError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        self.before_request(symbol, market).await?;

        let current_price = self.prices.read().get(symbol).copied().ok_or_else(|| {
            ProviderError::BadSymbol {
                symbol: symbol.to_string(),
                market,
            }
        })?;
        Ok(PriceSnapshot {
            symbol: symbol.to_string(),
            current_price,
            exchange: self.name().to_string(),
            timestamp: Utc::now(),
        })
    }
}

/// Sink that keeps every message, optionally refusing delivery
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<(ChatId, String)>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<(ChatId, String)> {
        self.messages.lock().clone()
    }

    pub fn messages_for(&self, chat: ChatId) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(to, _)| *to == chat)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Delivery {
                chat,
                message: "injected failure".to_string(),
            });
        }
        self.messages.lock().push((chat, text.to_string()));
        Ok(())
    }
}

/// [`MemoryStore`] whose reads fail for selected chats
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    unavailable: RwLock<HashSet<ChatId>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, chat: ChatId, unavailable: bool) {
        let mut chats = self.unavailable.write();
        if unavailable {
            chats.insert(chat);
        } else {
            chats.remove(&chat);
        }
    }

    fn check(&self, chat: ChatId) -> Result<(), StoreError> {
        if self.unavailable.read().contains(&chat) {
            return Err(StoreError::Unavailable {
                message: format!("chat {} unavailable", chat),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AlertStore for FlakyStore {
    async fn add(
        &self,
        chat: ChatId,
        symbol: &str,
        price: Decimal,
        message: Option<String>,
    ) -> Result<usize, StoreError> {
        self.inner.add(chat, symbol, price, message).await
    }

    async fn update(
        &self,
        chat: ChatId,
        id: usize,
        price: Decimal,
        message: Option<String>,
    ) -> Result<Option<String>, StoreError> {
        self.inner.update(chat, id, price, message).await
    }

    async fn delete(&self, chat: ChatId, id: usize) -> Result<bool, StoreError> {
        self.inner.delete(chat, id).await
    }

    async fn list(&self, chat: ChatId) -> Result<Vec<AlertRule>, StoreError> {
        self.check(chat)?;
        self.inner.list(chat).await
    }

    async fn alert_owners(&self) -> Result<Vec<ChatId>, StoreError> {
        self.inner.alert_owners().await
    }
}

#[async_trait]
impl MonitorStore for FlakyStore {
    async fn add_symbols(&self, chat: ChatId, symbols: &[String]) -> Result<usize, StoreError> {
        self.inner.add_symbols(chat, symbols).await
    }

    async fn delete_symbol(&self, chat: ChatId, id: usize) -> Result<bool, StoreError> {
        self.inner.delete_symbol(chat, id).await
    }

    async fn list_symbols(&self, chat: ChatId) -> Result<Vec<String>, StoreError> {
        self.check(chat)?;
        self.inner.list_symbols(chat).await
    }

    async fn monitor_owners(&self) -> Result<Vec<ChatId>, StoreError> {
        self.inner.monitor_owners().await
    }
}

#[async_trait]
impl UserConfigStore for FlakyStore {
    async fn get_or_create(&self, chat: ChatId) -> Result<UserConfig, StoreError> {
        self.check(chat)?;
        self.inner.get_or_create(chat).await
    }

    async fn set(
        &self,
        chat: ChatId,
        key: ConfigKey,
        raw: &str,
    ) -> Result<UserConfig, StoreError> {
        self.inner.set(chat, key, raw).await
    }
}
