//! Persistent store seam for alert rules, monitor subscriptions and user config
//!
//! Rule and subscription ids are 1-based *positions* in the owner's current list, so
//! every operation on one owner's list is a read-modify-write of the whole list.
//! Ids outside `1..=len` are answered with `None`/`false`, never an error.

use crate::error::StoreError;
use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use trendline_types::{
    normalize_symbol, AlertRule, ChatId, ConfigKey, MonitorSubscription, UserConfig,
};

#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Append a rule, returning its id (the new list length)
    async fn add(
        &self,
        chat: ChatId,
        symbol: &str,
        price: Decimal,
        message: Option<String>,
    ) -> Result<usize, StoreError>;

    /// Replace target and message of rule `id`, returning its symbol
    async fn update(
        &self,
        chat: ChatId,
        id: usize,
        price: Decimal,
        message: Option<String>,
    ) -> Result<Option<String>, StoreError>;

    /// Remove rule `id`; later rules move up one position
    async fn delete(&self, chat: ChatId, id: usize) -> Result<bool, StoreError>;

    async fn list(&self, chat: ChatId) -> Result<Vec<AlertRule>, StoreError>;

    /// Chats owning at least one rule
    async fn alert_owners(&self) -> Result<Vec<ChatId>, StoreError>;
}

#[async_trait]
pub trait MonitorStore: Send + Sync {
    /// Merge symbols into the chat's set, returning the resulting count
    async fn add_symbols(&self, chat: ChatId, symbols: &[String]) -> Result<usize, StoreError>;

    async fn delete_symbol(&self, chat: ChatId, id: usize) -> Result<bool, StoreError>;

    async fn list_symbols(&self, chat: ChatId) -> Result<Vec<String>, StoreError>;

    /// Chats watching at least one symbol
    async fn monitor_owners(&self) -> Result<Vec<ChatId>, StoreError>;
}

#[async_trait]
pub trait UserConfigStore: Send + Sync {
    /// Config for `chat`, created with defaults on first access
    async fn get_or_create(&self, chat: ChatId) -> Result<UserConfig, StoreError>;

    /// Validate and apply one key, returning the updated config
    async fn set(&self, chat: ChatId, key: ConfigKey, raw: &str)
        -> Result<UserConfig, StoreError>;
}

/// Everything the monitor needs from persistence
pub trait Store: AlertStore + MonitorStore + UserConfigStore {}

impl<T: AlertStore + MonitorStore + UserConfigStore> Store for T {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    alerts: BTreeMap<ChatId, Vec<AlertRule>>,
    #[serde(default)]
    monitors: BTreeMap<ChatId, MonitorSubscription>,
    #[serde(default)]
    configs: BTreeMap<ChatId, UserConfig>,
}

/// In-process store with an optional JSON snapshot file.
///
/// Each operation holds the write lock for its whole read-modify-write. Changes are
/// made on a copy of the state, and the copy replaces the live state only after the
/// snapshot holding it has been written.
pub struct MemoryStore {
    state: RwLock<StoreState>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Store that lives only as long as the process
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            snapshot_path: None,
        }
    }

    /// Store backed by `path`, loading it when the file already exists
    pub fn with_snapshot(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let state = if path.exists() {
            let bytes = std::fs::read(&path).map_err(|e| StoreError::Unavailable {
                message: format!("read {:?}: {}", path, e),
            })?;
            let state: StoreState =
                serde_json::from_slice(&bytes).map_err(|e| StoreError::Unavailable {
                    message: format!("parse {:?}: {}", path, e),
                })?;
            info!(
                "📂 Loaded store snapshot from {:?}: {} alert owners, {} monitor owners, {} configs",
                path,
                state.alerts.len(),
                state.monitors.len(),
                state.configs.len()
            );
            state
        } else {
            info!("No store snapshot at {:?}, starting empty", path);
            StoreState::default()
        };

        Ok(Self {
            state: RwLock::new(state),
            snapshot_path: Some(path),
        })
    }

    fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let persistence_error = |e: &dyn std::fmt::Display| StoreError::Persistence {
            message: format!("{:?}: {}", path, e),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| persistence_error(&e))?;
        }
        let bytes = serde_json::to_vec_pretty(state).map_err(|e| persistence_error(&e))?;

        // Write-then-rename so a crash never leaves a truncated snapshot
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes).map_err(|e| persistence_error(&e))?;
        std::fs::rename(&tmp, path).map_err(|e| persistence_error(&e))?;

        debug!("Store snapshot written to {:?}", path);
        Ok(())
    }

    /// Persist `next`, then make it the live state
    fn commit(&self, state: &mut StoreState, next: StoreState) -> Result<(), StoreError> {
        self.persist(&next)?;
        *state = next;
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn position(id: usize, len: usize) -> Option<usize> {
    (1..=len).contains(&id).then(|| id - 1)
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn add(
        &self,
        chat: ChatId,
        symbol: &str,
        price: Decimal,
        message: Option<String>,
    ) -> Result<usize, StoreError> {
        let mut state = self.state.write();
        let mut next = state.clone();
        let rules = next.alerts.entry(chat).or_default();
        rules.push(AlertRule::new(chat, normalize_symbol(symbol), price, message));
        let id = rules.len();
        self.commit(&mut state, next)?;
        Ok(id)
    }

    async fn update(
        &self,
        chat: ChatId,
        id: usize,
        price: Decimal,
        message: Option<String>,
    ) -> Result<Option<String>, StoreError> {
        let mut state = self.state.write();
        let mut next = state.clone();
        let Some(rule) = next
            .alerts
            .get_mut(&chat)
            .and_then(|rules| {
                let index = position(id, rules.len())?;
                rules.get_mut(index)
            })
        else {
            return Ok(None);
        };

        rule.target_price = price;
        rule.message = message;
        let symbol = rule.symbol.clone();

        self.commit(&mut state, next)?;
        Ok(Some(symbol))
    }

    async fn delete(&self, chat: ChatId, id: usize) -> Result<bool, StoreError> {
        let mut state = self.state.write();
        let mut next = state.clone();
        let Some(rules) = next.alerts.get_mut(&chat) else {
            return Ok(false);
        };
        let Some(index) = position(id, rules.len()) else {
            return Ok(false);
        };

        rules.remove(index);
        if rules.is_empty() {
            next.alerts.remove(&chat);
        }

        self.commit(&mut state, next)?;
        Ok(true)
    }

    async fn list(&self, chat: ChatId) -> Result<Vec<AlertRule>, StoreError> {
        Ok(self.state.read().alerts.get(&chat).cloned().unwrap_or_default())
    }

    async fn alert_owners(&self) -> Result<Vec<ChatId>, StoreError> {
        Ok(self.state.read().alerts.keys().copied().collect())
    }
}

#[async_trait]
impl MonitorStore for MemoryStore {
    async fn add_symbols(&self, chat: ChatId, symbols: &[String]) -> Result<usize, StoreError> {
        let mut state = self.state.write();
        let mut next = state.clone();
        let count = next
            .monitors
            .entry(chat)
            .or_insert_with(|| MonitorSubscription::new(chat))
            .merge(symbols);
        self.commit(&mut state, next)?;
        Ok(count)
    }

    async fn delete_symbol(&self, chat: ChatId, id: usize) -> Result<bool, StoreError> {
        let mut state = self.state.write();
        let mut next = state.clone();
        let Some(subscription) = next.monitors.get_mut(&chat) else {
            return Ok(false);
        };
        if !subscription.remove_position(id) {
            return Ok(false);
        }
        if subscription.symbols.is_empty() {
            next.monitors.remove(&chat);
        }

        self.commit(&mut state, next)?;
        Ok(true)
    }

    async fn list_symbols(&self, chat: ChatId) -> Result<Vec<String>, StoreError> {
        Ok(self
            .state
            .read()
            .monitors
            .get(&chat)
            .map(|subscription| subscription.symbols.clone())
            .unwrap_or_default())
    }

    async fn monitor_owners(&self) -> Result<Vec<ChatId>, StoreError> {
        Ok(self.state.read().monitors.keys().copied().collect())
    }
}

#[async_trait]
impl UserConfigStore for MemoryStore {
    async fn get_or_create(&self, chat: ChatId) -> Result<UserConfig, StoreError> {
        if let Some(config) = self.state.read().configs.get(&chat) {
            return Ok(config.clone());
        }

        let mut state = self.state.write();
        if let Some(config) = state.configs.get(&chat) {
            return Ok(config.clone());
        }
        let config = UserConfig::default();
        let mut next = state.clone();
        next.configs.insert(chat, config.clone());
        self.commit(&mut state, next)?;
        Ok(config)
    }

    async fn set(
        &self,
        chat: ChatId,
        key: ConfigKey,
        raw: &str,
    ) -> Result<UserConfig, StoreError> {
        let mut state = self.state.write();
        let mut config = state.configs.get(&chat).cloned().unwrap_or_default();
        config.apply(key, raw)?;
        let mut next = state.clone();
        next.configs.insert(chat, config.clone());
        self.commit(&mut state, next)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trendline_types::{ConfigValueError, Toggle};

    const CHAT: ChatId = ChatId(42);

    #[tokio::test]
    async fn test_alert_ids_are_positions() {
        let store = MemoryStore::new();

        assert_eq!(store.add(CHAT, "BTC/USDT", dec!(50000), None).await.unwrap(), 1);
        assert_eq!(store.add(CHAT, "ETH/USDT", dec!(3000), None).await.unwrap(), 2);
        assert_eq!(store.add(CHAT, "SOL/USDT", dec!(150), None).await.unwrap(), 3);

        assert!(store.delete(CHAT, 2).await.unwrap());

        let rules = store.list(CHAT).await.unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].symbol, "SOL/USDT");

        let symbol = store
            .update(CHAT, 2, dec!(160), Some("take profit".to_string()))
            .await
            .unwrap();
        assert_eq!(symbol.as_deref(), Some("SOL/USDT"));
    }

    #[tokio::test]
    async fn test_out_of_range_ids() {
        let store = MemoryStore::new();
        store.add(CHAT, "BTC/USDT", dec!(50000), None).await.unwrap();

        assert!(!store.delete(CHAT, 0).await.unwrap());
        assert!(!store.delete(CHAT, 2).await.unwrap());
        assert!(!store.delete(ChatId(7), 1).await.unwrap());
        assert_eq!(store.update(CHAT, 5, dec!(1), None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_owners_track_non_empty_lists() {
        let store = MemoryStore::new();
        store.add(CHAT, "BTC/USDT", dec!(50000), None).await.unwrap();
        store.add_symbols(ChatId(7), &["ETH/USDT".to_string()]).await.unwrap();

        assert_eq!(store.alert_owners().await.unwrap(), vec![CHAT]);
        assert_eq!(store.monitor_owners().await.unwrap(), vec![ChatId(7)]);

        store.delete(CHAT, 1).await.unwrap();
        assert!(store.alert_owners().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_monitor_symbols_deduplicate() {
        let store = MemoryStore::new();
        let count = store
            .add_symbols(CHAT, &["ETH/USDT".to_string(), "BTC/USDT".to_string()])
            .await
            .unwrap();
        assert_eq!(count, 2);

        let count = store
            .add_symbols(CHAT, &["BTC/USDT".to_string(), "SOL/USDT".to_string()])
            .await
            .unwrap();
        assert_eq!(count, 3);

        assert!(store.delete_symbol(CHAT, 1).await.unwrap());
        assert_eq!(
            store.list_symbols(CHAT).await.unwrap(),
            vec!["ETH/USDT".to_string(), "SOL/USDT".to_string()]
        );
        assert!(!store.delete_symbol(CHAT, 3).await.unwrap());
    }

    #[tokio::test]
    async fn test_symbols_are_normalised_on_add() {
        let store = MemoryStore::new();
        store.add(CHAT, "btc", dec!(50000), None).await.unwrap();
        store.add(CHAT, " eth/usdt ", dec!(3000), None).await.unwrap();

        let rules = store.list(CHAT).await.unwrap();
        assert_eq!(rules[0].symbol, "BTC/USDT");
        assert_eq!(rules[1].symbol, "ETH/USDT");

        let count = store
            .add_symbols(
                CHAT,
                &["btc".to_string(), "BTC/USDT".to_string(), "sol".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            store.list_symbols(CHAT).await.unwrap(),
            vec!["BTC/USDT".to_string(), "SOL/USDT".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_snapshot_write_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = MemoryStore::with_snapshot(&path).unwrap();
        store.add(CHAT, "BTC/USDT", dec!(50000), None).await.unwrap();
        store.add_symbols(CHAT, &["ETH/USDT".to_string()]).await.unwrap();
        store.set(CHAT, ConfigKey::AlertInterval, "10").await.unwrap();

        // A directory where the temporary snapshot goes makes every write fail
        let blocker = dir.path().join("store.json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        let err = store.add(CHAT, "ETH/USDT", dec!(3000), None).await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence { .. }));
        assert!(store.update(CHAT, 1, dec!(1), None).await.is_err());
        assert!(store.delete(CHAT, 1).await.is_err());
        assert!(store.add_symbols(CHAT, &["SOL/USDT".to_string()]).await.is_err());
        assert!(store.delete_symbol(CHAT, 1).await.is_err());
        assert!(store.set(CHAT, ConfigKey::AlertInterval, "30").await.is_err());
        assert!(store.get_or_create(ChatId(7)).await.is_err());

        let rules = store.list(CHAT).await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].target_price, dec!(50000));
        assert_eq!(
            store.list_symbols(CHAT).await.unwrap(),
            vec!["ETH/USDT".to_string()]
        );
        assert_eq!(store.get_or_create(CHAT).await.unwrap().alert_interval, 10);

        // Once writes succeed again a retried add gets the id it would have had
        std::fs::remove_dir(&blocker).unwrap();
        assert_eq!(store.add(CHAT, "ETH/USDT", dec!(3000), None).await.unwrap(), 2);
        assert_eq!(MemoryStore::with_snapshot(&path).unwrap().list(CHAT).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_config_created_lazily_and_validated() {
        let store = MemoryStore::new();
        let config = store.get_or_create(CHAT).await.unwrap();
        assert_eq!(config, UserConfig::default());

        let config = store.set(CHAT, ConfigKey::IsAlert, "off").await.unwrap();
        assert_eq!(config.is_alert, Toggle::Off);

        let err = store
            .set(CHAT, ConfigKey::AlertInterval, "0")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidValue(ConfigValueError::OutOfRange { .. })
        ));

        // Rejected value leaves the stored config untouched
        let config = store.get_or_create(CHAT).await.unwrap();
        assert_eq!(config.alert_interval, 5);
        assert_eq!(config.is_alert, Toggle::Off);
    }
}
