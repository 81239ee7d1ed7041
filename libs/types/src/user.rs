//! Per-user state: price alert rules, monitored symbols and typed configuration
//!
//! Rules and subscriptions have no stable id. A rule's id is its 1-based position in
//! its owner's list, so deleting one renumbers every rule after it. Callers already
//! depend on that numbering, so stores must preserve it.

use crate::common::errors::ConfigValueError;
use crate::common::identifiers::{normalize_symbol, ChatId, Market};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Threshold price alert owned by one chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub owner: ChatId,
    pub symbol: String,
    pub target_price: Decimal,
    /// Free text echoed back when the rule triggers
    pub message: Option<String>,
}

impl AlertRule {
    pub fn new(
        owner: ChatId,
        symbol: impl Into<String>,
        target_price: Decimal,
        message: Option<String>,
    ) -> Self {
        Self {
            owner,
            symbol: symbol.into(),
            target_price,
            message,
        }
    }
}

/// Symbols a chat wants trend signals for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSubscription {
    pub owner: ChatId,
    /// Deduplicated and sorted; positions shift on every write
    pub symbols: Vec<String>,
}

impl MonitorSubscription {
    pub fn new(owner: ChatId) -> Self {
        Self {
            owner,
            symbols: Vec::new(),
        }
    }

    /// Normalise and merge new symbols in, returning the resulting count
    pub fn merge<I, S>(&mut self, symbols: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.symbols
            .extend(symbols.into_iter().map(|s| normalize_symbol(s.as_ref())));
        self.symbols.sort();
        self.symbols.dedup();
        self.symbols.len()
    }

    /// Remove the symbol at 1-based position `id`
    pub fn remove_position(&mut self, id: usize) -> bool {
        if id == 0 || id > self.symbols.len() {
            return false;
        }
        self.symbols.remove(id - 1);
        true
    }
}

/// On/off flag as users type it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Toggle::On => f.write_str("on"),
            Toggle::Off => f.write_str("off"),
        }
    }
}

/// Recognised user configuration fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    IsAlert,
    PriceThreshold,
    AlertInterval,
    IsFuture,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 4] = [
        ConfigKey::IsAlert,
        ConfigKey::PriceThreshold,
        ConfigKey::AlertInterval,
        ConfigKey::IsFuture,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ConfigKey::IsAlert => "is_alert",
            ConfigKey::PriceThreshold => "price_threshold",
            ConfigKey::AlertInterval => "alert_interval",
            ConfigKey::IsFuture => "is_future",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        ConfigKey::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == key)
            .ok_or(ConfigValueError::UnknownKey { key })
    }
}

/// Longest accepted alert interval (one day)
pub const MAX_ALERT_INTERVAL_MINUTES: u32 = 1440;

/// Per-chat settings, created with defaults on first access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    pub is_alert: Toggle,
    /// Fraction of the target price, e.g. 0.01 = 1%
    pub price_threshold: Decimal,
    /// Minutes between alert evaluations for this chat
    pub alert_interval: u32,
    pub is_future: Toggle,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            is_alert: Toggle::On,
            price_threshold: Decimal::new(5, 3), // 0.5%
            alert_interval: 5,
            is_future: Toggle::Off,
        }
    }
}

impl UserConfig {
    pub fn alerts_enabled(&self) -> bool {
        self.is_alert.is_on()
    }

    /// Market the chat's symbols are fetched from
    pub fn market(&self) -> Market {
        if self.is_future.is_on() {
            Market::Futures
        } else {
            Market::Spot
        }
    }

    pub fn alert_interval_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.alert_interval))
    }

    /// Validate `raw` for `key` and store it. Leaves the config untouched on error.
    pub fn apply(&mut self, key: ConfigKey, raw: &str) -> Result<(), ConfigValueError> {
        let raw = raw.trim();
        match key {
            ConfigKey::IsAlert => self.is_alert = parse_toggle(key, raw)?,
            ConfigKey::IsFuture => self.is_future = parse_toggle(key, raw)?,
            ConfigKey::PriceThreshold => {
                let value =
                    Decimal::from_str(raw).map_err(|_| ConfigValueError::NotANumber {
                        key: key.as_str(),
                        value: raw.to_string(),
                    })?;
                if value <= Decimal::ZERO || value > Decimal::ONE {
                    return Err(ConfigValueError::OutOfRange {
                        key: key.as_str(),
                        value: raw.to_string(),
                        min: "0 (exclusive)".to_string(),
                        max: "1".to_string(),
                    });
                }
                self.price_threshold = value;
            }
            ConfigKey::AlertInterval => {
                let value = raw.parse::<u32>().map_err(|_| ConfigValueError::NotANumber {
                    key: key.as_str(),
                    value: raw.to_string(),
                })?;
                if !(1..=MAX_ALERT_INTERVAL_MINUTES).contains(&value) {
                    return Err(ConfigValueError::OutOfRange {
                        key: key.as_str(),
                        value: raw.to_string(),
                        min: "1".to_string(),
                        max: MAX_ALERT_INTERVAL_MINUTES.to_string(),
                    });
                }
                self.alert_interval = value;
            }
        }
        Ok(())
    }
}

fn parse_toggle(key: ConfigKey, raw: &str) -> Result<Toggle, ConfigValueError> {
    match raw.to_lowercase().as_str() {
        "on" => Ok(Toggle::On),
        "off" => Ok(Toggle::Off),
        _ => Err(ConfigValueError::InvalidToggle {
            key: key.as_str(),
            value: raw.to_string(),
        }),
    }
}
