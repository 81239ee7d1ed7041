//! Identifiers for users and instruments
//!
//! Chats are identified by the numeric id the messaging platform assigns them.
//! Instruments are plain exchange symbols (`BASE/QUOTE`), normalised once when a
//! user registers them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default quote currency appended to bare symbols
pub const DEFAULT_QUOTE: &str = "USDT";

/// Messaging-platform chat identity owning rules, subscriptions and config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl ChatId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn inner(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Market a symbol is quoted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    #[default]
    Spot,
    /// Perpetual futures settled in the quote currency
    Futures,
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::Spot => f.write_str("spot"),
            Market::Futures => f.write_str("futures"),
        }
    }
}

/// Complete a user-supplied symbol with the default quote and upper-case it.
///
/// `"btc"` becomes `"BTC/USDT"`; `"eth/usdt"` becomes `"ETH/USDT"`.
pub fn normalize_symbol(symbol: &str) -> String {
    let trimmed = symbol.trim();
    let upper = trimmed.to_uppercase();
    let suffix = format!("/{}", DEFAULT_QUOTE);
    if upper.ends_with(&suffix) {
        upper
    } else {
        format!("{}{}", upper, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("btc"), "BTC/USDT");
        assert_eq!(normalize_symbol("BTC/USDT"), "BTC/USDT");
        assert_eq!(normalize_symbol(" eth/usdt "), "ETH/USDT");
    }

    #[test]
    fn test_chat_id_serializes_as_number() {
        let json = serde_json::to_string(&ChatId::new(42)).unwrap();
        assert_eq!(json, "42");
    }
}
