//! Price alert evaluation
//!
//! A user's rules are grouped by symbol so each distinct symbol costs one snapshot
//! fetch, however many rules target it. A rule triggers when the current price is
//! within `price_threshold` of its target, boundary inclusive:
//!
//! ```text
//! pct = |current - target| / target      trigger iff pct <= threshold
//! ```

use crate::context::MonitorContext;
use crate::error::{ProviderError, Result};
use crate::provider::{exchange_label, with_timeout, PriceSnapshot};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};
use trendline_types::{AlertRule, ChatId, UserConfig};

/// One rule whose target the price came within threshold of
#[derive(Debug, Clone, PartialEq)]
pub struct AlertTrigger {
    pub chat: ChatId,
    pub symbol: String,
    pub target_price: Decimal,
    pub current_price: Decimal,
    /// Fractional distance from target, 0.01 = 1%
    pub pct: Decimal,
    pub message: Option<String>,
    pub exchange: String,
    pub timestamp: DateTime<Utc>,
}

impl AlertTrigger {
    /// Multi-line notification text
    pub fn render(&self) -> String {
        let mut text = format!(
            "🚨 Price Alert!\n\
             Exchange: {}\n\
             Symbol: {}\n\
             Target: ${}\n\
             Current: ${}\n\
             Difference: {:.4}%\n\
             Time: {}",
            exchange_label(&self.exchange),
            self.symbol,
            format_price(self.target_price),
            format_price(self.current_price),
            (self.pct * Decimal::ONE_HUNDRED).round_dp(4),
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        );
        if let Some(message) = &self.message {
            text.push_str("\nMessage: ");
            text.push_str(message);
        }
        text
    }
}

#[derive(Debug, Default)]
pub struct AlertOutcome {
    pub triggers: Vec<AlertTrigger>,
    /// Symbols whose snapshot could not be fetched this time
    pub failures: Vec<(String, ProviderError)>,
    pub symbols_checked: usize,
    pub skipped_disabled: bool,
}

/// Fractional distance of `current` from `target`.
///
/// `None` for a zero target, or when the distance does not fit a `Decimal`; such a
/// rule never triggers.
pub fn price_distance(current: Decimal, target: Decimal) -> Option<Decimal> {
    if target.is_zero() {
        return None;
    }
    current.checked_sub(target)?.abs().checked_div(target.abs())
}

/// Rules on `snapshot.symbol` whose target is within `threshold` of the current price
pub fn evaluate_rules(
    chat: ChatId,
    rules: &[AlertRule],
    snapshot: &PriceSnapshot,
    threshold: Decimal,
    now: DateTime<Utc>,
) -> Vec<AlertTrigger> {
    rules
        .iter()
        .filter_map(|rule| {
            let pct = price_distance(snapshot.current_price, rule.target_price)?;
            (pct <= threshold).then(|| AlertTrigger {
                chat,
                symbol: rule.symbol.clone(),
                target_price: rule.target_price,
                current_price: snapshot.current_price,
                pct,
                message: rule.message.clone(),
                exchange: snapshot.exchange.clone(),
                timestamp: now,
            })
        })
        .collect()
}

pub struct AlertEvaluator {
    context: MonitorContext,
    fetch_timeout: Duration,
    max_concurrent_fetches: usize,
}

impl AlertEvaluator {
    pub fn new(
        context: MonitorContext,
        fetch_timeout: Duration,
        max_concurrent_fetches: usize,
    ) -> Self {
        Self {
            context,
            fetch_timeout,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        }
    }

    /// Evaluate every rule `chat` owns against fresh prices.
    ///
    /// Fails only when the rules cannot be read. A symbol whose snapshot fails is
    /// recorded in [`AlertOutcome::failures`] and its rules are skipped.
    pub async fn evaluate_user(
        &self,
        chat: ChatId,
        config: &UserConfig,
        now: DateTime<Utc>,
    ) -> Result<AlertOutcome> {
        if !config.alerts_enabled() {
            return Ok(AlertOutcome {
                skipped_disabled: true,
                ..AlertOutcome::default()
            });
        }

        let rules = self.context.store.list(chat).await?;
        let mut by_symbol: BTreeMap<String, Vec<AlertRule>> = BTreeMap::new();
        for rule in rules {
            by_symbol.entry(rule.symbol.clone()).or_default().push(rule);
        }

        let market = config.market();
        let provider = &self.context.provider;
        let fetch_timeout = self.fetch_timeout;

        let snapshots: Vec<(String, std::result::Result<PriceSnapshot, ProviderError>)> =
            stream::iter(by_symbol.keys().cloned())
                .map(|symbol| async move {
                    let result = with_timeout(
                        &symbol,
                        fetch_timeout,
                        provider.fetch_snapshot(&symbol, market),
                    )
                    .await;
                    (symbol, result)
                })
                .buffer_unordered(self.max_concurrent_fetches)
                .collect()
                .await;

        let mut outcome = AlertOutcome {
            symbols_checked: snapshots.len(),
            ..AlertOutcome::default()
        };

        for (symbol, result) in snapshots {
            match result {
                Ok(snapshot) => {
                    let rules = by_symbol.get(&symbol).map(Vec::as_slice).unwrap_or_default();
                    let triggers =
                        evaluate_rules(chat, rules, &snapshot, config.price_threshold, now);
                    debug!(
                        "{} {} @ {}: {} of {} rules triggered",
                        chat,
                        symbol,
                        snapshot.current_price,
                        triggers.len(),
                        rules.len()
                    );
                    outcome.triggers.extend(triggers);
                }
                Err(e) => {
                    warn!("⚠️ Skipping alerts for {} ({}): {}", symbol, chat, e);
                    outcome.failures.push((symbol, e));
                }
            }
        }

        // buffer_unordered completes in any order
        outcome
            .triggers
            .sort_by(|a, b| a.symbol.cmp(&b.symbol));

        Ok(outcome)
    }
}

/// `1234567.5` -> `1,234,567.5000`
pub fn format_price(value: Decimal) -> String {
    let rounded = format!("{:.4}", value.round_dp(4));
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits, ""));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if fraction.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, fraction)
    }
}
