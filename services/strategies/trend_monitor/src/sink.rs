//! Outbound notification seam

use crate::error::SinkError;
use async_trait::async_trait;
use tracing::info;
use trendline_types::ChatId;

/// Delivers plain-text notifications to a chat. At-least-once; no ordering across callers.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), SinkError>;
}

/// Sink that writes every message to the log
#[derive(Debug, Default)]
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), SinkError> {
        info!(chat = %chat, "📨 {}", text);
        Ok(())
    }
}
