//! Notification sink trait and chat message types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Embed colours
pub mod color {
    pub const BLUE: u32 = 0x3498db;
    pub const GREEN: u32 = 0x2ecc71;
    pub const ORANGE: u32 = 0xe67e22;
}

/// Mention prepended to tick notifications
pub const ATTENTION_MARKER: &str = "@here";

/// A rich chat message body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub timestamp: DateTime<Utc>,
    pub footer: Option<String>,
}

impl Embed {
    pub fn new(title: impl Into<String>, description: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            color,
            timestamp: Utc::now(),
            footer: None,
        }
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// A notification to be sent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Plain text sent alongside the embed, e.g. a mention
    pub content: Option<String>,
    pub embed: Embed,
}

/// Record of an attempted tick notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub tick: String,
    pub channel_id: Option<u64>,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp_epoch_ms: u64,
}

/// Chat transport that delivers notifications
#[async_trait]
pub trait NotificationSink: Send + Sync + std::fmt::Debug {
    /// Check that the session with the chat platform is usable
    async fn ready(&self) -> crate::Result<()>;

    /// Send a notification to a channel.
    ///
    /// An unknown channel yields [`crate::GaltickError::ChannelNotFound`].
    async fn send(&self, channel_id: u64, notification: &Notification) -> crate::Result<()>;
}
