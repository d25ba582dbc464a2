//! Discord REST notification sink

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::DiscordConfig;
use crate::io::HttpClient;
use crate::notifier::{Embed, Notification, NotificationSink};

/// Subset of the Discord user object
#[derive(Debug, Deserialize)]
struct DiscordUser {
    username: String,
    #[serde(default)]
    id: String,
}

/// Sends notifications through the Discord bot REST API
pub struct DiscordNotifier {
    api_base_url: String,
    token: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for DiscordNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordNotifier")
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl DiscordNotifier {
    pub fn new(config: &DiscordConfig, http: Arc<dyn HttpClient>) -> crate::Result<Self> {
        let token = config.token.clone().ok_or_else(|| {
            crate::GaltickError::Config("Discord bot token is not set".to_string())
        })?;

        tracing::debug!("Created DiscordNotifier for {}", config.api_base_url);

        Ok(Self {
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }
}

/// Discord message payload for a notification
pub fn message_payload(notification: &Notification) -> serde_json::Value {
    let mut payload = json!({
        "embeds": [embed_payload(&notification.embed)],
        "allowed_mentions": { "parse": ["everyone"] },
    });
    if let Some(content) = &notification.content {
        payload["content"] = json!(content);
    }
    payload
}

fn embed_payload(embed: &Embed) -> serde_json::Value {
    let mut value = json!({
        "title": embed.title,
        "description": embed.description,
        "color": embed.color,
        "timestamp": embed.timestamp.to_rfc3339(),
    });
    if let Some(footer) = &embed.footer {
        value["footer"] = json!({ "text": footer });
    }
    value
}

#[async_trait]
impl NotificationSink for DiscordNotifier {
    async fn ready(&self) -> crate::Result<()> {
        let url = format!("{}/users/@me", self.api_base_url);
        let auth = self.authorization();
        let response = self
            .http
            .get(&url, &[("Authorization", auth.as_str())])
            .await?;

        match response.status {
            200 => {
                let user: DiscordUser = serde_json::from_str(&response.body).map_err(|e| {
                    crate::GaltickError::Parse(format!("Discord user response: {}", e))
                })?;
                tracing::info!("{} ({}) has connected to Discord", user.username, user.id);
                Ok(())
            }
            401 => Err(crate::GaltickError::Config(
                "Discord rejected the bot token".to_string(),
            )),
            status => Err(crate::GaltickError::Notifier(format!(
                "Discord API returned status {}: {}",
                status, response.body
            ))),
        }
    }

    async fn send(&self, channel_id: u64, notification: &Notification) -> crate::Result<()> {
        let url = format!("{}/channels/{}/messages", self.api_base_url, channel_id);
        let auth = self.authorization();
        let payload = message_payload(notification);

        tracing::debug!(
            "Sending Discord message to channel {}: title='{}'",
            channel_id,
            notification.embed.title
        );

        let response = self
            .http
            .post_json(&url, &[("Authorization", auth.as_str())], &payload)
            .await?;

        if response.status == 404 {
            return Err(crate::GaltickError::ChannelNotFound(channel_id));
        }
        if !response.is_success() {
            return Err(crate::GaltickError::Notifier(format!(
                "Discord API returned status {}: {}",
                response.status, response.body
            )));
        }

        tracing::debug!("Discord message sent to channel {}", channel_id);
        Ok(())
    }
}
