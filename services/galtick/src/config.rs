//! Configuration types for the galtick service

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the Discord bot token
pub const TOKEN_ENV: &str = "DISCORD_TOKEN";
/// Environment variable holding the notification channel id (`0` = unset)
pub const CHANNEL_ENV: &str = "TICK_CHANNEL_ID";
/// Environment variable holding the dashboard admin bearer token
pub const ADMIN_TOKEN_ENV: &str = "GALTICK_ADMIN_TOKEN";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Tick polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_polling_interval", with = "humantime_serde")]
    pub polling_interval: Duration,
    #[serde(default = "default_fetch_timeout", with = "humantime_serde")]
    pub fetch_timeout: Duration,
    #[serde(default = "default_ready_retry", with = "humantime_serde")]
    pub ready_retry: Duration,
    /// Channel that receives tick notifications; `None` (or `0` in the file) means not configured
    #[serde(default, deserialize_with = "deserialize_channel_id")]
    pub channel_id: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            polling_interval: default_polling_interval(),
            fetch_timeout: default_fetch_timeout(),
            ready_retry: default_ready_retry(),
            channel_id: None,
        }
    }
}

/// Discord REST configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default = "default_discord_api")]
    pub api_base_url: String,
    #[serde(default = "default_footer")]
    pub footer: String,
    /// Bot token; only ever read from the environment
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_discord_api(),
            footer: default_footer(),
            token: None,
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(skip)]
    pub admin_token: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
            history_size: default_history_size(),
            admin_token: None,
        }
    }
}

/// Channel id `0` means not configured
pub fn configured_channel(id: Option<u64>) -> Option<u64> {
    id.filter(|&id| id != 0)
}

fn deserialize_channel_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(configured_channel(Option::<u64>::deserialize(deserializer)?))
}

fn default_endpoint() -> String {
    "http://tick.infomancer.uk/galtick.json".to_string()
}

fn default_polling_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_ready_retry() -> Duration {
    Duration::from_secs(5)
}

fn default_discord_api() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_footer() -> String {
    "Data from tick.infomancer.uk".to_string()
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

fn default_history_size() -> usize {
    100
}

impl Config {
    /// Fill in secrets from the environment.
    ///
    /// The bot token is mandatory; the service must not start without it.
    pub fn resolve_secrets(&mut self) -> crate::Result<()> {
        self.resolve_secrets_with(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::resolve_secrets`] with an injectable variable lookup
    pub fn resolve_secrets_with<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_ENV)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                crate::GaltickError::Config(format!(
                    "{} not found in environment variables! Please create a .env file with your Discord bot token.",
                    TOKEN_ENV
                ))
            })?;
        self.discord.token = Some(token);

        if let Some(raw) = lookup(CHANNEL_ENV) {
            let id: u64 = raw.trim().parse().map_err(|e| {
                crate::GaltickError::Config(format!("Invalid {} '{}': {}", CHANNEL_ENV, raw, e))
            })?;
            self.monitor.channel_id = configured_channel(Some(id));
        }

        if let Some(admin) = lookup(ADMIN_TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.dashboard.admin_token = Some(admin);
        }

        Ok(())
    }
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::GaltickError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
