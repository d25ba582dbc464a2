//! Tick API client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::MonitorConfig;
use crate::io::HttpClient;
use crate::tick::Tick;

/// Body of the tick API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GalTickResponse {
    #[serde(default)]
    last_galaxy_tick: Option<String>,
}

/// Source of the latest galaxy tick
#[async_trait]
pub trait TickFetcher: Send + Sync + std::fmt::Debug {
    /// Fetch the latest tick.
    ///
    /// `Ok(None)` means the API answered without a tick value.
    async fn fetch(&self) -> crate::Result<Option<Tick>>;
}

/// Fetches the tick from the JSON endpoint over HTTP
pub struct HttpTickFetcher {
    url: String,
    timeout: Duration,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for HttpTickFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTickFetcher")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpTickFetcher {
    pub fn new(config: &MonitorConfig, http: Arc<dyn HttpClient>) -> Self {
        tracing::debug!(
            "Created HttpTickFetcher for {} (timeout {})",
            config.endpoint,
            humantime::format_duration(config.fetch_timeout)
        );

        Self {
            url: config.endpoint.clone(),
            timeout: config.fetch_timeout,
            http,
        }
    }
}

#[async_trait]
impl TickFetcher for HttpTickFetcher {
    async fn fetch(&self) -> crate::Result<Option<Tick>> {
        let response = tokio::time::timeout(self.timeout, self.http.get(&self.url, &[]))
            .await
            .map_err(|_| {
                crate::GaltickError::Transport(format!(
                    "GET {} timed out after {}",
                    self.url,
                    humantime::format_duration(self.timeout)
                ))
            })??;

        if response.status != 200 {
            tracing::debug!("Non-200 response from tick API: status={}", response.status);
            return Err(crate::GaltickError::Status(response.status));
        }

        let parsed: GalTickResponse = serde_json::from_str(&response.body)
            .map_err(|e| crate::GaltickError::Parse(format!("Tick API response: {}", e)))?;

        let tick = parsed.last_galaxy_tick.and_then(Tick::new);
        if tick.is_none() {
            tracing::debug!("Tick API response has no lastGalaxyTick");
        }
        Ok(tick)
    }
}
