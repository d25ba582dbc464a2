//! BDD test world for galtick service

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use cucumber::World;
use galtick::commands::Reply;
use galtick::fetcher::TickFetcher;
use galtick::io::{HttpClient, HttpResponse};
use galtick::notifier::{Notification, NotificationSink};
use galtick::state::StateHandle;
use galtick::tick::Tick;
use galtick::GaltickError;

/// Fetcher that replays a script, then reports no tick
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<galtick::Result<Option<Tick>>>>,
    calls: Mutex<u32>,
}

impl ScriptedFetcher {
    pub fn push(&self, result: galtick::Result<Option<Tick>>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl TickFetcher for ScriptedFetcher {
    async fn fetch(&self) -> galtick::Result<Option<Tick>> {
        *self.calls.lock().unwrap() += 1;
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }
}

/// Sink that records every message and can be told to misbehave
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(u64, Notification)>>,
    pub missing_channels: Mutex<Vec<u64>>,
    pub not_ready_for: Mutex<u32>,
    pub ready_calls: Mutex<u32>,
}

impl RecordingSink {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl NotificationSink for RecordingSink {
    async fn ready(&self) -> galtick::Result<()> {
        *self.ready_calls.lock().unwrap() += 1;
        let mut remaining = self.not_ready_for.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(GaltickError::Notifier("gateway not ready".to_string()));
        }
        Ok(())
    }

    async fn send(&self, channel_id: u64, notification: &Notification) -> galtick::Result<()> {
        if self.missing_channels.lock().unwrap().contains(&channel_id) {
            return Err(GaltickError::ChannelNotFound(channel_id));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id, notification.clone()));
        Ok(())
    }
}

/// HTTP client answering every GET with a canned response
#[derive(Debug)]
pub enum CannedHttpClient {
    Respond { status: u16, body: String },
    Unreachable,
}

#[async_trait::async_trait]
impl HttpClient for CannedHttpClient {
    async fn get(&self, url: &str, _headers: &[(&str, &str)]) -> galtick::Result<HttpResponse> {
        match self {
            CannedHttpClient::Respond { status, body } => Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            }),
            CannedHttpClient::Unreachable => Err(GaltickError::Transport(format!(
                "GET {} failed: connection refused",
                url
            ))),
        }
    }

    async fn post_json(
        &self,
        url: &str,
        _headers: &[(&str, &str)],
        _body: &serde_json::Value,
    ) -> galtick::Result<HttpResponse> {
        Err(GaltickError::Transport(format!(
            "POST {} not expected",
            url
        )))
    }
}

#[derive(Debug, Default, World)]
pub struct GaltickWorld {
    // Fetcher testing
    pub http: Option<Arc<CannedHttpClient>>,
    pub fetch_result: Option<galtick::Result<Option<Tick>>>,

    // Monitor and command testing
    pub fetcher: Arc<ScriptedFetcher>,
    pub sink: Arc<RecordingSink>,
    pub channel_id: Option<u64>,
    pub state: Option<StateHandle>,

    // Command testing
    pub is_admin: bool,
    pub invoking_channel: u64,
    pub reply: Option<Reply>,

    // Lifecycle testing
    pub run_result: Option<galtick::Result<()>>,
}
