//! Tick monitor: seeds the last known tick, waits for the chat session, then
//! polls on a fixed delay and notifies on every change

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::fetcher::TickFetcher;
use crate::formatter::describe_tick;
use crate::notifier::{
    color, Embed, Notification, NotificationRecord, NotificationSink, ATTENTION_MARKER,
};
use crate::state::{MonitorPhase, StateHandle};
use crate::tick::Tick;

/// What happened to a detected change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Sent(u64),
    Unconfigured,
    ChannelNotFound(u64),
    Failed(u64, String),
}

/// Result of one polling cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    FetchFailed,
    Unchanged,
    Changed(Dispatch),
}

/// Watches the tick API and relays changes to the notification sink
pub struct TickMonitor {
    fetcher: Arc<dyn TickFetcher>,
    sink: Arc<dyn NotificationSink>,
    state: StateHandle,
    footer: String,
    polling_interval: Duration,
    ready_retry: Duration,
    cancel: CancellationToken,
    running: AtomicBool,
}

impl std::fmt::Debug for TickMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickMonitor")
            .field("fetcher", &self.fetcher)
            .field("sink", &self.sink)
            .field("polling_interval", &self.polling_interval)
            .finish()
    }
}

impl TickMonitor {
    pub fn new(
        fetcher: Arc<dyn TickFetcher>,
        sink: Arc<dyn NotificationSink>,
        config: &Config,
        state: StateHandle,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            sink,
            state,
            footer: config.discord.footer.clone(),
            polling_interval: config.monitor.polling_interval,
            ready_retry: config.monitor.ready_retry,
            cancel,
            running: AtomicBool::new(false),
        }
    }

    /// One unscheduled fetch to establish the baseline tick.
    ///
    /// Failure leaves the baseline empty.
    pub async fn seed(&self) {
        match self.fetcher.fetch().await {
            Ok(Some(tick)) => {
                tracing::info!("Initial tick on startup: {}", tick);
                self.state.write().await.observe_tick(tick, current_epoch_ms());
            }
            Ok(None) => tracing::info!("Initial tick on startup: none reported"),
            Err(e) => tracing::warn!("Initial tick fetch failed: {}", e),
        }
    }

    /// Block until the sink reports ready. Returns false if cancelled first.
    pub async fn wait_for_ready(&self) -> bool {
        self.state.write().await.phase = MonitorPhase::WaitingForReady;
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            match self.sink.ready().await {
                Ok(()) => return true,
                Err(e) => tracing::warn!(
                    "Notification transport not ready: {}; retrying in {}",
                    e,
                    humantime::format_duration(self.ready_retry)
                ),
            }
            tokio::select! {
                _ = tokio::time::sleep(self.ready_retry) => {}
                _ = self.cancel.cancelled() => return false,
            }
        }
    }

    /// Run one fetch-compare-notify cycle
    pub async fn poll_once(&self) -> CycleOutcome {
        tracing::debug!("Checking for tick updates...");
        let fetched = self.fetcher.fetch().await;
        let now_ms = current_epoch_ms();

        let tick = match fetched {
            Ok(Some(tick)) => tick,
            Ok(None) => {
                let errors = self.state.write().await.record_fetch_failure(now_ms);
                tracing::warn!("Tick API returned no tick ({} consecutive failures)", errors);
                return CycleOutcome::FetchFailed;
            }
            Err(e) => {
                let errors = self.state.write().await.record_fetch_failure(now_ms);
                tracing::warn!(
                    "Failed to fetch current tick: {} ({} consecutive failures)",
                    e,
                    errors
                );
                return CycleOutcome::FetchFailed;
            }
        };

        let (changed, previous, channel_id) = {
            let mut state = self.state.write().await;
            let previous = state.last_tick.clone();
            let changed = state.observe_tick(tick.clone(), now_ms);
            (changed, previous, state.channel_id)
        };

        tracing::debug!(
            "Current tick from API: {}, last known tick: {:?}",
            tick,
            previous.as_ref().map(Tick::as_str)
        );

        if !changed {
            tracing::debug!("Tick unchanged");
            return CycleOutcome::Unchanged;
        }

        tracing::info!("NEW TICK DETECTED! {}", tick);
        CycleOutcome::Changed(self.dispatch(&tick, channel_id, now_ms).await)
    }

    async fn dispatch(&self, tick: &Tick, channel_id: Option<u64>, now_ms: u64) -> Dispatch {
        let Some(channel_id) = channel_id else {
            tracing::warn!("Tick channel not configured; notification suppressed");
            return Dispatch::Unconfigured;
        };

        tracing::info!("Sending notification to channel {}...", channel_id);
        let notification = tick_notification(tick, &self.footer);
        let result = self.sink.send(channel_id, &notification).await;

        let dispatch = match &result {
            Ok(()) => {
                tracing::info!("Notification sent successfully");
                Dispatch::Sent(channel_id)
            }
            Err(crate::GaltickError::ChannelNotFound(id)) => {
                tracing::warn!("Could not find channel with ID {}", id);
                Dispatch::ChannelNotFound(*id)
            }
            Err(e) => {
                tracing::warn!("Notification to channel {} failed: {}", channel_id, e);
                Dispatch::Failed(channel_id, e.to_string())
            }
        };

        self.state.write().await.add_notification(NotificationRecord {
            tick: tick.to_string(),
            channel_id: Some(channel_id),
            success: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
            timestamp_epoch_ms: now_ms,
        });

        dispatch
    }

    /// Wait for the sink, then poll until cancelled
    pub async fn run(&self) {
        if !self.wait_for_ready().await {
            tracing::debug!("Tick monitor cancelled before the transport was ready");
            self.state.write().await.phase = MonitorPhase::Stopped;
            return;
        }

        self.state.write().await.phase = MonitorPhase::Polling;
        tracing::info!(
            "Monitoring tick updates every {}",
            humantime::format_duration(self.polling_interval)
        );

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.poll_once().await;

            // Fixed delay: the next cycle starts a full interval after this one ended
            tokio::select! {
                _ = tokio::time::sleep(self.polling_interval) => {}
                _ = self.cancel.cancelled() => break,
            }
        }

        tracing::debug!("Tick monitor cancelled");
        self.state.write().await.phase = MonitorPhase::Stopped;
    }

    /// Spawn [`TickMonitor::run`] unless it is already running
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Tick monitor already running");
            return None;
        }

        tracing::info!("Starting tick monitoring...");
        let monitor = Arc::clone(self);
        Some(tokio::spawn(async move {
            monitor.run().await;
            monitor.running.store(false, Ordering::Release);
        }))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// The chat message announcing a new tick
pub fn tick_notification(tick: &Tick, footer: &str) -> Notification {
    Notification {
        content: Some(ATTENTION_MARKER.to_string()),
        embed: Embed::new(
            "🚨 NEW GALAXY TICK DETECTED!",
            describe_tick(Some(tick), Utc::now()),
            color::GREEN,
        )
        .with_footer(footer),
    }
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
