//! Shared state: last observed tick, notification target, and history

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::configured_channel;
use crate::notifier::NotificationRecord;
use crate::tick::Tick;

/// Lifecycle phase of the tick monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorPhase {
    Idle,
    WaitingForReady,
    Polling,
    Stopped,
}

impl fmt::Display for MonitorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorPhase::Idle => write!(f, "Idle"),
            MonitorPhase::WaitingForReady => write!(f, "Waiting for ready"),
            MonitorPhase::Polling => write!(f, "Polling"),
            MonitorPhase::Stopped => write!(f, "Stopped"),
        }
    }
}

/// State shared by the monitor, the command handlers and the dashboard.
///
/// Only the monitor writes `last_tick`; commands only touch `channel_id`.
#[derive(Debug)]
pub struct SharedState {
    pub last_tick: Option<Tick>,
    pub channel_id: Option<u64>,
    pub phase: MonitorPhase,
    pub polling_interval_ms: u64,
    pub last_poll_epoch_ms: u64,
    pub last_change_epoch_ms: Option<u64>,
    pub consecutive_errors: u32,
    pub history: VecDeque<NotificationRecord>,
    pub history_max_size: usize,
    pub started_at: Instant,
}

impl SharedState {
    pub fn new(channel_id: Option<u64>, polling_interval: Duration, history_max_size: usize) -> Self {
        Self {
            last_tick: None,
            channel_id: configured_channel(channel_id),
            phase: MonitorPhase::Idle,
            polling_interval_ms: polling_interval.as_millis() as u64,
            last_poll_epoch_ms: 0,
            last_change_epoch_ms: None,
            consecutive_errors: 0,
            history: VecDeque::with_capacity(history_max_size),
            history_max_size,
            started_at: Instant::now(),
        }
    }

    /// Record a successfully fetched tick, returning true if it differs from
    /// the last one seen
    pub fn observe_tick(&mut self, tick: Tick, now_ms: u64) -> bool {
        self.last_poll_epoch_ms = now_ms;
        self.consecutive_errors = 0;
        let changed = self.last_tick.as_ref() != Some(&tick);
        if changed {
            self.last_tick = Some(tick);
            self.last_change_epoch_ms = Some(now_ms);
        }
        changed
    }

    /// Change the notification channel for the next cycle. `0` clears it.
    pub fn set_channel_id(&mut self, channel_id: Option<u64>) {
        self.channel_id = configured_channel(channel_id);
    }

    /// Record a cycle that produced no tick. The last tick is left untouched.
    pub fn record_fetch_failure(&mut self, now_ms: u64) -> u32 {
        self.last_poll_epoch_ms = now_ms;
        self.consecutive_errors += 1;
        self.consecutive_errors
    }

    /// Add a notification to history
    pub fn add_notification(&mut self, record: NotificationRecord) {
        if self.history_max_size == 0 {
            return;
        }
        if self.history.len() >= self.history_max_size {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle(
    channel_id: Option<u64>,
    polling_interval: Duration,
    history_max_size: usize,
) -> StateHandle {
    Arc::new(RwLock::new(SharedState::new(
        channel_id,
        polling_interval,
        history_max_size,
    )))
}
