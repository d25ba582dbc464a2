//! BDD step definitions for the tick change detection feature

use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use galtick::config::Config;
use galtick::monitor::TickMonitor;
use galtick::state::{new_state_handle, StateHandle};
use galtick::tick::Tick;
use galtick::GaltickError;

use crate::world::GaltickWorld;

/// Shared state for the scenario, created on first use
pub fn scenario_state(world: &mut GaltickWorld) -> StateHandle {
    let channel_id = world.channel_id;
    world
        .state
        .get_or_insert_with(|| {
            new_state_handle(channel_id, Config::default().monitor.polling_interval, 10)
        })
        .clone()
}

fn build_monitor(world: &mut GaltickWorld) -> TickMonitor {
    let state = scenario_state(world);
    TickMonitor::new(
        world.fetcher.clone(),
        world.sink.clone(),
        &Config::default(),
        state,
        CancellationToken::new(),
    )
}

#[given(expr = "the notification channel is {int}")]
fn channel_is(world: &mut GaltickWorld, channel_id: u64) {
    world.channel_id = Some(channel_id);
}

#[given(expr = "the notification channel is {int} which does not exist")]
fn channel_is_missing(world: &mut GaltickWorld, channel_id: u64) {
    world.channel_id = Some(channel_id);
    world.sink.missing_channels.lock().unwrap().push(channel_id);
}

#[given("no notification channel is configured")]
fn no_channel(world: &mut GaltickWorld) {
    world.channel_id = None;
}

#[given("the tick API will report:")]
fn api_will_report(world: &mut GaltickWorld, step: &Step) {
    let table = step.table.as_ref().expect("a table of ticks");
    for row in table.rows.iter().skip(1) {
        let cell = row[0].trim();
        let result = match cell {
            "<none>" => Ok(None),
            "<error>" => Err(GaltickError::Status(503)),
            raw => Ok(Tick::new(raw)),
        };
        world.fetcher.push(result);
    }
}

#[when("the monitor is seeded")]
async fn monitor_seeded(world: &mut GaltickWorld) {
    build_monitor(world).seed().await;
}

#[when(expr = "the monitor runs {int} cycles")]
async fn monitor_runs_cycles(world: &mut GaltickWorld, cycles: u32) {
    let monitor = build_monitor(world);
    for _ in 0..cycles {
        monitor.poll_once().await;
    }
}

#[then(expr = "{int} notifications should have been sent to channel {int}")]
fn notifications_sent_to(world: &mut GaltickWorld, count: usize, channel_id: u64) {
    let sent = world.sink.sent.lock().unwrap();
    assert_eq!(sent.len(), count, "sent: {sent:?}");
    assert!(sent.iter().all(|(id, _)| *id == channel_id), "sent: {sent:?}");
}

#[then("no notifications should have been sent")]
fn no_notifications(world: &mut GaltickWorld) {
    assert_eq!(world.sink.sent_count(), 0);
}

#[then(expr = "the last known tick should be {string}")]
async fn last_known_tick(world: &mut GaltickWorld, expected: String) {
    let state = scenario_state(world);
    let state = state.read().await;
    assert_eq!(
        state.last_tick.as_ref().map(|t| t.as_str()),
        Some(expected.as_str())
    );
}

#[then(expr = "the monitor should report {int} consecutive errors")]
async fn consecutive_errors(world: &mut GaltickWorld, expected: u32) {
    let state = scenario_state(world);
    assert_eq!(state.read().await.consecutive_errors, expected);
}

#[then(expr = "the history should hold {int} failed dispatch")]
async fn failed_dispatches(world: &mut GaltickWorld, expected: usize) {
    let state = scenario_state(world);
    let state = state.read().await;
    assert_eq!(state.history.len(), expected);
    assert!(state.history.iter().all(|record| !record.success));
}

#[then(expr = "the last notification should mention {string}")]
fn last_notification_mentions(world: &mut GaltickWorld, mention: String) {
    let sent = world.sink.sent.lock().unwrap();
    let (_, notification) = sent.last().expect("nothing sent");
    assert_eq!(notification.content.as_deref(), Some(mention.as_str()));
}

#[then(expr = "the last notification should be titled {string}")]
fn last_notification_titled(world: &mut GaltickWorld, title: String) {
    let sent = world.sink.sent.lock().unwrap();
    let (_, notification) = sent.last().expect("nothing sent");
    assert_eq!(notification.embed.title, title);
}

#[then(expr = "the last notification should describe {string}")]
fn last_notification_describes(world: &mut GaltickWorld, text: String) {
    let sent = world.sink.sent.lock().unwrap();
    let (_, notification) = sent.last().expect("nothing sent");
    assert!(
        notification.embed.description.contains(&text),
        "description: {}",
        notification.embed.description
    );
}
