//! BDD step definitions for the chat commands feature

use cucumber::{given, then, when};

use galtick::commands::{CommandContext, CommandHandler, Reply};
use galtick::config::Config;

use crate::steps::monitor_steps::scenario_state;
use crate::world::GaltickWorld;

#[given("the user is an administrator")]
fn user_is_admin(world: &mut GaltickWorld) {
    world.is_admin = true;
}

#[given("the user is not an administrator")]
fn user_is_not_admin(world: &mut GaltickWorld) {
    world.is_admin = false;
}

async fn send_message(world: &mut GaltickWorld, message: &str, channel_id: u64) {
    let state = scenario_state(world);
    let footer = Config::default().discord.footer;
    let handler = CommandHandler::new(world.fetcher.clone(), state, footer);
    let ctx = CommandContext {
        channel_id,
        channel_name: Some("bdd".to_string()),
        is_admin: world.is_admin,
    };
    world.invoking_channel = channel_id;
    world.reply = handler.handle_message(message, &ctx).await;
}

#[when(expr = "a user sends {string}")]
async fn user_sends(world: &mut GaltickWorld, message: String) {
    send_message(world, &message, 1).await;
}

#[when(expr = "a user sends {string} in channel {int}")]
async fn user_sends_in_channel(world: &mut GaltickWorld, message: String, channel_id: u64) {
    send_message(world, &message, channel_id).await;
}

#[then(expr = "the reply should be an embed titled {string}")]
fn reply_embed_titled(world: &mut GaltickWorld, title: String) {
    match world.reply.as_ref().expect("no reply") {
        Reply::Embed { embed } => assert_eq!(embed.title, title),
        other => panic!("expected an embed, got {other:?}"),
    }
}

#[then(expr = "the reply should be the text {string}")]
fn reply_text(world: &mut GaltickWorld, text: String) {
    assert_eq!(world.reply, Some(Reply::text(text)));
}

#[then(expr = "the reply should contain {string}")]
fn reply_contains(world: &mut GaltickWorld, needle: String) {
    let haystack = match world.reply.as_ref().expect("no reply") {
        Reply::Text { text } => text.clone(),
        Reply::Embed { embed } => embed.description.clone(),
    };
    assert!(haystack.contains(&needle), "reply: {haystack}");
}

#[then(expr = "the notification channel should be {int}")]
async fn channel_should_be(world: &mut GaltickWorld, channel_id: u64) {
    let state = scenario_state(world);
    assert_eq!(state.read().await.channel_id, Some(channel_id));
}
