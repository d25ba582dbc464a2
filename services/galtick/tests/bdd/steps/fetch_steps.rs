//! BDD step definitions for the tick fetch feature

use std::sync::Arc;

use cucumber::{given, then, when};

use galtick::config::MonitorConfig;
use galtick::fetcher::{HttpTickFetcher, TickFetcher};
use galtick::GaltickError;

use crate::world::{CannedHttpClient, GaltickWorld};

#[given(expr = "the tick API answers {int} with body {string}")]
fn api_answers(world: &mut GaltickWorld, status: u16, body: String) {
    world.http = Some(Arc::new(CannedHttpClient::Respond { status, body }));
}

#[given("the tick API is unreachable")]
fn api_unreachable(world: &mut GaltickWorld) {
    world.http = Some(Arc::new(CannedHttpClient::Unreachable));
}

#[when("the tick is fetched")]
async fn tick_is_fetched(world: &mut GaltickWorld) {
    let http = world.http.clone().expect("tick API not set up");
    let fetcher = HttpTickFetcher::new(&MonitorConfig::default(), http);
    world.fetch_result = Some(fetcher.fetch().await);
}

#[then(expr = "the fetched tick should be {string}")]
fn fetched_tick_is(world: &mut GaltickWorld, expected: String) {
    let result = world.fetch_result.as_ref().expect("nothing fetched");
    let tick = result.as_ref().expect("fetch failed").as_ref().expect("no tick");
    assert_eq!(tick.as_str(), expected);
}

#[then("no tick should have been fetched")]
fn no_tick_fetched(world: &mut GaltickWorld) {
    let result = world.fetch_result.as_ref().expect("nothing fetched");
    assert!(matches!(result, Ok(None)), "expected Ok(None), got {result:?}");
}

#[then("the fetch should fail with a transport error")]
fn fetch_transport_error(world: &mut GaltickWorld) {
    let result = world.fetch_result.as_ref().expect("nothing fetched");
    match result {
        Err(e) => assert!(e.is_transport(), "expected transport error, got {e:?}"),
        Ok(v) => panic!("expected transport error, got Ok({v:?})"),
    }
}

#[then("the fetch should fail with a parse error")]
fn fetch_parse_error(world: &mut GaltickWorld) {
    let result = world.fetch_result.as_ref().expect("nothing fetched");
    assert!(
        matches!(result, Err(GaltickError::Parse(_))),
        "expected parse error, got {result:?}"
    );
}
