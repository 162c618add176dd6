use cucumber::{given, then, when};
use instant::Duration;
use taleforge_tests::GameWorld;

/// Split a `a | b | c` table cell into its entries
pub fn split_lines(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.split('|').map(|part| part.trim().to_string()).collect()
}

// ===== Given Steps =====

#[given(expr = "the host grace period is {int} seconds")]
async fn host_grace_period(world: &mut GameWorld, seconds: u64) {
    world.config = world
        .config
        .clone()
        .with_host_grace_period(Duration::from_secs(seconds));
}

#[given(expr = "a session hosted by {string}")]
async fn session_hosted_by(world: &mut GameWorld, host: String) {
    world.start_host(&host);
    world.tick(1);
}

#[given(expr = "a session hosted by {string} with guests {string} and {string}")]
async fn session_with_two_guests(world: &mut GameWorld, host: String, a: String, b: String) {
    world.start_host(&host);
    world.join_guest(&a);
    world.join_guest(&b);
    world.tick(1);
}

#[given(expr = "{string} joined the session")]
#[when(expr = "{string} joins the session")]
async fn guest_joins(world: &mut GameWorld, name: String) {
    world.join_guest(&name);
}

// ===== When Steps =====

#[given(expr = "the session ticks {int} time(s)")]
#[when(expr = "the session ticks {int} time(s)")]
async fn session_ticks(world: &mut GameWorld, count: usize) {
    world.tick(count);
}

#[when(expr = "only {string} ticks {int} time(s)")]
async fn only_peer_ticks(world: &mut GameWorld, name: String, count: usize) {
    world.tick_only(&name, count);
}

#[when("the session settles")]
async fn session_settles(world: &mut GameWorld) {
    world.settle(5_000);
}

#[when(expr = "{int} second(s) pass(es)")]
async fn seconds_pass(world: &mut GameWorld, seconds: u64) {
    world.advance(Duration::from_secs(seconds));
}

// ===== Then Steps =====

#[then(expr = "every peer shows the story {string}")]
async fn every_peer_shows_story(world: &mut GameWorld, story: String) {
    let expected = split_lines(&story);
    for name in world.peer_names() {
        assert_eq!(world.story_of(&name), expected, "Story of {} differs", name);
    }
}

#[then(expr = "{string} shows the story {string}")]
async fn peer_shows_story(world: &mut GameWorld, name: String, story: String) {
    assert_eq!(world.story_of(&name), split_lines(&story));
}

#[then(expr = "the last call failed with {string}")]
async fn last_call_failed(world: &mut GameWorld, fragment: String) {
    let error = world.last_error.as_deref().expect("Expected the last call to fail");
    assert!(
        error.contains(&fragment),
        "Error '{}' does not mention '{}'",
        error,
        fragment
    );
}

#[then("the last call succeeded")]
async fn last_call_succeeded(world: &mut GameWorld) {
    assert_eq!(world.last_error, None);
}

#[then(expr = "{string} has {int} notification(s)")]
async fn peer_has_notifications(world: &mut GameWorld, name: String, count: usize) {
    assert_eq!(world.session(&name).notifications().active().len(), count);
}
