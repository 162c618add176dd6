use super::session_steps::split_lines;
use cucumber::{then, when};
use taleforge_core::{EnqueueRequest, GameEvent};
use taleforge_tests::GameWorld;

#[when(expr = "{string} submits the story line(s) {string}")]
async fn submits_story_lines(world: &mut GameWorld, name: String, lines: String) {
    let events = split_lines(&lines).into_iter().map(GameEvent::story).collect();
    let result = world.session_mut(&name).submit_events(events);
    world.record(result);
}

#[when(expr = "{string} passes the turn to {string} with {int} points")]
async fn passes_turn(world: &mut GameWorld, name: String, player: String, points: u32) {
    let result = world.session_mut(&name).submit_events(vec![GameEvent::ChangeTurn {
        new_player: player,
        turn_points_remaining: points,
    }]);
    world.record(result);
}

#[when(expr = "{string} submits an empty batch")]
async fn submits_empty_batch(world: &mut GameWorld, name: String) {
    let result = world.session_mut(&name).submit_events(Vec::new());
    world.record(result);
}

#[when(expr = "{string} submits a response rolling {int} and {int}")]
async fn submits_roll_response(world: &mut GameWorld, name: String, a: u8, b: u8) {
    let body = serde_json::json!({
        "events": [
            { "type": "player_action", "text": format!("{} rolls.", name), "label": name },
            { "type": "dice_roll", "target_values": [a, b] }
        ]
    });
    let bytes = serde_json::to_vec(&body).expect("response body");
    let result = world.session_mut(&name).submit_action_response(&bytes);
    world.record(result);
}

#[when(expr = "{string} submits a malformed action response")]
async fn submits_malformed_response(world: &mut GameWorld, name: String) {
    let result = world
        .session_mut(&name)
        .submit_action_response(br#"{"events":[{"type":"teleport"}]}"#);
    world.record(result);
}

#[when(expr = "the host receives a batch from {string} acting as {string}")]
async fn host_receives_forged_batch(world: &mut GameWorld, sender: String, actor: String) {
    let sender = world.peer_id(&sender);
    let actor = world.peer_id(&actor);
    let host = world.current_host().expect("a host").to_string();

    let result = world.session_mut(&host).accept_enqueue(
        sender,
        EnqueueRequest {
            actor,
            events: vec![GameEvent::story("forged")],
        },
    );
    world.record(result);
}

#[then(expr = "every peer shows {string} as the current player")]
async fn every_peer_current_player(world: &mut GameWorld, player: String) {
    for name in world.peer_names() {
        let turn = world.session(&name).sink().turn().expect("turn state");
        assert_eq!(turn.current_player, player, "{} disagrees", name);
    }
}

#[then(expr = "every peer totals the last roll at {int}")]
async fn every_peer_roll_total(world: &mut GameWorld, total: u32) {
    for name in world.peer_names() {
        assert_eq!(world.session(&name).sink().last_roll_total(), Some(total));
    }
}

#[then(expr = "the host queue head was submitted by {string}")]
async fn queue_head_actor(world: &mut GameWorld, name: String) {
    let actor = world.peer_id(&name);
    let host = world.current_host().expect("a host").to_string();
    let head = world
        .session(&host)
        .queue()
        .peek_head()
        .expect("host queue has a head");
    assert_eq!(head.actor, Some(actor));
}

#[then("the host queue is empty")]
async fn host_queue_empty(world: &mut GameWorld) {
    let host = world.current_host().expect("a host").to_string();
    assert!(world.session(&host).queue().is_empty());
}
