use cucumber::{given, then, when};
use taleforge_core::{FingerprintStrategy, GameEvent};
use taleforge_p2p::FaultPlan;
use taleforge_tests::GameWorld;

#[given("every state change is delivered twice and then replayed stale")]
async fn faulty_delivery(world: &mut GameWorld) {
    world.set_faults(FaultPlan {
        duplicate_state_changes: true,
        replay_stale_state: true,
    });
}

#[given(expr = "events are fingerprinted by {word}")]
async fn fingerprint_strategy(world: &mut GameWorld, strategy: String) {
    let strategy = match strategy.as_str() {
        "sequence" => FingerprintStrategy::Sequence,
        "content" => FingerprintStrategy::Content,
        other => panic!("Unknown fingerprint strategy '{}'", other),
    };
    world.config = world.config.clone().with_fingerprint_strategy(strategy);
}

#[when(expr = "{string} submits two identical rolls of {int} and {int}")]
async fn identical_rolls(world: &mut GameWorld, name: String, a: u8, b: u8) {
    let roll = GameEvent::dice_roll(vec![a, b]);
    let result = world
        .session_mut(&name)
        .submit_events(vec![roll.clone(), roll]);
    world.record(result);
}

#[then(expr = "every peer applied {int} event(s)")]
async fn every_peer_applied(world: &mut GameWorld, count: usize) {
    for name in world.peer_names() {
        assert_eq!(
            world.session(&name).processor().ledger().len(),
            count,
            "{} applied a different number of events",
            name
        );
    }
}

#[then("every peer has caught up")]
async fn every_peer_caught_up(world: &mut GameWorld) {
    for name in world.peer_names() {
        assert!(world.session(&name).is_caught_up(), "{} lags behind", name);
    }
}
