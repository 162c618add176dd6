use cucumber::{then, when};
use taleforge_core::VoteOptions;
use taleforge_tests::GameWorld;

fn parse_choice(choice: &str) -> bool {
    match choice {
        "yes" => true,
        "no" => false,
        other => panic!("Unknown vote choice '{}'", other),
    }
}

#[when(expr = "{string} proposes the vote {string}")]
async fn proposes_vote(world: &mut GameWorld, name: String, title: String) {
    let result = world
        .session_mut(&name)
        .propose_vote(title, VoteOptions::new("Yes", "No"));
    world.record(result);
}

#[when(expr = "{string} votes {word}")]
async fn votes(world: &mut GameWorld, name: String, choice: String) {
    let result = world.session_mut(&name).cast_vote(parse_choice(&choice));
    world.record(result);
}

#[when(expr = "{string} tallies the votes")]
async fn tallies(world: &mut GameWorld, name: String) {
    let result = world.session_mut(&name).tally_votes();
    world.record(result);
}

#[then(expr = "the vote is visible on every peer")]
async fn vote_visible(world: &mut GameWorld) {
    for name in world.peer_names() {
        assert!(world.session(&name).vote().is_visible(), "{} misses the vote", name);
    }
}

#[then(expr = "the vote is hidden on every peer")]
async fn vote_hidden(world: &mut GameWorld) {
    for name in world.peer_names() {
        assert!(!world.session(&name).vote().is_visible(), "{} still shows the vote", name);
    }
}

#[then(expr = "the host concludes the vote with {word}")]
async fn host_concludes(world: &mut GameWorld, choice: String) {
    let host = world.current_host().expect("a host").to_string();
    let outcome = world
        .session(&host)
        .last_vote_outcome()
        .expect("vote concluded");
    assert_eq!(outcome.passed, parse_choice(&choice));
}

#[then("the vote is still open")]
async fn vote_open(world: &mut GameWorld) {
    let host = world.current_host().expect("a host").to_string();
    assert!(world.session(&host).last_vote_outcome().is_none());
    assert!(world.session(&host).vote().is_visible());
}

#[then(expr = "the vote counted {int} yes of {int} eligible")]
async fn vote_counted(world: &mut GameWorld, yes: usize, electorate: usize) {
    let host = world.current_host().expect("a host").to_string();
    let outcome = world
        .session(&host)
        .last_vote_outcome()
        .expect("vote concluded");
    assert_eq!(outcome.tally.yes, yes);
    assert_eq!(outcome.tally.electorate, electorate);
}
