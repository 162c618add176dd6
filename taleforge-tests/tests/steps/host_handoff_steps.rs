use cucumber::{then, when};
use taleforge_tests::GameWorld;

#[when(expr = "{string} hands the host role to {string}")]
async fn hands_off(world: &mut GameWorld, from: String, to: String) {
    let to = world.peer_id(&to);
    let result = world.session_mut(&from).hand_off_host(to);
    world.record(result);
}

#[when(expr = "{string} disconnects")]
async fn disconnects(world: &mut GameWorld, name: String) {
    let peer = world.peer_id(&name);
    world.network.disconnect(peer);
}

#[when(expr = "{string} reconnects")]
async fn reconnects(world: &mut GameWorld, name: String) {
    let peer = world.peer_id(&name);
    world.network.reconnect(peer);
}

#[then(expr = "{string} is the host")]
async fn is_the_host(world: &mut GameWorld, name: String) {
    assert_eq!(world.current_host(), Some(name.as_str()));
    for other in world.peer_names() {
        if other != name {
            assert!(!world.session(&other).is_host(), "{} still acts as host", other);
        }
    }
}

#[then("nobody holds the host role")]
async fn nobody_hosts(world: &mut GameWorld) {
    assert_eq!(world.current_host(), None);
}

#[then("the connected peer with the lowest id is the host")]
async fn lowest_is_host(world: &mut GameWorld) {
    let connected = world.network.connected_peers();
    let lowest = world
        .peer_names()
        .into_iter()
        .filter(|name| connected.contains(&world.peer_id(name)))
        .min_by_key(|name| world.peer_id(name))
        .expect("a connected peer");
    assert_eq!(world.current_host(), Some(lowest.as_str()));
}

#[then(expr = "every connected peer sees host epoch {int}")]
async fn host_epoch(world: &mut GameWorld, epoch: u64) {
    let connected = world.network.connected_peers();
    for name in world.peer_names() {
        if connected.contains(&world.peer_id(&name)) {
            let lease = world.session(&name).lease().expect("lease");
            assert_eq!(lease.epoch, epoch, "{} sees another epoch", name);
        }
    }
}
