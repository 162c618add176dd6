use cucumber::World;
use instant::{Duration, Instant};
use std::collections::HashMap;
use taleforge_core::{GameView, PeerId};
use taleforge_p2p::{FaultPlan, GameSession, MemoryNetwork, MemoryTransport, SessionConfig};

pub type Session = GameSession<MemoryTransport, GameView>;

#[derive(World)]
#[world(init = Self::new)]
pub struct GameWorld {
    /// Shared replication bus (the system under test runs on top of it)
    pub network: MemoryNetwork,

    pub config: SessionConfig,

    /// Sessions in join order; the first one started as host
    pub sessions: Vec<Session>,

    /// Display name -> index into `sessions`
    pub names: HashMap<String, usize>,

    /// Simulated clock handed to every poll
    pub clock: Instant,

    /// Last error returned by a session call
    pub last_error: Option<String>,
}

impl std::fmt::Debug for GameWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameWorld")
            .field("peers", &self.names)
            .field("config", &self.config)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl Default for GameWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl GameWorld {
    pub fn new() -> Self {
        Self {
            network: MemoryNetwork::new(),
            config: SessionConfig::default(),
            sessions: Vec::new(),
            names: HashMap::new(),
            clock: Instant::now(),
            last_error: None,
        }
    }

    pub fn set_faults(&mut self, faults: FaultPlan) {
        self.network.set_faults(faults);
    }

    fn view(&self) -> GameView {
        GameView::new(self.config.turn_time_limit)
    }

    /// Start the hosting session
    pub fn start_host(&mut self, name: &str) {
        let session = GameSession::host(self.network.join(), self.view(), self.config.clone())
            .expect("host session");
        self.names.insert(name.to_string(), self.sessions.len());
        self.sessions.push(session);
    }

    pub fn join_guest(&mut self, name: &str) {
        let session = GameSession::guest(self.network.join(), self.view(), self.config.clone());
        self.names.insert(name.to_string(), self.sessions.len());
        self.sessions.push(session);
    }

    fn index(&self, name: &str) -> usize {
        *self
            .names
            .get(name)
            .unwrap_or_else(|| panic!("Peer '{}' not found", name))
    }

    pub fn session(&self, name: &str) -> &Session {
        &self.sessions[self.index(name)]
    }

    pub fn session_mut(&mut self, name: &str) -> &mut Session {
        let index = self.index(name);
        &mut self.sessions[index]
    }

    pub fn peer_id(&self, name: &str) -> PeerId {
        self.session(name).local_peer_id()
    }

    /// Name of the peer whose session currently holds the lease
    pub fn current_host(&self) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, index)| self.sessions[**index].is_host() && self.is_connected(**index))
            .map(|(name, _)| name.as_str())
    }

    fn is_connected(&self, index: usize) -> bool {
        self.network
            .connected_peers()
            .contains(&self.sessions[index].local_peer_id())
    }

    /// Poll every connected peer `count` times, one poll interval apart
    pub fn tick(&mut self, count: usize) {
        for _ in 0..count {
            let now = self.clock;
            let connected = self.network.connected_peers();
            for session in self.sessions.iter_mut() {
                if connected.contains(&session.local_peer_id()) {
                    session.poll_at(now);
                }
            }
            self.clock += self.config.poll_interval();
        }
    }

    /// Poll a single peer `count` times while the others lag behind
    pub fn tick_only(&mut self, name: &str, count: usize) {
        let index = self.index(name);
        for _ in 0..count {
            let now = self.clock;
            self.sessions[index].poll_at(now);
            self.clock += self.config.poll_interval();
        }
    }

    pub fn advance(&mut self, by: Duration) {
        let steps = (by.as_millis() / self.config.poll_interval().as_millis().max(1)) as usize;
        self.tick(steps.max(1));
    }

    /// Tick until every connected peer is caught up and the host drained
    /// its queue
    pub fn settle(&mut self, max_ticks: usize) {
        for _ in 0..max_ticks {
            self.tick(1);
            let connected = self.network.connected_peers();
            let live = || {
                self.sessions
                    .iter()
                    .filter(|s| connected.contains(&s.local_peer_id()))
            };
            if live().all(|s| s.is_caught_up()) && live().all(|s| !s.is_host() || s.queue().is_empty())
            {
                return;
            }
        }
        panic!("Sessions did not settle within {} ticks", max_ticks);
    }

    pub fn story_of(&self, name: &str) -> Vec<String> {
        self.session(name)
            .sink()
            .story_texts()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn peer_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.keys().cloned().collect();
        names.sort_by_key(|name| self.names[name]);
        names
    }

    /// Remember the error of a session call for later assertions
    pub fn record<T, E: std::fmt::Display>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                None
            }
        }
    }
}
