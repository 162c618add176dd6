#![allow(dead_code)]

use instant::{Duration, Instant};
use taleforge_core::application::GameView;
use taleforge_core::PeerId;
use taleforge_p2p::{GameSession, MemoryNetwork, MemoryTransport, SessionConfig};

pub type Session = GameSession<MemoryTransport, GameView>;

/// Test fixture: one host and N guests on a shared in-memory network,
/// driven by a simulated clock
pub struct SessionFixture {
    pub network: MemoryNetwork,
    pub host: Session,
    pub guests: Vec<Session>,
    pub config: SessionConfig,
    pub clock: Instant,
}

impl SessionFixture {
    pub fn new(guest_count: usize) -> Self {
        Self::with_network(MemoryNetwork::new(), SessionConfig::default(), guest_count)
    }

    pub fn with_config(config: SessionConfig, guest_count: usize) -> Self {
        Self::with_network(MemoryNetwork::new(), config, guest_count)
    }

    pub fn with_network(network: MemoryNetwork, config: SessionConfig, guest_count: usize) -> Self {
        let host = GameSession::host(network.join(), view(&config), config.clone())
            .expect("host session");

        let mut fixture = Self {
            network,
            host,
            guests: Vec::new(),
            config,
            clock: Instant::now(),
        };
        for _ in 0..guest_count {
            fixture.add_guest();
        }
        fixture.tick(1);
        fixture
    }

    /// Join one more guest; returns its index
    pub fn add_guest(&mut self) -> usize {
        let guest = GameSession::guest(
            self.network.join(),
            view(&self.config),
            self.config.clone(),
        );
        self.guests.push(guest);
        self.guests.len() - 1
    }

    pub fn guest_id(&self, index: usize) -> PeerId {
        self.guests[index].local_peer_id()
    }

    pub fn host_id(&self) -> PeerId {
        self.host.local_peer_id()
    }

    pub fn advance(&mut self, by: Duration) {
        self.clock += by;
    }

    /// Poll every peer `count` times, host first, one poll interval apart
    pub fn tick(&mut self, count: usize) {
        for _ in 0..count {
            let now = self.clock;
            self.host.poll_at(now);
            for guest in self.guests.iter_mut() {
                guest.poll_at(now);
            }
            self.clock += self.config.poll_interval();
        }
    }

    /// Poll only the host while every guest lags behind
    pub fn tick_host(&mut self, count: usize) {
        for _ in 0..count {
            self.host.poll_at(self.clock);
            self.clock += self.config.poll_interval();
        }
    }

    /// Poll only the guests, e.g. while the host is cut off
    pub fn tick_guests(&mut self, count: usize) {
        for _ in 0..count {
            let now = self.clock;
            for guest in self.guests.iter_mut() {
                guest.poll_at(now);
            }
            self.clock += self.config.poll_interval();
        }
    }

    pub fn all_sessions(&self) -> impl Iterator<Item = &Session> {
        std::iter::once(&self.host).chain(self.guests.iter())
    }

    /// Tick until every peer has applied everything and the host queue is
    /// drained. Returns the number of ticks taken.
    pub fn settle(&mut self, max_ticks: usize) -> usize {
        for i in 0..max_ticks {
            self.tick(1);
            let drained = self.all_sessions().all(|s| s.is_caught_up())
                && self.all_sessions().all(|s| !s.is_host() || s.queue().is_empty());
            if drained {
                tracing::debug!("Settled after {} ticks", i + 1);
                return i + 1;
            }
        }
        panic!("Sessions did not settle within {} ticks", max_ticks);
    }

    pub fn story_of(session: &Session) -> Vec<String> {
        session
            .sink()
            .story_texts()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Every peer shows the same story feed
    pub fn assert_same_story(&self) -> Vec<String> {
        let expected = Self::story_of(&self.host);
        for (i, guest) in self.guests.iter().enumerate() {
            assert_eq!(
                Self::story_of(guest),
                expected,
                "Guest {} diverged from host",
                i + 1
            );
        }
        expected
    }
}

pub fn view(config: &SessionConfig) -> GameView {
    GameView::new(config.turn_time_limit)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("taleforge_p2p=debug,taleforge_core=debug")
        .with_test_writer()
        .try_init();
}
