use crate::application::scripted_backend::ScriptedBackend;
use crate::infrastructure::{CliError, Result};
use instant::Instant;
use serde::Serialize;
use taleforge_core::{GameView, VoteOptions};
use taleforge_p2p::{FaultPlan, GameSession, MemoryNetwork, MemoryTransport, SessionConfig};
use tracing::{debug, info, warn};

type Session = GameSession<MemoryTransport, GameView>;

const ACTIONS: [&str; 4] = ["look", "roll", "move", "end_turn"];
const DESTINATIONS: [&str; 3] = ["old mill", "river ford", "watchtower"];

/// Parameters of a headless multi-peer run
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub guests: usize,
    pub rounds: usize,
    pub seed: u64,
    pub faults: FaultPlan,
    pub session: SessionConfig,
    /// Pace ticks at the poll interval instead of running flat out
    pub realtime: bool,
    pub max_settle_ticks: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            guests: 2,
            rounds: 3,
            seed: 42,
            faults: FaultPlan::default(),
            session: SessionConfig::default(),
            realtime: false,
            max_settle_ticks: 20_000,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub peers: usize,
    pub actions: usize,
    pub events_applied: usize,
    pub ticks: usize,
    pub story: Vec<String>,
    pub vote_passed: Option<bool>,
    /// Seconds left on the host's turn timer when the run ended
    pub turn_seconds_left: Option<u64>,
}

struct Simulation {
    sessions: Vec<Session>,
    names: Vec<String>,
    session_config: SessionConfig,
    clock: Instant,
    ticks: usize,
    pacing: Option<tokio::time::Interval>,
}

impl Simulation {
    fn new(config: &SimulationConfig) -> Result<Self> {
        if config.max_settle_ticks == 0 {
            return Err(CliError::InvalidConfig(
                "max settle ticks must be positive".to_string(),
            ));
        }

        let session_config = config.session.clone();
        let network = MemoryNetwork::with_faults(config.faults);

        let view = || GameView::new(session_config.turn_time_limit);
        let mut sessions = vec![GameSession::host(
            network.join(),
            view(),
            session_config.clone(),
        )?];
        for _ in 0..config.guests {
            sessions.push(GameSession::guest(
                network.join(),
                view(),
                session_config.clone(),
            ));
        }

        let names = std::iter::once("Host".to_string())
            .chain((1..=config.guests).map(|i| format!("Player {}", i)))
            .collect();

        let pacing = config
            .realtime
            .then(|| tokio::time::interval(session_config.poll_interval()));

        Ok(Self {
            sessions,
            names,
            session_config,
            clock: Instant::now(),
            ticks: 0,
            pacing,
        })
    }

    async fn tick(&mut self, count: usize) {
        for _ in 0..count {
            if let Some(pacing) = self.pacing.as_mut() {
                pacing.tick().await;
            }
            let now = self.clock;
            let elapsed = self.session_config.poll_interval();
            for session in self.sessions.iter_mut() {
                session.poll_at(now);
                session.sink_mut().tick(elapsed);
            }
            self.clock += elapsed;
            self.ticks += 1;
        }
    }

    fn settled(&self) -> bool {
        self.sessions.iter().all(|s| s.is_caught_up())
            && self.sessions.iter().all(|s| !s.is_host() || s.queue().is_empty())
    }

    async fn settle(&mut self, max_ticks: usize) -> Result<()> {
        for _ in 0..max_ticks {
            self.tick(1).await;
            if self.settled() {
                return Ok(());
            }
        }
        Err(CliError::NotSettled(max_ticks))
    }

    fn host(&self) -> &Session {
        &self.sessions[0]
    }

    fn check_consistency(&self) -> Result<Vec<String>> {
        let expected = self.host().sink().story_texts();
        for (i, guest) in self.sessions.iter().enumerate().skip(1) {
            let feed = guest.sink().story_texts();
            if feed != expected {
                return Err(CliError::Diverged(format!(
                    "{} shows {} story lines, host shows {}",
                    self.names[i],
                    feed.len(),
                    expected.len()
                )));
            }
            let player = |s: &Session| s.sink().turn().map(|t| t.current_player.clone());
            if player(guest) != player(self.host()) {
                return Err(CliError::Diverged(format!(
                    "{} disagrees on the current turn",
                    self.names[i]
                )));
            }
        }
        Ok(expected.into_iter().map(str::to_string).collect())
    }
}

fn parameters_for(action: &str, round: usize) -> serde_json::Value {
    match action {
        "roll" => serde_json::json!({ "dice": 2 }),
        "move" => serde_json::json!({ "to": DESTINATIONS[round % DESTINATIONS.len()] }),
        _ => serde_json::Value::Null,
    }
}

/// Drive one host and `guests` guests through scripted rounds, then a
/// vote, and verify every peer ended on the same story.
pub async fn run(config: SimulationConfig) -> Result<SimulationReport> {
    let mut sim = Simulation::new(&config)?;
    let backend = ScriptedBackend::new(sim.names.clone(), config.seed);
    info!(
        "Simulating {} peers for {} rounds (seed {})",
        sim.sessions.len(),
        config.rounds,
        config.seed
    );

    sim.tick(1).await;

    let mut actions = 0;
    for round in 0..config.rounds {
        for index in 0..sim.sessions.len() {
            let action = ACTIONS[(round + index) % ACTIONS.len()];
            let name = sim.names[index].clone();
            let parameters = parameters_for(action, round);

            match sim.sessions[index]
                .perform_action(&backend, name.as_str(), action, parameters)
                .await
            {
                Ok(count) => {
                    actions += 1;
                    debug!("{} performed '{}' ({} events)", name, action, count);
                }
                Err(e) => warn!("{} failed to perform '{}': {}", name, action, e),
            }
            sim.tick(1).await;
        }
        info!("Round {} submitted", round + 1);
    }

    sim.settle(config.max_settle_ticks).await?;

    sim.sessions[0].propose_vote("Continue the adventure?", VoteOptions::new("Yes", "No"))?;
    sim.tick(1).await;
    for session in sim.sessions.iter_mut() {
        session.cast_vote(true)?;
    }
    sim.tick(2).await;

    let vote_passed = sim.host().last_vote_outcome().map(|outcome| outcome.passed);
    match vote_passed {
        Some(passed) => info!("Vote concluded: passed = {}", passed),
        None => warn!("Vote did not conclude"),
    }

    let story = sim.check_consistency()?;
    let report = SimulationReport {
        peers: sim.sessions.len(),
        actions,
        events_applied: sim.host().processor().ledger().len(),
        ticks: sim.ticks,
        story,
        vote_passed,
        turn_seconds_left: sim
            .host()
            .sink()
            .turn()
            .map(|turn| turn.time_remaining.as_secs()),
    };

    info!(
        "✓ {} peers agree on {} story lines after {} ticks",
        report.peers,
        report.story.len(),
        report.ticks
    );
    Ok(report)
}
