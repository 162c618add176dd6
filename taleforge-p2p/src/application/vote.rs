use crate::domain::keys;
use crate::infrastructure::error::Result;
use crate::infrastructure::transport::Transport;
use taleforge_core::domain::{Ballots, CastOutcome, LocalBallot, VoteTally};
use taleforge_core::{PeerId, VoteError, VoteOptions, VoteOutcome, VoteState};

/// Client side of the vote sub-protocol.
///
/// The session record lives under [`keys::VOTE_STATE`] and every ballot
/// under its own per-peer key, so concurrent casts never overwrite each
/// other. Only the host tallies.
#[derive(Debug, Default)]
pub struct VoteCoordinator {
    state: Option<VoteState>,
    ballot: LocalBallot,
}

impl VoteCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-read the vote record from the replicated store
    pub fn refresh<T: Transport>(&mut self, transport: &T) {
        self.state = transport
            .get_state(keys::VOTE_STATE)
            .and_then(|value| serde_json::from_value(value).ok());
    }

    /// Start a vote, superseding any open one
    pub fn propose<T: Transport>(
        &mut self,
        transport: &mut T,
        title: impl Into<String>,
        options: VoteOptions,
    ) -> Result<VoteState> {
        let me = transport.local_peer_id();
        let state = VoteState::propose(me, title, options)?;

        self.refresh(transport);
        if let Some(previous) = self.state.take() {
            clear_ballots(transport, &previous)?;
        }

        transport.set_state(keys::VOTE_STATE, Some(serde_json::to_value(&state)?))?;
        tracing::info!("🗳️ Vote proposed: '{}' ({})", state.title, state.vote_id);

        self.state = Some(state.clone());
        Ok(state)
    }

    /// Record this peer's choice under its ballot key
    pub fn cast<T: Transport>(&mut self, transport: &mut T, choice: bool) -> Result<CastOutcome> {
        self.refresh(transport);
        let state = self.state.as_ref().ok_or(VoteError::NoActiveVote)?;
        let me = transport.local_peer_id();

        let outcome = self.ballot.cast(state, me, choice)?;
        transport.set_state(
            &keys::ballot_key(state.vote_id, me),
            Some(serde_json::Value::Bool(choice)),
        )?;

        tracing::debug!("Cast {} on vote {} ({:?})", choice, state.vote_id, outcome);
        Ok(outcome)
    }

    /// Count ballots of connected peers and conclude on a majority.
    ///
    /// Safe to re-run on every change: once concluded, the record is closed
    /// and further tallies are no-ops.
    pub fn tally<T: Transport>(&mut self, transport: &mut T) -> Result<Option<VoteOutcome>> {
        self.refresh(transport);
        let Some(mut state) = self.state.clone().filter(|s| s.visible) else {
            return Ok(None);
        };

        let connected = transport.connected_peers();
        let ballots = read_ballots(transport, &state, &connected);
        let tally = VoteTally::count(&ballots, &connected);

        let Some(passed) = tally.outcome() else {
            tracing::debug!(
                "Vote {} open: {} yes / {} no of {} (need {})",
                state.vote_id,
                tally.yes,
                tally.no,
                tally.electorate,
                tally.threshold
            );
            return Ok(None);
        };

        clear_ballots(transport, &state)?;
        state.close();
        transport.set_state(keys::VOTE_STATE, Some(serde_json::to_value(&state)?))?;

        tracing::info!(
            "🗳️ Vote '{}' concluded: {} ({} yes / {} no)",
            state.title,
            if passed { "passed" } else { "rejected" },
            tally.yes,
            tally.no
        );

        let outcome = VoteOutcome {
            vote_id: state.vote_id,
            title: state.title.clone(),
            passed,
            tally,
        };
        self.state = Some(state);
        Ok(Some(outcome))
    }

    pub fn current(&self) -> Option<&VoteState> {
        self.state.as_ref()
    }

    /// Whether the vote prompt should be shown on this client
    pub fn is_visible(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.visible && !self.ballot.is_hidden_for(state))
    }

    pub fn my_choice(&self) -> Option<bool> {
        self.state
            .as_ref()
            .and_then(|state| self.ballot.choice_for(state))
    }
}

fn read_ballots<T: Transport>(transport: &T, state: &VoteState, peers: &[PeerId]) -> Ballots {
    peers
        .iter()
        .filter_map(|peer| {
            let value = transport.get_state(&keys::ballot_key(state.vote_id, *peer))?;
            Some((*peer, value.as_bool()?))
        })
        .collect()
}

/// Clear every ballot of `state`, including those of peers that left
fn clear_ballots<T: Transport>(transport: &mut T, state: &VoteState) -> Result<()> {
    for key in transport.state_keys(&keys::ballot_prefix(state.vote_id)) {
        transport.set_state(&key, None)?;
    }
    Ok(())
}
