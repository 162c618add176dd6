use crate::domain::PeerId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Labels shown for the two choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VoteOptions {
    pub yes_label: String,
    pub no_label: String,
}

impl VoteOptions {
    pub fn new(yes_label: impl Into<String>, no_label: impl Into<String>) -> Self {
        Self {
            yes_label: yes_label.into(),
            no_label: no_label.into(),
        }
    }
}

impl Default for VoteOptions {
    fn default() -> Self {
        Self::new("Yes", "No")
    }
}

/// Shared state of the current vote session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VoteState {
    /// Key under which per-peer ballots of this session are stored
    pub vote_id: Uuid,
    pub title: String,
    pub options: VoteOptions,
    pub visible: bool,
    pub initiator: PeerId,
}

impl VoteState {
    /// Start a new session. Any previous vote is superseded.
    pub fn propose(
        initiator: PeerId,
        title: impl Into<String>,
        options: VoteOptions,
    ) -> Result<Self, VoteError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(VoteError::EmptyTitle);
        }

        Ok(Self {
            vote_id: Uuid::new_v4(),
            title,
            options,
            visible: true,
            initiator,
        })
    }

    pub fn close(&mut self) {
        self.visible = false;
    }
}

/// Ballots of one vote session, keyed by voter
pub type Ballots = BTreeMap<PeerId, bool>;

/// Votes needed to decide with `peer_count` connected peers
pub fn majority_threshold(peer_count: usize) -> usize {
    peer_count / 2 + 1
}

/// Count of the ballots cast by currently connected peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTally {
    pub yes: usize,
    pub no: usize,
    pub electorate: usize,
    pub threshold: usize,
}

impl VoteTally {
    /// Ballots from peers outside `connected` are ignored
    pub fn count(ballots: &Ballots, connected: &[PeerId]) -> Self {
        let (mut yes, mut no) = (0, 0);
        for peer in connected {
            match ballots.get(peer) {
                Some(true) => yes += 1,
                Some(false) => no += 1,
                None => {}
            }
        }

        Self {
            yes,
            no,
            electorate: connected.len(),
            threshold: majority_threshold(connected.len()),
        }
    }

    /// Winning choice once either side reaches a strict majority
    pub fn outcome(&self) -> Option<bool> {
        if self.yes >= self.threshold {
            Some(true)
        } else if self.no >= self.threshold {
            Some(false)
        } else {
            None
        }
    }
}

/// Result of a concluded vote session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    pub vote_id: Uuid,
    pub title: String,
    pub passed: bool,
    pub tally: VoteTally,
}

/// What a local cast did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOutcome {
    Recorded,
    /// Initiator voted against their own proposal; hidden locally right away
    Retracted,
}

/// This client's participation in the current vote session
#[derive(Debug, Clone, Default)]
pub struct LocalBallot {
    vote_id: Option<Uuid>,
    choice: Option<bool>,
    hidden: bool,
}

impl LocalBallot {
    /// Validate and record a local vote.
    ///
    /// A peer votes at most once per session; the initiator may vote again,
    /// and a "no" from the initiator retracts the proposal for them.
    pub fn cast(
        &mut self,
        state: &VoteState,
        voter: PeerId,
        choice: bool,
    ) -> Result<CastOutcome, VoteError> {
        if !state.visible {
            return Err(VoteError::NoActiveVote);
        }

        if self.vote_id != Some(state.vote_id) {
            *self = LocalBallot {
                vote_id: Some(state.vote_id),
                ..Default::default()
            };
        }

        let is_initiator = state.initiator == voter;
        if self.choice.is_some() && !is_initiator {
            return Err(VoteError::AlreadyVoted);
        }

        self.choice = Some(choice);

        if is_initiator && !choice {
            self.hidden = true;
            return Ok(CastOutcome::Retracted);
        }

        Ok(CastOutcome::Recorded)
    }

    pub fn choice_for(&self, state: &VoteState) -> Option<bool> {
        if self.vote_id == Some(state.vote_id) {
            self.choice
        } else {
            None
        }
    }

    pub fn is_hidden_for(&self, state: &VoteState) -> bool {
        self.vote_id == Some(state.vote_id) && self.hidden
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum VoteError {
    #[error("No vote is currently open")]
    NoActiveVote,

    #[error("Already voted in this session")]
    AlreadyVoted,

    #[error("Vote title must not be empty")]
    EmptyTitle,

    #[error("Only the host may tally votes")]
    NotHost,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peers(n: usize) -> Vec<PeerId> {
        (0..n)
            .map(|i| PeerId::from_uuid(Uuid::from_u128(i as u128 + 1)))
            .collect()
    }

    #[test]
    fn test_majority_threshold() {
        assert_eq!(majority_threshold(1), 1);
        assert_eq!(majority_threshold(2), 2);
        assert_eq!(majority_threshold(3), 2);
        assert_eq!(majority_threshold(4), 3);
        assert_eq!(majority_threshold(5), 3);
    }

    #[test]
    fn test_two_of_three_yes_concludes() {
        let connected = peers(3);
        let mut ballots = Ballots::new();
        ballots.insert(connected[0], true);
        ballots.insert(connected[1], true);

        let tally = VoteTally::count(&ballots, &connected);
        assert_eq!(tally.outcome(), Some(true));
    }

    #[test]
    fn test_no_majority_is_undecided() {
        let connected = peers(4);
        let mut ballots = Ballots::new();
        ballots.insert(connected[0], true);
        ballots.insert(connected[1], true);
        ballots.insert(connected[2], false);

        assert_eq!(VoteTally::count(&ballots, &connected).outcome(), None);
    }

    #[test]
    fn test_no_side_wins() {
        let connected = peers(3);
        let mut ballots = Ballots::new();
        ballots.insert(connected[1], false);
        ballots.insert(connected[2], false);

        assert_eq!(VoteTally::count(&ballots, &connected).outcome(), Some(false));
    }

    #[test]
    fn test_departed_peer_excluded() {
        let all = peers(3);
        let mut ballots = Ballots::new();
        ballots.insert(all[0], true);
        ballots.insert(all[2], true); // leaves before the tally

        let still_here = &all[..2];
        let tally = VoteTally::count(&ballots, still_here);
        assert_eq!(tally.yes, 1);
        assert_eq!(tally.threshold, 2);
        assert_eq!(tally.outcome(), None);
    }

    #[test]
    fn test_peer_votes_once() {
        let voters = peers(2);
        let state = VoteState::propose(voters[0], "Rest at the inn?", VoteOptions::default())
            .unwrap();

        let mut ballot = LocalBallot::default();
        assert_eq!(
            ballot.cast(&state, voters[1], true),
            Ok(CastOutcome::Recorded)
        );
        assert_eq!(
            ballot.cast(&state, voters[1], false),
            Err(VoteError::AlreadyVoted)
        );
        assert_eq!(ballot.choice_for(&state), Some(true));
    }

    #[test]
    fn test_initiator_can_retract() {
        let initiator = peers(1)[0];
        let state =
            VoteState::propose(initiator, "Enter the cave?", VoteOptions::default()).unwrap();

        let mut ballot = LocalBallot::default();
        ballot.cast(&state, initiator, true).unwrap();
        assert!(!ballot.is_hidden_for(&state));

        assert_eq!(
            ballot.cast(&state, initiator, false),
            Ok(CastOutcome::Retracted)
        );
        assert!(ballot.is_hidden_for(&state));
    }

    #[test]
    fn test_new_session_resets_local_ballot() {
        let voter = peers(2)[1];
        let first = VoteState::propose(peers(1)[0], "Vote", VoteOptions::default()).unwrap();
        let second = VoteState::propose(peers(1)[0], "Vote", VoteOptions::default()).unwrap();

        let mut ballot = LocalBallot::default();
        ballot.cast(&first, voter, true).unwrap();
        assert_eq!(ballot.choice_for(&second), None);
        assert_eq!(
            ballot.cast(&second, voter, false),
            Ok(CastOutcome::Recorded)
        );
    }

    #[test]
    fn test_cast_on_closed_vote_fails() {
        let initiator = peers(1)[0];
        let mut state = VoteState::propose(initiator, "Vote", VoteOptions::default()).unwrap();
        state.close();

        let mut ballot = LocalBallot::default();
        assert_eq!(
            ballot.cast(&state, initiator, true),
            Err(VoteError::NoActiveVote)
        );
    }

    #[test]
    fn test_empty_title_rejected() {
        assert_eq!(
            VoteState::propose(PeerId::random(), "  ", VoteOptions::default()),
            Err(VoteError::EmptyTitle)
        );
    }
}
