mod support;

use std::cell::RefCell;
use std::rc::Rc;
use support::SessionFixture;
use taleforge_core::domain::CastOutcome;
use taleforge_core::{VoteError, VoteOptions};
use taleforge_p2p::domain::keys;
use taleforge_p2p::{P2PError, Transport};

#[test]
fn test_majority_of_three_concludes_without_third_vote() {
    let mut fixture = SessionFixture::new(2);

    let outcomes = Rc::new(RefCell::new(Vec::new()));
    let recorded = outcomes.clone();
    fixture
        .host
        .on_vote_complete(move |outcome| recorded.borrow_mut().push(outcome.passed));

    let vote = fixture.guests[0]
        .propose_vote("Open the door?", VoteOptions::new("Open", "Leave it"))
        .unwrap();
    fixture.tick(1);
    assert!(fixture.all_sessions().all(|s| s.vote().is_visible()));

    fixture.guests[0].cast_vote(true).unwrap();
    fixture.guests[1].cast_vote(true).unwrap();
    fixture.tick(2);

    assert_eq!(*outcomes.borrow(), vec![true]);
    let outcome = fixture.host.last_vote_outcome().unwrap();
    assert_eq!(outcome.vote_id, vote.vote_id);
    assert_eq!(outcome.tally.yes, 2);
    assert_eq!(outcome.tally.threshold, 2);

    assert!(fixture.all_sessions().all(|s| !s.vote().is_visible()));
    assert!(fixture
        .host
        .transport()
        .state_keys(&keys::ballot_prefix(vote.vote_id))
        .is_empty());
}

#[test]
fn test_majority_no_rejects() {
    let mut fixture = SessionFixture::new(2);

    fixture.host.propose_vote("Rest here?", VoteOptions::default()).unwrap();
    fixture.tick(1);

    fixture.guests[0].cast_vote(false).unwrap();
    fixture.guests[1].cast_vote(false).unwrap();
    fixture.tick(2);

    assert_eq!(fixture.host.last_vote_outcome().map(|o| o.passed), Some(false));
}

#[test]
fn test_fresh_vote_with_same_title_starts_empty() {
    let mut fixture = SessionFixture::new(2);

    fixture.guests[0].propose_vote("Cross the river?", VoteOptions::default()).unwrap();
    fixture.tick(1);
    fixture.guests[0].cast_vote(true).unwrap();
    fixture.guests[1].cast_vote(true).unwrap();
    fixture.tick(2);

    let second = fixture.guests[1]
        .propose_vote("Cross the river?", VoteOptions::default())
        .unwrap();
    fixture.tick(1);

    assert!(fixture
        .host
        .transport()
        .state_keys(&keys::ballot_prefix(second.vote_id))
        .is_empty());
    assert!(fixture.all_sessions().all(|s| s.vote().my_choice().is_none()));

    // Earlier voters may vote again in the new session
    assert!(matches!(
        fixture.guests[0].cast_vote(false),
        Ok(CastOutcome::Recorded)
    ));
}

#[test]
fn test_single_vote_per_session_except_initiator() {
    let mut fixture = SessionFixture::new(3);

    fixture.guests[0].propose_vote("Fight?", VoteOptions::default()).unwrap();
    fixture.tick(1);

    fixture.guests[1].cast_vote(true).unwrap();
    assert!(matches!(
        fixture.guests[1].cast_vote(false),
        Err(P2PError::Vote(VoteError::AlreadyVoted))
    ));

    fixture.guests[0].cast_vote(true).unwrap();
    assert!(fixture.guests[0].cast_vote(true).is_ok());
}

#[test]
fn test_initiator_retracts_locally() {
    let mut fixture = SessionFixture::new(2);

    fixture.guests[0].propose_vote("Flee?", VoteOptions::default()).unwrap();
    fixture.tick(1);

    assert!(matches!(
        fixture.guests[0].cast_vote(false),
        Ok(CastOutcome::Retracted)
    ));
    assert!(!fixture.guests[0].vote().is_visible());

    fixture.tick(1);
    assert!(fixture.guests[1].vote().is_visible());
    assert!(fixture.host.vote().is_visible());
    assert!(fixture.host.last_vote_outcome().is_none());
}

#[test]
fn test_leaver_is_excluded_from_tally() {
    let mut fixture = SessionFixture::new(3);

    fixture.host.propose_vote("Take the left path?", VoteOptions::default()).unwrap();
    fixture.tick(1);

    fixture.guests[0].cast_vote(true).unwrap();
    fixture.guests[1].cast_vote(true).unwrap();
    fixture.tick(1);
    // 2 of 4 is below the threshold of 3
    assert!(fixture.host.last_vote_outcome().is_none());

    let leaver = fixture.guest_id(2);
    fixture.network.disconnect(leaver);
    fixture.tick(1);

    let outcome = fixture.host.last_vote_outcome().expect("concluded after leave");
    assert!(outcome.passed);
    assert_eq!(outcome.tally.electorate, 3);
}

#[test]
fn test_only_host_tallies() {
    let mut fixture = SessionFixture::new(1);
    assert!(matches!(
        fixture.guests[0].tally_votes(),
        Err(P2PError::Vote(VoteError::NotHost))
    ));
}

#[test]
fn test_cast_without_vote_fails() {
    let mut fixture = SessionFixture::new(1);
    assert!(matches!(
        fixture.guests[0].cast_vote(true),
        Err(P2PError::Vote(VoteError::NoActiveVote))
    ));
}
