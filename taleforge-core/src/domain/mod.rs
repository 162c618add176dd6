pub mod envelope;
pub mod events;
pub mod ledger;
pub mod notification;
pub mod peer;
pub mod queue;
pub mod vote;

pub use envelope::{EventEnvelope, Fingerprint, FingerprintStrategy};
pub use events::{
    CharacterStates, DiceRollConfig, GameEvent, SinkTarget, DICE_ROLL_DISPLAY, STORY_DISPLAY,
};
pub use ledger::DedupLedger;
pub use notification::{Notification, NotificationCenter, NotificationLevel};
pub use peer::PeerId;
pub use queue::{EventQueue, QueueError};
pub use vote::{
    majority_threshold, Ballots, CastOutcome, LocalBallot, VoteError, VoteOptions, VoteOutcome,
    VoteState, VoteTally,
};
