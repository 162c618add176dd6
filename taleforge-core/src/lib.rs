pub mod application;
pub mod domain;

pub use application::{
    parse_action_response, ActionBackend, ActionRequest, ActionResponse, BatchError,
    EnqueueRequest, EventProcessor, GameView, PolicyError, PresentationSink, ProcessorStep,
};
pub use domain::{
    DedupLedger, DiceRollConfig, EventEnvelope, EventQueue, Fingerprint, FingerprintStrategy,
    GameEvent, NotificationCenter, PeerId, QueueError, VoteError, VoteOptions, VoteOutcome,
    VoteState,
};
