use taleforge_core::{BatchError, PeerId, PolicyError, QueueError, VoteError};

/// Session and transport errors
#[derive(Debug, thiserror::Error)]
pub enum P2PError {
    #[error("Peer not found: {0}")]
    PeerNotFound(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Peer {0} is not connected")]
    Disconnected(PeerId),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Operation requires the host lease")]
    NotHost,

    #[error("No host lease has been published yet")]
    NoHostLease,

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Enqueue rejected: {0}")]
    Policy(#[from] PolicyError),

    #[error("Vote error: {0}")]
    Vote(#[from] VoteError),

    #[error("Invalid batch: {0}")]
    Batch(#[from] BatchError),
}

pub type Result<T> = std::result::Result<T, P2PError>;
