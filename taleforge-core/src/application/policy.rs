use crate::domain::{GameEvent, PeerId};
use serde::{Deserialize, Serialize};

/// Request to append a backend batch to the shared queue.
/// Non-host peers send this to the host, which sequences and publishes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnqueueRequest {
    /// Player whose action produced the batch
    pub actor: PeerId,
    pub events: Vec<GameEvent>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PolicyError {
    #[error("Peer {sender} may not enqueue events for an action of {actor}")]
    ForeignActor { sender: PeerId, actor: PeerId },
}

/// Who may originate events: the host, or a player teeing the backend
/// response to their own action. Checked by the host for every batch.
pub fn authorize_enqueue(
    sender: PeerId,
    host: PeerId,
    request: &EnqueueRequest,
) -> Result<(), PolicyError> {
    if sender == host || sender == request.actor {
        Ok(())
    } else {
        Err(PolicyError::ForeignActor {
            sender,
            actor: request.actor,
        })
    }
}
