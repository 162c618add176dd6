use crate::domain::{GameEvent, PeerId};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One player action sent to the game-logic backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionRequest {
    pub actor: PeerId,
    pub character: String,
    pub action: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// Ordered batch produced for one action. Enqueued as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionResponse {
    pub events: Vec<GameEvent>,
}

/// Backend/client contract violations
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Malformed action response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid event at position {index}: {reason}")]
    InvalidEvent { index: usize, reason: String },

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Game-logic service. Treated as a black box producing one batch per action.
#[async_trait]
pub trait ActionBackend: Send + Sync {
    async fn perform(&self, request: ActionRequest) -> Result<ActionResponse, BatchError>;
}

/// Decode and validate a raw backend response body
pub fn parse_action_response(body: &[u8]) -> Result<Vec<GameEvent>, BatchError> {
    let response: ActionResponse = serde_json::from_slice(body)?;
    validate_batch(&response.events)?;
    Ok(response.events)
}

/// Schema-level checks serde cannot express
pub fn validate_batch(events: &[GameEvent]) -> Result<(), BatchError> {
    for (index, event) in events.iter().enumerate() {
        let reason = match event {
            GameEvent::DiceRoll(roll) if roll.target_values.is_empty() => {
                Some("dice roll without dice")
            }
            GameEvent::DiceRoll(roll) if roll.target_values.contains(&0) => {
                Some("dice face value 0")
            }
            GameEvent::ChangeTurn { new_player, .. } if new_player.trim().is_empty() => {
                Some("turn change without a player")
            }
            _ => None,
        };

        if let Some(reason) = reason {
            return Err(BatchError::InvalidEvent {
                index,
                reason: reason.to_string(),
            });
        }
    }
    Ok(())
}
