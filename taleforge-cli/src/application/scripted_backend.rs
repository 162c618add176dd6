use async_trait::async_trait;
use std::sync::Mutex;
use taleforge_core::domain::DiceRollConfig;
use taleforge_core::{ActionBackend, ActionRequest, ActionResponse, BatchError, GameEvent};

/// Deterministic stand-in for the game-logic service.
///
/// Understands a handful of actions and derives dice faces from a seeded
/// generator, so the same seed always yields the same batches.
pub struct ScriptedBackend {
    players: Vec<String>,
    state: Mutex<ScriptState>,
}

struct ScriptState {
    rng: u64,
    turn: usize,
}

impl ScriptedBackend {
    pub fn new(players: Vec<String>, seed: u64) -> Self {
        Self {
            players,
            state: Mutex::new(ScriptState {
                rng: seed.max(1),
                turn: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn roll_die(state: &mut ScriptState) -> u8 {
        // xorshift64
        state.rng ^= state.rng << 13;
        state.rng ^= state.rng >> 7;
        state.rng ^= state.rng << 17;
        (state.rng % 6) as u8 + 1
    }
}

#[async_trait]
impl ActionBackend for ScriptedBackend {
    async fn perform(&self, request: ActionRequest) -> Result<ActionResponse, BatchError> {
        let mut state = self.lock();
        let character = request.character.as_str();

        let events = match request.action.as_str() {
            "look" => vec![
                GameEvent::PlayerAction {
                    text: format!("{} looks around.", character),
                    label: character.to_string(),
                },
                GameEvent::story("Moss covers the old stones."),
            ],
            "roll" => {
                let dice = request
                    .parameters
                    .get("dice")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(2)
                    .clamp(1, 6);
                let faces = (0..dice).map(|_| Self::roll_die(&mut state)).collect();
                vec![GameEvent::DiceRoll(
                    DiceRollConfig::new(faces)
                        .with_texts(format!("{} rolls...", character), "The dice settle."),
                )]
            }
            "move" => {
                let to = request
                    .parameters
                    .get("to")
                    .and_then(|v| v.as_str())
                    .unwrap_or("crossroads");
                vec![
                    GameEvent::ChangeLocation {
                        location_state: serde_json::json!({ "visited": true }),
                        location_data: serde_json::json!({ "name": to }),
                    },
                    GameEvent::story(format!("{} arrives at the {}.", character, to)),
                ]
            }
            "end_turn" => {
                if self.players.is_empty() {
                    return Err(BatchError::Unavailable("no players seated".to_string()));
                }
                state.turn = (state.turn + 1) % self.players.len();
                vec![GameEvent::ChangeTurn {
                    new_player: self.players[state.turn].clone(),
                    turn_points_remaining: 3,
                }]
            }
            other => {
                return Err(BatchError::Unavailable(format!("unknown action '{}'", other)));
            }
        };

        tracing::debug!(
            "Scripted backend produced {} events for '{}'",
            events.len(),
            request.action
        );
        Ok(ActionResponse { events })
    }
}
