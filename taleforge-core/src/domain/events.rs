use instant::Duration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How long a story line stays on screen before the next event is applied
pub const STORY_DISPLAY: Duration = Duration::from_millis(3000);

/// Length of the dice overlay animation
pub const DICE_ROLL_DISPLAY: Duration = Duration::from_millis(4000);

/// Full character state mapping (character name -> opaque sheet)
pub type CharacterStates = BTreeMap<String, serde_json::Value>;

/// One game-state change, applied identically by every client.
///
/// Events are immutable once enqueued. The payload is self-contained:
/// applying it needs nothing beyond the presentation sinks it targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Narrative text revealed at reading pace
    Story {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },

    /// Echo of what a player did (no reveal delay)
    PlayerAction { text: String, label: String },

    /// Dice overlay with the authoritative face values
    DiceRoll(DiceRollConfig),

    /// Replaces the whole character mapping
    CharacterStateUpdate { characters: CharacterStates },

    LocationStateUpdate { location_state: serde_json::Value },

    /// New location state together with its static data
    ChangeLocation {
        location_state: serde_json::Value,
        location_data: serde_json::Value,
    },

    ChangeTurn {
        new_player: String,
        turn_points_remaining: u32,
    },

    TurnPointsUpdate { turn_points_remaining: u32 },
}

/// Dice roll payload. `target_values` are authoritative; every client
/// derives the total from them locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DiceRollConfig {
    pub target_values: Vec<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl DiceRollConfig {
    pub fn new(target_values: Vec<u8>) -> Self {
        Self {
            target_values,
            before_text: None,
            after_text: None,
            images: Vec::new(),
        }
    }

    pub fn with_texts(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.before_text = Some(before.into());
        self.after_text = Some(after.into());
        self
    }

    /// Sum of all dice faces
    pub fn total(&self) -> u32 {
        self.target_values.iter().map(|v| u32::from(*v)).sum()
    }
}

/// Local projection an event writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkTarget {
    Story,
    Characters,
    Location,
    Turn,
    Dice,
}

impl GameEvent {
    pub fn story(text: impl Into<String>) -> Self {
        GameEvent::Story {
            text: text.into(),
            label: None,
        }
    }

    pub fn dice_roll(target_values: Vec<u8>) -> Self {
        GameEvent::DiceRoll(DiceRollConfig::new(target_values))
    }

    /// Stable name of the variant (matches the serialized tag)
    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::Story { .. } => "story",
            GameEvent::PlayerAction { .. } => "player_action",
            GameEvent::DiceRoll(_) => "dice_roll",
            GameEvent::CharacterStateUpdate { .. } => "character_state_update",
            GameEvent::LocationStateUpdate { .. } => "location_state_update",
            GameEvent::ChangeLocation { .. } => "change_location",
            GameEvent::ChangeTurn { .. } => "change_turn",
            GameEvent::TurnPointsUpdate { .. } => "turn_points_update",
        }
    }

    /// Fixed pacing policy. Pure state replacements apply instantly.
    pub fn display_duration(&self) -> Duration {
        match self {
            GameEvent::Story { .. } => STORY_DISPLAY,
            GameEvent::DiceRoll(_) => DICE_ROLL_DISPLAY,
            _ => Duration::ZERO,
        }
    }

    /// Sinks that must be ready before this event can be applied
    pub fn targets(&self) -> &'static [SinkTarget] {
        match self {
            GameEvent::Story { .. } | GameEvent::PlayerAction { .. } => &[SinkTarget::Story],
            GameEvent::DiceRoll(_) => &[SinkTarget::Dice, SinkTarget::Story],
            GameEvent::CharacterStateUpdate { .. } => &[SinkTarget::Characters],
            GameEvent::LocationStateUpdate { .. } | GameEvent::ChangeLocation { .. } => {
                &[SinkTarget::Location]
            }
            GameEvent::ChangeTurn { .. } | GameEvent::TurnPointsUpdate { .. } => &[SinkTarget::Turn],
        }
    }
}
