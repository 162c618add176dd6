use crate::domain::{CharacterStates, DiceRollConfig, SinkTarget};
use instant::Duration;
use serde::Serialize;

/// Presentation layer consumed by the event processor.
///
/// The processor only calls these; how anything is rendered is up to the
/// implementor. Calls are fire-and-forget.
pub trait PresentationSink {
    /// Whether a projection can accept writes yet (e.g. location data provider mounted)
    fn is_ready(&self, target: SinkTarget) -> bool {
        let _ = target;
        true
    }

    fn append_story_text(&mut self, text: &str, label: Option<&str>);

    fn set_character_state(&mut self, characters: &CharacterStates);

    fn set_location_state(&mut self, state: &serde_json::Value);

    fn set_location_data(&mut self, data: &serde_json::Value);

    fn set_turn_state(&mut self, current_player: &str, points_remaining: u32);

    fn set_turn_points(&mut self, points_remaining: u32);

    fn show_dice_roll(&mut self, roll: &DiceRollConfig);

    fn hide_dice_roll(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryLine {
    pub text: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnState {
    pub current_player: String,
    pub turn_points_remaining: u32,
    /// Local countdown, reset on every turn change
    pub time_remaining: Duration,
}

/// Dice overlay while it is visible
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiceRollView {
    pub values: Vec<u8>,
    pub total: u32,
    pub images: Vec<String>,
}

/// In-memory projection of everything the processor writes.
///
/// Used headless by the CLI and as the reference sink in tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameView {
    story: Vec<StoryLine>,
    characters: CharacterStates,
    location_state: Option<serde_json::Value>,
    location_data: Option<serde_json::Value>,
    turn: Option<TurnState>,
    dice: Option<DiceRollView>,
    last_roll_total: Option<u32>,
    turn_time_limit: Duration,
    #[serde(skip)]
    location_ready: bool,
}

impl GameView {
    pub fn new(turn_time_limit: Duration) -> Self {
        Self {
            story: Vec::new(),
            characters: CharacterStates::new(),
            location_state: None,
            location_data: None,
            turn: None,
            dice: None,
            last_roll_total: None,
            turn_time_limit,
            location_ready: true,
        }
    }

    /// View whose location provider is not mounted yet
    pub fn with_location_pending(mut self) -> Self {
        self.location_ready = false;
        self
    }

    pub fn mark_location_ready(&mut self) {
        self.location_ready = true;
    }

    /// Count down the local turn timer
    pub fn tick(&mut self, elapsed: Duration) {
        if let Some(turn) = self.turn.as_mut() {
            turn.time_remaining = turn.time_remaining.saturating_sub(elapsed);
        }
    }

    pub fn story(&self) -> &[StoryLine] {
        &self.story
    }

    pub fn story_texts(&self) -> Vec<&str> {
        self.story.iter().map(|line| line.text.as_str()).collect()
    }

    pub fn characters(&self) -> &CharacterStates {
        &self.characters
    }

    pub fn location_state(&self) -> Option<&serde_json::Value> {
        self.location_state.as_ref()
    }

    pub fn location_data(&self) -> Option<&serde_json::Value> {
        self.location_data.as_ref()
    }

    pub fn turn(&self) -> Option<&TurnState> {
        self.turn.as_ref()
    }

    pub fn dice(&self) -> Option<&DiceRollView> {
        self.dice.as_ref()
    }

    /// Total of the most recent roll, kept after the overlay hides
    pub fn last_roll_total(&self) -> Option<u32> {
        self.last_roll_total
    }

    pub fn turn_time_limit(&self) -> Duration {
        self.turn_time_limit
    }
}

impl Default for GameView {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl PresentationSink for GameView {
    fn is_ready(&self, target: SinkTarget) -> bool {
        match target {
            SinkTarget::Location => self.location_ready,
            _ => true,
        }
    }

    fn append_story_text(&mut self, text: &str, label: Option<&str>) {
        self.story.push(StoryLine {
            text: text.to_string(),
            label: label.map(str::to_string),
        });
    }

    fn set_character_state(&mut self, characters: &CharacterStates) {
        self.characters = characters.clone();
    }

    fn set_location_state(&mut self, state: &serde_json::Value) {
        self.location_state = Some(state.clone());
    }

    fn set_location_data(&mut self, data: &serde_json::Value) {
        self.location_data = Some(data.clone());
    }

    fn set_turn_state(&mut self, current_player: &str, points_remaining: u32) {
        self.turn = Some(TurnState {
            current_player: current_player.to_string(),
            turn_points_remaining: points_remaining,
            time_remaining: self.turn_time_limit,
        });
    }

    fn set_turn_points(&mut self, points_remaining: u32) {
        match self.turn.as_mut() {
            Some(turn) => turn.turn_points_remaining = points_remaining,
            None => tracing::debug!("Turn points update before any turn change, ignoring"),
        }
    }

    fn show_dice_roll(&mut self, roll: &DiceRollConfig) {
        let total = roll.total();
        self.dice = Some(DiceRollView {
            values: roll.target_values.clone(),
            total,
            images: roll.images.clone(),
        });
        self.last_roll_total = Some(total);
    }

    fn hide_dice_roll(&mut self) {
        self.dice = None;
    }
}
