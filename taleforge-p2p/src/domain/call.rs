use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend batch teed to the host for sequencing
pub const ENQUEUE_CHANNEL: &str = "enqueue";

/// Direct story append, outside the durable queue
pub const STORY_CHANNEL: &str = "story";

/// Player chat lines
pub const CHAT_CHANNEL: &str = "chat";

/// Recipients of a fire-and-forget call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallMode {
    /// Every connected peer, sender included
    All,
    /// Current host only
    Host,
    /// Everyone except the sender
    Others,
}

impl fmt::Display for CallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallMode::All => write!(f, "all"),
            CallMode::Host => write!(f, "host"),
            CallMode::Others => write!(f, "others"),
        }
    }
}

/// Payload of the story channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryAppend {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Payload of the chat channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    pub author: String,
    pub text: String,
}
