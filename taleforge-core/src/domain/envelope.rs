use crate::domain::{GameEvent, PeerId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Wire representation of one queued game event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventEnvelope {
    /// Monotonically increasing sequence number (assigned by host, 0 = unassigned)
    pub sequence: u64,

    /// Peer whose action produced this event (None for host-originated events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<PeerId>,

    /// The event payload
    pub event: GameEvent,
}

impl EventEnvelope {
    pub fn new(sequence: u64, actor: Option<PeerId>, event: GameEvent) -> Self {
        Self {
            sequence,
            actor,
            event,
        }
    }

    /// Envelope that has not been sequenced by the host yet
    pub fn unsequenced(actor: Option<PeerId>, event: GameEvent) -> Self {
        Self::new(0, actor, event)
    }
}

/// Identity used by the dedup ledger
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    Sequence(u64),
    Content(String),
}

/// How an envelope is reduced to a [`Fingerprint`].
///
/// `Content` compares the serialized payload, so two distinct events with
/// byte-identical payloads collide and the second one is treated as a
/// duplicate. `Sequence` keys on the host-assigned sequence number instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintStrategy {
    #[default]
    Sequence,
    Content,
}

impl FingerprintStrategy {
    pub fn fingerprint(&self, envelope: &EventEnvelope) -> Fingerprint {
        match self {
            FingerprintStrategy::Sequence => Fingerprint::Sequence(envelope.sequence),
            FingerprintStrategy::Content => Fingerprint::Content(
                // Map keys are ordered, so equal payloads serialize identically
                serde_json::to_string(&envelope.event)
                    .unwrap_or_else(|_| format!("{:?}", envelope.event)),
            ),
        }
    }
}
