use crate::domain::CallMode;
use crate::infrastructure::error::Result;
use serde_json::Value;
use taleforge_core::PeerId;

/// Notifications delivered by a transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    PeerConnected(PeerId),

    PeerDisconnected(PeerId),

    /// This peer came back after a disconnect; local state should be re-read
    Reconnected,

    /// A shared key changed. `None` means the key was cleared.
    StateChanged { key: String, value: Option<Value> },

    /// Fire-and-forget call addressed to this peer
    CallReceived {
        from: PeerId,
        channel: String,
        payload: Value,
    },
}

/// Replication layer as seen by a session.
///
/// Two primitives: a per-key last-writer-wins store with change
/// notifications (at-least-once, possibly stale or duplicated), and a
/// fire-and-forget call reaching only peers connected at call time.
pub trait Transport {
    fn local_peer_id(&self) -> PeerId;

    /// Connected peers including this one, in ascending id order
    fn connected_peers(&self) -> Vec<PeerId>;

    fn get_state(&self, key: &str) -> Option<Value>;

    /// Keys currently set under `prefix`
    fn state_keys(&self, prefix: &str) -> Vec<String>;

    /// Write or clear (`None`) a shared key
    fn set_state(&mut self, key: &str, value: Option<Value>) -> Result<()>;

    fn call(&mut self, channel: &str, payload: Value, mode: CallMode) -> Result<()>;

    fn poll_events(&mut self) -> Vec<TransportEvent>;
}
