use crate::domain::{keys, CallMode, HostLease};
use crate::infrastructure::error::{P2PError, Result};
use crate::infrastructure::transport::{Transport, TransportEvent};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use taleforge_core::PeerId;

/// Delivery faults injected by the in-memory network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Every state change is delivered twice
    pub duplicate_state_changes: bool,

    /// After each state change, the previous value of the key is delivered again
    pub replay_stale_state: bool,
}

struct PeerSlot {
    connected: bool,
    inbox: VecDeque<TransportEvent>,
}

#[derive(Default)]
struct NetworkState {
    store: BTreeMap<String, Value>,
    peers: BTreeMap<PeerId, PeerSlot>,
    faults: FaultPlan,
}

impl NetworkState {
    fn connected(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.peers
            .iter()
            .filter(|(_, slot)| slot.connected)
            .map(|(id, _)| *id)
    }

    fn deliver(&mut self, to: PeerId, event: TransportEvent) {
        if let Some(slot) = self.peers.get_mut(&to) {
            if slot.connected {
                slot.inbox.push_back(event);
            }
        }
    }

    fn deliver_to_connected(&mut self, event: TransportEvent, except: Option<PeerId>) {
        let targets: Vec<PeerId> = self.connected().filter(|id| Some(*id) != except).collect();
        for peer in targets {
            self.deliver(peer, event.clone());
        }
    }

    fn host(&self) -> Option<PeerId> {
        let lease: HostLease =
            serde_json::from_value(self.store.get(keys::HOST_LEASE)?.clone()).ok()?;
        Some(lease.holder)
    }
}

/// Shared in-process replication bus. Cloning yields another handle to the
/// same network.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    inner: Arc<Mutex<NetworkState>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: FaultPlan) -> Self {
        let network = Self::new();
        network.set_faults(faults);
        network
    }

    pub fn set_faults(&self, faults: FaultPlan) {
        self.lock().faults = faults;
    }

    /// A panic while holding the lock leaves the bus usable
    fn lock(&self) -> MutexGuard<'_, NetworkState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a new peer and announce it to everyone connected
    pub fn join(&self) -> MemoryTransport {
        let id = PeerId::random();
        let mut state = self.lock();

        let existing: Vec<PeerId> = state.connected().collect();
        state.peers.insert(
            id,
            PeerSlot {
                connected: true,
                inbox: existing
                    .iter()
                    .map(|peer| TransportEvent::PeerConnected(*peer))
                    .collect(),
            },
        );
        for peer in existing {
            state.deliver(peer, TransportEvent::PeerConnected(id));
        }

        tracing::debug!("Peer {} joined the memory network", id.short());

        MemoryTransport {
            local_id: id,
            network: self.clone(),
        }
    }

    /// Drop a peer off the network. Its pending inbox is discarded.
    pub fn disconnect(&self, peer: PeerId) {
        let mut state = self.lock();
        match state.peers.get_mut(&peer) {
            Some(slot) if slot.connected => {
                slot.connected = false;
                slot.inbox.clear();
            }
            _ => return,
        }
        state.deliver_to_connected(TransportEvent::PeerDisconnected(peer), None);
        tracing::debug!("Peer {} disconnected", peer.short());
    }

    pub fn reconnect(&self, peer: PeerId) {
        let mut state = self.lock();
        match state.peers.get_mut(&peer) {
            Some(slot) if !slot.connected => slot.connected = true,
            _ => return,
        }
        state.deliver(peer, TransportEvent::Reconnected);
        state.deliver_to_connected(TransportEvent::PeerConnected(peer), Some(peer));
        tracing::debug!("Peer {} reconnected", peer.short());
    }

    pub fn connected_peers(&self) -> Vec<PeerId> {
        self.lock().connected().collect()
    }

    /// Current value of a shared key
    pub fn state(&self, key: &str) -> Option<Value> {
        self.lock().store.get(key).cloned()
    }

    /// Undelivered events queued for `peer`
    pub fn pending_for(&self, peer: PeerId) -> usize {
        self.lock()
            .peers
            .get(&peer)
            .map(|slot| slot.inbox.len())
            .unwrap_or(0)
    }
}

/// One peer's handle on a [`MemoryNetwork`]
#[derive(Clone)]
pub struct MemoryTransport {
    local_id: PeerId,
    network: MemoryNetwork,
}

impl MemoryTransport {
    pub fn network(&self) -> &MemoryNetwork {
        &self.network
    }

    fn ensure_connected(&self, state: &NetworkState) -> Result<()> {
        match state.peers.get(&self.local_id) {
            Some(slot) if slot.connected => Ok(()),
            _ => Err(P2PError::Disconnected(self.local_id)),
        }
    }
}

impl Transport for MemoryTransport {
    fn local_peer_id(&self) -> PeerId {
        self.local_id
    }

    fn connected_peers(&self) -> Vec<PeerId> {
        self.network.connected_peers()
    }

    fn get_state(&self, key: &str) -> Option<Value> {
        self.network.state(key)
    }

    fn state_keys(&self, prefix: &str) -> Vec<String> {
        self.network
            .lock()
            .store
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn set_state(&mut self, key: &str, value: Option<Value>) -> Result<()> {
        let mut state = self.network.lock();
        self.ensure_connected(&state)?;

        let previous = match &value {
            Some(v) => state.store.insert(key.to_string(), v.clone()),
            None => state.store.remove(key),
        };

        let change = TransportEvent::StateChanged {
            key: key.to_string(),
            value,
        };
        state.deliver_to_connected(change.clone(), None);

        let faults = state.faults;
        if faults.duplicate_state_changes {
            state.deliver_to_connected(change, None);
        }
        if faults.replay_stale_state {
            let stale = TransportEvent::StateChanged {
                key: key.to_string(),
                value: previous,
            };
            state.deliver_to_connected(stale, None);
        }

        Ok(())
    }

    fn call(&mut self, channel: &str, payload: Value, mode: CallMode) -> Result<()> {
        let mut state = self.network.lock();
        self.ensure_connected(&state)?;

        let event = TransportEvent::CallReceived {
            from: self.local_id,
            channel: channel.to_string(),
            payload,
        };

        match mode {
            CallMode::All => state.deliver_to_connected(event, None),
            CallMode::Others => state.deliver_to_connected(event, Some(self.local_id)),
            CallMode::Host => {
                let host = state
                    .host()
                    .ok_or_else(|| P2PError::PeerNotFound("no host lease".to_string()))?;
                if !state.connected().any(|peer| peer == host) {
                    return Err(P2PError::PeerNotFound(host.to_string()));
                }
                state.deliver(host, event);
            }
        }

        tracing::trace!("Call on '{}' ({}) from {}", channel, mode, self.local_id.short());
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        let mut state = self.network.lock();
        match state.peers.get_mut(&self.local_id) {
            Some(slot) => slot.inbox.drain(..).collect(),
            None => Vec::new(),
        }
    }
}
