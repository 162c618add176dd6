use serde::{Deserialize, Serialize};
use taleforge_core::PeerId;

/// Host status modeled as a lease.
///
/// The holder is the only peer that pops the shared queue and tallies
/// votes. Each hand-off bumps `epoch`; the new holder resumes popping after
/// `confirmed_sequence`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostLease {
    pub holder: PeerId,
    pub epoch: u64,
    /// Highest sequence the previous holder confirmed as consumed
    pub confirmed_sequence: u64,
}

impl HostLease {
    pub fn initial(holder: PeerId) -> Self {
        Self {
            holder,
            epoch: 1,
            confirmed_sequence: 0,
        }
    }

    /// Lease for the next holder
    pub fn hand_off(&self, to: PeerId, confirmed_sequence: u64) -> Self {
        Self {
            holder: to,
            epoch: self.epoch + 1,
            confirmed_sequence: confirmed_sequence.max(self.confirmed_sequence),
        }
    }

    pub fn supersedes(&self, other: &HostLease) -> bool {
        self.epoch > other.epoch
    }

    pub fn is_held_by(&self, peer: PeerId) -> bool {
        self.holder == peer
    }
}
