use crate::domain::Fingerprint;
use std::collections::HashSet;

/// Per-client record of events already applied.
///
/// Membership only grows within a session. It is never persisted: after a
/// reload the ledger starts empty and every event still present in the
/// shared queue is applied again.
#[derive(Debug, Clone, Default)]
pub struct DedupLedger {
    applied: HashSet<Fingerprint>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_applied(&self, fingerprint: &Fingerprint) -> bool {
        self.applied.contains(fingerprint)
    }

    /// Returns false if the fingerprint was already present
    pub fn mark_applied(&mut self, fingerprint: Fingerprint) -> bool {
        self.applied.insert(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}
