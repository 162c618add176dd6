use instant::{Duration, Instant};

/// Presence of the lease holder as seen by one peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolderStatus {
    /// Holder is in the connected set
    Present,
    /// Holder vanished, but within the grace period
    Missing { since: Instant },
    /// Grace period expired; the lease may be claimed
    Expired,
}

/// Grace-period tracker for the host lease holder
#[derive(Debug, Clone)]
pub struct HostWatch {
    grace_period: Duration,
    missing_since: Option<Instant>,
}

impl HostWatch {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            grace_period,
            missing_since: None,
        }
    }

    pub fn observe(&mut self, holder_present: bool, now: Instant) -> HolderStatus {
        if holder_present {
            self.missing_since = None;
            return HolderStatus::Present;
        }

        let since = *self.missing_since.get_or_insert(now);
        if now.duration_since(since) >= self.grace_period {
            HolderStatus::Expired
        } else {
            HolderStatus::Missing { since }
        }
    }

    pub fn reset(&mut self) {
        self.missing_since = None;
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }
}
