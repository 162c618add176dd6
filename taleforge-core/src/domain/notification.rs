use instant::{Duration, Instant};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationLevel::Info => write!(f, "info"),
            NotificationLevel::Warning => write!(f, "warning"),
            NotificationLevel::Error => write!(f, "error"),
        }
    }
}

/// A user-visible message that expires on its own
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    pub expires_at: Instant,
}

/// Top-level notification surface. Errors land here instead of ending the session.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    ttl: Duration,
    next_id: u64,
    active: Vec<Notification>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            next_id: 1,
            active: Vec::new(),
        }
    }

    pub fn push(
        &mut self,
        level: NotificationLevel,
        message: impl Into<String>,
        now: Instant,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.active.push(Notification {
            id,
            level,
            message: message.into(),
            expires_at: now + self.ttl,
        });
        id
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) -> u64 {
        self.push(NotificationLevel::Error, message, now)
    }

    /// User dismissed a message
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.active.len();
        self.active.retain(|n| n.id != id);
        self.active.len() != before
    }

    /// Drop expired messages; returns how many were removed
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.active.len();
        self.active.retain(|n| n.expires_at > now);
        before - self.active.len()
    }

    pub fn active(&self) -> &[Notification] {
        &self.active
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(Duration::from_secs(8))
    }
}
