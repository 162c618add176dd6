use std::time::Duration;
use taleforge_core::FingerprintStrategy;

/// Configuration for a game session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Scheduler tick in milliseconds
    pub poll_interval_ms: u64,

    /// Turn timer reset value on every turn change
    pub turn_time_limit: Duration,

    /// How applied events are recognized on replay
    pub fingerprint_strategy: FingerprintStrategy,

    /// Lifetime of user-facing notifications
    pub notification_ttl: Duration,

    /// How long the lease holder may be absent before another peer claims it
    pub host_grace_period: Duration,

    /// Upper bound on processor transitions per tick
    pub max_steps_per_poll: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            turn_time_limit: Duration::from_secs(60),
            fingerprint_strategy: FingerprintStrategy::Sequence,
            notification_ttl: Duration::from_secs(8),
            host_grace_period: Duration::from_secs(30),
            max_steps_per_poll: 64,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_turn_time_limit(mut self, limit: Duration) -> Self {
        self.turn_time_limit = limit;
        self
    }

    pub fn with_fingerprint_strategy(mut self, strategy: FingerprintStrategy) -> Self {
        self.fingerprint_strategy = strategy;
        self
    }

    pub fn with_notification_ttl(mut self, ttl: Duration) -> Self {
        self.notification_ttl = ttl;
        self
    }

    pub fn with_host_grace_period(mut self, grace: Duration) -> Self {
        self.host_grace_period = grace;
        self
    }

    pub fn with_max_steps_per_poll(mut self, steps: usize) -> Self {
        self.max_steps_per_poll = steps.max(1);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.turn_time_limit, Duration::from_secs(60));
        assert_eq!(config.fingerprint_strategy, FingerprintStrategy::Sequence);
        assert_eq!(config.notification_ttl, Duration::from_secs(8));
    }

    #[test]
    fn test_builders() {
        let config = SessionConfig::new()
            .with_poll_interval(16)
            .with_fingerprint_strategy(FingerprintStrategy::Content)
            .with_max_steps_per_poll(0);

        assert_eq!(config.poll_interval_ms, 16);
        assert_eq!(config.fingerprint_strategy, FingerprintStrategy::Content);
        assert_eq!(config.max_steps_per_poll, 1);
    }
}
