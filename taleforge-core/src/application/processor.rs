use crate::application::PresentationSink;
use crate::domain::{
    DedupLedger, EventEnvelope, EventQueue, Fingerprint, FingerprintStrategy, GameEvent,
    SinkTarget,
};
use instant::Instant;

/// Event currently being displayed
#[derive(Debug, Clone, PartialEq)]
pub struct InFlight {
    pub envelope: EventEnvelope,
    pub fingerprint: Fingerprint,
    pub until: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessorState {
    Idle,
    Applying(InFlight),
}

/// Result of one processor tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorStep {
    /// Nothing left to apply
    Idle,

    /// Side effects written, display wait started
    Started { sequence: u64 },

    /// An event is in flight and its wait has not elapsed
    Waiting { sequence: u64 },

    /// Event fully applied and recorded. `pop` is set on the host.
    Applied { sequence: u64, pop: bool },

    /// Host found an already-applied event at the head; it should be popped
    Skipped { sequence: u64 },

    /// Target sink not ready; the same event is retried next tick
    Deferred { sequence: u64, target: SinkTarget },
}

/// Single-consumer state machine draining the shared queue into local sinks.
///
/// At most one event is in flight at a time. Events are always taken in
/// queue order, so sinks observe them in sequence order.
pub struct EventProcessor<S: PresentationSink> {
    sink: S,
    ledger: DedupLedger,
    strategy: FingerprintStrategy,
    state: ProcessorState,
    is_host: bool,
}

impl<S: PresentationSink> EventProcessor<S> {
    pub fn new(sink: S, strategy: FingerprintStrategy) -> Self {
        Self {
            sink,
            ledger: DedupLedger::new(),
            strategy,
            state: ProcessorState::Idle,
            is_host: false,
        }
    }

    /// Host processors report consumed heads for popping
    pub fn set_host(&mut self, is_host: bool) {
        self.is_host = is_host;
    }

    pub fn is_host(&self) -> bool {
        self.is_host
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ProcessorState::Idle)
    }

    pub fn state(&self) -> &ProcessorState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub fn strategy(&self) -> FingerprintStrategy {
        self.strategy
    }

    /// Whether every event currently in `queue` has been applied here
    pub fn is_caught_up(&self, queue: &EventQueue) -> bool {
        self.is_idle()
            && queue
                .entries()
                .all(|e| self.ledger.has_applied(&self.strategy.fingerprint(e)))
    }

    pub fn poll(&mut self, queue: &EventQueue) -> ProcessorStep {
        self.poll_at(queue, Instant::now())
    }

    /// Advance by at most one transition
    pub fn poll_at(&mut self, queue: &EventQueue, now: Instant) -> ProcessorStep {
        if let ProcessorState::Applying(in_flight) = &self.state {
            if now < in_flight.until {
                return ProcessorStep::Waiting {
                    sequence: in_flight.envelope.sequence,
                };
            }
            return self.finish();
        }

        for envelope in queue.entries() {
            let fingerprint = self.strategy.fingerprint(envelope);

            if !self.ledger.has_applied(&fingerprint) {
                let envelope = envelope.clone();
                return self.begin(envelope, fingerprint, now);
            }

            // Only the host acts on a stale head; guests read past it
            if self.is_host {
                tracing::debug!(
                    "Head {} already applied, skipping ({})",
                    envelope.sequence,
                    envelope.event.kind()
                );
                return ProcessorStep::Skipped {
                    sequence: envelope.sequence,
                };
            }
        }

        ProcessorStep::Idle
    }

    /// Drop the in-flight event without touching any sink.
    /// It is not recorded, so it is applied again on the next run.
    pub fn abandon(&mut self) -> Option<u64> {
        match std::mem::replace(&mut self.state, ProcessorState::Idle) {
            ProcessorState::Applying(in_flight) => {
                tracing::debug!("Abandoned in-flight event {}", in_flight.envelope.sequence);
                Some(in_flight.envelope.sequence)
            }
            ProcessorState::Idle => None,
        }
    }

    fn begin(
        &mut self,
        envelope: EventEnvelope,
        fingerprint: Fingerprint,
        now: Instant,
    ) -> ProcessorStep {
        let sequence = envelope.sequence;

        if let Some(target) = envelope
            .event
            .targets()
            .iter()
            .find(|target| !self.sink.is_ready(**target))
        {
            tracing::debug!(
                "Sink {:?} not ready for event {}, retrying next tick",
                target,
                sequence
            );
            return ProcessorStep::Deferred {
                sequence,
                target: *target,
            };
        }

        tracing::debug!("Applying event {} ({})", sequence, envelope.event.kind());
        self.apply_effects(&envelope.event);

        let wait = envelope.event.display_duration();
        if wait.is_zero() {
            self.ledger.mark_applied(fingerprint);
            return ProcessorStep::Applied {
                sequence,
                pop: self.is_host,
            };
        }

        self.state = ProcessorState::Applying(InFlight {
            envelope,
            fingerprint,
            until: now + wait,
        });
        ProcessorStep::Started { sequence }
    }

    fn finish(&mut self) -> ProcessorStep {
        let in_flight = match std::mem::replace(&mut self.state, ProcessorState::Idle) {
            ProcessorState::Applying(in_flight) => in_flight,
            ProcessorState::Idle => return ProcessorStep::Idle,
        };

        if let GameEvent::DiceRoll(roll) = &in_flight.envelope.event {
            self.sink.hide_dice_roll();
            if let Some(after) = &roll.after_text {
                self.sink.append_story_text(after, None);
            }
        }

        let sequence = in_flight.envelope.sequence;
        self.ledger.mark_applied(in_flight.fingerprint);
        tracing::debug!("Event {} complete", sequence);

        ProcessorStep::Applied {
            sequence,
            pop: self.is_host,
        }
    }

    fn apply_effects(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Story { text, label } => {
                self.sink.append_story_text(text, label.as_deref());
            }
            GameEvent::PlayerAction { text, label } => {
                self.sink.append_story_text(text, Some(label));
            }
            GameEvent::DiceRoll(roll) => {
                if let Some(before) = &roll.before_text {
                    self.sink.append_story_text(before, None);
                }
                self.sink.show_dice_roll(roll);
            }
            GameEvent::CharacterStateUpdate { characters } => {
                self.sink.set_character_state(characters);
            }
            GameEvent::LocationStateUpdate { location_state } => {
                self.sink.set_location_state(location_state);
            }
            GameEvent::ChangeLocation {
                location_state,
                location_data,
            } => {
                self.sink.set_location_state(location_state);
                self.sink.set_location_data(location_data);
            }
            GameEvent::ChangeTurn {
                new_player,
                turn_points_remaining,
            } => {
                self.sink.set_turn_state(new_player, *turn_points_remaining);
            }
            GameEvent::TurnPointsUpdate {
                turn_points_remaining,
            } => {
                self.sink.set_turn_points(*turn_points_remaining);
            }
        }
    }
}
