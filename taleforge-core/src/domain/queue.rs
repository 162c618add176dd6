use crate::domain::{EventEnvelope, GameEvent, PeerId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ops::RangeInclusive;

/// Shared, host-popped queue of pending game events.
///
/// The whole value is replicated to every peer. Only the host mutates it:
/// batches are appended at the back with fresh sequence numbers and consumed
/// events are popped from the front, never out of order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventQueue {
    /// Pending events (head at front)
    entries: VecDeque<EventEnvelope>,

    /// Next sequence number to assign
    next_sequence: u64,

    /// Lease epoch of the host that published this value
    host_epoch: u64,

    /// Bumped on every mutation
    revision: u64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum QueueError {
    #[error("Cannot enqueue an empty batch")]
    EmptyBatch,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_sequence: 1, // 0 is reserved for "unassigned"
            host_epoch: 0,
            revision: 0,
        }
    }

    /// Append a batch as one unit, assigning consecutive sequence numbers.
    /// Returns the assigned range.
    pub fn append_batch(
        &mut self,
        actor: Option<PeerId>,
        events: Vec<GameEvent>,
    ) -> Result<RangeInclusive<u64>, QueueError> {
        if events.is_empty() {
            return Err(QueueError::EmptyBatch);
        }

        let first = self.next_sequence;
        for event in events {
            self.entries
                .push_back(EventEnvelope::new(self.next_sequence, actor, event));
            self.next_sequence += 1;
        }
        self.revision += 1;

        Ok(first..=self.next_sequence - 1)
    }

    /// First unconsumed event
    pub fn peek_head(&self) -> Option<&EventEnvelope> {
        self.entries.front()
    }

    /// Remove the head (host only)
    pub fn pop_head(&mut self) -> Option<EventEnvelope> {
        let popped = self.entries.pop_front();
        if popped.is_some() {
            self.revision += 1;
        }
        popped
    }

    /// Pop every leading entry with a sequence at or below `sequence`
    pub fn pop_through(&mut self, sequence: u64) -> usize {
        let mut popped = 0;
        while self
            .entries
            .front()
            .is_some_and(|head| head.sequence <= sequence)
        {
            self.entries.pop_front();
            popped += 1;
        }
        if popped > 0 {
            self.revision += 1;
        }
        popped
    }

    pub fn entries(&self) -> impl Iterator<Item = &EventEnvelope> {
        self.entries.iter()
    }

    pub fn get(&self, sequence: u64) -> Option<&EventEnvelope> {
        self.entries.iter().find(|e| e.sequence == sequence)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Highest sequence ever assigned (0 if none)
    pub fn last_sequence(&self) -> u64 {
        self.next_sequence - 1
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn host_epoch(&self) -> u64 {
        self.host_epoch
    }

    /// Record the publishing host's lease epoch
    pub fn stamp_epoch(&mut self, epoch: u64) {
        if epoch != self.host_epoch {
            self.host_epoch = epoch;
            self.revision += 1;
        }
    }

    /// Re-insert entries of an older snapshot that this one no longer holds,
    /// keeping those `keep` accepts. Returns how many were carried over.
    ///
    /// A reader that skipped intermediate snapshots would otherwise never
    /// see events the host popped in between.
    pub fn carry_over<F>(&mut self, older: &EventQueue, keep: F) -> usize
    where
        F: Fn(&EventEnvelope) -> bool,
    {
        let head = self
            .entries
            .front()
            .map(|e| e.sequence)
            .unwrap_or(self.next_sequence);

        let missed: Vec<EventEnvelope> = older
            .entries
            .iter()
            .filter(|e| e.sequence < head && keep(e))
            .cloned()
            .collect();

        for envelope in missed.iter().rev() {
            self.entries.push_front(envelope.clone());
        }
        missed.len()
    }

    /// Whether this snapshot is newer than `other` (later host, then later revision)
    pub fn supersedes(&self, other: &EventQueue) -> bool {
        (self.host_epoch, self.revision) > (other.host_epoch, other.revision)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
