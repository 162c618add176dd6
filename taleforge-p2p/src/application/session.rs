use crate::application::config::SessionConfig;
use crate::application::registry::{CallContext, HandlerId, HandlerRegistry};
use crate::application::vote::VoteCoordinator;
use crate::domain::{
    keys, CallMode, ChatLine, HolderStatus, HostLease, HostWatch, StoryAppend, CHAT_CHANNEL,
    ENQUEUE_CHANNEL, STORY_CHANNEL,
};
use crate::infrastructure::error::{P2PError, Result};
use crate::infrastructure::transport::{Transport, TransportEvent};
use instant::Instant;
use serde_json::Value;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use taleforge_core::application::{authorize_enqueue, validate_batch};
use taleforge_core::domain::CastOutcome;
use taleforge_core::{
    parse_action_response, ActionBackend, ActionRequest, EnqueueRequest, EventProcessor,
    EventQueue, GameEvent, NotificationCenter, PeerId, PresentationSink, ProcessorStep,
    QueueError, VoteError, VoteOptions, VoteOutcome, VoteState,
};

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub transport_events: usize,
    pub applied: usize,
    pub skipped: usize,
    pub popped: usize,
    /// The head waits for a sink that is not ready yet
    pub deferred: bool,
}

type VoteCallback = Box<dyn FnMut(&VoteOutcome)>;

/// One client of a multiplayer game.
///
/// Owns the local processor and its sinks, mirrors the replicated event
/// queue, and takes on the host duties (sequencing, popping, tallying)
/// while it holds the host lease. Driven by explicit [`poll_at`] ticks.
///
/// [`poll_at`]: GameSession::poll_at
pub struct GameSession<T: Transport, S: PresentationSink> {
    transport: T,
    config: SessionConfig,
    processor: EventProcessor<S>,

    /// Last accepted snapshot (authoritative while hosting)
    queue: EventQueue,
    queue_dirty: bool,

    lease: Option<HostLease>,
    host_watch: HostWatch,

    /// Highest sequence this peer popped as host
    confirmed_sequence: u64,

    /// Peers that held the lease before the current holder
    former_hosts: BTreeSet<PeerId>,

    synced: bool,

    vote: VoteCoordinator,
    vote_dirty: bool,
    on_vote_complete: Option<VoteCallback>,
    last_vote_outcome: Option<VoteOutcome>,

    registry: HandlerRegistry,
    notifications: NotificationCenter,
    chat_log: Vec<ChatLine>,
}

impl<T: Transport, S: PresentationSink> GameSession<T, S> {
    fn new(transport: T, sink: S, config: SessionConfig) -> Self {
        Self {
            processor: EventProcessor::new(sink, config.fingerprint_strategy),
            queue: EventQueue::new(),
            queue_dirty: false,
            lease: None,
            host_watch: HostWatch::new(config.host_grace_period),
            confirmed_sequence: 0,
            former_hosts: BTreeSet::new(),
            synced: false,
            vote: VoteCoordinator::new(),
            vote_dirty: false,
            on_vote_complete: None,
            last_vote_outcome: None,
            registry: HandlerRegistry::new(),
            notifications: NotificationCenter::new(config.notification_ttl),
            chat_log: Vec::new(),
            transport,
            config,
        }
    }

    /// Start hosting. Takes over an existing lease and queue if the
    /// network already has one.
    pub fn host(transport: T, sink: S, config: SessionConfig) -> Result<Self> {
        let mut session = Self::new(transport, sink, config);
        let me = session.local_peer_id();

        let lease = match session.read_lease()? {
            Some(existing) if existing.is_held_by(me) => existing,
            Some(existing) => {
                session.former_hosts.insert(existing.holder);
                existing.hand_off(me, existing.confirmed_sequence)
            }
            None => HostLease::initial(me),
        };

        if let Some(queue) = session.read_queue()? {
            session.replace_queue(queue);
        }
        session.vote.refresh(&session.transport);

        session
            .transport
            .set_state(keys::HOST_LEASE, Some(serde_json::to_value(&lease)?))?;
        session.promote(lease)?;
        session.synced = true;

        tracing::info!("👑 Hosting game session as {}", me);
        Ok(session)
    }

    /// Join as a regular player. Shared state is read on the first poll.
    pub fn guest(transport: T, sink: S, config: SessionConfig) -> Self {
        let session = Self::new(transport, sink, config);
        tracing::info!("Joining game session as {}", session.local_peer_id());
        session
    }

    pub fn local_peer_id(&self) -> PeerId {
        self.transport.local_peer_id()
    }

    pub fn is_host(&self) -> bool {
        let me = self.local_peer_id();
        self.lease.as_ref().is_some_and(|lease| lease.is_held_by(me))
    }

    pub fn lease(&self) -> Option<&HostLease> {
        self.lease.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Local view of the shared queue
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn processor(&self) -> &EventProcessor<S> {
        &self.processor
    }

    pub fn sink(&self) -> &S {
        self.processor.sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.processor.sink_mut()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationCenter {
        &mut self.notifications
    }

    pub fn chat_log(&self) -> &[ChatLine] {
        &self.chat_log
    }

    pub fn vote(&self) -> &VoteCoordinator {
        &self.vote
    }

    pub fn last_vote_outcome(&self) -> Option<&VoteOutcome> {
        self.last_vote_outcome.as_ref()
    }

    /// Whether every queued event has been applied locally
    pub fn is_caught_up(&self) -> bool {
        self.processor.is_caught_up(&self.queue)
    }

    // ===== Event origination =====

    /// Enqueue a batch produced by this peer's own action
    pub fn submit_events(&mut self, events: Vec<GameEvent>) -> Result<()> {
        if events.is_empty() {
            return Err(QueueError::EmptyBatch.into());
        }
        validate_batch(&events)?;

        let request = EnqueueRequest {
            actor: self.local_peer_id(),
            events,
        };

        if self.is_host() {
            self.accept_enqueue(request.actor, request)?;
        } else {
            tracing::debug!("Sending batch of {} events to host", request.events.len());
            self.transport.call(
                ENQUEUE_CHANNEL,
                serde_json::to_value(&request)?,
                CallMode::Host,
            )?;
        }
        Ok(())
    }

    /// Decode a raw backend response and enqueue it. Contract violations
    /// are shown to the user and returned.
    pub fn submit_action_response(&mut self, body: &[u8]) -> Result<()> {
        match parse_action_response(body) {
            Ok(events) => self.submit_events(events),
            Err(err) => {
                self.notifications
                    .error(format!("Backend response rejected: {}", err), Instant::now());
                Err(err.into())
            }
        }
    }

    /// Run one action through the backend and enqueue its batch.
    /// Returns the number of events enqueued.
    pub async fn perform_action<B>(
        &mut self,
        backend: &B,
        character: impl Into<String>,
        action: impl Into<String>,
        parameters: Value,
    ) -> Result<usize>
    where
        B: ActionBackend + ?Sized,
    {
        let request = ActionRequest {
            actor: self.local_peer_id(),
            character: character.into(),
            action: action.into(),
            parameters,
        };

        let response = match backend.perform(request).await {
            Ok(response) => response,
            Err(err) => {
                self.notifications
                    .error(format!("Action failed: {}", err), Instant::now());
                return Err(err.into());
            }
        };

        let count = response.events.len();
        if let Err(err) = self.submit_events(response.events) {
            self.notifications.error(err.to_string(), Instant::now());
            return Err(err);
        }
        Ok(count)
    }

    /// Validate, sequence and publish a batch (host only)
    pub fn accept_enqueue(
        &mut self,
        sender: PeerId,
        request: EnqueueRequest,
    ) -> Result<RangeInclusive<u64>> {
        let host = self.require_host()?;
        if let Err(err) = authorize_enqueue(sender, host, &request) {
            // A former host relays batches that reached it after the hand-off
            if !self.former_hosts.contains(&sender) {
                return Err(err.into());
            }
            tracing::info!(
                "Accepting batch of {} relayed by former host {}",
                request.actor.short(),
                sender.short()
            );
        }
        validate_batch(&request.events)?;

        let actor = request.actor;
        let range = self.queue.append_batch(Some(actor), request.events)?;
        tracing::info!(
            "Enqueued events {}..={} for {}",
            range.start(),
            range.end(),
            actor.short()
        );

        self.publish_queue()?;
        Ok(range)
    }

    /// Write the local queue to the shared store (host only)
    pub fn publish_queue(&mut self) -> Result<()> {
        let epoch = match &self.lease {
            Some(lease) if lease.is_held_by(self.local_peer_id()) => lease.epoch,
            Some(_) => return Err(P2PError::NotHost),
            None => return Err(P2PError::NoHostLease),
        };

        self.queue.stamp_epoch(epoch);
        self.transport
            .set_state(keys::EVENT_QUEUE, Some(serde_json::to_value(&self.queue)?))?;
        self.queue_dirty = false;

        tracing::debug!(
            "Published queue rev {} ({} pending)",
            self.queue.revision(),
            self.queue.len()
        );
        Ok(())
    }

    // ===== Fire-and-forget calls =====

    /// Append text to every connected peer's story feed, outside the queue
    pub fn broadcast_story(&mut self, text: impl Into<String>, label: Option<String>) -> Result<()> {
        let line = StoryAppend {
            text: text.into(),
            label,
        };
        self.transport
            .call(STORY_CHANNEL, serde_json::to_value(&line)?, CallMode::All)
    }

    pub fn send_chat(&mut self, author: impl Into<String>, text: impl Into<String>) -> Result<()> {
        let line = ChatLine {
            author: author.into(),
            text: text.into(),
        };
        self.transport
            .call(CHAT_CHANNEL, serde_json::to_value(&line)?, CallMode::Others)?;
        self.chat_log.push(line);
        Ok(())
    }

    pub fn register_handler<F>(&mut self, channel: impl Into<String>, handler: F) -> HandlerId
    where
        F: FnMut(&CallContext<'_>) + 'static,
    {
        self.registry.register(channel, handler)
    }

    pub fn unregister_handler(&mut self, id: HandlerId) -> bool {
        self.registry.unregister(id)
    }

    // ===== Votes =====

    pub fn propose_vote(
        &mut self,
        title: impl Into<String>,
        options: VoteOptions,
    ) -> Result<VoteState> {
        let state = self.vote.propose(&mut self.transport, title, options)?;
        self.vote_dirty = true;
        Ok(state)
    }

    pub fn cast_vote(&mut self, choice: bool) -> Result<CastOutcome> {
        let outcome = self.vote.cast(&mut self.transport, choice)?;
        self.vote_dirty = true;
        Ok(outcome)
    }

    /// Count ballots now (host only). Also runs on every vote-related change.
    pub fn tally_votes(&mut self) -> Result<Option<VoteOutcome>> {
        if !self.is_host() {
            return Err(VoteError::NotHost.into());
        }

        let outcome = self.vote.tally(&mut self.transport)?;
        if let Some(outcome) = &outcome {
            if let Some(callback) = self.on_vote_complete.as_mut() {
                callback(outcome);
            }
            self.last_vote_outcome = Some(outcome.clone());
        }
        Ok(outcome)
    }

    /// Called on the host whenever a vote concludes
    pub fn on_vote_complete<F>(&mut self, callback: F)
    where
        F: FnMut(&VoteOutcome) + 'static,
    {
        self.on_vote_complete = Some(Box::new(callback));
    }

    // ===== Host lease =====

    /// Pass host duties to another connected peer
    pub fn hand_off_host(&mut self, to: PeerId) -> Result<HostLease> {
        self.require_host()?;
        if !self.transport.connected_peers().contains(&to) {
            return Err(P2PError::PeerNotFound(to.to_string()));
        }

        if self.queue_dirty {
            self.publish_queue()?;
        }

        let current = self.lease.clone().ok_or(P2PError::NoHostLease)?;
        let next = current.hand_off(to, self.confirmed_sequence);
        self.transport
            .set_state(keys::HOST_LEASE, Some(serde_json::to_value(&next)?))?;

        tracing::info!(
            "Handing host lease to {} (epoch {}, confirmed {})",
            to.short(),
            next.epoch,
            next.confirmed_sequence
        );
        self.adopt_lease(next.clone())?;
        Ok(next)
    }

    /// Drop the in-flight event without touching any sink, e.g. when the
    /// presentation layer is torn down. It is applied again later.
    pub fn abandon_in_flight(&mut self) -> Option<u64> {
        self.processor.abandon()
    }

    // ===== Scheduler =====

    pub fn poll(&mut self) -> PollSummary {
        self.poll_at(Instant::now())
    }

    /// One scheduler tick: sync, handle transport events, drain the queue
    /// and run host duties. Errors are reported, never propagated.
    pub fn poll_at(&mut self, now: Instant) -> PollSummary {
        let mut summary = PollSummary::default();

        if !self.synced {
            if let Err(err) = self.sync_from_store() {
                self.report(err, now);
            }
        }

        let events = self.transport.poll_events();
        summary.transport_events = events.len();
        for event in events {
            if let Err(err) = self.handle_event(event) {
                self.report(err, now);
            }
        }

        if let Err(err) = self.check_host_presence(now) {
            self.report(err, now);
        }

        self.drain_queue(now, &mut summary);

        if self.is_host() {
            if self.queue_dirty {
                if let Err(err) = self.publish_queue() {
                    self.report(err, now);
                }
            }
            if self.vote_dirty {
                self.vote_dirty = false;
                if let Err(err) = self.tally_votes() {
                    self.report(err, now);
                }
            }
        } else {
            self.vote_dirty = false;
        }

        self.notifications.prune(now);
        summary
    }

    fn drain_queue(&mut self, now: Instant, summary: &mut PollSummary) {
        for _ in 0..self.config.max_steps_per_poll {
            match self.processor.poll_at(&self.queue, now) {
                ProcessorStep::Idle | ProcessorStep::Waiting { .. } => break,
                ProcessorStep::Deferred { .. } => {
                    summary.deferred = true;
                    break;
                }
                ProcessorStep::Started { .. } => {}
                ProcessorStep::Applied { sequence, pop } => {
                    summary.applied += 1;
                    if pop {
                        summary.popped += self.pop_consumed(sequence);
                    }
                }
                ProcessorStep::Skipped { sequence } => {
                    summary.skipped += 1;
                    summary.popped += self.pop_consumed(sequence);
                }
            }
        }
    }

    /// Pops are published once per tick
    fn pop_consumed(&mut self, sequence: u64) -> usize {
        let popped = self.queue.pop_through(sequence);
        if popped > 0 {
            self.confirmed_sequence = self.confirmed_sequence.max(sequence);
            self.queue_dirty = true;
        }
        popped
    }

    fn handle_event(&mut self, event: TransportEvent) -> Result<()> {
        match event {
            TransportEvent::PeerConnected(peer) => {
                tracing::info!("🟢 Peer {} connected", peer.short());
                self.vote_dirty = true;
            }
            TransportEvent::PeerDisconnected(peer) => {
                tracing::info!("🔴 Peer {} disconnected", peer.short());
                self.vote_dirty = true;
            }
            TransportEvent::Reconnected => {
                tracing::info!("Reconnected, re-reading shared state");
                self.synced = false;
                self.sync_from_store()?;
            }
            TransportEvent::StateChanged { key, value } => match key.as_str() {
                keys::EVENT_QUEUE => self.observe_queue(value)?,
                keys::HOST_LEASE => {
                    if let Some(value) = value {
                        self.adopt_lease(serde_json::from_value(value)?)?;
                    }
                }
                keys::VOTE_STATE => {
                    self.vote.refresh(&self.transport);
                    self.vote_dirty = true;
                }
                other if keys::parse_ballot_key(other).is_some() => {
                    self.vote_dirty = true;
                }
                other => tracing::trace!("Ignoring change of '{}'", other),
            },
            TransportEvent::CallReceived {
                from,
                channel,
                payload,
            } => self.handle_call(from, &channel, payload)?,
        }
        Ok(())
    }

    fn handle_call(&mut self, from: PeerId, channel: &str, payload: Value) -> Result<()> {
        match channel {
            ENQUEUE_CHANNEL if self.is_host() => {
                let request: EnqueueRequest = serde_json::from_value(payload.clone())?;
                self.accept_enqueue(from, request)?;
            }
            ENQUEUE_CHANNEL => self.relay_enqueue(from, payload.clone())?,
            STORY_CHANNEL => {
                let line: StoryAppend = serde_json::from_value(payload.clone())?;
                self.processor
                    .sink_mut()
                    .append_story_text(&line.text, line.label.as_deref());
            }
            CHAT_CHANNEL => {
                let line: ChatLine = serde_json::from_value(payload.clone())?;
                self.chat_log.push(line);
            }
            _ => {}
        }

        self.registry.dispatch(&CallContext {
            from,
            channel,
            payload: &payload,
        });
        Ok(())
    }

    /// Pass an enqueue request that arrived after losing the lease on to
    /// the current holder
    fn relay_enqueue(&mut self, from: PeerId, payload: Value) -> Result<()> {
        let holder = self
            .lease
            .as_ref()
            .map(|lease| lease.holder)
            .ok_or(P2PError::NoHostLease)?;
        if holder == self.local_peer_id() {
            return Err(P2PError::NotHost);
        }

        tracing::warn!(
            "Enqueue request from {} arrived after hand-off, relaying to {}",
            from.short(),
            holder.short()
        );
        self.transport.call(ENQUEUE_CHANNEL, payload, CallMode::Host)
    }

    fn observe_queue(&mut self, value: Option<Value>) -> Result<()> {
        let Some(value) = value else {
            return Ok(());
        };
        let incoming: EventQueue = serde_json::from_value(value)?;

        if incoming.supersedes(&self.queue) {
            self.replace_queue(incoming);
        } else {
            tracing::debug!(
                "Ignoring stale queue snapshot (epoch {}, rev {})",
                incoming.host_epoch(),
                incoming.revision()
            );
        }
        Ok(())
    }

    /// Adopt a newer snapshot without losing events this peer has not
    /// applied yet
    fn replace_queue(&mut self, mut incoming: EventQueue) {
        let strategy = self.processor.strategy();
        let ledger = self.processor.ledger();
        let carried = incoming.carry_over(&self.queue, |envelope| {
            !ledger.has_applied(&strategy.fingerprint(envelope))
        });

        if carried > 0 {
            tracing::debug!("Kept {} popped events not yet applied here", carried);
        }
        self.queue = incoming;
    }

    fn adopt_lease(&mut self, lease: HostLease) -> Result<()> {
        if let Some(current) = &self.lease {
            if !lease.supersedes(current) {
                return Ok(());
            }
            if current.holder != lease.holder {
                self.former_hosts.insert(current.holder);
            }
        }

        let me = self.local_peer_id();
        if lease.is_held_by(me) {
            return self.promote(lease);
        }

        if self.is_host() {
            tracing::info!("Host lease passed to {}", lease.holder.short());
        }
        self.lease = Some(lease);
        self.processor.set_host(false);
        self.host_watch.reset();
        Ok(())
    }

    /// Take on host duties, resuming after the confirmed sequence.
    ///
    /// Confirmed entries this peer has not applied yet stay queued; the new
    /// host pops them once it has applied them itself.
    fn promote(&mut self, lease: HostLease) -> Result<()> {
        let strategy = self.processor.strategy();
        let ledger = self.processor.ledger();
        let applied_through = self
            .queue
            .entries()
            .take_while(|e| {
                e.sequence <= lease.confirmed_sequence
                    && ledger.has_applied(&strategy.fingerprint(e))
            })
            .last()
            .map(|e| e.sequence);
        let popped = applied_through
            .map(|sequence| self.queue.pop_through(sequence))
            .unwrap_or(0);
        self.confirmed_sequence = self.confirmed_sequence.max(lease.confirmed_sequence);

        tracing::info!(
            "👑 Holding host lease (epoch {}), {} pending, {} already confirmed",
            lease.epoch,
            self.queue.len(),
            popped
        );

        self.lease = Some(lease);
        self.processor.set_host(true);
        self.host_watch.reset();
        self.vote_dirty = true;
        self.publish_queue()
    }

    fn check_host_presence(&mut self, now: Instant) -> Result<()> {
        let Some(lease) = self.lease.clone() else {
            return Ok(());
        };

        let connected = self.transport.connected_peers();
        let status = self
            .host_watch
            .observe(connected.contains(&lease.holder), now);

        if status != HolderStatus::Expired {
            return Ok(());
        }

        // Lowest connected id claims, so peers agree without coordination
        let me = self.local_peer_id();
        if connected.first() != Some(&me) {
            return Ok(());
        }

        tracing::warn!(
            "Host {} gone for {:?}, claiming lease",
            lease.holder.short(),
            self.host_watch.grace_period()
        );
        let claimed = lease.hand_off(me, lease.confirmed_sequence);
        self.transport
            .set_state(keys::HOST_LEASE, Some(serde_json::to_value(&claimed)?))?;
        self.adopt_lease(claimed)
    }

    fn sync_from_store(&mut self) -> Result<()> {
        if let Some(lease) = self.read_lease()? {
            self.adopt_lease(lease)?;
        }
        if let Some(queue) = self.read_queue()? {
            if queue.supersedes(&self.queue) {
                self.replace_queue(queue);
            }
        }
        self.vote.refresh(&self.transport);
        self.vote_dirty = true;
        self.synced = true;

        tracing::info!(
            "Synchronized with shared state: {} pending events",
            self.queue.len()
        );
        Ok(())
    }

    fn read_lease(&self) -> Result<Option<HostLease>> {
        Ok(self
            .transport
            .get_state(keys::HOST_LEASE)
            .map(serde_json::from_value::<HostLease>)
            .transpose()?)
    }

    fn read_queue(&self) -> Result<Option<EventQueue>> {
        Ok(self
            .transport
            .get_state(keys::EVENT_QUEUE)
            .map(serde_json::from_value::<EventQueue>)
            .transpose()?)
    }

    fn require_host(&self) -> Result<PeerId> {
        match &self.lease {
            Some(lease) if lease.is_held_by(self.local_peer_id()) => Ok(lease.holder),
            Some(_) => Err(P2PError::NotHost),
            None => Err(P2PError::NoHostLease),
        }
    }

    fn report(&mut self, err: P2PError, now: Instant) {
        tracing::warn!("❌ {}", err);
        self.notifications.error(err.to_string(), now);
    }
}
