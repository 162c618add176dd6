use serde_json::Value;
use std::collections::BTreeMap;
use taleforge_core::PeerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// One received call, as handed to handlers
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    pub from: PeerId,
    pub channel: &'a str,
    pub payload: &'a Value,
}

type Handler = Box<dyn FnMut(&CallContext<'_>)>;

/// Handlers for fire-and-forget call channels, owned by one session.
///
/// Registration is explicit: whoever mounts a handler keeps the returned
/// id and unregisters it on teardown.
#[derive(Default)]
pub struct HandlerRegistry {
    next_id: u64,
    handlers: BTreeMap<String, Vec<(HandlerId, Handler)>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, channel: impl Into<String>, handler: F) -> HandlerId
    where
        F: FnMut(&CallContext<'_>) + 'static,
    {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.handlers
            .entry(channel.into())
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Returns false if `id` was not registered
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let mut removed = false;
        self.handlers.retain(|_, handlers| {
            let before = handlers.len();
            handlers.retain(|(handler_id, _)| *handler_id != id);
            removed |= handlers.len() != before;
            !handlers.is_empty()
        });
        removed
    }

    /// Invoke every handler of the call's channel. Returns how many ran.
    pub fn dispatch(&mut self, call: &CallContext<'_>) -> usize {
        match self.handlers.get_mut(call.channel) {
            Some(handlers) => {
                for (_, handler) in handlers.iter_mut() {
                    handler(call);
                }
                handlers.len()
            }
            None => 0,
        }
    }

    pub fn handler_count(&self, channel: &str) -> usize {
        self.handlers.get(channel).map(Vec::len).unwrap_or(0)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: BTreeMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(channel, handlers)| (channel.as_str(), handlers.len()))
            .collect();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &counts)
            .finish()
    }
}
