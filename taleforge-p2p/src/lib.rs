// Domain layer (shared keys, lease, call channels)
pub mod domain;

// Application layer (session loop, votes, handlers)
pub mod application;

// Infrastructure layer (transport adapters)
pub mod infrastructure;

// Re-exports for convenience
pub use application::{
    CallContext, GameSession, HandlerId, HandlerRegistry, PollSummary, SessionConfig,
    VoteCoordinator,
};
pub use domain::{CallMode, ChatLine, HostLease, StoryAppend};
pub use infrastructure::error::{P2PError, Result};
pub use infrastructure::{FaultPlan, MemoryNetwork, MemoryTransport, Transport, TransportEvent};
