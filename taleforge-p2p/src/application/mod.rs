pub mod config;
pub mod registry;
pub mod session;
pub mod vote;

pub use config::SessionConfig;
pub use registry::{CallContext, HandlerId, HandlerRegistry};
pub use session::{GameSession, PollSummary};
pub use vote::VoteCoordinator;
