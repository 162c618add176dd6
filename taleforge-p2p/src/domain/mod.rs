mod call;
mod host_watch;
pub mod keys;
mod lease;

pub use call::{CallMode, ChatLine, StoryAppend, CHAT_CHANNEL, ENQUEUE_CHANNEL, STORY_CHANNEL};
pub use host_watch::{HolderStatus, HostWatch};
pub use lease::HostLease;
