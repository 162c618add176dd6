pub mod error;
pub mod memory;
pub mod transport;

pub use memory::{FaultPlan, MemoryNetwork, MemoryTransport};
pub use transport::{Transport, TransportEvent};
