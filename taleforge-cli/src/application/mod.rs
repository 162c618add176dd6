pub mod replay;
pub mod scripted_backend;
pub mod simulation;

pub use replay::replay_file;
pub use scripted_backend::ScriptedBackend;
pub use simulation::{run as run_simulation, SimulationConfig, SimulationReport};
