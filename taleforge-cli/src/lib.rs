pub mod application;
pub mod infrastructure;

pub use application::{
    replay_file, run_simulation, ScriptedBackend, SimulationConfig, SimulationReport,
};
pub use infrastructure::{CliError, LogConfig, Result};
