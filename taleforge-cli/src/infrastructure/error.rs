use std::path::PathBuf;
use taleforge_core::BatchError;
use taleforge_p2p::P2PError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session error: {0}")]
    Session(#[from] P2PError),

    #[error("Invalid action response in {path}: {source}")]
    InvalidResponse {
        path: PathBuf,
        #[source]
        source: BatchError,
    },

    #[error("Replay file not found: {path}")]
    ReplayFileNotFound { path: PathBuf },

    #[error("Peers diverged: {0}")]
    Diverged(String),

    #[error("Simulation did not settle within {0} ticks")]
    NotSettled(usize),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CliError {
    pub fn replay_not_found(path: PathBuf) -> Self {
        CliError::ReplayFileNotFound { path }
    }

    pub fn invalid_response(path: PathBuf, source: BatchError) -> Self {
        CliError::InvalidResponse { path, source }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
