//! Error types
//!
//! Nothing here is fatal to a session: chat errors degrade an encounter to the
//! fallback line, tuning errors fall back to defaults.

use thiserror::Error;

/// Failure of the external chat collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// The backend answered with an error
    #[error("chat request failed: {0}")]
    Failed(String),

    /// No reply before the deadline
    #[error("chat reply timed out after {0} ms")]
    Timeout(u64),

    /// The backend replied with nothing usable
    #[error("chat reply was empty")]
    Empty,
}

/// Rejected tuning configuration.
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),

    /// A value is outside its allowed range
    #[error("invalid tuning value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Native runtime failures.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The session driver task is already running
    #[error("session driver already running")]
    AlreadyRunning,

    #[error("session driver task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
