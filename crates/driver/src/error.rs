//! Driver error types

use contracts::{DeviceError, STATUS_RUNTIME_ERROR, STATUS_UNKNOWN_ERROR};
use thiserror::Error;

/// Failure inside a command handler
#[derive(Debug, Error)]
pub enum CommandError {
    /// Reported by the device; its code is surfaced verbatim
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Generic runtime failure (malformed request, serialization)
    #[error("{0}")]
    Runtime(String),

    /// Opaque failure
    #[error("{0}")]
    Unknown(String),
}

impl CommandError {
    /// Response status code
    pub fn status(&self) -> i32 {
        match self {
            CommandError::Device(e) => e.code,
            CommandError::Runtime(_) => STATUS_RUNTIME_ERROR,
            CommandError::Unknown(_) => STATUS_UNKNOWN_ERROR,
        }
    }

    /// Response message
    pub fn message(&self) -> String {
        match self {
            CommandError::Device(e) => e.message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        CommandError::Runtime(e.to_string())
    }
}

/// Driver startup error
#[derive(Debug, Error)]
pub enum DriverError {
    /// Acquisition thread could not be started
    #[error("failed to spawn acquisition thread: {0}")]
    Spawn(#[from] std::io::Error),
}
