//! Device Session error types

use contracts::{DeviceError, SchemaMask};
use thiserror::Error;

/// Session construction error
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session handle could not be opened
    #[error("failed to open device session at {address}:{port}: {source}")]
    Connect {
        address: String,
        port: u16,
        #[source]
        source: DeviceError,
    },

    /// Frame grabber could not be bound to the session
    #[error("failed to open frame grabber (mask {mask}, port {port}): {source}")]
    Grabber {
        mask: SchemaMask,
        port: u16,
        #[source]
        source: DeviceError,
    },
}

impl SessionError {
    /// Device error reported by the collaborator
    pub fn device_error(&self) -> &DeviceError {
        match self {
            SessionError::Connect { source, .. } | SessionError::Grabber { source, .. } => source,
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, SessionError>;
