//! Layered error definitions
//!
//! Categorized by source: config / device / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Device Errors =====
    /// Error reported by the device collaborator
    #[error(transparent)]
    Device(#[from] DeviceError),

    // ===== Sink Errors =====
    /// Sink publish error
    #[error("sink '{sink_name}' publish error on '{topic}': {message}")]
    SinkPublish {
        sink_name: String,
        topic: String,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink publish error
    pub fn sink_publish(
        sink_name: impl Into<String>,
        topic: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SinkPublish {
            sink_name: sink_name.into(),
            topic: topic.into(),
            message: message.into(),
        }
    }
}

/// Error raised by the device session collaborator
///
/// Carries the numeric code reported by the camera so that command
/// responses can surface it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("device error {code}: {message}")]
pub struct DeviceError {
    /// Device-specific error code
    pub code: i32,
    /// Human-readable message
    pub message: String,
}

impl DeviceError {
    /// Create a device error
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_display() {
        let err = DeviceError::new(-9001, "connection refused");
        assert_eq!(err.to_string(), "device error -9001: connection refused");
    }

    #[test]
    fn test_device_error_converts_transparently() {
        let err: ContractError = DeviceError::new(7, "busy").into();
        assert_eq!(err.to_string(), "device error 7: busy");
    }

    #[test]
    fn test_validation_error_names_field() {
        let err = ContractError::config_validation("camera.ip", "ip cannot be empty");
        assert!(err.to_string().contains("camera.ip"));
    }
}
