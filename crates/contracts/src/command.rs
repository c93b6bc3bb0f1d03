//! Command surface - request/response types
//!
//! Synchronous commands exposed through the service-registration framework.

use serde::{Deserialize, Serialize};

/// Status returned for generic runtime failures
pub const STATUS_RUNTIME_ERROR: i32 = -1;

/// Status returned for unknown/opaque failures
pub const STATUS_UNKNOWN_ERROR: i32 = -2;

/// Command request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandRequest {
    /// Read the full device configuration
    Dump,
    /// Write a serialized configuration document
    Config { json: String },
    /// Software trigger
    Trigger,
    /// Put the data port into IDLE
    SoftOff,
    /// Put the data port into RUN
    SoftOn,
}

impl CommandRequest {
    /// Service name of the command
    pub fn service_name(&self) -> &'static str {
        match self {
            CommandRequest::Dump => "Dump",
            CommandRequest::Config { .. } => "Config",
            CommandRequest::Trigger => "Trigger",
            CommandRequest::SoftOff => "SoftOff",
            CommandRequest::SoftOn => "SoftOn",
        }
    }
}

/// `Dump` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpResponse {
    pub status: i32,
    /// Serialized configuration document (empty on failure)
    pub config: String,
}

/// Status + message response shared by the other commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: i32,
    pub msg: String,
}

impl StatusResponse {
    /// Build a response
    pub fn new(status: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            msg: msg.into(),
        }
    }
}

/// Command response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandResponse {
    Dump(DumpResponse),
    Status(StatusResponse),
}

impl CommandResponse {
    /// Status code of the response
    pub fn status(&self) -> i32 {
        match self {
            CommandResponse::Dump(r) => r.status,
            CommandResponse::Status(r) => r.status,
        }
    }
}

/// Command service bound by the service-registration framework
pub trait CommandService: Send + Sync {
    /// Execute a command to completion
    fn call(&self, request: CommandRequest) -> CommandResponse;
}
