//! OutputSink trait - publish interface
//!
//! Defines the abstract interface of the outbound publish transport.

use crate::{ContractError, OutputMessage, Topic};

/// Output sink trait
///
/// Publishing happens from the acquisition thread, so implementations use
/// interior mutability and must be shareable across threads. Sinks retain
/// the last value of latched topics (see [`Topic::is_latched`]).
pub trait OutputSink: Send + Sync {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Publish a record on a topic
    ///
    /// # Errors
    /// Returns publish error (should include context)
    fn publish(&self, topic: Topic, message: OutputMessage) -> Result<(), ContractError>;
}
