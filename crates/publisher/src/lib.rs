//! # Publisher
//!
//! Output sink implementations.
//!
//! Responsibilities:
//! - Log and in-memory sinks
//! - Latch the last value of durable topics
//! - Isolate slow sinks behind a bounded queue so the acquisition thread never blocks
//! - Fan-out to every configured sink

pub mod fanout;
pub mod handle;
pub mod metrics;
pub mod set;
pub mod sinks;

pub use contracts::OutputSink;
pub use fanout::FanoutSink;
pub use handle::QueuedSink;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use set::{create_sinks, SinkSet};
pub use sinks::{LogSink, MemorySink};
