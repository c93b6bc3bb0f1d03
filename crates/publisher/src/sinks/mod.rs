//! Sink implementations

mod log;
mod memory;

pub use log::LogSink;
pub use memory::MemorySink;
