//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the camera bridge.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Output headers carry a UTC stamp, preferring the device-reported capture time
//! - Frame-of-reference identifiers are derived from a single configured base name

mod command;
mod config;
mod error;
mod image;
mod output;
mod schema;
mod sink;
mod topic;

pub use command::*;
pub use config::*;
pub use error::*;
pub use image::*;
pub use output::*;
pub use schema::{Channel, SchemaMask};
pub use sink::OutputSink;
pub use topic::Topic;
