//! Bridge orchestration module.

mod report;
mod runner;

pub use report::RunReport;
pub use runner::{Bridge, BridgeConfig};
