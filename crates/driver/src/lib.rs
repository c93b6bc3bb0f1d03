//! # Driver
//!
//! Acquisition and command surface of the camera bridge.
//!
//! Responsibilities:
//! - Bootstrap on the unit-vector schema, then stream the requested schema
//! - Detect stale sessions and re-establish them without operator action
//! - Pull frames under the shared lock, convert and publish outside it
//! - Serve Dump / Config / Trigger / SoftOff / SoftOn under the same lock
//!
//! ## Threading
//!
//! The acquisition loop runs on one dedicated thread. Command handlers are
//! called from any thread and contend with it for the device state lock.

pub mod acquisition;
pub mod commands;
pub mod driver;
pub mod error;
pub mod frame_set;
pub mod phase;
pub mod publish;
pub mod retry;
pub mod stamp;
pub mod state;
pub mod stats;
pub mod timing;

pub use acquisition::{AcquisitionLoop, LoopSettings};
pub use commands::CommandHandlers;
pub use driver::{CameraDriver, DriverHandle};
pub use error::{CommandError, DriverError};
pub use frame_set::FrameSet;
pub use phase::Phase;
pub use publish::{extrinsics_message, Publisher};
pub use retry::{retry_until, ShutdownSignal};
pub use stamp::{StampReconciler, StampSource};
pub use state::{DeviceState, SharedState};
pub use stats::{AcquisitionSnapshot, AcquisitionStats};
pub use timing::{ActiveTiming, TimeoutPolicy, TimingRegimes};
