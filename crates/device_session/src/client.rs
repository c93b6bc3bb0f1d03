//! Device collaborator abstraction
//!
//! Traits for the camera session, its frame grabber and the frame decoder.
//! The network protocol lives behind these traits; the lifecycle manager and
//! the acquisition loop only ever talk to them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use contracts::{DeviceError, ImageKind, RawImage, SchemaMask};

/// Control-plane address of a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub address: String,
    pub control_port: u16,
    pub password: String,
}

impl Endpoint {
    /// Create an endpoint
    pub fn new(address: impl Into<String>, control_port: u16, password: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            control_port,
            password: password.into(),
        }
    }
}

/// Device client trait
///
/// Factory for the three collaborators making up a session triple.
/// A real network client and the simulator both implement it.
pub trait DeviceClient: Send + 'static {
    /// Session handle type
    type Session: DeviceSession;
    /// Frame decoder type
    type Buffer: FrameBuffer;
    /// Frame grabber type, filling `Self::Buffer`
    type Grabber: FrameGrabber<Buffer = Self::Buffer>;

    /// Open a session handle against the control port
    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Session, DeviceError>;

    /// Bind a frame grabber to an open session
    ///
    /// The grabber keeps the session alive for as long as it exists.
    fn open_grabber(
        &self,
        session: &Arc<Self::Session>,
        mask: SchemaMask,
        data_port: u16,
    ) -> Result<Self::Grabber, DeviceError>;

    /// Create an empty frame buffer
    fn new_buffer(&self) -> Self::Buffer;
}

/// Device session handle: configuration RPC surface
pub trait DeviceSession: Send + Sync + 'static {
    /// Read the full device configuration
    fn to_json(&self) -> Result<serde_json::Value, DeviceError>;

    /// Apply a (partial) configuration document
    fn from_json(&self, document: &serde_json::Value) -> Result<(), DeviceError>;
}

/// Frame grabber bound to a session
pub trait FrameGrabber: Send + 'static {
    /// Buffer the grabber decodes into
    type Buffer: FrameBuffer;

    /// Block until a frame arrives or `timeout` elapses
    ///
    /// Returns `Ok(false)` on timeout; the buffer is untouched in that case.
    fn wait_for_frame(
        &mut self,
        buffer: &mut Self::Buffer,
        timeout: Duration,
    ) -> Result<bool, DeviceError>;

    /// Fire a software trigger
    fn software_trigger(&mut self) -> Result<(), DeviceError>;
}

/// Decoded frame accessors
pub trait FrameBuffer: Send + 'static {
    /// Sub-image of the given kind; empty when the schema did not request it
    fn image(&self, kind: ImageKind) -> Result<RawImage, DeviceError>;

    /// Extrinsics vector, normally `[tx, ty, tz, rot_x, rot_y, rot_z]`
    fn extrinsics(&self) -> Result<Vec<f32>, DeviceError>;

    /// Device-reported capture time
    fn timestamp(&self) -> DateTime<Utc>;
}
