//! Session Lifecycle Manager
//!
//! Owns the (session, grabber, buffer) triple. The triple is either fully
//! present or absent; `initialize` is the only way to replace it.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use contracts::{DeviceError, SchemaMask, STATUS_RUNTIME_ERROR};
use tracing::{debug, error, info, instrument};

use crate::client::{DeviceClient, Endpoint, FrameGrabber};
use crate::error::{Result, SessionError};

/// Error returned by accessors while no session is held
pub fn not_initialized() -> DeviceError {
    DeviceError::new(STATUS_RUNTIME_ERROR, "device session not initialized")
}

/// Session handle + frame grabber + frame buffer
///
/// Fields drop in declaration order: buffer, grabber, then the session.
struct SessionTriple<C: DeviceClient> {
    buffer: C::Buffer,
    grabber: C::Grabber,
    session: Arc<C::Session>,
    mask: SchemaMask,
    data_port: u16,
}

/// Session Lifecycle Manager
pub struct SessionManager<C: DeviceClient> {
    client: C,
    endpoint: Endpoint,
    settle_delay: Duration,
    triple: Option<SessionTriple<C>>,
}

impl<C: DeviceClient> SessionManager<C> {
    /// Create a manager holding no session
    pub fn new(client: C, endpoint: Endpoint, settle_delay: Duration) -> Self {
        Self {
            client,
            endpoint,
            settle_delay,
            triple: None,
        }
    }

    /// Tear down the current triple and build a new one
    ///
    /// Returns `false` and leaves no session held when any collaborator
    /// call fails.
    #[instrument(
        name = "session_initialize",
        skip(self),
        fields(address = %self.endpoint.address)
    )]
    pub fn initialize(&mut self, mask: SchemaMask, data_port: u16) -> bool {
        self.teardown();

        match self.build(mask, data_port) {
            Ok(triple) => {
                self.triple = Some(triple);
                info!("device session initialized");
                true
            }
            Err(e) => {
                error!(error = %e, code = e.device_error().code, "session initialization failed");
                false
            }
        }
    }

    /// Drop the current triple, dependents first
    pub fn teardown(&mut self) {
        if let Some(triple) = self.triple.take() {
            let SessionTriple {
                buffer,
                grabber,
                session,
                mask,
                ..
            } = triple;
            drop(buffer);
            drop(grabber);
            drop(session);
            debug!(mask = %mask, "previous device session released");
        }
    }

    fn build(&self, mask: SchemaMask, data_port: u16) -> Result<SessionTriple<C>> {
        let session = self
            .client
            .connect(&self.endpoint)
            .map_err(|source| SessionError::Connect {
                address: self.endpoint.address.clone(),
                port: self.endpoint.control_port,
                source,
            })?;
        let session = Arc::new(session);

        // device-side service needs time after the handle opens
        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }

        let grabber = self
            .client
            .open_grabber(&session, mask, data_port)
            .map_err(|source| SessionError::Grabber {
                mask,
                port: data_port,
                source,
            })?;
        let buffer = self.client.new_buffer();

        Ok(SessionTriple {
            buffer,
            grabber,
            session,
            mask,
            data_port,
        })
    }

    /// True while a session triple is held
    pub fn is_ready(&self) -> bool {
        self.triple.is_some()
    }

    /// Mask the held grabber streams
    pub fn active_mask(&self) -> Option<SchemaMask> {
        self.triple.as_ref().map(|t| t.mask)
    }

    /// Data port the held grabber is bound to
    pub fn data_port(&self) -> Option<u16> {
        self.triple.as_ref().map(|t| t.data_port)
    }

    /// Held session handle
    pub fn session(&self) -> std::result::Result<&C::Session, DeviceError> {
        self.triple
            .as_ref()
            .map(|t| t.session.as_ref())
            .ok_or_else(not_initialized)
    }

    /// Held frame buffer
    pub fn buffer(&self) -> std::result::Result<&C::Buffer, DeviceError> {
        self.triple
            .as_ref()
            .map(|t| &t.buffer)
            .ok_or_else(not_initialized)
    }

    /// Wait for the next frame into the held buffer
    pub fn wait_for_frame(&mut self, timeout: Duration) -> std::result::Result<bool, DeviceError> {
        let triple = self.triple.as_mut().ok_or_else(not_initialized)?;
        triple.grabber.wait_for_frame(&mut triple.buffer, timeout)
    }

    /// Fire a software trigger on the held grabber
    pub fn software_trigger(&mut self) -> std::result::Result<(), DeviceError> {
        let triple = self.triple.as_mut().ok_or_else(not_initialized)?;
        triple.grabber.software_trigger()
    }
}
