//! # Device Session
//!
//! Camera session lifecycle module.
//!
//! Responsibilities:
//! - Define the device collaborator traits (session, frame grabber, frame buffer)
//! - Own the session triple and recreate it atomically on demand
//! - Roll back to an empty triple when any collaborator call fails
//! - Provide a simulated camera for development without hardware

pub mod client;
pub mod error;
pub mod manager;
pub mod sim;

pub use client::{DeviceClient, DeviceSession, Endpoint, FrameBuffer, FrameGrabber};
pub use error::{SessionError, Result};
pub use manager::{not_initialized, SessionManager};
pub use sim::{SimulatedCamera, SimulatorConfig, SimulatorProbe};
