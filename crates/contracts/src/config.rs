//! DriverConfig - Config Loader output
//!
//! Describes the camera connection, the acquisition timing regimes and the
//! output sinks. Every field has a default so an empty document is valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{FrameIds, SchemaMask};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete driver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Device connection
    #[serde(default)]
    pub camera: CameraConfig,

    /// Acquisition timing
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Output sinks
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Device connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Device address
    #[serde(default = "default_ip")]
    pub ip: String,

    /// Device control (XML-RPC) port
    #[serde(default = "default_xmlrpc_port")]
    pub xmlrpc_port: u16,

    /// Device data (PCIC) port
    #[serde(default = "default_pcic_port")]
    pub pcic_port: u16,

    /// Device password
    #[serde(default)]
    pub password: String,

    /// Requested channels
    #[serde(default)]
    pub schema_mask: SchemaMask,

    /// Base name of the frame-of-reference identifiers
    #[serde(default = "default_frame_id_base")]
    pub frame_id_base: String,
}

impl CameraConfig {
    /// `<base>_link` / `<base>_optical_link`
    pub fn frame_ids(&self) -> FrameIds {
        FrameIds::from_base(&self.frame_id_base)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            xmlrpc_port: default_xmlrpc_port(),
            pcic_port: default_pcic_port(),
            password: String::new(),
            schema_mask: SchemaMask::default(),
            frame_id_base: default_frame_id_base(),
        }
    }
}

fn default_ip() -> String {
    "192.168.0.69".to_string()
}

fn default_xmlrpc_port() -> u16 {
    80
}

fn default_pcic_port() -> u16 {
    50010
}

fn default_frame_id_base() -> String {
    "camera".to_string()
}

/// Acquisition timing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Per-wait timeout while streaming (ms)
    #[serde(default = "default_timeout_millis")]
    pub timeout_millis: u64,

    /// Staleness tolerance while streaming (s)
    #[serde(default = "default_timeout_tolerance_secs")]
    pub timeout_tolerance_secs: f64,

    /// Treat wait timeouts as expected (software-triggered device)
    #[serde(default)]
    pub assume_sw_triggered: bool,

    /// Per-wait timeout after SoftOn (ms)
    #[serde(default = "default_timeout_millis")]
    pub soft_on_timeout_millis: u64,

    /// Staleness tolerance after SoftOn (s)
    #[serde(default = "default_timeout_tolerance_secs")]
    pub soft_on_timeout_tolerance_secs: f64,

    /// Per-wait timeout after SoftOff (ms)
    #[serde(default = "default_timeout_millis")]
    pub soft_off_timeout_millis: u64,

    /// Staleness tolerance after SoftOff (s)
    #[serde(default = "default_soft_off_tolerance_secs")]
    pub soft_off_timeout_tolerance_secs: f64,

    /// Max accepted gap between device and local clock (s)
    #[serde(default = "default_frame_latency_thresh")]
    pub frame_latency_thresh: f64,

    /// Pause after opening a device session (ms)
    #[serde(default = "default_settle_delay_millis")]
    pub settle_delay_millis: u64,

    /// Pause between session initialisation attempts (ms)
    #[serde(default = "default_retry_backoff_millis")]
    pub retry_backoff_millis: u64,
}

impl AcquisitionConfig {
    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_millis)
    }

    /// Retry backoff as a duration
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_millis)
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            timeout_millis: default_timeout_millis(),
            timeout_tolerance_secs: default_timeout_tolerance_secs(),
            assume_sw_triggered: false,
            soft_on_timeout_millis: default_timeout_millis(),
            soft_on_timeout_tolerance_secs: default_timeout_tolerance_secs(),
            soft_off_timeout_millis: default_timeout_millis(),
            soft_off_timeout_tolerance_secs: default_soft_off_tolerance_secs(),
            frame_latency_thresh: default_frame_latency_thresh(),
            settle_delay_millis: default_settle_delay_millis(),
            retry_backoff_millis: default_retry_backoff_millis(),
        }
    }
}

fn default_timeout_millis() -> u64 {
    500
}

fn default_timeout_tolerance_secs() -> f64 {
    5.0
}

fn default_soft_off_tolerance_secs() -> f64 {
    600.0
}

fn default_frame_latency_thresh() -> f64 {
    60.0
}

fn default_settle_delay_millis() -> u64 {
    1000
}

fn default_retry_backoff_millis() -> u64 {
    1000
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity between the acquisition thread and the sink worker
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    16
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Summary line per publish via tracing
    Log,
    /// In-process store with latched topics
    Memory,
}
