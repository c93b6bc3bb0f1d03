//! Simulated camera
//!
//! Implements the device collaborator traits in-process. Generates frames
//! for every channel requested by the schema mask and supports failure
//! injection (refused connects, refused grabbers, link stalls, clock skew,
//! short extrinsics) for tests and hardware-free runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use contracts::{DeviceError, ImageKind, PixelFormat, RawImage, SchemaMask};
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::client::{DeviceClient, DeviceSession, Endpoint, FrameBuffer, FrameGrabber};

/// Base of the data port numbering
const PCIC_BASE_PORT: u16 = 50010;

/// Error code reported for refused connections
const CONNECT_REFUSED: i32 = -9001;

/// Error code reported for refused grabbers
const GRABBER_REFUSED: i32 = -9002;

/// Minimal JFIF stream (SOI, APP0, EOI)
const JPEG_STUB: [u8; 22] = [
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
];

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Image width (pixels)
    pub width: u32,
    /// Image height (pixels)
    pub height: u32,
    /// Interval between frames
    pub frame_period: Duration,
    /// Number of initial connect attempts to refuse
    pub fail_connects: u32,
    /// Number of initial grabber opens to refuse
    pub fail_grabbers: u32,
    /// Frames each grabber delivers before the link stalls
    pub stall_after: Option<u64>,
    /// Offset of the device clock from local time
    pub clock_offset: TimeDelta,
    /// Extrinsics vector reported with each frame
    pub extrinsics: Vec<f32>,
    /// Emit a JPEG stream on the RGB channel
    pub rgb: bool,
    /// Error returned by every configuration write
    pub config_error: Option<DeviceError>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            width: 224,
            height: 172,
            frame_period: Duration::from_millis(50),
            fail_connects: 0,
            fail_grabbers: 0,
            stall_after: None,
            clock_offset: TimeDelta::zero(),
            extrinsics: vec![0.01, 0.02, 0.03, 0.0, 0.0, 0.0],
            rgb: false,
            config_error: None,
        }
    }
}

/// State shared between the camera, its sessions and the probe
#[derive(Debug)]
struct SimShared {
    config: SimulatorConfig,
    device_config: Mutex<Value>,
    connects: AtomicU32,
    grabbers: AtomicU32,
    live_sessions: AtomicUsize,
    frames: AtomicU64,
    triggers: AtomicU32,
    opened_masks: Mutex<Vec<SchemaMask>>,
    applied: Mutex<Vec<Value>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn initial_device_config() -> Value {
    json!({
        "device": {
            "info": { "name": "simulated", "partNumber": "SIM-0001" },
            "state": { "temperature": 42.0 }
        },
        "ports": {
            "port0": { "state": "RUN", "mode": "standard_range4m" },
            "port1": { "state": "RUN", "mode": "standard_range4m" },
            "port2": { "state": "RUN", "mode": "experimental_high_2m" }
        }
    })
}

/// Recursive JSON merge: objects merge key-wise, everything else replaces
fn merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                merge(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// Simulated camera (device client)
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    shared: Arc<SimShared>,
}

impl SimulatedCamera {
    /// Create a camera with the given behaviour
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            shared: Arc::new(SimShared {
                config,
                device_config: Mutex::new(initial_device_config()),
                connects: AtomicU32::new(0),
                grabbers: AtomicU32::new(0),
                live_sessions: AtomicUsize::new(0),
                frames: AtomicU64::new(0),
                triggers: AtomicU32::new(0),
                opened_masks: Mutex::new(Vec::new()),
                applied: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Observation handle for tests and reports
    pub fn probe(&self) -> SimulatorProbe {
        SimulatorProbe {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl DeviceClient for SimulatedCamera {
    type Session = SimulatedSession;
    type Buffer = SimulatedBuffer;
    type Grabber = SimulatedGrabber;

    fn connect(&self, endpoint: &Endpoint) -> Result<SimulatedSession, DeviceError> {
        let attempt = self.shared.connects.fetch_add(1, Ordering::SeqCst);
        if attempt < self.shared.config.fail_connects {
            return Err(DeviceError::new(
                CONNECT_REFUSED,
                format!("connection refused by {}", endpoint.address),
            ));
        }
        self.shared.live_sessions.fetch_add(1, Ordering::SeqCst);
        debug!(address = %endpoint.address, port = endpoint.control_port, "simulated session opened");
        Ok(SimulatedSession {
            shared: Arc::clone(&self.shared),
        })
    }

    fn open_grabber(
        &self,
        session: &Arc<SimulatedSession>,
        mask: SchemaMask,
        data_port: u16,
    ) -> Result<SimulatedGrabber, DeviceError> {
        let attempt = self.shared.grabbers.fetch_add(1, Ordering::SeqCst);
        if attempt < self.shared.config.fail_grabbers {
            return Err(DeviceError::new(GRABBER_REFUSED, "data port not available"));
        }
        lock(&self.shared.opened_masks).push(mask);
        Ok(SimulatedGrabber {
            session: Arc::clone(session),
            mask,
            port_key: format!("port{}", data_port % PCIC_BASE_PORT),
            delivered: 0,
        })
    }

    fn new_buffer(&self) -> SimulatedBuffer {
        SimulatedBuffer::default()
    }
}

/// Simulated session handle
#[derive(Debug)]
pub struct SimulatedSession {
    shared: Arc<SimShared>,
}

impl Drop for SimulatedSession {
    fn drop(&mut self) {
        self.shared.live_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DeviceSession for SimulatedSession {
    fn to_json(&self) -> Result<Value, DeviceError> {
        Ok(lock(&self.shared.device_config).clone())
    }

    fn from_json(&self, document: &Value) -> Result<(), DeviceError> {
        if let Some(err) = &self.shared.config.config_error {
            return Err(err.clone());
        }
        merge(&mut lock(&self.shared.device_config), document);
        lock(&self.shared.applied).push(document.clone());
        Ok(())
    }
}

/// Simulated frame grabber
#[derive(Debug)]
pub struct SimulatedGrabber {
    session: Arc<SimulatedSession>,
    mask: SchemaMask,
    port_key: String,
    delivered: u64,
}

impl SimulatedGrabber {
    fn port_idle(&self) -> bool {
        let doc = lock(&self.session.shared.device_config);
        doc.pointer(&format!("/ports/{}/state", self.port_key))
            .and_then(Value::as_str)
            == Some("IDLE")
    }

    fn stalled(&self) -> bool {
        matches!(self.session.shared.config.stall_after, Some(limit) if self.delivered >= limit)
    }
}

impl FrameGrabber for SimulatedGrabber {
    type Buffer = SimulatedBuffer;

    fn wait_for_frame(
        &mut self,
        buffer: &mut SimulatedBuffer,
        timeout: Duration,
    ) -> Result<bool, DeviceError> {
        let shared = &self.session.shared;
        if self.stalled() || self.port_idle() || shared.config.frame_period > timeout {
            thread::sleep(timeout);
            return Ok(false);
        }
        thread::sleep(shared.config.frame_period);

        let index = shared.frames.fetch_add(1, Ordering::SeqCst);
        self.delivered += 1;
        buffer.frame = Some(generate_frame(&shared.config, self.mask, index));
        trace!(index, mask = %self.mask, "simulated frame delivered");
        Ok(true)
    }

    fn software_trigger(&mut self) -> Result<(), DeviceError> {
        self.session.shared.triggers.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Decoded frame held by the buffer
#[derive(Debug, Clone)]
struct SimFrame {
    images: HashMap<ImageKind, RawImage>,
    extrinsics: Vec<f32>,
    timestamp: DateTime<Utc>,
}

/// Simulated frame buffer
#[derive(Debug, Default)]
pub struct SimulatedBuffer {
    frame: Option<SimFrame>,
}

impl FrameBuffer for SimulatedBuffer {
    fn image(&self, kind: ImageKind) -> Result<RawImage, DeviceError> {
        Ok(self
            .frame
            .as_ref()
            .and_then(|f| f.images.get(&kind).cloned())
            .unwrap_or_default())
    }

    fn extrinsics(&self) -> Result<Vec<f32>, DeviceError> {
        Ok(self
            .frame
            .as_ref()
            .map(|f| f.extrinsics.clone())
            .unwrap_or_default())
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.frame
            .as_ref()
            .map(|f| f.timestamp)
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

fn generate_frame(config: &SimulatorConfig, mask: SchemaMask, index: u64) -> SimFrame {
    let (w, h) = (config.width, config.height);
    let phase = (index % 256) as u16;
    let mut images = HashMap::new();

    images.insert(
        ImageKind::Confidence,
        plane_u8(w, h, |x, y| ((x ^ y) & 1) as u8),
    );
    if mask.includes(SchemaMask::IMG_RDIS) {
        images.insert(
            ImageKind::Distance,
            plane_u16(w, h, |x, y| 1000 + (x + y) as u16 + phase),
        );
    }
    if mask.includes(SchemaMask::IMG_DIS_NOISE) {
        images.insert(ImageKind::DistanceNoise, plane_u16(w, h, |x, _| 5 + (x % 3) as u16));
    }
    if mask.includes(SchemaMask::IMG_AMP) {
        images.insert(ImageKind::Amplitude, plane_u16(w, h, |x, y| (x * y) as u16));
    }
    if mask.includes(SchemaMask::IMG_RAMP) {
        images.insert(ImageKind::RawAmplitude, plane_u16(w, h, |x, y| (x * y) as u16 / 2));
    }
    if mask.includes(SchemaMask::IMG_GRAY) {
        images.insert(ImageKind::Gray, plane_u16(w, h, |x, _| (x * 16) as u16));
    }
    if mask.includes(SchemaMask::IMG_CART) {
        images.insert(
            ImageKind::Cartesian,
            plane_f32x3(w, h, |x, y| [1.0, x as f32 * 0.01, y as f32 * 0.01]),
        );
    }
    if mask.includes(SchemaMask::IMG_UVEC) {
        images.insert(ImageKind::UnitVectors, plane_f32x3(w, h, |_, _| [0.0, 0.0, 1.0]));
    }
    if config.rgb {
        images.insert(
            ImageKind::Jpeg,
            RawImage::new(
                JPEG_STUB.len() as u32,
                1,
                PixelFormat::Format8U,
                Bytes::from_static(&JPEG_STUB),
            ),
        );
    }

    SimFrame {
        images,
        extrinsics: config.extrinsics.clone(),
        timestamp: Utc::now() + config.clock_offset,
    }
}

/// Row-major pixel coordinates
fn grid(w: u32, h: u32) -> impl Iterator<Item = (u32, u32)> {
    (0..h).flat_map(move |y| (0..w).map(move |x| (x, y)))
}

fn plane_u8(w: u32, h: u32, f: impl Fn(u32, u32) -> u8) -> RawImage {
    let pixels: Vec<u8> = grid(w, h).map(|(x, y)| f(x, y)).collect();
    RawImage::new(w, h, PixelFormat::Format8U, pixels)
}

fn plane_u16(w: u32, h: u32, f: impl Fn(u32, u32) -> u16) -> RawImage {
    let pixels: Vec<u16> = grid(w, h).map(|(x, y)| f(x, y)).collect();
    let data = Bytes::copy_from_slice(bytemuck::cast_slice(&pixels));
    RawImage::new(w, h, PixelFormat::Format16U, data)
}

fn plane_f32x3(w: u32, h: u32, f: impl Fn(u32, u32) -> [f32; 3]) -> RawImage {
    let points: Vec<[f32; 3]> = grid(w, h).map(|(x, y)| f(x, y)).collect();
    let data = Bytes::copy_from_slice(bytemuck::cast_slice(&points));
    RawImage::new(w, h, PixelFormat::Format32F3, data)
}

/// Read-only view on the simulator's recorded activity
#[derive(Debug, Clone)]
pub struct SimulatorProbe {
    shared: Arc<SimShared>,
}

impl SimulatorProbe {
    /// Connect attempts, refused ones included
    pub fn connect_count(&self) -> u32 {
        self.shared.connects.load(Ordering::SeqCst)
    }

    /// Session handles currently alive
    pub fn live_sessions(&self) -> usize {
        self.shared.live_sessions.load(Ordering::SeqCst)
    }

    /// Masks of every successfully opened grabber, in order
    pub fn opened_masks(&self) -> Vec<SchemaMask> {
        lock(&self.shared.opened_masks).clone()
    }

    /// Configuration fragments applied through `from_json`
    pub fn applied_fragments(&self) -> Vec<Value> {
        lock(&self.shared.applied).clone()
    }

    /// Software triggers fired
    pub fn trigger_count(&self) -> u32 {
        self.shared.triggers.load(Ordering::SeqCst)
    }

    /// Frames delivered across all grabbers
    pub fn frames_delivered(&self) -> u64 {
        self.shared.frames.load(Ordering::SeqCst)
    }

    /// Current device configuration document
    pub fn device_config(&self) -> Value {
        lock(&self.shared.device_config).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(
        config: SimulatorConfig,
        mask: SchemaMask,
    ) -> (SimulatedCamera, Arc<SimulatedSession>, SimulatedGrabber) {
        let camera = SimulatedCamera::new(config);
        let session = Arc::new(camera.connect(&Endpoint::new("sim", 80, "")).unwrap());
        let grabber = camera.open_grabber(&session, mask, 50010).unwrap();
        (camera, session, grabber)
    }

    fn fast(width: u32, height: u32) -> SimulatorConfig {
        SimulatorConfig {
            width,
            height,
            frame_period: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_frame_follows_mask() {
        let mask = SchemaMask::IMG_CART | SchemaMask::IMG_RDIS;
        let (camera, _session, mut grabber) = open(fast(10, 5), mask);
        let mut buffer = camera.new_buffer();

        assert!(grabber.wait_for_frame(&mut buffer, Duration::from_millis(100)).unwrap());

        let distance = buffer.image(ImageKind::Distance).unwrap();
        assert_eq!(distance.format(), Some(PixelFormat::Format16U));
        assert_eq!(distance.data.len(), 10 * 5 * 2);

        let xyz = buffer.image(ImageKind::Cartesian).unwrap();
        assert_eq!(xyz.format(), Some(PixelFormat::Format32F3));
        assert_eq!(xyz.data.len(), 10 * 5 * 12);

        assert!(!buffer.image(ImageKind::Confidence).unwrap().is_empty());
        assert!(buffer.image(ImageKind::Amplitude).unwrap().is_empty());
        assert!(buffer.image(ImageKind::Jpeg).unwrap().is_empty());
    }

    #[test]
    fn test_stall_after_limit() {
        let config = SimulatorConfig {
            stall_after: Some(1),
            ..fast(2, 2)
        };
        let (camera, _session, mut grabber) = open(config, SchemaMask::DEFAULT);
        let mut buffer = camera.new_buffer();

        assert!(grabber.wait_for_frame(&mut buffer, Duration::from_millis(20)).unwrap());
        assert!(!grabber.wait_for_frame(&mut buffer, Duration::from_millis(20)).unwrap());
    }

    #[test]
    fn test_idle_port_stops_frames() {
        let (camera, session, mut grabber) = open(fast(2, 2), SchemaMask::DEFAULT);
        let mut buffer = camera.new_buffer();

        session
            .from_json(&json!({"ports": {"port0": {"state": "IDLE"}}}))
            .unwrap();
        assert!(!grabber.wait_for_frame(&mut buffer, Duration::from_millis(10)).unwrap());

        session
            .from_json(&json!({"ports": {"port0": {"state": "RUN"}}}))
            .unwrap();
        assert!(grabber.wait_for_frame(&mut buffer, Duration::from_millis(10)).unwrap());
        assert_eq!(camera.probe().applied_fragments().len(), 2);
    }

    #[test]
    fn test_from_json_merges() {
        let (camera, session, _grabber) = open(fast(2, 2), SchemaMask::DEFAULT);
        session
            .from_json(&json!({"ports": {"port1": {"state": "IDLE"}}}))
            .unwrap();

        let doc = camera.probe().device_config();
        assert_eq!(doc["ports"]["port1"]["state"], "IDLE");
        assert_eq!(doc["ports"]["port1"]["mode"], "standard_range4m");
        assert_eq!(doc["ports"]["port0"]["state"], "RUN");
    }

    #[test]
    fn test_config_error_injection() {
        let config = SimulatorConfig {
            config_error: Some(DeviceError::new(101000, "invalid parameter")),
            ..fast(2, 2)
        };
        let (_camera, session, _grabber) = open(config, SchemaMask::DEFAULT);
        let err = session.from_json(&json!({})).unwrap_err();
        assert_eq!(err.code, 101000);
    }

    #[test]
    fn test_clock_offset() {
        let config = SimulatorConfig {
            clock_offset: TimeDelta::hours(2),
            ..fast(2, 2)
        };
        let (camera, _session, mut grabber) = open(config, SchemaMask::DEFAULT);
        let mut buffer = camera.new_buffer();
        assert!(grabber.wait_for_frame(&mut buffer, Duration::from_millis(100)).unwrap());

        let skew = buffer.timestamp() - Utc::now();
        assert!(skew > TimeDelta::minutes(119));
    }

    #[test]
    fn test_session_kept_alive_by_grabber() {
        let (camera, session, grabber) = open(fast(2, 2), SchemaMask::DEFAULT);
        let probe = camera.probe();
        drop(session);
        assert_eq!(probe.live_sessions(), 1);
        drop(grabber);
        assert_eq!(probe.live_sessions(), 0);
    }

    #[test]
    fn test_rgb_stream() {
        let config = SimulatorConfig {
            rgb: true,
            ..fast(2, 2)
        };
        let (camera, _session, mut grabber) = open(config, SchemaMask::DEFAULT);
        let mut buffer = camera.new_buffer();
        assert!(grabber.wait_for_frame(&mut buffer, Duration::from_millis(100)).unwrap());

        let jpeg = buffer.image(ImageKind::Jpeg).unwrap();
        assert_eq!(jpeg.pixel_count(), JPEG_STUB.len() as u64);
        assert_eq!(&jpeg.data[..2], &[0xFF, 0xD8]);
    }
}
