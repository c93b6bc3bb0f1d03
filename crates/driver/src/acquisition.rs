//! Acquisition loop
//!
//! Bootstrap on the unit-vector schema, then stream the requested schema.
//! Stale sessions are rebuilt with the mask of the current phase. The loop
//! only ends on shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use contracts::{DeviceError, ImageKind, RawImage, SchemaMask};
use device_session::{DeviceClient, FrameBuffer};
use tracing::{debug, info, instrument, warn};

use crate::frame_set::FrameSet;
use crate::phase::Phase;
use crate::publish::Publisher;
use crate::retry::{retry_until, ShutdownSignal};
use crate::stamp::{StampReconciler, StampSource};
use crate::state::{lock_state, DeviceState, SharedState};
use crate::stats::AcquisitionStats;
use crate::timing::ActiveTiming;

/// Pause after a timeout when the device is software-triggered
const SW_TRIGGER_PAUSE: Duration = Duration::from_millis(1);

/// Static loop parameters
#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Schema streamed after bootstrap
    pub requested: SchemaMask,
    pub data_port: u16,
    /// Pause between initialisation attempts
    pub retry_backoff: Duration,
    /// Max accepted device/local clock gap (s)
    pub frame_latency_thresh: f64,
}

/// Acquisition loop state
pub struct AcquisitionLoop<C: DeviceClient> {
    state: SharedState<C>,
    publisher: Publisher,
    settings: LoopSettings,
    shutdown: ShutdownSignal,
    stats: Arc<AcquisitionStats>,
    stamps: StampReconciler,
    phase: Phase,
    last_frame: Instant,
    previous_frame: Option<Instant>,
}

impl<C: DeviceClient> AcquisitionLoop<C> {
    pub fn new(
        state: SharedState<C>,
        publisher: Publisher,
        settings: LoopSettings,
        shutdown: ShutdownSignal,
        stats: Arc<AcquisitionStats>,
    ) -> Self {
        let stamps = StampReconciler::new(settings.frame_latency_thresh);
        Self {
            state,
            publisher,
            settings,
            shutdown,
            stats,
            stamps,
            phase: Phase::Bootstrapping,
            last_frame: Instant::now(),
            previous_frame: None,
        }
    }

    /// Run until shutdown; releases the device session on exit
    #[instrument(name = "acquisition_loop", skip(self), fields(mask = %self.settings.requested))]
    pub fn run(mut self) {
        info!(data_port = self.settings.data_port, "acquisition loop started");

        if self.initialize_until_ready() {
            self.last_frame = Instant::now();
            while !self.shutdown.is_triggered() {
                self.step();
            }
        }

        lock_state(&self.state).session.teardown();
        info!(phase = %self.phase, "acquisition loop stopped");
    }

    /// Retry `initialize` with the mask of the current phase until it
    /// succeeds; `false` on shutdown
    fn initialize_until_ready(&self) -> bool {
        let phase = self.phase;
        let mask = phase.mask(self.settings.requested);
        retry_until(self.settings.retry_backoff, &self.shutdown, || {
            let ok = lock_state(&self.state)
                .session
                .initialize(mask, self.settings.data_port);
            self.stats.record_initialization(phase, ok);
            if !ok {
                warn!(mask = %mask, phase = %phase, "could not initialize pixel stream");
            }
            ok
        })
    }

    fn step(&mut self) {
        let (waited, timing) = {
            let mut state = lock_state(&self.state);
            let timing = state.timing;
            let waited = state.session.wait_for_frame(timing.policy.timeout);
            (waited, timing)
        };

        match waited {
            Ok(true) => self.on_frame(),
            Ok(false) => self.on_timeout(timing),
            Err(e) => {
                warn!(error = %e, "frame wait failed");
                // avoid spinning on an immediate error
                self.shutdown
                    .sleep(timing.policy.timeout.min(self.settings.retry_backoff));
                self.on_timeout(timing);
            }
        }
    }

    fn on_timeout(&mut self, timing: ActiveTiming) {
        self.stats.record_timeout();
        if timing.assume_sw_triggered {
            self.shutdown.sleep(SW_TRIGGER_PAUSE);
        } else {
            warn!(
                timeout_ms = timing.policy.timeout.as_millis() as u64,
                "timeout waiting for camera"
            );
        }

        let elapsed = self.last_frame.elapsed();
        if elapsed <= timing.policy.tolerance {
            return;
        }

        warn!(
            elapsed_secs = elapsed.as_secs_f64(),
            tolerance_secs = timing.policy.tolerance.as_secs_f64(),
            phase = %self.phase,
            "frames stale, restarting frame grabber"
        );
        self.stats.record_restart(self.phase);
        self.previous_frame = None;
        if self.initialize_until_ready() {
            self.last_frame = Instant::now();
        }
    }

    fn on_frame(&mut self) {
        let now = Instant::now();
        self.stats
            .record_frame(self.previous_frame.map(|previous| now - previous));
        self.previous_frame = Some(now);
        self.last_frame = now;

        match self.phase {
            Phase::Bootstrapping => self.bootstrap(),
            Phase::Streaming => self.stream(),
        }
    }

    /// Publish unit vectors once, then switch the grabber to the requested schema
    fn bootstrap(&mut self) {
        let mut state = lock_state(&self.state);

        let (image, device_stamp) = match read_unit_vectors(&*state) {
            Ok(pulled) => pulled,
            Err(e) => {
                warn!(error = %e, "failed to fetch unit vectors, staying in bootstrap");
                return;
            }
        };
        let stamp = header_stamp(&mut self.stamps, &self.stats, device_stamp);
        self.publisher.unit_vectors(&image, stamp);

        self.phase = Phase::Streaming;
        self.stats.set_streaming(true);
        info!(mask = %self.settings.requested, "got unit vectors, restarting frame grabber");

        let ok = state
            .session
            .initialize(self.settings.requested, self.settings.data_port);
        self.stats.record_initialization(Phase::Streaming, ok);
        drop(state);

        if !ok {
            warn!("could not re-initialize pixel stream");
            if !self.initialize_until_ready() {
                return;
            }
        }
        self.last_frame = Instant::now();
        self.previous_frame = None;
        info!("start streaming data");
    }

    /// Copy the frame out under the lock, convert and publish outside it
    fn stream(&mut self) {
        let pulled = {
            let state = lock_state(&self.state);
            let pulled = state.session.buffer().map(|buffer| {
                (
                    FrameSet::pull(buffer, self.settings.requested),
                    buffer.timestamp(),
                )
            });
            pulled
        };

        let (frames, device_stamp) = match pulled {
            Ok(pulled) => pulled,
            Err(e) => {
                warn!(error = %e, "frame buffer unavailable");
                return;
            }
        };

        let stamp = header_stamp(&mut self.stamps, &self.stats, device_stamp);
        debug!(stamp = %stamp, "publishing frame");
        self.publisher
            .streaming(&frames, self.settings.requested, stamp);
    }
}

fn header_stamp(
    stamps: &mut StampReconciler,
    stats: &AcquisitionStats,
    device: DateTime<Utc>,
) -> DateTime<Utc> {
    let (stamp, source) = stamps.reconcile(device, Utc::now());
    if source == StampSource::Local {
        stats.record_time_sync_fallback();
    }
    stamp
}

fn read_unit_vectors<C: DeviceClient>(
    state: &DeviceState<C>,
) -> Result<(RawImage, DateTime<Utc>), DeviceError> {
    let buffer = state.session.buffer()?;
    Ok((buffer.image(ImageKind::UnitVectors)?, buffer.timestamp()))
}
