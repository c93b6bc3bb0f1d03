//! Driver assembly and the acquisition thread handle

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use contracts::{DriverConfig, OutputSink};
use device_session::{DeviceClient, Endpoint, SessionManager};
use tracing::{info, warn};

use crate::acquisition::{AcquisitionLoop, LoopSettings};
use crate::commands::CommandHandlers;
use crate::error::DriverError;
use crate::publish::Publisher;
use crate::retry::ShutdownSignal;
use crate::state::DeviceState;
use crate::stats::AcquisitionStats;
use crate::timing::{ActiveTiming, TimingRegimes};

/// Name of the acquisition thread
const THREAD_NAME: &str = "tofcam-acquisition";

/// Entry point wiring a device client to an output sink
pub struct CameraDriver;

impl CameraDriver {
    /// Build the shared state and start the acquisition thread
    ///
    /// `config` is expected to be validated already.
    pub fn spawn<C: DeviceClient>(
        client: C,
        config: &DriverConfig,
        sink: Arc<dyn OutputSink>,
    ) -> Result<DriverHandle<C>, DriverError> {
        let camera = &config.camera;
        let acquisition = &config.acquisition;

        let endpoint = Endpoint::new(&camera.ip, camera.xmlrpc_port, &camera.password);
        let session = SessionManager::new(client, endpoint, acquisition.settle_delay());
        let regimes = TimingRegimes::from_config(acquisition);
        let timing = ActiveTiming::initial(&regimes, acquisition);
        let state = Arc::new(Mutex::new(DeviceState::new(session, timing)));

        let stats = Arc::new(AcquisitionStats::new());
        let shutdown = ShutdownSignal::new();
        let commands = Arc::new(CommandHandlers::new(
            state.clone(),
            regimes,
            camera.pcic_port,
        ));

        let publisher = Publisher::new(sink, camera.frame_ids(), stats.clone());
        let settings = LoopSettings {
            requested: camera.schema_mask,
            data_port: camera.pcic_port,
            retry_backoff: acquisition.retry_backoff(),
            frame_latency_thresh: acquisition.frame_latency_thresh,
        };
        let acquisition_loop =
            AcquisitionLoop::new(state, publisher, settings, shutdown.clone(), stats.clone());

        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || acquisition_loop.run())?;

        info!(
            ip = %camera.ip,
            pcic_port = camera.pcic_port,
            mask = %camera.schema_mask,
            "camera driver started"
        );

        Ok(DriverHandle {
            commands,
            stats,
            shutdown,
            thread: Some(thread),
        })
    }
}

/// Owns the acquisition thread; stops it on drop
pub struct DriverHandle<C: DeviceClient> {
    commands: Arc<CommandHandlers<C>>,
    stats: Arc<AcquisitionStats>,
    shutdown: ShutdownSignal,
    thread: Option<JoinHandle<()>>,
}

impl<C: DeviceClient> DriverHandle<C> {
    /// Command surface, shareable with any thread
    pub fn commands(&self) -> Arc<CommandHandlers<C>> {
        self.commands.clone()
    }

    pub fn stats(&self) -> Arc<AcquisitionStats> {
        self.stats.clone()
    }

    /// Request the acquisition loop to stop
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Stop the loop and wait until the session is released
    pub fn join(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.shutdown.trigger();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("acquisition thread panicked");
            }
        }
    }
}

impl<C: DeviceClient> Drop for DriverHandle<C> {
    fn drop(&mut self) {
        self.stop();
    }
}
