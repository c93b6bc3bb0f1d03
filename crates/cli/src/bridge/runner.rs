//! Bridge runner - wires the driver, the sinks and the console together.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::DriverConfig;
use device_session::{SimulatedCamera, SimulatorConfig};
use driver::CameraDriver;
use tracing::{info, warn};

use super::RunReport;
use crate::console;

/// Bound on draining the sink queues at shutdown
const SINK_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Validated driver configuration
    pub driver: DriverConfig,

    /// Simulated camera behaviour
    pub simulator: SimulatorConfig,

    /// Run time limit (None = until Ctrl-C)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Serve commands from stdin
    pub interactive: bool,
}

/// Runs the camera driver until shutdown
pub struct Bridge {
    config: BridgeConfig,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Run to completion and report
    pub async fn run(self) -> Result<RunReport> {
        let start_time = Instant::now();
        let driver_config = &self.config.driver;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        info!(
            ip = %driver_config.camera.ip,
            pcic_port = driver_config.camera.pcic_port,
            "Running against the simulated camera"
        );
        let camera = SimulatedCamera::new(self.config.simulator.clone());

        let sinks = publisher::create_sinks(&driver_config.sinks);
        let handle = CameraDriver::spawn(camera, driver_config, sinks.output())
            .context("Failed to start camera driver")?;
        let stats = handle.stats();

        let console = self
            .config
            .interactive
            .then(|| tokio::spawn(console::serve(handle.commands())));

        wait_for_stop(self.config.timeout).await;

        info!("Shutting down bridge...");
        if let Some(console) = console {
            console.abort();
        }
        tokio::task::spawn_blocking(move || handle.join())
            .await
            .context("Acquisition thread did not stop cleanly")?;

        if tokio::time::timeout(SINK_DRAIN_TIMEOUT, sinks.shutdown())
            .await
            .is_err()
        {
            warn!("Timed out draining sink queues");
        }

        let report = RunReport {
            duration: start_time.elapsed(),
            acquisition: stats.snapshot(),
            sinks: sinks.metrics(),
        };
        info!(
            duration_secs = report.duration.as_secs_f64(),
            frames = report.acquisition.frames,
            fps = format!("{:.2}", report.fps()),
            "Bridge shutdown complete"
        );
        Ok(report)
    }
}

/// Wait for Ctrl-C, SIGTERM or the run time limit
async fn wait_for_stop(timeout: Option<Duration>) {
    let limit = async {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = shutdown_signal() => warn!("Received shutdown signal, stopping bridge..."),
        _ = limit => info!("Run time limit reached"),
    }
}

/// Ctrl-C and SIGTERM; never resolves if the handlers cannot be installed
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SinkConfig, SinkType};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_with_time_limit() {
        let mut driver = DriverConfig::default();
        driver.acquisition.settle_delay_millis = 0;
        driver.acquisition.retry_backoff_millis = 10;
        driver.sinks = vec![SinkConfig {
            name: "mem".to_string(),
            sink_type: SinkType::Memory,
            queue_capacity: 64,
        }];

        let bridge = Bridge::new(BridgeConfig {
            driver,
            simulator: SimulatorConfig {
                width: 8,
                height: 4,
                frame_period: Duration::from_millis(5),
                ..Default::default()
            },
            timeout: Some(Duration::from_millis(400)),
            metrics_port: None,
            interactive: false,
        });

        let report = bridge.run().await.unwrap();
        assert!(report.acquisition.frames > 0);
        assert_eq!(report.sinks.len(), 1);
        assert!(report.sinks[0].1.published > 0);
        assert_eq!(report.sink_drops(), 0);
    }
}
