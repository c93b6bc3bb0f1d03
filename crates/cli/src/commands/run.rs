//! `run` command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::TimeDelta;
use contracts::{DriverConfig, SchemaMask};
use device_session::SimulatorConfig;
use tracing::info;

use crate::bridge::{Bridge, BridgeConfig};
use crate::cli::{RunArgs, SimArgs};

/// Execute the `run` command
pub async fn run_bridge(args: &RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            super::load_config(path)?
        }
        None => {
            info!("No configuration file given, using defaults");
            DriverConfig::default()
        }
    };

    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config)
        .context("Configuration invalid after command-line overrides")?;

    info!(
        ip = %config.camera.ip,
        pcic_port = config.camera.pcic_port,
        mask = %config.camera.schema_mask,
        frame_id_base = %config.camera.frame_id_base,
        sinks = config.sinks.len(),
        "Configuration loaded"
    );

    let bridge = Bridge::new(BridgeConfig {
        driver: config,
        simulator: simulator_config(&args.sim),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
        interactive: args.interactive,
    });

    info!("Starting bridge...");
    let report = bridge.run().await.context("Bridge execution failed")?;
    report.print_summary();

    info!("tofcam finished");
    Ok(())
}

/// Apply command-line overrides on top of the file configuration
fn apply_overrides(config: &mut DriverConfig, args: &RunArgs) {
    if let Some(ref ip) = args.ip {
        info!(ip = %ip, "Overriding camera IP from CLI");
        config.camera.ip = ip.clone();
    }
    if let Some(port) = args.pcic_port {
        info!(port, "Overriding data port from CLI");
        config.camera.pcic_port = port;
    }
    if let Some(bits) = args.schema_mask {
        let mask = SchemaMask::from_bits(bits);
        info!(mask = %mask, "Overriding schema mask from CLI");
        config.camera.schema_mask = mask;
    }
    if let Some(ref base) = args.frame_id_base {
        info!(frame_id_base = %base, "Overriding frame id base from CLI");
        config.camera.frame_id_base = base.clone();
    }
}

fn simulator_config(sim: &SimArgs) -> SimulatorConfig {
    SimulatorConfig {
        width: sim.width,
        height: sim.height,
        frame_period: Duration::from_millis(sim.frame_period_ms),
        fail_connects: sim.fail_connects,
        stall_after: sim.stall_after,
        clock_offset: TimeDelta::seconds(sim.clock_offset_secs),
        rgb: sim.rgb,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn run_args(extra: &[&str]) -> RunArgs {
        let argv = ["tofcam", "run"].iter().chain(extra.iter());
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_overrides_applied() {
        let args = run_args(&[
            "--ip",
            "10.1.2.3",
            "--pcic-port",
            "50012",
            "--schema-mask",
            "1",
            "--frame-id-base",
            "front",
        ]);
        let mut config = DriverConfig::default();
        apply_overrides(&mut config, &args);

        assert_eq!(config.camera.ip, "10.1.2.3");
        assert_eq!(config.camera.pcic_port, 50012);
        assert_eq!(config.camera.schema_mask, SchemaMask::IMG_RDIS);
        assert_eq!(config.camera.frame_ids().link, "front_link");
    }

    #[test]
    fn test_no_overrides_keeps_file_values() {
        let args = run_args(&[]);
        let mut config = DriverConfig::default();
        config.camera.ip = "172.16.0.9".to_string();
        apply_overrides(&mut config, &args);
        assert_eq!(config.camera.ip, "172.16.0.9");
        assert_eq!(config.camera.schema_mask, SchemaMask::DEFAULT);
    }

    #[test]
    fn test_simulator_config_from_flags() {
        let args = run_args(&["--sim-stall-after", "10", "--sim-rgb", "--sim-clock-offset-secs", "90"]);
        let sim = simulator_config(&args.sim);
        assert_eq!(sim.stall_after, Some(10));
        assert!(sim.rgb);
        assert_eq!(sim.clock_offset, TimeDelta::seconds(90));
        assert_eq!(sim.frame_period, Duration::from_millis(50));
    }
}
