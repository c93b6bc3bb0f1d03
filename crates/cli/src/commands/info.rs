//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{DriverConfig, SchemaMask, Topic};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    camera: CameraInfo,
    timing: TimingInfo,
    topics: Vec<TopicInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct CameraInfo {
    ip: String,
    xmlrpc_port: u16,
    pcic_port: u16,
    schema_mask: u16,
    frame_id_base: String,
}

#[derive(Serialize)]
struct TimingInfo {
    timeout_millis: u64,
    timeout_tolerance_secs: f64,
    soft_on_timeout_millis: u64,
    soft_on_timeout_tolerance_secs: f64,
    soft_off_timeout_millis: u64,
    soft_off_timeout_tolerance_secs: f64,
    assume_sw_triggered: bool,
    frame_latency_thresh: f64,
}

#[derive(Debug, PartialEq, Serialize)]
struct TopicInfo {
    name: &'static str,
    enabled: bool,
    latched: bool,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = super::load_config(&args.config)?;

    if args.json {
        let info = build_config_info(&config);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config);
    }

    Ok(())
}

/// Topics and whether the mask enables them
///
/// RGB depends on the device actually delivering a stream.
fn topic_table(mask: SchemaMask) -> Vec<TopicInfo> {
    Topic::ALL
        .into_iter()
        .map(|topic| TopicInfo {
            name: topic.as_str(),
            enabled: topic.channel().map_or(true, |channel| mask.contains(channel)),
            latched: topic.is_latched(),
        })
        .collect()
}

fn build_config_info(config: &DriverConfig) -> ConfigInfo {
    let camera = &config.camera;
    let acquisition = &config.acquisition;

    ConfigInfo {
        version: format!("{:?}", config.version),
        camera: CameraInfo {
            ip: camera.ip.clone(),
            xmlrpc_port: camera.xmlrpc_port,
            pcic_port: camera.pcic_port,
            schema_mask: camera.schema_mask.bits(),
            frame_id_base: camera.frame_id_base.clone(),
        },
        timing: TimingInfo {
            timeout_millis: acquisition.timeout_millis,
            timeout_tolerance_secs: acquisition.timeout_tolerance_secs,
            soft_on_timeout_millis: acquisition.soft_on_timeout_millis,
            soft_on_timeout_tolerance_secs: acquisition.soft_on_timeout_tolerance_secs,
            soft_off_timeout_millis: acquisition.soft_off_timeout_millis,
            soft_off_timeout_tolerance_secs: acquisition.soft_off_timeout_tolerance_secs,
            assume_sw_triggered: acquisition.assume_sw_triggered,
            frame_latency_thresh: acquisition.frame_latency_thresh,
        },
        topics: topic_table(camera.schema_mask),
        sinks: config
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
            })
            .collect(),
    }
}

fn print_config_info(config: &DriverConfig) {
    let camera = &config.camera;
    let acquisition = &config.acquisition;
    let ids = camera.frame_ids();

    println!("=== tofcam Configuration ===\n");

    println!("Camera");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Address: {}:{}", camera.ip, camera.xmlrpc_port);
    println!("   ├─ Data port: {}", camera.pcic_port);
    println!("   ├─ Schema mask: {} ({})", camera.schema_mask, camera.schema_mask.bits());
    println!("   └─ Frames: {} / {}", ids.link, ids.optical_link);

    println!("\nTiming");
    println!(
        "   ├─ Streaming: {} ms wait, {} s tolerance",
        acquisition.timeout_millis, acquisition.timeout_tolerance_secs
    );
    println!(
        "   ├─ Soft-on: {} ms wait, {} s tolerance",
        acquisition.soft_on_timeout_millis, acquisition.soft_on_timeout_tolerance_secs
    );
    println!(
        "   ├─ Soft-off: {} ms wait, {} s tolerance",
        acquisition.soft_off_timeout_millis, acquisition.soft_off_timeout_tolerance_secs
    );
    println!("   ├─ Software triggered: {}", acquisition.assume_sw_triggered);
    println!("   └─ Clock skew threshold: {} s", acquisition.frame_latency_thresh);

    let topics = topic_table(camera.schema_mask);
    println!("\nTopics ({})", topics.len());
    for (i, topic) in topics.iter().enumerate() {
        let prefix = if i == topics.len() - 1 { "└─" } else { "├─" };
        let state = if topic.enabled { "on" } else { "off" };
        let latched = if topic.latched { ", latched" } else { "" };
        println!("   {} {} ({}{})", prefix, topic.name, state, latched);
    }

    if !config.sinks.is_empty() {
        println!("\nSinks ({})", config.sinks.len());
        for (i, sink) in config.sinks.iter().enumerate() {
            let prefix = if i == config.sinks.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {} ({:?}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );
        }
    }

    println!();
}
