//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// tofcam - ToF camera acquisition bridge
#[derive(Parser, Debug)]
#[command(
    name = "tofcam",
    author,
    version,
    about = "Time-of-flight camera acquisition bridge",
    long_about = "Acquires frames from a time-of-flight camera, converts them into typed \n\
                  image / point-cloud / extrinsics records and publishes them to the \n\
                  configured sinks. Without hardware it runs against a simulated camera."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TOFCAM_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TOFCAM_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the acquisition bridge
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "TOFCAM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override camera IP address
    #[arg(long, env = "TOFCAM_IP")]
    pub ip: Option<String>,

    /// Override data (PCIC) port
    #[arg(long, env = "TOFCAM_PCIC_PORT")]
    pub pcic_port: Option<u16>,

    /// Override schema mask (bit set, e.g. 10 for amplitude + cartesian)
    #[arg(long, env = "TOFCAM_SCHEMA_MASK")]
    pub schema_mask: Option<u16>,

    /// Override frame-of-reference base name
    #[arg(long, env = "TOFCAM_FRAME_ID_BASE")]
    pub frame_id_base: Option<String>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TOFCAM_METRICS_PORT")]
    pub metrics_port: u16,

    /// Stop after this many seconds (0 = run until Ctrl-C)
    #[arg(long, default_value = "0", env = "TOFCAM_TIMEOUT")]
    pub timeout: u64,

    /// Read commands (dump, config <json>, trigger, soft-on, soft-off) from stdin
    #[arg(long)]
    pub interactive: bool,

    #[command(flatten)]
    pub sim: SimArgs,
}

/// Simulated camera settings
#[derive(Parser, Debug, Clone)]
pub struct SimArgs {
    /// Simulated image width
    #[arg(long = "sim-width", default_value = "224")]
    pub width: u32,

    /// Simulated image height
    #[arg(long = "sim-height", default_value = "172")]
    pub height: u32,

    /// Interval between simulated frames (ms)
    #[arg(long = "sim-frame-period-ms", default_value = "50")]
    pub frame_period_ms: u64,

    /// Frames each grabber delivers before the link stalls
    #[arg(long = "sim-stall-after")]
    pub stall_after: Option<u64>,

    /// Number of initial connect attempts to refuse
    #[arg(long = "sim-fail-connects", default_value = "0")]
    pub fail_connects: u32,

    /// Offset of the simulated device clock (s)
    #[arg(long = "sim-clock-offset-secs", default_value = "0", allow_negative_numbers = true)]
    pub clock_offset_secs: i64,

    /// Emit an RGB (JPEG) stream
    #[arg(long = "sim-rgb")]
    pub rgb: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml", env = "TOFCAM_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "TOFCAM_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
