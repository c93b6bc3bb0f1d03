//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::DriverConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    ip: String,
    pcic_port: u16,
    schema_mask: u16,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match super::load_config(&args.config) {
        Ok(config) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&config),
            summary: Some(ConfigSummary {
                version: format!("{:?}", config.version),
                ip: config.camera.ip.clone(),
                pcic_port: config.camera.pcic_port,
                schema_mask: config.camera.schema_mask.bits(),
                sink_count: config.sinks.len(),
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("{:#}", e)),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &DriverConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let camera = &config.camera;
    let acquisition = &config.acquisition;

    if config.sinks.is_empty() {
        warnings.push("No sinks configured - records go to the default log sink".to_string());
    }

    if camera.schema_mask.channels().next().is_none() {
        warnings.push(format!(
            "schema_mask {} enables no published channel - only confidence and extrinsics are streamed",
            camera.schema_mask
        ));
    }

    if acquisition.assume_sw_triggered && acquisition.timeout_tolerance_secs < 60.0 {
        warnings.push(
            "assume_sw_triggered with a short timeout_tolerance_secs - idle periods will restart the session"
                .to_string(),
        );
    }

    if acquisition.soft_off_timeout_tolerance_secs < acquisition.timeout_tolerance_secs {
        warnings.push(
            "soft_off_timeout_tolerance_secs is below the streaming tolerance - soft-off will trigger restarts"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Camera: {} (data port {})", summary.ip, summary.pcic_port);
            println!("  Schema mask: {}", summary.schema_mask);
            println!("  Sinks: {}", summary.sink_count);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
