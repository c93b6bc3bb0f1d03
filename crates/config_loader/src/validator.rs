//! Configuration validation
//!
//! Rules:
//! - camera address and frame id base are non-empty
//! - ports are non-zero
//! - timeouts, tolerances and the latency threshold are positive
//! - sink names are non-empty and unique, queue capacities positive

use std::collections::HashSet;

use contracts::{AcquisitionConfig, CameraConfig, ContractError, DriverConfig, SinkConfig};

/// Validate a DriverConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &DriverConfig) -> Result<(), ContractError> {
    validate_camera(&config.camera)?;
    validate_acquisition(&config.acquisition)?;
    validate_sinks(&config.sinks)?;
    Ok(())
}

fn validate_camera(camera: &CameraConfig) -> Result<(), ContractError> {
    if camera.ip.trim().is_empty() {
        return Err(ContractError::config_validation(
            "camera.ip",
            "ip cannot be empty",
        ));
    }
    if camera.xmlrpc_port == 0 {
        return Err(ContractError::config_validation(
            "camera.xmlrpc_port",
            "port must be > 0",
        ));
    }
    if camera.pcic_port == 0 {
        return Err(ContractError::config_validation(
            "camera.pcic_port",
            "port must be > 0",
        ));
    }
    if camera.frame_id_base.trim().is_empty() {
        return Err(ContractError::config_validation(
            "camera.frame_id_base",
            "frame_id_base cannot be empty",
        ));
    }
    Ok(())
}

fn validate_acquisition(acq: &AcquisitionConfig) -> Result<(), ContractError> {
    let timeouts = [
        ("acquisition.timeout_millis", acq.timeout_millis),
        ("acquisition.soft_on_timeout_millis", acq.soft_on_timeout_millis),
        ("acquisition.soft_off_timeout_millis", acq.soft_off_timeout_millis),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            return Err(ContractError::config_validation(
                field,
                "timeout must be > 0",
            ));
        }
    }

    let seconds = [
        ("acquisition.timeout_tolerance_secs", acq.timeout_tolerance_secs),
        (
            "acquisition.soft_on_timeout_tolerance_secs",
            acq.soft_on_timeout_tolerance_secs,
        ),
        (
            "acquisition.soft_off_timeout_tolerance_secs",
            acq.soft_off_timeout_tolerance_secs,
        ),
        ("acquisition.frame_latency_thresh", acq.frame_latency_thresh),
    ];
    for (field, value) in seconds {
        // also rejects NaN
        if !(value > 0.0 && value.is_finite()) {
            return Err(ContractError::config_validation(
                field,
                format!("must be a positive number of seconds, got {value}"),
            ));
        }
    }
    Ok(())
}

fn validate_sinks(sinks: &[SinkConfig]) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(&sink.name) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SinkType;

    fn minimal_config() -> DriverConfig {
        DriverConfig {
            sinks: vec![SinkConfig {
                name: "log".into(),
                sink_type: SinkType::Log,
                queue_capacity: 16,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn test_empty_ip() {
        let mut config = minimal_config();
        config.camera.ip = "  ".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("ip cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_zero_pcic_port() {
        let mut config = minimal_config();
        config.camera.pcic_port = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("camera.pcic_port"), "got: {err}");
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = minimal_config();
        config.acquisition.soft_on_timeout_millis = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("soft_on_timeout_millis"), "got: {err}");
    }

    #[test]
    fn test_negative_tolerance() {
        let mut config = minimal_config();
        config.acquisition.timeout_tolerance_secs = -1.0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("timeout_tolerance_secs"), "got: {err}");
    }

    #[test]
    fn test_nan_latency_threshold() {
        let mut config = minimal_config();
        config.acquisition.frame_latency_thresh = f64::NAN;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_frame_id_base() {
        let mut config = minimal_config();
        config.camera.frame_id_base = String::new();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("frame_id_base"), "got: {err}");
    }

    #[test]
    fn test_duplicate_sink_name() {
        let mut config = minimal_config();
        config.sinks.push(config.sinks[0].clone());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("duplicate sink name"), "got: {err}");
    }

    #[test]
    fn test_empty_sink_name() {
        let mut config = minimal_config();
        config.sinks[0].name = String::new();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_zero_queue_capacity() {
        let mut config = minimal_config();
        config.sinks[0].queue_capacity = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("queue_capacity"), "got: {err}");
    }
}
