//! Configuration parsing
//!
//! TOML (primary) and JSON formats.

use contracts::{ContractError, DriverConfig};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<DriverConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<DriverConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<DriverConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SchemaMask, SinkType};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[camera]
ip = "10.0.0.2"
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.camera.ip, "10.0.0.2");
        assert_eq!(config.camera.pcic_port, 50010);
    }

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
[camera]
ip = "192.168.0.69"
xmlrpc_port = 80
pcic_port = 50012
schema_mask = 9
frame_id_base = "front"

[acquisition]
timeout_millis = 250
timeout_tolerance_secs = 2.5
assume_sw_triggered = true
soft_off_timeout_tolerance_secs = 900.0

[[sinks]]
name = "log"
sink_type = "log"
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.camera.pcic_port, 50012);
        assert_eq!(
            config.camera.schema_mask,
            SchemaMask::IMG_RDIS | SchemaMask::IMG_CART
        );
        assert_eq!(config.acquisition.timeout_millis, 250);
        assert!(config.acquisition.assume_sw_triggered);
        assert_eq!(config.acquisition.soft_on_timeout_millis, 500);
        assert_eq!(config.sinks.len(), 1);
        assert_eq!(config.sinks[0].sink_type, SinkType::Log);
        assert_eq!(config.sinks[0].queue_capacity, 16);
    }

    #[test]
    fn test_parse_json() {
        let content = r#"{"camera": {"frame_id_base": "rear"}}"#;
        let config = parse_json(content).unwrap();
        assert_eq!(config.camera.frame_id_base, "rear");
    }

    #[test]
    fn test_parse_toml_invalid() {
        let result = parse_toml("[camera\nip = ");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_unknown_sink_type_rejected() {
        let content = r#"
[[sinks]]
name = "x"
sink_type = "carrier_pigeon"
"#;
        assert!(parse_toml(content).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
