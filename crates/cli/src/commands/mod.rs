//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_bridge;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::DriverConfig;

use crate::error::CliError;

/// Load and validate a configuration file
fn load_config(path: &Path) -> Result<DriverConfig> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
