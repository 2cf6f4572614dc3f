// Path: crates/agent/src/config.rs
//! Loading of `witness.toml`.

use std::path::Path;
use witness_types::error::ConfigError;

pub use witness_types::config::{NotificationIdentities, WitnessConfig};

/// Reads and parses the agent configuration file.
///
/// Validation is a separate step ([`WitnessConfig::validate`]) so callers can
/// report parse and policy errors differently.
pub fn load_config(path: &Path) -> Result<WitnessConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
    toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
}
