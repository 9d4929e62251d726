//! Application errors.

use std::path::PathBuf;

use boltlock_core::ConfigError;
use thiserror::Error;

/// Errors from the runtime and the binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Console or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for a device configuration.
    #[error("invalid config file {path}: {source}")]
    ConfigFile {
        /// File that failed to parse
        path: PathBuf,
        /// Parser error
        source: serde_json::Error,
    },

    /// The configuration was rejected by the device.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Output could not be serialized.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
