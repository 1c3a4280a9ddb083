//! Error types for the shared fedwatt infrastructure
//!
//! Crate-specific failure modes (shape mismatches, numeric instability,
//! malformed datasets) live in their own crates; this enum only covers
//! configuration loading and validation.

use thiserror::Error;

/// Errors raised while loading or validating a simulation config
#[derive(Debug, Error)]
pub enum Error {
    /// A config value the simulator cannot run with
    #[error("Config error: {0}")]
    Config(String),

    /// The config file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid YAML
    #[error("Malformed YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}
