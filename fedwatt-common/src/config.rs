//! Configuration structures for the fedwatt simulator
//!
//! This module provides the YAML-backed configuration for a simulation
//! run: dataset location, federation shape (clients, rounds, epochs),
//! model hyperparameters, the privacy-noise toggle, and artifact output.
//!
//! All sections have sensible defaults so a minimal configuration file
//! (or none at all) produces a runnable simulation.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Dataset ingestion configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Path to the household readings CSV
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/households.csv"),
        }
    }
}

/// Federation shape: how many clients train for how long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Number of virtual clients the dataset is partitioned across
    #[serde(default = "default_clients")]
    pub clients: u32,
    /// Number of federated rounds (broadcast, local train, aggregate)
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    /// Local training epochs per client per round
    #[serde(default = "default_local_epochs")]
    pub local_epochs: u32,
    /// Mini-batch size for local gradient steps
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Master seed; every client derives its stream from (seed, client, round)
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Run the clients of a round on worker threads instead of sequentially
    #[serde(default)]
    pub parallel: bool,
    /// Per-round wall-clock budget in seconds (0 = unbounded)
    #[serde(default)]
    pub round_timeout_secs: u64,
}

fn default_clients() -> u32 {
    5
}

fn default_rounds() -> u32 {
    5
}

fn default_local_epochs() -> u32 {
    3
}

fn default_batch_size() -> usize {
    32
}

fn default_seed() -> u64 {
    42
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            clients: default_clients(),
            rounds: default_rounds(),
            local_epochs: default_local_epochs(),
            batch_size: default_batch_size(),
            seed: default_seed(),
            parallel: false,
            round_timeout_secs: 0,
        }
    }
}

/// Model hyperparameters for the energy regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Hidden layer widths, input to output order
    #[serde(default = "default_hidden_layers")]
    pub hidden_layers: Vec<usize>,
    /// Adam learning rate
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
}

fn default_hidden_layers() -> Vec<usize> {
    vec![64, 32]
}

fn default_learning_rate() -> f32 {
    0.001
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden_layers: default_hidden_layers(),
            learning_rate: default_learning_rate(),
        }
    }
}

/// Local differential-privacy noise applied to client updates.
///
/// When enabled, every client perturbs its trained weights with zero-mean
/// Gaussian noise of standard deviation `sigma` before submitting them.
/// `sigma = 0` degenerates to exact federated averaging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacyConfig {
    /// Whether clients noise their updates before submission
    #[serde(default)]
    pub enabled: bool,
    /// Standard deviation of the per-element Gaussian perturbation
    #[serde(default = "default_sigma")]
    pub sigma: f32,
}

fn default_sigma() -> f32 {
    0.01
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sigma: default_sigma(),
        }
    }
}

/// Where the trained artifact set (weights, scaler, manifest) is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Output directory for the artifact set
    pub dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (`trace`, `debug`, `info`, `warn`, `error`);
    /// `RUST_LOG` overrides it
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
        }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimConfig {
    /// Dataset ingestion
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// Federation shape
    #[serde(default)]
    pub federation: FederationConfig,
    /// Model hyperparameters
    #[serde(default)]
    pub model: ModelConfig,
    /// Privacy-noise toggle
    #[serde(default)]
    pub privacy: PrivacyConfig,
    /// Artifact output
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimConfig {
    /// Parses a simulation configuration from a YAML string.
    ///
    /// # Errors
    /// Returns `Error::YamlParse` if the YAML is malformed.
    ///
    /// # Example
    /// ```
    /// use fedwatt_common::SimConfig;
    ///
    /// let yaml = r#"
    /// federation:
    ///   clients: 3
    ///   rounds: 2
    /// "#;
    ///
    /// let config = SimConfig::from_yaml(yaml).unwrap();
    /// assert_eq!(config.federation.clients, 3);
    /// assert_eq!(config.federation.local_epochs, 3); // default
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a simulation configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, or
    /// `Error::YamlParse` if it does not parse.
    ///
    /// # Example
    /// ```no_run
    /// use fedwatt_common::SimConfig;
    ///
    /// let config = SimConfig::from_yaml_file("config/sim.yaml").unwrap();
    /// ```
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Serializes the configuration to a YAML string.
    ///
    /// # Errors
    /// Returns `Error::YamlParse` on serialization failure.
    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validates the configuration, failing fast on values the simulator
    /// cannot run with.
    ///
    /// # Errors
    /// Returns `Error::Config` naming the offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.federation.clients == 0 {
            return Err(Error::Config(String::from(
                "federation.clients must be at least 1",
            )));
        }
        if self.federation.rounds == 0 {
            return Err(Error::Config(String::from(
                "federation.rounds must be at least 1",
            )));
        }
        if self.federation.local_epochs == 0 {
            return Err(Error::Config(String::from(
                "federation.local_epochs must be at least 1",
            )));
        }
        if self.federation.batch_size == 0 {
            return Err(Error::Config(String::from(
                "federation.batch_size must be at least 1",
            )));
        }
        if !self.model.learning_rate.is_finite() || self.model.learning_rate <= 0.0 {
            return Err(Error::Config(format!(
                "model.learning_rate must be a positive finite value (got {})",
                self.model.learning_rate
            )));
        }
        if self.model.hidden_layers.iter().any(|&w| w == 0) {
            return Err(Error::Config(String::from(
                "model.hidden_layers entries must be at least 1",
            )));
        }
        if !self.privacy.sigma.is_finite() || self.privacy.sigma < 0.0 {
            return Err(Error::Config(format!(
                "privacy.sigma must be a non-negative finite value (got {})",
                self.privacy.sigma
            )));
        }
        Ok(())
    }
}

impl fmt::Display for SimConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} clients, {} rounds x {} epochs, batch {}, seed {}, privacy {}",
            self.federation.clients,
            self.federation.rounds,
            self.federation.local_epochs,
            self.federation.batch_size,
            self.federation.seed,
            if self.privacy.enabled {
                format!("on (sigma {})", self.privacy.sigma)
            } else {
                String::from("off")
            }
        )
    }
}
