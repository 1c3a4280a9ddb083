//! Common infrastructure for the fedwatt federated-learning simulator
//!
//! This crate carries everything the other fedwatt crates share:
//! configuration structures (loaded from YAML), the base error type,
//! logging initialization, and identifier newtypes.
//!
//! # Architecture
//!
//! ```text
//! fedwatt-sim / fedwatt-cli (binaries)
//!         |
//!         v
//! fedwatt-fl --- fedwatt-advice
//!     |    \
//!     v     v
//! fedwatt-data  fedwatt-model
//!         \      /
//!          v    v
//!       fedwatt-common   (this crate)
//! ```

pub mod config;
pub mod error;
pub mod ids;
pub mod logging;

pub use config::{
    ArtifactConfig, DatasetConfig, FederationConfig, LoggingConfig, ModelConfig, PrivacyConfig,
    SimConfig,
};
pub use error::Error;
pub use ids::ClientId;
pub use logging::{init_logging, init_logging_with_filter, LogLevel};
