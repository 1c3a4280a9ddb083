//! Data pipeline for fedwatt
//!
//! Turns the raw household readings CSV into the training inputs the
//! federation consumes, in three deterministic steps:
//!
//! 1. **Ingest** ([`readings`]): explode list-packed CSV rows into
//!    individual appliance readings.
//! 2. **Pivot** ([`pivot`]): group readings into one observation per
//!    home-hour, appliance columns plus context columns, and derive the
//!    total-energy target.
//! 3. **Partition** ([`partition`]): slice the observations into
//!    contiguous, disjoint per-client datasets.
//!
//! Feature scaling lives in `fedwatt-model`; it is applied between the
//! pivot and partition steps so every client sees the same feature
//! scale.

pub mod dataset;
pub mod error;
pub mod partition;
pub mod pivot;
pub mod readings;

// Re-export main types
pub use dataset::Dataset;
pub use error::DataError;
pub use partition::{partition_dataset, ClientPartition};
pub use pivot::{build_dataset, SIZE_FEATURE, TEMP_FEATURE};
pub use readings::{load_readings, parse_readings, ApplianceReading};
