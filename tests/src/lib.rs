//! Integration test framework for fedwatt
#![allow(missing_docs)]
//!
//! This crate exercises the fedwatt workspace the way the `fw-sim` and
//! `fw-cli` binaries drive it: readings file in, federated rounds in the
//! middle, persisted artifact bundle and predictions out.
//!
//! # Components
//!
//! - [`test_fixtures`] - Readings CSV generator, synthetic datasets, and
//!   a federation builder
//! - [`test_utils`] - Utility functions for test setup
//!
//! # Test Categories
//!
//! 1. **Pipeline Tests** - Readings CSV through training to a reloaded
//!    predictor, including artifact corruption handling
//! 2. **Federation Tests** - Round-loop reproducibility, schedule
//!    equivalence, broadcast alignment, partitioning, and the privacy
//!    toggle

pub mod e2e_pipeline;
pub mod federation_rounds;
pub mod test_fixtures;
pub mod test_utils;

pub use test_fixtures::{
    readings_csv, synthetic_dataset, scaled_dataset_from_csv, write_readings_csv,
    TestFederation, READINGS_HEADER,
};
pub use test_utils::init_test_logging;
