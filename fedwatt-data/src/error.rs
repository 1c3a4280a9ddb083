//! Error types for the data pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while ingesting, pivoting, or partitioning data
#[derive(Error, Debug)]
pub enum DataError {
    /// The readings file could not be read
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The input has no header row
    #[error("Input has no header row")]
    EmptyInput,

    /// A required column is absent from the header
    #[error("Missing required column: {name}")]
    MissingColumn {
        /// Column name (or prefix) that was looked up
        name: String,
    },

    /// Every row was malformed or the file held no data rows
    #[error("No usable readings after parsing")]
    NoUsableReadings,

    /// Pivoting produced no observations
    #[error("Empty dataset: no home-hour observations")]
    EmptyDataset,

    /// Target vector is not aligned with the feature matrix
    #[error("Target length {targets} does not match {rows} feature rows")]
    MisalignedTarget {
        /// Rows in the feature matrix
        rows: usize,
        /// Entries in the target vector
        targets: usize,
    },

    /// Feature name list is not aligned with the matrix columns
    #[error("Got {names} feature names for {columns} matrix columns")]
    MisalignedNames {
        /// Names supplied
        names: usize,
        /// Columns in the feature matrix
        columns: usize,
    },

    /// Client count is unusable for the dataset size
    #[error("Invalid configuration: cannot split {rows} rows across {clients} clients")]
    InvalidConfiguration {
        /// Requested client count
        clients: u32,
        /// Rows available
        rows: usize,
    },
}
