//! Error types for the advice engine

use thiserror::Error;

/// Errors that can occur while analyzing a usage row
#[derive(Error, Debug)]
pub enum AdviceError {
    /// The scaled row and the feature names disagree in length
    #[error("Row has {values} values but {names} feature names")]
    MisalignedRow {
        /// Number of scaled values in the row
        values: usize,
        /// Number of feature names
        names: usize,
    },
}
