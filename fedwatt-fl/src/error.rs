//! Error types for the federated training loop

use fedwatt_common::ClientId;
use fedwatt_data::DataError;
use fedwatt_model::ModelError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while running a federated simulation
#[derive(Error, Debug)]
pub enum FlError {
    /// Aggregation was requested with no client updates
    #[error("Cannot aggregate an empty set of client updates")]
    EmptyClientSet,

    /// A client update does not match the aggregation template
    #[error("Client update {index} is incompatible with the aggregation template: {source}")]
    IncompatibleUpdate {
        /// Position of the offending update in the aggregation batch
        index: usize,
        /// Underlying shape error
        source: ModelError,
    },

    /// A client failed during local training or weight installation
    #[error("{client} failed: {source}")]
    Client {
        /// The client that failed
        client: ClientId,
        /// Underlying model error
        source: ModelError,
    },

    /// Training produced a non-finite loss or non-finite weights
    #[error("Numeric instability in round {round}: {reason}")]
    NumericInstability {
        /// Round in which the instability was detected (1-based)
        round: u32,
        /// What went non-finite
        reason: String,
    },

    /// A round ran past the configured time limit
    #[error("Round {round} exceeded the {limit_secs}s time limit")]
    RoundTimedOut {
        /// Round that timed out (1-based)
        round: u32,
        /// Configured limit in seconds
        limit_secs: u64,
    },

    /// A training worker thread panicked
    #[error("A training worker panicked in round {round}")]
    WorkerPanicked {
        /// Round in which the panic occurred (1-based)
        round: u32,
    },

    /// Model error outside any single client
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Data pipeline error
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Artifact persistence error
    #[error("Artifact store error: {0}")]
    Store(#[from] StoreError),
}
