//! Error types for model operations
//!
//! This module defines the errors raised by weight manipulation, feature
//! scaling, and local training. Federation-level errors wrap these.

use thiserror::Error;

use crate::shape::{ShapeSignature, TensorShape};

/// Errors raised by weight containers and the trainable model
#[derive(Error, Debug)]
pub enum ModelError {
    /// Weight sequences disagree in structure
    #[error("Weight shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Shape signature the operation expected
        expected: ShapeSignature,
        /// Shape signature actually supplied
        actual: ShapeSignature,
    },

    /// Tensor data length does not match its declared shape
    #[error("Invalid tensor: shape {shape} holds {expected} elements, got {actual}")]
    InvalidTensor {
        /// Declared shape
        shape: TensorShape,
        /// Element count the shape implies
        expected: usize,
        /// Element count actually supplied
        actual: usize,
    },

    /// Input row width does not match the fitted feature count
    #[error("Feature count mismatch: expected {expected}, got {actual}")]
    FeatureCountMismatch {
        /// Feature count the model or transform was built for
        expected: usize,
        /// Feature count actually supplied
        actual: usize,
    },

    /// Feature matrix and target vector differ in length
    #[error("Sample count mismatch: {features} feature rows vs {targets} targets")]
    SampleCountMismatch {
        /// Rows in the feature matrix
        features: usize,
        /// Entries in the target vector
        targets: usize,
    },

    /// Training or fitting was given no samples
    #[error("Empty training set")]
    EmptyTrainingSet,

    /// Loss diverged to NaN or infinity during training
    #[error("Non-finite loss {loss} at epoch {epoch}")]
    NonFiniteLoss {
        /// Zero-based epoch index where the divergence was observed
        epoch: u32,
        /// The offending loss value
        loss: f32,
    },
}
