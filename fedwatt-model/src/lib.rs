//! Energy regressor model and weight plumbing for fedwatt
//!
//! This crate provides everything the federation treats as "the model":
//! the dense regressor itself, the strongly-typed weight containers that
//! travel between orchestrator, clients, and aggregator, and the
//! fitted-once feature scaling shared by training and inference.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         fedwatt-model                           │
//! │  ┌───────────────┐  ┌────────────────┐  ┌───────────────────┐  │
//! │  │ MlpRegressor  │  │ WeightSet      │  │ ScalingTransform  │  │
//! │  │ - Trainable   │  │ - WeightTensor │  │ - fit once        │  │
//! │  │ - Adam / MSE  │  │ - ShapeSig     │  │ - z-score         │  │
//! │  │ - predict     │  │ - scale/add    │  │ - inverse         │  │
//! │  └───────────────┘  └────────────────┘  └───────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The federation logic in `fedwatt-fl` depends only on the [`Trainable`]
//! trait and the weight containers; the regressor internals are opaque
//! to it.

pub mod error;
pub mod network;
pub mod scaling;
pub mod shape;
pub mod weights;

// Re-export main types
pub use error::ModelError;
pub use network::{FitOptions, MlpRegressor, Trainable};
pub use scaling::ScalingTransform;
pub use shape::{ShapeSignature, TensorShape};
pub use weights::{WeightSet, WeightTensor};
