//! Federated training loop for fedwatt
//!
//! This crate drives the simulation: virtual clients fit private model
//! replicas on disjoint data partitions, the orchestrator aggregates
//! their updates with unweighted FedAvg, and the finished global model
//! is persisted as a validated artifact bundle. Weights only ever move
//! by value, and every round is a full barrier: broadcast, local
//! training, aggregate.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           fedwatt-fl                            │
//! │                                                                 │
//! │   ┌──────────────┐  broadcast   ┌───────────────────────────┐   │
//! │   │ Orchestrator │─────────────▶│ VirtualClient (replicas)  │   │
//! │   │  aggregate() │◀─────────────│ train() + privacy noise   │   │
//! │   └──────┬───────┘   updates    └───────────────────────────┘   │
//! │          │ persist                                              │
//! │          ▼                                                      │
//! │   ┌──────────────┐                                              │
//! │   │ArtifactStore │  weights.fwt + scaler.json + manifest.json   │
//! │   └──────────────┘                                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Local training stays deterministic per (seed, client, round), so the
//! sequential and the threaded round schedule produce identical runs.

pub mod aggregator;
pub mod client;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod privacy;
pub mod store;

// Re-export main types
pub use aggregator::aggregate;
pub use client::{LocalUpdate, VirtualClient};
pub use error::FlError;
pub use metrics::{RoundRecord, TrainingHistory};
pub use orchestrator::{Orchestrator, RoundSchedule};
pub use privacy::apply_privacy_noise;
pub use store::{ArtifactBundle, ArtifactManifest, ArtifactStore, StoreError};
