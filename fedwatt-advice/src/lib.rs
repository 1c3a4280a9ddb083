//! Rule-based energy saving advice for fedwatt
//!
//! Turns a z-scored usage row into concrete, per-appliance saving
//! actions. The scores come straight out of the shared scaling
//! transform, so "above average" always means above the average of the
//! population the federated model was trained on. Context columns
//! (temperature, household size) are excluded from advice.

pub mod engine;
pub mod error;
pub mod report;

// Re-export main types
pub use engine::analyze;
pub use error::AdviceError;
pub use report::{AdviceReport, AdviceSeverity, ApplianceFinding};
