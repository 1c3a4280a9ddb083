//! Unweighted federated averaging
//!
//! Aggregation is plain FedAvg without sample weighting: every client
//! update counts equally regardless of partition size. Updates are
//! validated against the global template before any arithmetic, so a
//! malformed update is reported by batch position instead of corrupting
//! the mean.

use fedwatt_model::{ShapeSignature, WeightSet};
use tracing::debug;

use crate::error::FlError;

/// Computes the element-wise unweighted mean of the client updates.
///
/// Every update must match `template` tensor-for-tensor; the first
/// mismatch is reported with its position in the batch. An empty batch
/// is an error rather than a silent identity.
pub fn aggregate(template: &ShapeSignature, updates: &[WeightSet]) -> Result<WeightSet, FlError> {
    if updates.is_empty() {
        return Err(FlError::EmptyClientSet);
    }

    for (index, update) in updates.iter().enumerate() {
        update
            .check_signature(template)
            .map_err(|source| FlError::IncompatibleUpdate { index, source })?;
    }

    let mut sum = WeightSet::zeros(template);
    for update in updates {
        sum = sum.add(update)?;
    }

    debug!(updates = updates.len(), "aggregated client updates");
    Ok(sum.scale(1.0 / updates.len() as f32))
}
