//! Per-feature standardization
//!
//! The scaling transform is fitted exactly once over the full dataset
//! before partitioning, then shared read-only by every client and by the
//! inference path. Refitting per client would give each federation
//! member its own feature scale and make weight averaging meaningless.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Fitted, invertible per-feature standardization (z-score)
///
/// Statistics are accumulated and stored in `f64`; transformed values
/// stay in the `f32` data plane. A feature with zero variance is passed
/// through unscaled (divisor 1) rather than producing NaN columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingTransform {
    mean: Vec<f64>,
    variance: Vec<f64>,
}

impl ScalingTransform {
    /// Fits per-feature mean and population variance over all rows.
    ///
    /// # Errors
    /// Returns `ModelError::EmptyTrainingSet` if the matrix has no rows
    /// or no columns.
    pub fn fit(features: &Array2<f32>) -> Result<Self, ModelError> {
        let rows = features.nrows();
        let cols = features.ncols();
        if rows == 0 || cols == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }

        let n = rows as f64;
        let mut mean = vec![0.0f64; cols];
        let mut variance = vec![0.0f64; cols];

        for row in features.rows() {
            for (j, &value) in row.iter().enumerate() {
                mean[j] += f64::from(value);
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        for row in features.rows() {
            for (j, &value) in row.iter().enumerate() {
                let delta = f64::from(value) - mean[j];
                variance[j] += delta * delta;
            }
        }
        for v in &mut variance {
            *v /= n;
        }

        Ok(Self { mean, variance })
    }

    /// Returns the number of features the transform was fitted on
    pub fn num_features(&self) -> usize {
        self.mean.len()
    }

    /// Returns the per-feature means
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Returns the per-feature population variances
    pub fn variance(&self) -> &[f64] {
        &self.variance
    }

    /// Divisor used for a feature: stddev, or 1 when the variance is zero
    fn scale(&self, index: usize) -> f64 {
        let sd = self.variance[index].sqrt();
        if sd > 0.0 {
            sd
        } else {
            1.0
        }
    }

    /// Standardizes a full feature matrix.
    ///
    /// # Errors
    /// Returns `ModelError::FeatureCountMismatch` if the column count
    /// differs from the fitted feature count.
    pub fn transform(&self, features: &Array2<f32>) -> Result<Array2<f32>, ModelError> {
        if features.ncols() != self.num_features() {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.num_features(),
                actual: features.ncols(),
            });
        }
        let mut scaled = features.clone();
        for mut row in scaled.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = ((f64::from(*value) - self.mean[j]) / self.scale(j)) as f32;
            }
        }
        Ok(scaled)
    }

    /// Standardizes a single raw feature vector.
    ///
    /// # Errors
    /// Returns `ModelError::FeatureCountMismatch` if the vector length
    /// differs from the fitted feature count.
    pub fn transform_row(&self, row: &[f32]) -> Result<Array1<f32>, ModelError> {
        if row.len() != self.num_features() {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.num_features(),
                actual: row.len(),
            });
        }
        Ok(Array1::from_iter(row.iter().enumerate().map(
            |(j, &value)| ((f64::from(value) - self.mean[j]) / self.scale(j)) as f32,
        )))
    }

    /// Maps a standardized value of one feature back to its raw scale
    pub fn inverse_transform_feature(&self, index: usize, value: f32) -> f32 {
        (f64::from(value) * self.scale(index) + self.mean[index]) as f32
    }
}
