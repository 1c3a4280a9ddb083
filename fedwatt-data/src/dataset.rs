//! Assembled training dataset

use ndarray::{Array1, Array2};

use crate::error::DataError;

/// Raw (unscaled) observation matrix with its aligned target and
/// feature names
///
/// One row per home-hour observation; the target holds the summed
/// appliance energy for that observation. Feature scaling is applied
/// downstream, after this structure is built and before partitioning.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Array2<f32>,
    target: Array1<f32>,
    feature_names: Vec<String>,
}

impl Dataset {
    /// Bundles a feature matrix, target vector, and feature names.
    ///
    /// # Errors
    /// Returns `DataError::EmptyDataset` for a rowless matrix,
    /// `DataError::MisalignedTarget` or `DataError::MisalignedNames`
    /// when the pieces disagree in size.
    pub fn new(
        features: Array2<f32>,
        target: Array1<f32>,
        feature_names: Vec<String>,
    ) -> Result<Self, DataError> {
        if features.nrows() == 0 {
            return Err(DataError::EmptyDataset);
        }
        if target.len() != features.nrows() {
            return Err(DataError::MisalignedTarget {
                rows: features.nrows(),
                targets: target.len(),
            });
        }
        if feature_names.len() != features.ncols() {
            return Err(DataError::MisalignedNames {
                names: feature_names.len(),
                columns: features.ncols(),
            });
        }
        Ok(Self {
            features,
            target,
            feature_names,
        })
    }

    /// Returns the feature matrix, one row per observation
    pub fn features(&self) -> &Array2<f32> {
        &self.features
    }

    /// Returns the target vector, aligned by row index
    pub fn target(&self) -> &Array1<f32> {
        &self.target
    }

    /// Returns the feature names in column order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Returns the number of observations
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// Returns true if the dataset holds no observations
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of features per observation
    pub fn num_features(&self) -> usize {
        self.features.ncols()
    }

    /// Replaces the feature matrix, keeping target and names.
    ///
    /// Used to swap in the standardized matrix after scaling.
    ///
    /// # Errors
    /// Returns `DataError::MisalignedTarget` if the new matrix changes
    /// the row count, or `DataError::MisalignedNames` if it changes the
    /// column count.
    pub fn with_features(self, features: Array2<f32>) -> Result<Self, DataError> {
        if features.nrows() != self.target.len() {
            return Err(DataError::MisalignedTarget {
                rows: features.nrows(),
                targets: self.target.len(),
            });
        }
        if features.ncols() != self.feature_names.len() {
            return Err(DataError::MisalignedNames {
                names: self.feature_names.len(),
                columns: features.ncols(),
            });
        }
        Ok(Self { features, ..self })
    }
}
