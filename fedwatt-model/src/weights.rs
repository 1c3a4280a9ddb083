//! Model weight containers
//!
//! Weights travel through the federation as plain values: the
//! orchestrator hands a copy to every client at broadcast, clients hand
//! trained copies back, and the aggregator folds them into a new global
//! set. [`WeightSet`] keeps the tensors strongly typed so every one of
//! those hand-offs can be shape-checked.

use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::shape::{ShapeSignature, TensorShape};

/// A single weight tensor with its shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTensor {
    shape: TensorShape,
    data: Vec<f32>,
}

impl WeightTensor {
    /// Creates a tensor from a shape and flattened row-major data.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidTensor` if the data length does not
    /// match the shape's element count.
    pub fn new(shape: impl Into<TensorShape>, data: Vec<f32>) -> Result<Self, ModelError> {
        let shape = shape.into();
        let expected = shape.num_elements();
        if data.len() != expected {
            return Err(ModelError::InvalidTensor {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Creates a zero-filled tensor of the given shape
    pub fn zeros(shape: impl Into<TensorShape>) -> Self {
        let shape = shape.into();
        let size = shape.num_elements();
        Self {
            shape,
            data: vec![0.0; size],
        }
    }

    /// Returns the shape of the tensor
    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    /// Returns the flattened row-major data
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the tensor has no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if every element is finite
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// Scales every element by a factor (for federated averaging)
    pub fn scale(&self, factor: f32) -> Self {
        Self {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| x * factor).collect(),
        }
    }

    /// Applies a function to every element, preserving the shape
    pub fn map_elements(&self, mut f: impl FnMut(f32) -> f32) -> Self {
        Self {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Adds two tensors element-wise (for federated averaging).
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the shapes differ.
    pub fn add(&self, other: &WeightTensor) -> Result<Self, ModelError> {
        if self.shape != other.shape {
            return Err(ModelError::ShapeMismatch {
                expected: ShapeSignature::new(vec![self.shape.clone()]),
                actual: ShapeSignature::new(vec![other.shape.clone()]),
            });
        }
        let sum: Vec<f32> = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| a + b)
            .collect();
        Ok(Self {
            shape: self.shape.clone(),
            data: sum,
        })
    }

    /// Views a rank-2 tensor as an ndarray matrix
    pub fn to_array2(&self) -> Option<Array2<f32>> {
        if self.shape.rank() != 2 {
            return None;
        }
        let dims = self.shape.dims();
        Array2::from_shape_vec((dims[0], dims[1]), self.data.clone()).ok()
    }

    /// Views a rank-1 tensor as an ndarray vector
    pub fn to_array1(&self) -> Option<Array1<f32>> {
        if self.shape.rank() != 1 {
            return None;
        }
        Some(Array1::from_vec(self.data.clone()))
    }
}

impl From<Array2<f32>> for WeightTensor {
    fn from(array: Array2<f32>) -> Self {
        let shape = TensorShape::new(array.shape().to_vec());
        let data = array.into_raw_vec();
        Self { shape, data }
    }
}

impl From<Array1<f32>> for WeightTensor {
    fn from(array: Array1<f32>) -> Self {
        let shape = TensorShape::d1(array.len());
        Self {
            shape,
            data: array.into_raw_vec(),
        }
    }
}

impl fmt::Display for WeightTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor({}, {} elements)", self.shape, self.len())
    }
}

/// Ordered weight tensors for a full model
///
/// Layer order is fixed by the architecture: for each dense layer the
/// kernel tensor is followed by its bias tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSet {
    tensors: Vec<WeightTensor>,
}

impl WeightSet {
    /// Creates a weight set from an ordered list of tensors
    pub fn new(tensors: Vec<WeightTensor>) -> Self {
        Self { tensors }
    }

    /// Creates a zero-filled weight set matching a signature
    pub fn zeros(signature: &ShapeSignature) -> Self {
        Self {
            tensors: signature
                .shapes()
                .iter()
                .map(|shape| WeightTensor::zeros(shape.clone()))
                .collect(),
        }
    }

    /// Returns the tensors in order
    pub fn tensors(&self) -> &[WeightTensor] {
        &self.tensors
    }

    /// Returns the number of tensors
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Returns true if the set holds no tensors
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Returns the total element count across all tensors
    pub fn num_elements(&self) -> usize {
        self.tensors.iter().map(WeightTensor::len).sum()
    }

    /// Returns the shape signature of this set
    pub fn signature(&self) -> ShapeSignature {
        self.tensors
            .iter()
            .map(|t| t.shape().clone())
            .collect()
    }

    /// Returns true if every element of every tensor is finite
    pub fn is_finite(&self) -> bool {
        self.tensors.iter().all(WeightTensor::is_finite)
    }

    /// Checks this set against a reference signature.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the signatures differ.
    pub fn check_signature(&self, expected: &ShapeSignature) -> Result<(), ModelError> {
        let actual = self.signature();
        if &actual != expected {
            return Err(ModelError::ShapeMismatch {
                expected: expected.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Scales every tensor by a factor (for federated averaging)
    pub fn scale(&self, factor: f32) -> Self {
        Self {
            tensors: self.tensors.iter().map(|t| t.scale(factor)).collect(),
        }
    }

    /// Applies a function to every element of every tensor
    pub fn map_elements(&self, mut f: impl FnMut(f32) -> f32) -> Self {
        Self {
            tensors: self
                .tensors
                .iter()
                .map(|t| t.map_elements(&mut f))
                .collect(),
        }
    }

    /// Adds two weight sets tensor by tensor (for federated averaging).
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the signatures differ.
    pub fn add(&self, other: &WeightSet) -> Result<Self, ModelError> {
        other.check_signature(&self.signature())?;
        let tensors = self
            .tensors
            .iter()
            .zip(other.tensors.iter())
            .map(|(a, b)| a.add(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tensors })
    }
}

impl fmt::Display for WeightSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WeightSet({} tensors, {} elements)",
            self.len(),
            self.num_elements()
        )
    }
}

impl FromIterator<WeightTensor> for WeightSet {
    fn from_iter<I: IntoIterator<Item = WeightTensor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
