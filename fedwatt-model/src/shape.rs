//! Weight tensor shapes and shape signatures
//!
//! Every weight tensor carries its shape, and a full weight set is
//! described by an ordered [`ShapeSignature`]. Two weight sets may only
//! be combined (assigned, averaged, persisted together) when their
//! signatures are equal; every federation boundary checks this.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dimensions of one weight tensor, outermost first
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorShape {
    dims: Vec<usize>,
}

impl TensorShape {
    /// Wraps a dimension list as a shape
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Shorthand for a rank-1 shape, used for bias vectors
    pub fn d1(dim: usize) -> Self {
        Self::new(vec![dim])
    }

    /// Shorthand for a rank-2 shape, used for kernel matrices
    pub fn d2(rows: usize, cols: usize) -> Self {
        Self::new(vec![rows, cols])
    }

    /// The dimension list
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Element count a tensor of this shape must hold
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", join(self.dims.iter()))
    }
}

impl From<Vec<usize>> for TensorShape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

impl From<&[usize]> for TensorShape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

/// Ordered shape list describing a full weight set
///
/// Derived from the model architecture. Serves as the reference template
/// the aggregator validates every client submission against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeSignature {
    shapes: Vec<TensorShape>,
}

impl ShapeSignature {
    /// Wraps an ordered list of tensor shapes as a signature
    pub fn new(shapes: Vec<TensorShape>) -> Self {
        Self { shapes }
    }

    /// The tensor shapes in order
    pub fn shapes(&self) -> &[TensorShape] {
        &self.shapes
    }

    /// Number of tensors described
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns true if the signature describes no tensors
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Total element count across all described tensors
    pub fn num_elements(&self) -> usize {
        self.shapes.iter().map(TensorShape::num_elements).sum()
    }
}

impl fmt::Display for ShapeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", join(self.shapes.iter()))
    }
}

impl FromIterator<TensorShape> for ShapeSignature {
    fn from_iter<I: IntoIterator<Item = TensorShape>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Comma-joins any displayable sequence
fn join<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
