use crate::MlError;
use serde::{Deserialize, Serialize};

/// Dense row-major tensor of `f32` values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
}

impl Tensor {
    /// Builds a tensor from raw data.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` is not the product of `shape`.
    #[must_use]
    pub fn from_vec(shape: Vec<usize>, data: Vec<f32>) -> Self {
        assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { data, shape }
    }

    /// Fallible variant of [`Tensor::from_vec`] for data coming from outside
    /// the crate.
    pub fn try_from_vec(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, MlError> {
        let expected = shape.iter().product::<usize>();
        if expected != data.len() {
            return Err(MlError::ShapeMismatch {
                expected: shape,
                actual: vec![data.len()],
            });
        }
        Ok(Self { data, shape })
    }

    #[must_use]
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self { data: vec![0.0; len], shape }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of rows of a 2-D tensor.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Number of columns of a 2-D tensor.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.shape.get(1).copied().unwrap_or(0)
    }

    /// Borrow row `i` of a 2-D tensor.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f32] {
        let cols = self.cols();
        &self.data[i * cols..(i + 1) * cols]
    }

    /// Checks that this tensor is `[_, cols]`.
    pub fn expect_cols(&self, cols: usize) -> Result<(), MlError> {
        if self.shape.len() != 2 || self.shape[1] != cols {
            return Err(MlError::ShapeMismatch {
                expected: vec![self.rows(), cols],
                actual: self.shape.clone(),
            });
        }
        Ok(())
    }
}

/// Index of the largest value, first index on ties.
///
/// Returns `0` for an empty slice.
#[must_use]
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
