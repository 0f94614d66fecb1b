//! Explicit parameter containers.
//!
//! A [`ParamSet`] is an ordered snapshot of every trainable tensor of a
//! network. Two networks built with the same architecture produce sets of the
//! same length and shapes, which is what [`soft_update`] and checkpoint
//! loading rely on.

use crate::{MlError, Tensor};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    tensors: Vec<Tensor>,
}

impl ParamSet {
    #[must_use]
    pub fn new(tensors: Vec<Tensor>) -> Self {
        Self { tensors }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tensor> {
        self.tensors.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Tensor> {
        self.tensors.get(index)
    }

    /// Replaces tensor `index`; the replacement must keep the shape.
    pub fn set(&mut self, index: usize, value: Tensor) -> Result<(), MlError> {
        let len = self.tensors.len();
        let slot = self.tensors.get_mut(index).ok_or(MlError::ParamCount {
            expected: len,
            actual: index + 1,
        })?;
        if slot.shape != value.shape {
            return Err(MlError::ShapeMismatch {
                expected: slot.shape.clone(),
                actual: value.shape,
            });
        }
        *slot = value;
        Ok(())
    }

    /// Checks that `other` has the same layout as `self`.
    pub fn check_compatible(&self, other: &ParamSet) -> Result<(), MlError> {
        if self.len() != other.len() {
            return Err(MlError::ParamCount {
                expected: self.len(),
                actual: other.len(),
            });
        }
        for (a, b) in self.tensors.iter().zip(&other.tensors) {
            if a.shape != b.shape {
                return Err(MlError::ShapeMismatch {
                    expected: a.shape.clone(),
                    actual: b.shape.clone(),
                });
            }
        }
        Ok(())
    }

    /// Euclidean distance over all parameters.
    pub fn distance(&self, other: &ParamSet) -> Result<f32, MlError> {
        self.check_compatible(other)?;
        let sum: f32 = self
            .tensors
            .iter()
            .zip(&other.tensors)
            .flat_map(|(a, b)| a.data.iter().zip(&b.data))
            .map(|(x, y)| (x - y).powi(2))
            .sum();
        Ok(sum.sqrt())
    }

    #[must_use]
    pub fn into_tensors(self) -> Vec<Tensor> {
        self.tensors
    }
}

/// Exponential moving average of `online` into `target`.
///
/// Every returned parameter is `tau * target + (1 - tau) * online`, so a `tau`
/// close to one keeps the target slow.
pub fn soft_update(target: &ParamSet, online: &ParamSet, tau: f32) -> Result<ParamSet, MlError> {
    target.check_compatible(online)?;
    let tensors = target
        .tensors
        .iter()
        .zip(&online.tensors)
        .map(|(t, o)| {
            let data = t
                .data
                .iter()
                .zip(&o.data)
                .map(|(&tv, &ov)| tau * tv + (1.0 - tau) * ov)
                .collect();
            Tensor::from_vec(t.shape.clone(), data)
        })
        .collect();
    Ok(ParamSet { tensors })
}
