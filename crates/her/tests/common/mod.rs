#![allow(dead_code)]

use her::{Bits, Transition};
use ml::{MlError, ParamSet, QFunction, Tensor};

pub fn bits(v: &[u8]) -> Bits {
    Bits::from(v)
}

pub fn transition(id: usize, size: usize) -> Transition {
    let state: Vec<u8> = (0..size).map(|i| ((id >> i) & 1) as u8).collect();
    let mut next = bits(&state);
    next.flip(0);
    Transition {
        state: bits(&state),
        action: 0,
        reward: -(id as f32),
        next_state: next,
        goal: Bits::zeros(size),
    }
}

/// Q-function that returns the same per-action values for every input and
/// records what it was trained on.
pub struct FixedQ {
    pub size: usize,
    pub values: Vec<f32>,
    pub trained: Vec<(Vec<f32>, Vec<usize>)>,
}

impl FixedQ {
    pub fn new(values: Vec<f32>) -> Self {
        Self { size: values.len(), values, trained: Vec::new() }
    }
}

impl QFunction for FixedQ {
    fn input_dim(&self) -> usize {
        2 * self.size
    }

    fn num_actions(&self) -> usize {
        self.size
    }

    fn evaluate(&self, inputs: &Tensor) -> Result<Tensor, MlError> {
        inputs.expect_cols(2 * self.size)?;
        let data = (0..inputs.rows()).flat_map(|_| self.values.clone()).collect();
        Ok(Tensor::from_vec(vec![inputs.rows(), self.size], data))
    }

    fn train_step(
        &mut self,
        _inputs: &Tensor,
        targets: &[f32],
        actions: &[usize],
    ) -> Result<f32, MlError> {
        self.trained.push((targets.to_vec(), actions.to_vec()));
        Ok(0.0)
    }

    fn parameters(&self) -> ParamSet {
        ParamSet::new(vec![Tensor::from_vec(vec![self.size], self.values.clone())])
    }

    fn set_parameters(&mut self, params: &ParamSet) -> Result<(), MlError> {
        self.parameters().check_compatible(params)?;
        self.values = params.get(0).map(|t| t.data.clone()).unwrap_or_default();
        Ok(())
    }
}
