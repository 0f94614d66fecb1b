use crate::optim::{Optimizer, OptimizerKind};
use crate::{argmax, Dense, MlError, ParamSet, Relu, Sequential, Tensor};
use rand::Rng;

/// Action-value function approximator.
///
/// Inputs are `[batch, input_dim]` rows (state and goal concatenated),
/// outputs are `[batch, num_actions]` Q-values.
pub trait QFunction {
    fn input_dim(&self) -> usize;

    fn num_actions(&self) -> usize;

    /// Per-action values for every row of `inputs`.
    fn evaluate(&self, inputs: &Tensor) -> Result<Tensor, MlError>;

    /// Greedy action for a single input row.
    fn predict(&self, input: &[f32]) -> Result<usize, MlError> {
        let x = Tensor::try_from_vec(vec![1, input.len()], input.to_vec())?;
        let q = self.evaluate(&x)?;
        Ok(argmax(q.row(0)))
    }

    /// One optimizer step on the squared error between `Q(inputs)[actions]`
    /// and `targets`. Returns the summed squared error before the update.
    fn train_step(
        &mut self,
        inputs: &Tensor,
        targets: &[f32],
        actions: &[usize],
    ) -> Result<f32, MlError>;

    fn parameters(&self) -> ParamSet;

    fn set_parameters(&mut self, params: &ParamSet) -> Result<(), MlError>;
}

/// Two-layer perceptron: `Dense -> Relu -> Dense`.
pub struct QNetwork {
    net: Sequential,
    optimizer: Box<dyn Optimizer>,
    input_dim: usize,
    num_actions: usize,
}

impl QNetwork {
    pub fn new(
        input_dim: usize,
        hidden: usize,
        num_actions: usize,
        optimizer: Box<dyn Optimizer>,
        rng: &mut impl Rng,
    ) -> Self {
        let mut net = Sequential::new();
        net.push(Dense::xavier(input_dim, hidden, rng));
        net.push(Relu);
        net.push(Dense::xavier(hidden, num_actions, rng));
        Self {
            net,
            optimizer,
            input_dim,
            num_actions,
        }
    }

    /// Network for a bit-flipping task of `size` bits: input is state and
    /// goal, one action per bit.
    pub fn for_bits(
        size: usize,
        hidden: usize,
        optimizer: OptimizerKind,
        lr: f32,
        rng: &mut impl Rng,
    ) -> Self {
        Self::new(2 * size, hidden, size, optimizer.build(lr), rng)
    }

    fn check_batch(&self, inputs: &Tensor) -> Result<(), MlError> {
        inputs.expect_cols(self.input_dim)?;
        if inputs.rows() == 0 {
            return Err(MlError::EmptyBatch);
        }
        Ok(())
    }
}

impl QFunction for QNetwork {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn evaluate(&self, inputs: &Tensor) -> Result<Tensor, MlError> {
        self.check_batch(inputs)?;
        Ok(self.net.infer(inputs))
    }

    fn train_step(
        &mut self,
        inputs: &Tensor,
        targets: &[f32],
        actions: &[usize],
    ) -> Result<f32, MlError> {
        self.check_batch(inputs)?;
        let batch = inputs.rows();
        if targets.len() != batch || actions.len() != batch {
            return Err(MlError::ShapeMismatch {
                expected: vec![batch],
                actual: vec![targets.len(), actions.len()],
            });
        }
        if let Some(&action) = actions.iter().find(|&&a| a >= self.num_actions) {
            return Err(MlError::ActionOutOfRange {
                action,
                num_actions: self.num_actions,
            });
        }

        let (q, activations) = self.net.forward(inputs);
        let mut grad = vec![0.0f32; q.len()];
        let mut loss = 0.0f32;
        for (n, (&a, &target)) in actions.iter().zip(targets).enumerate() {
            let idx = n * self.num_actions + a;
            let err = q.data[idx] - target;
            loss += err * err;
            grad[idx] = 2.0 * err;
        }
        let grad = Tensor::from_vec(q.shape.clone(), grad);
        let (_, grads) = self.net.backward(&activations, &grad);

        let mut pairs: Vec<(&mut Tensor, &Tensor)> =
            self.net.params_mut().into_iter().zip(grads.iter()).collect();
        self.optimizer.step(&mut pairs);
        Ok(loss)
    }

    fn parameters(&self) -> ParamSet {
        ParamSet::new(self.net.params().into_iter().cloned().collect())
    }

    fn set_parameters(&mut self, params: &ParamSet) -> Result<(), MlError> {
        self.parameters().check_compatible(params)?;
        for (slot, value) in self.net.params_mut().into_iter().zip(params.iter()) {
            slot.data.clone_from(&value.data);
        }
        Ok(())
    }
}
