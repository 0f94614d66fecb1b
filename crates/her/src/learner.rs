use crate::error::HerError;
use crate::types::{network_input, Bits, Transition};
use ml::{argmax, soft_update, QFunction, Tensor};

/// Range of achievable discounted returns when every step costs at most one:
/// `[-1 / (1 - gamma), 0]`.
#[must_use]
pub fn value_bounds(gamma: f32) -> (f32, f32) {
    (-1.0 / (1.0 - gamma), 0.0)
}

/// Double-Q bootstrap target for one transition.
///
/// The online network's values pick the next action, the target network's
/// values score it, and the result is clipped to [`value_bounds`].
#[must_use]
pub fn double_q_target(reward: f32, online_next: &[f32], target_next: &[f32], gamma: f32) -> f32 {
    let best = argmax(online_next);
    let (lo, hi) = value_bounds(gamma);
    (reward + gamma * target_next[best]).clamp(lo, hi)
}

/// Online/target network pair trained with double Q-learning.
pub struct DoubleDqn<Q: QFunction> {
    online: Q,
    target: Q,
    gamma: f32,
    tau: f32,
    size: usize,
    updates: u64,
}

impl<Q: QFunction> DoubleDqn<Q> {
    /// Pairs two networks of identical layout. Parameters are taken as given;
    /// see [`DoubleDqn::hard_sync`] to start the target from the online
    /// weights.
    pub fn new(online: Q, target: Q, gamma: f32, tau: f32) -> Result<Self, HerError> {
        if !(0.0..1.0).contains(&gamma) {
            return Err(HerError::InvalidConfig(format!(
                "gamma must be in [0, 1), got {gamma}"
            )));
        }
        if !(0.0..=1.0).contains(&tau) {
            return Err(HerError::InvalidConfig(format!(
                "tau must be in [0, 1], got {tau}"
            )));
        }
        let size = online.num_actions();
        if online.input_dim() != 2 * size {
            return Err(HerError::DimensionMismatch {
                expected: 2 * size,
                actual: online.input_dim(),
            });
        }
        if target.input_dim() != online.input_dim() || target.num_actions() != size {
            return Err(HerError::DimensionMismatch {
                expected: size,
                actual: target.num_actions(),
            });
        }
        online.parameters().check_compatible(&target.parameters())?;
        Ok(Self {
            online,
            target,
            gamma,
            tau,
            size,
            updates: 0,
        })
    }

    /// Number of bits (and actions) the networks are built for.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    #[must_use]
    pub fn tau(&self) -> f32 {
        self.tau
    }

    /// Gradient steps taken so far.
    #[must_use]
    pub fn updates(&self) -> u64 {
        self.updates
    }

    #[must_use]
    pub fn online(&self) -> &Q {
        &self.online
    }

    #[must_use]
    pub fn target(&self) -> &Q {
        &self.target
    }

    #[must_use]
    pub fn into_networks(self) -> (Q, Q) {
        (self.online, self.target)
    }

    /// Copies the online parameters into the target network.
    pub fn hard_sync(&mut self) -> Result<(), HerError> {
        self.target.set_parameters(&self.online.parameters())?;
        Ok(())
    }

    /// Moves the target parameters towards the online ones:
    /// `target <- tau * target + (1 - tau) * online`.
    ///
    /// Meant to be called once per training cycle, not per gradient step.
    pub fn sync_target(&mut self) -> Result<(), HerError> {
        let blended = soft_update(&self.target.parameters(), &self.online.parameters(), self.tau)?;
        self.target.set_parameters(&blended)?;
        Ok(())
    }

    /// Greedy action of the online network.
    pub fn act(&self, state: &Bits, goal: &Bits) -> Result<usize, HerError> {
        self.check_bits(state)?;
        self.check_bits(goal)?;
        Ok(self.online.predict(&network_input(state, goal))?)
    }

    /// Greedy action of the target network, used for evaluation runs.
    pub fn act_target(&self, state: &Bits, goal: &Bits) -> Result<usize, HerError> {
        self.check_bits(state)?;
        self.check_bits(goal)?;
        Ok(self.target.predict(&network_input(state, goal))?)
    }

    /// Clipped double-Q targets for every transition of `batch`.
    pub fn compute_targets(&self, batch: &[&Transition]) -> Result<Vec<f32>, HerError> {
        let (_, next_inputs) = self.batch_inputs(batch)?;
        self.targets_for(batch, &next_inputs)
    }

    /// One gradient step of the online network towards the clipped double-Q
    /// targets. Returns the batch's summed squared error.
    pub fn optimize(&mut self, batch: &[&Transition]) -> Result<f32, HerError> {
        let (inputs, next_inputs) = self.batch_inputs(batch)?;
        let targets = self.targets_for(batch, &next_inputs)?;
        let actions: Vec<usize> = batch.iter().map(|t| t.action).collect();
        let loss = self.online.train_step(&inputs, &targets, &actions)?;
        self.updates += 1;
        Ok(loss)
    }

    fn targets_for(&self, batch: &[&Transition], next_inputs: &Tensor) -> Result<Vec<f32>, HerError> {
        let q_online = self.online.evaluate(next_inputs)?;
        let q_target = self.target.evaluate(next_inputs)?;
        Ok(batch
            .iter()
            .enumerate()
            .map(|(n, t)| double_q_target(t.reward, q_online.row(n), q_target.row(n), self.gamma))
            .collect())
    }

    fn batch_inputs(&self, batch: &[&Transition]) -> Result<(Tensor, Tensor), HerError> {
        if batch.is_empty() {
            return Err(HerError::EmptyBatch);
        }
        let width = 2 * self.size;
        let mut inputs = Vec::with_capacity(batch.len() * width);
        let mut next_inputs = Vec::with_capacity(batch.len() * width);
        for t in batch {
            self.check_bits(&t.state)?;
            self.check_bits(&t.next_state)?;
            self.check_bits(&t.goal)?;
            if t.action >= self.size {
                return Err(HerError::ActionOutOfRange {
                    action: t.action,
                    size: self.size,
                });
            }
            inputs.extend(t.input());
            next_inputs.extend(t.next_input());
        }
        Ok((
            Tensor::from_vec(vec![batch.len(), width], inputs),
            Tensor::from_vec(vec![batch.len(), width], next_inputs),
        ))
    }

    fn check_bits(&self, bits: &Bits) -> Result<(), HerError> {
        if bits.len() != self.size {
            return Err(HerError::DimensionMismatch {
                expected: self.size,
                actual: bits.len(),
            });
        }
        Ok(())
    }
}
