use crate::env::RewardPolicy;
use crate::error::HerError;
use ml::OptimizerKind;
use serde::{Deserialize, Serialize};

/// Every tunable constant of a training run.
///
/// Missing fields in a JSON file fall back to [`TrainingConfig::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of bits in states and goals.
    pub size: usize,
    /// Store hindsight-relabeled transitions next to the original ones.
    pub use_her: bool,
    /// Dense distance-based reward instead of the sparse `0`/`-1` one.
    pub shaped_reward: bool,
    pub num_epochs: usize,
    pub num_cycles: usize,
    pub num_episodes_per_cycle: usize,
    pub optimisation_steps_per_cycle: usize,
    /// Relabeled copies per step.
    pub k: usize,
    pub buffer_size: usize,
    /// Share of `buffer_size` dropped when the buffer overflows.
    pub evict_fraction: f64,
    /// Weight of the old target parameters in the soft update.
    pub tau: f32,
    pub gamma: f32,
    pub batch_size: usize,
    /// Probability of a uniformly random action while collecting.
    pub epsilon: f64,
    pub learning_rate: f32,
    pub hidden_units: usize,
    pub optimizer: OptimizerKind,
    pub seed: u64,
    /// Episodes played by an evaluation run.
    pub num_test: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            size: 10,
            use_her: true,
            shaped_reward: false,
            num_epochs: 20,
            num_cycles: 50,
            num_episodes_per_cycle: 16,
            optimisation_steps_per_cycle: 40,
            k: 8,
            buffer_size: 1_000_000,
            evict_fraction: 0.0001,
            tau: 0.95,
            gamma: 0.98,
            batch_size: 128,
            epsilon: 0.0,
            learning_rate: 1e-3,
            hidden_units: 256,
            optimizer: OptimizerKind::Adam,
            seed: 0,
            num_test: 1000,
        }
    }
}

impl TrainingConfig {
    pub fn from_json(json: &str) -> Result<Self, HerError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn reward_policy(&self) -> RewardPolicy {
        RewardPolicy::from_shaped(self.shaped_reward)
    }

    pub fn validate(&self) -> Result<(), HerError> {
        let fail = |msg: String| Err(HerError::InvalidConfig(msg));
        if self.size == 0 {
            return fail("size must be at least 1".into());
        }
        if self.batch_size == 0 {
            return fail("batch_size must be positive".into());
        }
        if self.buffer_size == 0 {
            return fail("buffer_size must be positive".into());
        }
        if self.num_episodes_per_cycle == 0 && self.optimisation_steps_per_cycle > 0 {
            return fail("optimisation needs at least one episode per cycle".into());
        }
        if self.hidden_units == 0 {
            return fail("hidden_units must be positive".into());
        }
        if !(0.0..1.0).contains(&self.gamma) {
            return fail(format!("gamma must be in [0, 1), got {}", self.gamma));
        }
        if !(0.0..=1.0).contains(&self.tau) {
            return fail(format!("tau must be in [0, 1], got {}", self.tau));
        }
        if !(self.evict_fraction > 0.0 && self.evict_fraction <= 1.0) {
            return fail(format!(
                "evict_fraction must be in (0, 1], got {}",
                self.evict_fraction
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return fail(format!("epsilon must be in [0, 1], got {}", self.epsilon));
        }
        if !(self.learning_rate > 0.0) {
            return fail(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }
        if self.use_her && self.shaped_reward {
            return fail("hindsight relabeling requires the sparse reward".into());
        }
        Ok(())
    }
}
