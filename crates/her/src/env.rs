use crate::error::HerError;
use crate::types::{Bits, Episode, Transition};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound on goal draws in [`GoalEnv::reset`]. For `size >= 1` each draw
/// collides with the state with probability `2^-size`, so this is never hit
/// in practice.
const MAX_GOAL_DRAWS: usize = 10_000;

/// How a reached state is scored against a goal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardPolicy {
    /// `0` when every bit matches, `-1` otherwise.
    #[default]
    Sparse,
    /// Negative sum of squared per-bit differences.
    Shaped,
}

impl RewardPolicy {
    #[must_use]
    pub fn from_shaped(shaped: bool) -> Self {
        if shaped {
            RewardPolicy::Shaped
        } else {
            RewardPolicy::Sparse
        }
    }

    #[must_use]
    pub fn reward(self, achieved: &Bits, goal: &Bits) -> f32 {
        match self {
            RewardPolicy::Sparse => {
                if achieved == goal {
                    0.0
                } else {
                    -1.0
                }
            }
            // bits square to themselves, so the squared distance is the
            // number of mismatches
            RewardPolicy::Shaped => -(achieved.mismatches(goal) as f32),
        }
    }
}

/// Bit-flipping environment with a fixed goal per episode.
///
/// Each action flips one bit of the state. There is no terminal flag: an
/// episode is exactly `size` steps long and is driven from outside, so the
/// goal can be reached, lost and reached again within one episode.
pub struct GoalEnv<R: Rng = StdRng> {
    size: usize,
    reward: RewardPolicy,
    state: Bits,
    goal: Bits,
    rng: R,
}

impl<R: Rng> GoalEnv<R> {
    /// Creates the environment and samples the first state and goal.
    pub fn new(size: usize, reward: RewardPolicy, rng: R) -> Result<Self, HerError> {
        if size == 0 {
            return Err(HerError::InvalidConfig("size must be at least 1".into()));
        }
        let mut env = Self {
            size,
            reward,
            state: Bits::zeros(size),
            goal: Bits::zeros(size),
            rng,
        };
        env.reset()?;
        Ok(env)
    }

    /// Starts from a known state and goal instead of sampling them.
    pub fn with_state(
        state: Bits,
        goal: Bits,
        reward: RewardPolicy,
        rng: R,
    ) -> Result<Self, HerError> {
        let size = state.len();
        if size == 0 {
            return Err(HerError::InvalidConfig("size must be at least 1".into()));
        }
        if goal.len() != size {
            return Err(HerError::DimensionMismatch {
                expected: size,
                actual: goal.len(),
            });
        }
        Ok(Self {
            size,
            reward,
            state,
            goal,
            rng,
        })
    }

    /// Samples a fresh state and a goal that differs from it in at least one
    /// bit.
    pub fn reset(&mut self) -> Result<(), HerError> {
        self.state = Bits::random(self.size, &mut self.rng);
        for _ in 0..MAX_GOAL_DRAWS {
            let goal = Bits::random(self.size, &mut self.rng);
            if goal != self.state {
                self.goal = goal;
                return Ok(());
            }
        }
        tracing::warn!(size = self.size, "goal resampling exhausted");
        Err(HerError::DegenerateGoal {
            attempts: MAX_GOAL_DRAWS,
        })
    }

    /// Flips bit `action` and returns a copy of the new state with its reward.
    pub fn step(&mut self, action: usize) -> Result<(Bits, f32), HerError> {
        if action >= self.size {
            return Err(HerError::ActionOutOfRange {
                action,
                size: self.size,
            });
        }
        self.state.flip(action);
        let reward = self.reward.reward(&self.state, &self.goal);
        Ok((self.state.clone(), reward))
    }

    /// Plays one full episode of `size` steps from the current state.
    ///
    /// `policy` sees the current state and the goal and returns the bit to
    /// flip. The environment is not reset first.
    pub fn rollout<F>(&mut self, mut policy: F) -> Result<Episode, HerError>
    where
        F: FnMut(&Bits, &Bits) -> Result<usize, HerError>,
    {
        let mut transitions = Vec::with_capacity(self.size);
        for _ in 0..self.size {
            let state = self.state.clone();
            let action = policy(&state, &self.goal)?;
            let (next_state, reward) = self.step(action)?;
            transitions.push(Transition {
                state,
                action,
                reward,
                next_state,
                goal: self.goal.clone(),
            });
        }
        Ok(Episode { transitions })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn state(&self) -> &Bits {
        &self.state
    }

    #[must_use]
    pub fn goal(&self) -> &Bits {
        &self.goal
    }

    #[must_use]
    pub fn reward_policy(&self) -> RewardPolicy {
        self.reward
    }
}
