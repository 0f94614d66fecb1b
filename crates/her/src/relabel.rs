//! # Hindsight relabeling
//!
//! Turns one episode into the set of transitions that goes into the replay
//! buffer. Every original transition is kept as is. With relabeling enabled,
//! each step additionally gets `k` copies whose goal is replaced by a state
//! the agent actually reached at that step or later, with the reward
//! recomputed against the new goal. A copy whose substituted goal is the
//! step's own next state is a success by construction and is kept.

use crate::env::RewardPolicy;
use crate::types::{Episode, Transition};
use rand::rngs::StdRng;
use rand::Rng;

pub struct HindsightRelabeler<R: Rng = StdRng> {
    enabled: bool,
    k: usize,
    reward: RewardPolicy,
    rng: R,
}

impl<R: Rng> HindsightRelabeler<R> {
    #[must_use]
    pub fn new(enabled: bool, k: usize, reward: RewardPolicy, rng: R) -> Self {
        Self {
            enabled,
            k,
            reward,
            rng,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Number of transitions [`HindsightRelabeler::relabel`] emits for an
    /// episode of `len` steps.
    #[must_use]
    pub fn output_len(&self, len: usize) -> usize {
        if self.enabled {
            len * (1 + self.k)
        } else {
            len
        }
    }

    /// Original transitions followed, per step, by their `k` relabeled
    /// copies.
    pub fn relabel(&mut self, episode: &Episode) -> Vec<Transition> {
        let steps = &episode.transitions;
        let mut out = Vec::with_capacity(self.output_len(steps.len()));
        for (t, transition) in steps.iter().enumerate() {
            out.push(transition.clone());
            if !self.enabled {
                continue;
            }
            for _ in 0..self.k {
                let future = self.rng.gen_range(t..steps.len());
                let goal = steps[future].next_state.clone();
                let reward = self.reward.reward(&transition.next_state, &goal);
                out.push(Transition {
                    state: transition.state.clone(),
                    action: transition.action,
                    reward,
                    next_state: transition.next_state.clone(),
                    goal,
                });
            }
        }
        out
    }
}
