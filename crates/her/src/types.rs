//! # Core data types
//!
//! Bit vectors, transitions and episodes shared by every stage of the
//! pipeline. Transitions are immutable once built; the goal travels inside
//! each transition so relabeled copies are self-contained.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fixed-length vector of bits, used for both states and goals.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bits(Vec<bool>);

impl Bits {
    #[must_use]
    pub fn new(bits: Vec<bool>) -> Self {
        Self(bits)
    }

    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self(vec![false; len])
    }

    /// Uniformly random bits.
    pub fn random(len: usize, rng: &mut impl Rng) -> Self {
        Self((0..len).map(|_| rng.gen::<bool>()).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<bool> {
        self.0.get(index).copied()
    }

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn flip(&mut self, index: usize) {
        self.0[index] = !self.0[index];
    }

    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Number of positions where `self` and `other` differ.
    #[must_use]
    pub fn mismatches(&self, other: &Bits) -> usize {
        self.0.iter().zip(&other.0).filter(|(a, b)| a != b).count()
    }

    /// Appends the bits as `0.0`/`1.0` network inputs.
    pub fn extend_input(&self, out: &mut Vec<f32>) {
        out.extend(self.0.iter().map(|&b| if b { 1.0 } else { 0.0 }));
    }
}

impl From<Vec<bool>> for Bits {
    fn from(bits: Vec<bool>) -> Self {
        Self(bits)
    }
}

impl From<&[u8]> for Bits {
    fn from(bits: &[u8]) -> Self {
        Self(bits.iter().map(|&b| b != 0).collect())
    }
}

/// Concatenation of `state` and `goal` as a network input row.
#[must_use]
pub fn network_input(state: &Bits, goal: &Bits) -> Vec<f32> {
    let mut input = Vec::with_capacity(state.len() + goal.len());
    state.extend_input(&mut input);
    goal.extend_input(&mut input);
    input
}

/// One environment step with the goal it was taken under.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: Bits,
    pub action: usize,
    pub reward: f32,
    pub next_state: Bits,
    pub goal: Bits,
}

impl Transition {
    /// `state ++ goal`.
    #[must_use]
    pub fn input(&self) -> Vec<f32> {
        network_input(&self.state, &self.goal)
    }

    /// `next_state ++ goal`.
    #[must_use]
    pub fn next_input(&self) -> Vec<f32> {
        network_input(&self.next_state, &self.goal)
    }
}

/// Ordered transitions of one rollout under a single goal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Episode {
    pub transitions: Vec<Transition>,
}

impl Episode {
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Whether the goal was reached at least once. Later re-matches do not
    /// count twice.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.first_success().is_some()
    }

    /// Index of the first transition that reached the goal.
    #[must_use]
    pub fn first_success(&self) -> Option<usize> {
        self.transitions.iter().position(|t| t.next_state == t.goal)
    }

    #[must_use]
    pub fn total_reward(&self) -> f32 {
        self.transitions.iter().map(|t| t.reward).sum()
    }
}
