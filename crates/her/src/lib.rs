//! # her
//!
//! Experience collection and hindsight relabeling for a goal-conditioned
//! bit-flipping task, trained with double Q-learning.
//!
//! Data flows through the crate in one direction:
//!
//! 1. [`GoalEnv`] rolls out an [`Episode`] of exactly `size` transitions.
//! 2. [`HindsightRelabeler`] expands the episode with extra transitions whose
//!    goal is replaced by a state reached later in the same episode.
//! 3. [`ReplayBuffer`] stores the result and serves uniform batches.
//! 4. [`DoubleDqn`] computes clipped double-Q targets, trains the online
//!    network and softly tracks it with the target network.
//!
//! [`Trainer`] drives the whole loop (epochs, cycles, episodes) from a
//! [`TrainingConfig`]. Everything runs on the calling thread.

#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_precision_loss,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

pub mod config;
pub mod env;
pub mod error;
pub mod learner;
pub mod metrics;
pub mod relabel;
pub mod replay;
pub mod trainer;
pub mod types;

pub use config::TrainingConfig;
pub use env::{GoalEnv, RewardPolicy};
pub use error::HerError;
pub use learner::{double_q_target, value_bounds, DoubleDqn};
pub use metrics::{
    CycleStats, EvalReport, MetricsHistory, MetricsSink, TracingSink, TrainingSummary,
};
pub use relabel::HindsightRelabeler;
pub use replay::ReplayBuffer;
pub use trainer::Trainer;
pub use types::{Bits, Episode, Transition};
