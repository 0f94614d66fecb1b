//! # ml
//!
//! Function approximation for the hindsight-replay learner.
//!
//! The crate provides just enough machinery to train a small goal-conditioned
//! Q-network on the CPU:
//!
//! - [`Tensor`]: a dense row-major `f32` buffer with a shape.
//! - [`Dense`], [`Relu`] and [`Sequential`]: layers with analytic backward
//!   passes, composed through the [`Layer`] trait.
//! - [`Sgd`] and [`Adam`]: optimizers behind the [`Optimizer`] trait.
//! - [`ParamSet`]: an explicit, ordered container of network parameters used
//!   for checkpoints and for the soft target update.
//! - [`QFunction`]: the interface the learner drives, and [`QNetwork`], the
//!   multilayer perceptron that implements it.

#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::cast_precision_loss, clippy::module_name_repetitions)]

pub mod nn;
pub mod optim;
pub mod params;
pub mod qnet;
pub mod tensor;

pub use nn::{Dense, Layer, Relu, Sequential};
pub use optim::{Adam, Optimizer, OptimizerKind, Sgd};
pub use params::{soft_update, ParamSet};
pub use qnet::{QFunction, QNetwork};
pub use tensor::{argmax, Tensor};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MlError {
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("parameter count mismatch: expected {expected}, got {actual}")]
    ParamCount { expected: usize, actual: usize },
    #[error("action {action} out of range for {num_actions} actions")]
    ActionOutOfRange { action: usize, num_actions: usize },
    #[error("empty batch")]
    EmptyBatch,
}
