use ml::MlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HerError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("dimension mismatch: expected {expected} bits, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("action {action} out of range for {size} bits")]
    ActionOutOfRange { action: usize, size: usize },
    #[error("cannot sample from an empty replay buffer")]
    EmptyBuffer,
    #[error("cannot optimize on an empty batch")]
    EmptyBatch,
    #[error("no goal differing from the initial state after {attempts} draws")]
    DegenerateGoal { attempts: usize },
    #[error("function approximator: {0}")]
    Model(#[from] MlError),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
