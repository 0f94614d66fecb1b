//! # Checkpoints
//!
//! Trained networks are written as one JSON document holding both parameter
//! sets and the shape needed to rebuild the networks before loading them.

use anyhow::{bail, Context, Result};
use her::{DoubleDqn, TrainingConfig};
use ml::{OptimizerKind, ParamSet, QFunction, QNetwork};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub size: usize,
    pub hidden_units: usize,
    pub online: ParamSet,
    pub target: ParamSet,
}

impl Checkpoint {
    pub fn from_learner(learner: &DoubleDqn<QNetwork>, hidden_units: usize) -> Self {
        Self {
            size: learner.size(),
            hidden_units,
            online: learner.online().parameters(),
            target: learner.target().parameters(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating checkpoint directory {}", dir.display()))?;
        }
        let json = serde_json::to_string(self).context("serializing checkpoint")?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
    }

    /// Rebuilds the online and target networks with the stored weights.
    pub fn into_networks(self, config: &TrainingConfig) -> Result<(QNetwork, QNetwork)> {
        if self.size != config.size {
            bail!(
                "checkpoint is for {} bits but the config asks for {}",
                self.size,
                config.size
            );
        }
        // weights are overwritten below, the seed only feeds the throwaway init
        let mut rng = StdRng::seed_from_u64(0);
        let mut build = || {
            QNetwork::for_bits(
                self.size,
                self.hidden_units,
                OptimizerKind::default(),
                config.learning_rate,
                &mut rng,
            )
        };
        let mut online = build();
        let mut target = build();
        online
            .set_parameters(&self.online)
            .context("loading online parameters")?;
        target
            .set_parameters(&self.target)
            .context("loading target parameters")?;
        Ok((online, target))
    }
}
