//! # HER runtime
//!
//! Entry point for training and evaluating the bit-flipping agent.
//!
//! A training run builds a [`her::Trainer`] from a JSON config (or the
//! defaults), runs every epoch, then writes the online and target networks to
//! a checkpoint and, optionally, the per-cycle metrics to a JSON file. With
//! `--evaluate` the checkpoint is read back and the greedy target network is
//! played for `num_test` episodes instead.

#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::unnecessary_wraps)]

mod checkpoint;

use anyhow::{Context, Result};
use checkpoint::Checkpoint;
use clap::Parser;
use her::{MetricsHistory, TracingSink, Trainer, TrainingConfig};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "her_runtime", about = "Hindsight experience replay on bit flipping")]
struct Args {
    /// JSON training config; unset fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where trained networks are written, or read from with `--evaluate`.
    #[arg(long, default_value = "train/model.json")]
    checkpoint: PathBuf,

    /// Optional JSON file receiving per-cycle success rate and loss.
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Skip training and evaluate the checkpoint.
    #[arg(long)]
    evaluate: bool,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    epochs: Option<usize>,

    #[arg(long)]
    size: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    if args.evaluate {
        evaluate(&args, config)
    } else {
        train(&args, config)
    }
}

fn load_config(args: &Args) -> Result<TrainingConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => TrainingConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(epochs) = args.epochs {
        config.num_epochs = epochs;
    }
    if let Some(size) = args.size {
        config.size = size;
    }
    config.validate()?;
    Ok(config)
}

fn train(args: &Args, config: TrainingConfig) -> Result<()> {
    let hidden_units = config.hidden_units;
    tracing::info!("Initializing trainer with seed {}...", config.seed);
    let mut trainer = Trainer::new(config)?;
    let mut history = MetricsHistory::default();
    let summary = trainer.run((TracingSink, &mut history))?;

    if let Some(last) = history.success_rate.last() {
        tracing::info!("Final cycle success rate: {:.3}", last);
    }
    tracing::info!(
        "Number of episodes succeeded: {} of {}",
        summary.succeeded_episodes,
        summary.episodes
    );

    Checkpoint::from_learner(trainer.learner(), hidden_units).save(&args.checkpoint)?;
    tracing::info!("Checkpoint written to {}", args.checkpoint.display());

    if let Some(path) = &args.metrics {
        let json = serde_json::to_string_pretty(&history).context("serializing metrics")?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!("Metrics written to {}", path.display());
    }
    Ok(())
}

fn evaluate(args: &Args, config: TrainingConfig) -> Result<()> {
    let checkpoint = Checkpoint::load(&args.checkpoint)?;
    tracing::info!("Loaded checkpoint from {}", args.checkpoint.display());
    let (online, target) = checkpoint.into_networks(&config)?;
    let episodes = config.num_test;
    let mut trainer = Trainer::with_networks(config, online, target)?;
    let report = trainer.evaluate(episodes)?;
    tracing::info!(
        "Success rate: {:.3} ({} / {}), mean steps to goal {:.2}",
        report.success_rate(),
        report.successes,
        report.episodes,
        report.mean_steps_to_goal
    );
    Ok(())
}
