//! # Training loop
//!
//! [`Trainer`] owns one instance of every pipeline stage and runs them in
//! order: collect episodes, relabel them into the replay buffer, take a fixed
//! number of gradient steps, then softly update the target network. One pass
//! of that sequence is a *cycle*; `num_cycles` cycles make an epoch.
//!
//! All randomness comes from the configured seed. A master generator hands
//! each stage its own child generator at construction, so runs with the same
//! config are reproducible.

use crate::config::TrainingConfig;
use crate::env::GoalEnv;
use crate::error::HerError;
use crate::learner::DoubleDqn;
use crate::metrics::{CycleStats, EvalReport, MetricsSink, TrainingSummary};
use crate::relabel::HindsightRelabeler;
use crate::replay::ReplayBuffer;
use crate::types::Episode;
use ml::{QFunction, QNetwork};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn child(master: &mut StdRng) -> StdRng {
    StdRng::seed_from_u64(master.gen())
}

pub struct Trainer<Q: QFunction> {
    config: TrainingConfig,
    env: GoalEnv,
    buffer: ReplayBuffer,
    relabeler: HindsightRelabeler,
    learner: DoubleDqn<Q>,
    explore: StdRng,
}

impl Trainer<QNetwork> {
    /// Builds fresh networks from the config. The target network starts as
    /// a copy of the online one.
    pub fn new(config: TrainingConfig) -> Result<Self, HerError> {
        config.validate()?;
        let mut master = StdRng::seed_from_u64(config.seed);
        let mut init = child(&mut master);
        let build = |rng: &mut StdRng| {
            QNetwork::for_bits(
                config.size,
                config.hidden_units,
                config.optimizer,
                config.learning_rate,
                rng,
            )
        };
        let online = build(&mut init);
        let target = build(&mut init);
        let mut trainer = Self::assemble(config, online, target, &mut master)?;
        trainer.learner.hard_sync()?;
        Ok(trainer)
    }
}

impl<Q: QFunction> Trainer<Q> {
    /// Uses the given networks as they are, e.g. restored from a checkpoint.
    pub fn with_networks(config: TrainingConfig, online: Q, target: Q) -> Result<Self, HerError> {
        config.validate()?;
        let mut master = StdRng::seed_from_u64(config.seed);
        Self::assemble(config, online, target, &mut master)
    }

    fn assemble(
        config: TrainingConfig,
        online: Q,
        target: Q,
        master: &mut StdRng,
    ) -> Result<Self, HerError> {
        let reward = config.reward_policy();
        let learner = DoubleDqn::new(online, target, config.gamma, config.tau)?;
        if learner.size() != config.size {
            return Err(HerError::DimensionMismatch {
                expected: config.size,
                actual: learner.size(),
            });
        }
        let env = GoalEnv::new(config.size, reward, child(master))?;
        let buffer = ReplayBuffer::new(config.buffer_size, config.evict_fraction, child(master))?;
        let relabeler = HindsightRelabeler::new(config.use_her, config.k, reward, child(master));
        let explore = child(master);
        Ok(Self {
            config,
            env,
            buffer,
            relabeler,
            learner,
            explore,
        })
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    #[must_use]
    pub fn learner(&self) -> &DoubleDqn<Q> {
        &self.learner
    }

    #[must_use]
    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    #[must_use]
    pub fn env(&self) -> &GoalEnv {
        &self.env
    }

    #[must_use]
    pub fn into_learner(self) -> DoubleDqn<Q> {
        self.learner
    }

    /// Resets the environment and plays one episode with the epsilon-greedy
    /// online policy.
    pub fn collect_episode(&mut self) -> Result<Episode, HerError> {
        self.env.reset()?;
        let learner = &self.learner;
        let explore = &mut self.explore;
        let epsilon = self.config.epsilon;
        let size = self.config.size;
        self.env.rollout(|state, goal| {
            if epsilon > 0.0 && explore.gen_bool(epsilon) {
                Ok(explore.gen_range(0..size))
            } else {
                learner.act(state, goal)
            }
        })
    }

    /// Relabels `episode` and stores the result. Returns the number of
    /// transitions added.
    pub fn store_episode(&mut self, episode: &Episode) -> usize {
        let transitions = self.relabeler.relabel(episode);
        let added = transitions.len();
        self.buffer.extend(transitions);
        added
    }

    /// Runs the configured number of gradient steps and returns their mean
    /// loss.
    pub fn optimize(&mut self) -> Result<f32, HerError> {
        let steps = self.config.optimisation_steps_per_cycle;
        let mut total = 0.0;
        for _ in 0..steps {
            let batch = self.buffer.sample(self.config.batch_size)?;
            total += self.learner.optimize(&batch)?;
        }
        Ok(if steps == 0 { 0.0 } else { total / steps as f32 })
    }

    /// Full training run.
    pub fn run<S: MetricsSink>(&mut self, sink: S) -> Result<TrainingSummary, HerError> {
        self.run_until(sink, || false)
    }

    /// Training run that asks `should_stop` before every episode. A stop
    /// request ends the run between episodes; the current cycle is abandoned
    /// without optimisation or target update.
    pub fn run_until<S, F>(
        &mut self,
        mut sink: S,
        mut should_stop: F,
    ) -> Result<TrainingSummary, HerError>
    where
        S: MetricsSink,
        F: FnMut() -> bool,
    {
        let mut summary = TrainingSummary::default();
        tracing::info!(
            "Starting training: {} epochs x {} cycles x {} episodes, size = {}, her = {}",
            self.config.num_epochs,
            self.config.num_cycles,
            self.config.num_episodes_per_cycle,
            self.config.size,
            self.config.use_her
        );

        'epochs: for epoch in 0..self.config.num_epochs {
            let mut epoch_success = 0.0;
            for cycle in 0..self.config.num_cycles {
                let mut successes = 0usize;
                let mut total_reward = 0.0f32;
                for _ in 0..self.config.num_episodes_per_cycle {
                    if should_stop() {
                        summary.stopped = true;
                        tracing::info!("Stop requested after {} episodes.", summary.episodes);
                        break 'epochs;
                    }
                    let episode = self.collect_episode()?;
                    summary.episodes += 1;
                    if episode.succeeded() {
                        successes += 1;
                        summary.succeeded_episodes += 1;
                    }
                    total_reward += episode.total_reward();
                    self.store_episode(&episode);
                }

                let mean_loss = self.optimize()?;
                self.learner.sync_target()?;

                let episodes = self.config.num_episodes_per_cycle.max(1);
                let stats = CycleStats {
                    epoch,
                    cycle,
                    success_rate: successes as f32 / episodes as f32,
                    mean_loss,
                    total_reward,
                    buffer_len: self.buffer.len(),
                };
                tracing::debug!(
                    epoch,
                    cycle,
                    success_rate = stats.success_rate,
                    mean_loss,
                    buffer_len = stats.buffer_len,
                    "cycle complete"
                );
                epoch_success += stats.success_rate;
                sink.record(&stats);
                summary.cycles += 1;
            }
            tracing::info!(
                "Epoch {} complete. Mean success rate: {:.3}",
                epoch + 1,
                epoch_success / self.config.num_cycles.max(1) as f32
            );
        }

        tracing::info!(
            "Training finished: {} of {} episodes succeeded.",
            summary.succeeded_episodes,
            summary.episodes
        );
        Ok(summary)
    }

    /// Plays `episodes` greedy episodes with the target network, ending each
    /// one at its first success.
    pub fn evaluate(&mut self, episodes: usize) -> Result<EvalReport, HerError> {
        let mut report = EvalReport {
            episodes,
            ..EvalReport::default()
        };
        let mut steps_to_goal = 0usize;
        for _ in 0..episodes {
            self.env.reset()?;
            for step in 0..self.env.size() {
                let action = self.learner.act_target(self.env.state(), self.env.goal())?;
                self.env.step(action)?;
                if self.env.state() == self.env.goal() {
                    report.successes += 1;
                    steps_to_goal += step + 1;
                    break;
                }
            }
        }
        if report.successes > 0 {
            report.mean_steps_to_goal = steps_to_goal as f32 / report.successes as f32;
        }
        tracing::info!(
            "Evaluation: {} / {} episodes reached the goal.",
            report.successes,
            report.episodes
        );
        Ok(report)
    }
}
