use serde::Serialize;

/// Scalars reported after every training cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CycleStats {
    pub epoch: usize,
    pub cycle: usize,
    /// Fraction of the cycle's episodes that reached their goal.
    pub success_rate: f32,
    /// Mean of the per-step losses; `0.0` when no step ran.
    pub mean_loss: f32,
    pub total_reward: f32,
    pub buffer_len: usize,
}

/// Receiver for per-cycle statistics, e.g. a plot or a log.
pub trait MetricsSink {
    fn record(&mut self, stats: &CycleStats);
}

impl MetricsSink for () {
    fn record(&mut self, _stats: &CycleStats) {}
}

impl<S: MetricsSink + ?Sized> MetricsSink for &mut S {
    fn record(&mut self, stats: &CycleStats) {
        (**self).record(stats);
    }
}

impl<A: MetricsSink, B: MetricsSink> MetricsSink for (A, B) {
    fn record(&mut self, stats: &CycleStats) {
        self.0.record(stats);
        self.1.record(stats);
    }
}

/// Logs every cycle at `info` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn record(&mut self, stats: &CycleStats) {
        tracing::info!(
            "Epoch {} cycle {}: success rate {:.3}, loss {:.4}, reward {:.1}, buffer {}",
            stats.epoch + 1,
            stats.cycle + 1,
            stats.success_rate,
            stats.mean_loss,
            stats.total_reward,
            stats.buffer_len
        );
    }
}

/// Keeps every reported value, in order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MetricsHistory {
    pub success_rate: Vec<f32>,
    pub loss: Vec<f32>,
    pub total_reward: Vec<f32>,
}

impl MetricsHistory {
    #[must_use]
    pub fn len(&self) -> usize {
        self.success_rate.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.success_rate.is_empty()
    }
}

impl MetricsSink for MetricsHistory {
    fn record(&mut self, stats: &CycleStats) {
        self.success_rate.push(stats.success_rate);
        self.loss.push(stats.mean_loss);
        self.total_reward.push(stats.total_reward);
    }
}

/// Outcome of [`crate::Trainer::run`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub cycles: usize,
    pub episodes: usize,
    pub succeeded_episodes: usize,
    /// Set when the stop predicate ended the run early.
    pub stopped: bool,
}

/// Outcome of [`crate::Trainer::evaluate`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EvalReport {
    pub episodes: usize,
    pub successes: usize,
    /// Mean number of flips needed by the successful episodes.
    pub mean_steps_to_goal: f32,
}

impl EvalReport {
    #[must_use]
    pub fn success_rate(&self) -> f32 {
        if self.episodes == 0 {
            0.0
        } else {
            self.successes as f32 / self.episodes as f32
        }
    }
}
