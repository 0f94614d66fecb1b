use crate::error::HerError;
use crate::types::Transition;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;
use std::collections::VecDeque;

/// Bounded transition store with uniform sampling.
///
/// Overflow drops a block of the oldest transitions at once rather than one
/// at a time. The block is `ceil(evict_fraction * capacity)` items, at least
/// one.
pub struct ReplayBuffer<R: Rng = StdRng> {
    items: VecDeque<Transition>,
    capacity: usize,
    evict: usize,
    rng: R,
}

impl<R: Rng> ReplayBuffer<R> {
    pub fn new(capacity: usize, evict_fraction: f64, rng: R) -> Result<Self, HerError> {
        if capacity == 0 {
            return Err(HerError::InvalidConfig("buffer_size must be positive".into()));
        }
        if !(evict_fraction > 0.0 && evict_fraction <= 1.0) {
            return Err(HerError::InvalidConfig(format!(
                "evict_fraction must be in (0, 1], got {evict_fraction}"
            )));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let evict = ((evict_fraction * capacity as f64).ceil() as usize).clamp(1, capacity);
        Ok(Self {
            items: VecDeque::new(),
            capacity,
            evict,
            rng,
        })
    }

    pub fn add(&mut self, transition: Transition) {
        self.items.push_back(transition);
        if self.items.len() > self.capacity {
            let n = self.evict.min(self.items.len());
            self.items.drain(..n);
        }
    }

    pub fn extend(&mut self, transitions: impl IntoIterator<Item = Transition>) {
        for t in transitions {
            self.add(t);
        }
    }

    /// Draws `n` transitions uniformly.
    ///
    /// With at least `n` items the draw is without replacement. With fewer,
    /// the contents are treated as repeated until there are at least `n`
    /// candidates, so duplicates appear but the call still returns `n` items.
    pub fn sample(&mut self, n: usize) -> Result<Vec<&Transition>, HerError> {
        let len = self.items.len();
        if len == 0 {
            return Err(HerError::EmptyBuffer);
        }
        let copies = n.div_ceil(len).max(1);
        let picks = index::sample(&mut self.rng, len * copies, n);
        Ok(picks.into_iter().map(|i| &self.items[i % len]).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items dropped per overflow.
    #[must_use]
    pub fn evict_count(&self) -> usize {
        self.evict
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.items.iter()
    }
}
