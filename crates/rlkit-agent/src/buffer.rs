//! Experience replay buffer for off-policy agents

use ndarray::{Array2, Axis};
use rand::seq::index;
use rand::Rng;
use std::collections::VecDeque;

use rlkit_core::{RLError, Result, Transition};

/// Bounded FIFO replay store; once full, each push evicts the oldest record.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    /// Buffer storage
    buffer: VecDeque<Transition>,
    /// Maximum capacity
    capacity: usize,
}

/// Column-stacked batch of sampled transitions
#[derive(Debug, Clone)]
pub struct Batch {
    /// `(B, observe_dim)`
    pub observations: Array2<f32>,
    /// `(B, action_dim)`
    pub actions: Array2<f32>,
    /// `(B, 1)`
    pub rewards: Array2<f32>,
    /// `(B, observe_dim)`
    pub next_observations: Array2<f32>,
    /// `(B, 1)`, 1.0 for terminal transitions
    pub terminals: Array2<f32>,
}

impl Batch {
    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rewards.nrows()
    }

    /// Check if the batch has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stack transitions row-wise
    pub fn from_transitions(transitions: &[&Transition]) -> Result<Self> {
        let first = transitions
            .first()
            .ok_or_else(|| RLError::Agent("cannot build an empty batch".into()))?;
        let obs_dim = first.observation().dim();
        let act_dim = first.action().dim();
        let n = transitions.len();

        let mut batch = Self {
            observations: Array2::zeros((n, obs_dim)),
            actions: Array2::zeros((n, act_dim)),
            rewards: Array2::zeros((n, 1)),
            next_observations: Array2::zeros((n, obs_dim)),
            terminals: Array2::zeros((n, 1)),
        };

        for (i, t) in transitions.iter().enumerate() {
            RLError::check_dim(obs_dim, t.observation().dim())?;
            RLError::check_dim(obs_dim, t.next_observation().dim())?;
            RLError::check_dim(act_dim, t.action().dim())?;
            batch.observations.row_mut(i).assign(&t.observation().data);
            batch.actions.row_mut(i).assign(&t.action().0);
            batch.next_observations.row_mut(i).assign(&t.next_observation().data);
            #[allow(clippy::cast_possible_truncation)]
            let reward = t.reward().value() as f32;
            batch.rewards[[i, 0]] = reward;
            batch.terminals[[i, 0]] = if t.is_terminal() { 1.0 } else { 0.0 };
        }
        debug_assert_eq!(batch.observations.len_of(Axis(0)), n);

        Ok(batch)
    }
}

impl ReplayBuffer {
    /// Create a new replay buffer
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity.min(1 << 16)),
            capacity,
        }
    }

    /// Add a transition, evicting the oldest when full
    pub fn push(&mut self, transition: Transition) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Sample up to `batch_size` distinct transitions uniformly.
    ///
    /// Returns `None` when the buffer is empty.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Option<Vec<&Transition>> {
        let amount = batch_size.min(self.buffer.len());
        if amount == 0 {
            return None;
        }
        let picked = index::sample(rng, self.buffer.len(), amount);
        Some(picked.iter().map(|i| &self.buffer[i]).collect())
    }

    /// Sample and stack into a [`Batch`]
    pub fn sample_batch<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Option<Batch>> {
        match self.sample(batch_size, rng) {
            Some(transitions) => Batch::from_transitions(&transitions).map(Some),
            None => Ok(None),
        }
    }

    /// Oldest-to-newest iterator over stored transitions
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    /// Get the current size of the buffer
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Maximum number of stored transitions
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
