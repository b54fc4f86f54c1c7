//! Transition records

use serde::{Deserialize, Serialize};

use crate::{ContinuousAction, Reward, VectorObservation};

/// Single transition `(s, a, s', r, terminal)`.
///
/// Fields are private so a stored record cannot be altered afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    observation: VectorObservation,
    action: ContinuousAction,
    next_observation: VectorObservation,
    reward: Reward,
    terminal: bool,
}

impl Transition {
    /// Create a new transition
    #[must_use]
    pub fn new(
        observation: VectorObservation,
        action: ContinuousAction,
        next_observation: VectorObservation,
        reward: Reward,
        terminal: bool,
    ) -> Self {
        Self {
            observation,
            action,
            next_observation,
            reward,
            terminal,
        }
    }

    /// Observation before the action
    #[must_use]
    pub fn observation(&self) -> &VectorObservation {
        &self.observation
    }

    /// Action taken
    #[must_use]
    pub fn action(&self) -> &ContinuousAction {
        &self.action
    }

    /// Observation after the action
    #[must_use]
    pub fn next_observation(&self) -> &VectorObservation {
        &self.next_observation
    }

    /// Reward received
    #[must_use]
    pub fn reward(&self) -> Reward {
        self.reward
    }

    /// Whether the episode ended with this transition
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}
