//! Agent traits and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::{ContinuousAction, NoiseMode, NoiseParams, Transition, VectorObservation};

/// Maps an agent's internal network names to on-disk file stems.
///
/// Names without an entry are stored under their own name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameMap(pub HashMap<String, String>);

impl NameMap {
    /// File stem for `name`
    #[must_use]
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.0.get(name).map_or(name, String::as_str)
    }
}

/// Losses reported by a single optimization update
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateStats {
    /// Policy loss, present only when the policy was updated
    pub policy_loss: Option<f32>,
    /// Mean value loss across critics
    pub value_loss: f32,
    /// Whether the update ran (false when the replay store was empty)
    pub performed: bool,
}

/// Off-policy learning agent driven by the training loop.
///
/// The loop treats implementations as opaque; any algorithm honouring this
/// contract is interchangeable.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Deterministic (noise-free) action
    async fn act(&self, observation: &VectorObservation) -> crate::Result<ContinuousAction>;

    /// Exploratory action with additive noise
    async fn act_with_noise(
        &mut self,
        observation: &VectorObservation,
        noise: &NoiseParams,
        mode: NoiseMode,
    ) -> crate::Result<ContinuousAction>;

    /// Called once at the start of every episode, after the environment reset
    fn begin_episode(&mut self) {}

    /// Record a transition in the replay store
    fn store_observe(&mut self, transition: Transition);

    /// Run one optimization update
    ///
    /// Value networks are always trained; `update_policy` and
    /// `update_targets` gate the policy step and target smoothing.
    async fn update(&mut self, update_policy: bool, update_targets: bool) -> crate::Result<UpdateStats>;

    /// Persist all networks under `dir`, tagged with `version`
    async fn save(&self, dir: &Path, names: &NameMap, version: u64) -> crate::Result<()>;

    /// Restore the newest complete checkpoint under `dir`.
    ///
    /// Returns the loaded version, or `None` if nothing was found.
    async fn load(&mut self, dir: &Path, names: &NameMap) -> crate::Result<Option<u64>>;

    /// Number of transitions currently stored
    fn replay_len(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_map_resolution() {
        let mut names = NameMap::default();
        names.0.insert("actor".into(), "walker_actor".into());
        assert_eq!(names.resolve("actor"), "walker_actor");
        assert_eq!(names.resolve("critic"), "critic");
    }
}
