//! DDPG with TD3 extensions
//!
//! One deterministic actor and two critics, each with a target copy. Targets
//! never receive gradient steps; they only move by Polyak averaging in
//! [`DdpgTd3::update`] when `update_targets` is set. Value targets use the
//! minimum of the two target critics (clipped double Q-learning), and the
//! target action is smoothed with clipped Gaussian noise.
//!
//! Delaying policy updates is the caller's choice: pass `update_policy` and
//! `update_targets` on every other call.

use async_trait::async_trait;
use ndarray::{concatenate, s, Array2, ArrayView2, Axis, Zip};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use rlkit_core::{
    Agent, ContinuousAction, NameMap, NoiseGenerator, NoiseMode, NoiseParams, RLError, Result, Transition,
    UpdateStats, VectorObservation,
};

use crate::buffer::ReplayBuffer;
use crate::nn::{Mlp, MlpConfig};
use crate::optim::{mse_loss, Adam, AdamConfig, Reduction};

/// Network names as used for checkpoint files
pub const NETWORK_NAMES: [&str; 6] = [
    "actor",
    "actor_target",
    "critic",
    "critic_target",
    "critic2",
    "critic2_target",
];

/// Clipped Gaussian noise added to target actions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetPolicyNoise {
    /// Noise standard deviation
    pub std: f32,
    /// Noise is clipped to `[-clip, clip]`
    pub clip: f32,
}

impl Default for TargetPolicyNoise {
    fn default() -> Self {
        Self { std: 0.1, clip: 0.5 }
    }
}

/// DDPG/TD3 configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DdpgTd3Config {
    /// Observation width per agent
    pub observe_dim: usize,
    /// Action width per agent
    pub action_dim: usize,
    /// Hidden layer sizes shared by actor and critics
    pub hidden_dims: Vec<usize>,
    /// Actor output bound
    pub max_action: f32,
    /// Discount factor
    pub discount: f32,
    /// Target smoothing rate (tau)
    pub update_rate: f32,
    /// Transitions per update
    pub batch_size: usize,
    /// Adam step size for all networks
    pub learning_rate: f32,
    /// Replay store capacity
    pub replay_size: usize,
    /// Critic loss reduction
    pub reduction: Reduction,
    /// Target policy smoothing; `None` disables it
    pub target_policy_noise: Option<TargetPolicyNoise>,
    /// RNG seed for initialisation, sampling and noise
    pub seed: Option<u64>,
}

impl Default for DdpgTd3Config {
    fn default() -> Self {
        Self {
            observe_dim: 3,
            action_dim: 1,
            hidden_dims: vec![400, 300],
            max_action: 1.0,
            discount: 0.99,
            update_rate: 0.005,
            batch_size: 100,
            learning_rate: 1e-3,
            replay_size: 500_000,
            reduction: Reduction::Sum,
            target_policy_noise: Some(TargetPolicyNoise::default()),
            seed: None,
        }
    }
}

/// DDPG agent with twin critics, target smoothing and delayed policy updates
#[derive(Debug)]
pub struct DdpgTd3 {
    config: DdpgTd3Config,
    actor: Mlp,
    actor_target: Mlp,
    critic: Mlp,
    critic_target: Mlp,
    critic2: Mlp,
    critic2_target: Mlp,
    actor_optim: Adam,
    critic_optim: Adam,
    critic2_optim: Adam,
    replay: ReplayBuffer,
    noise: NoiseGenerator,
    rng: StdRng,
    updates: u64,
}

impl DdpgTd3 {
    /// Build networks and optimizers; targets start as exact copies
    pub fn new(config: DdpgTd3Config) -> Result<Self> {
        if config.observe_dim == 0 || config.action_dim == 0 {
            return Err(RLError::Config("observe_dim and action_dim must be positive".into()));
        }
        if !(0.0..=1.0).contains(&config.update_rate) {
            return Err(RLError::Config(format!(
                "update_rate must lie in [0, 1], got {}",
                config.update_rate
            )));
        }

        let mut rng = config.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let actor_config = MlpConfig::actor(
            config.observe_dim,
            config.action_dim,
            config.hidden_dims.clone(),
            config.max_action,
        );
        let critic_config = MlpConfig::critic(config.observe_dim, config.action_dim, config.hidden_dims.clone());

        let actor = Mlp::new(actor_config, &mut rng);
        let critic = Mlp::new(critic_config.clone(), &mut rng);
        let critic2 = Mlp::new(critic_config, &mut rng);

        let adam = AdamConfig {
            learning_rate: config.learning_rate,
            ..AdamConfig::default()
        };

        Ok(Self {
            actor_optim: Adam::new(adam, &actor),
            critic_optim: Adam::new(adam, &critic),
            critic2_optim: Adam::new(adam, &critic2),
            actor_target: actor.clone(),
            critic_target: critic.clone(),
            critic2_target: critic2.clone(),
            actor,
            critic,
            critic2,
            replay: ReplayBuffer::new(config.replay_size),
            noise: NoiseGenerator::new(),
            rng,
            updates: 0,
            config,
        })
    }

    /// Agent configuration
    #[must_use]
    pub fn config(&self) -> &DdpgTd3Config {
        &self.config
    }

    /// Online actor
    #[must_use]
    pub fn actor(&self) -> &Mlp {
        &self.actor
    }

    /// Online critics
    #[must_use]
    pub fn critics(&self) -> (&Mlp, &Mlp) {
        (&self.critic, &self.critic2)
    }

    /// Target networks `(actor, critic, critic2)`
    #[must_use]
    pub fn targets(&self) -> (&Mlp, &Mlp, &Mlp) {
        (&self.actor_target, &self.critic_target, &self.critic2_target)
    }

    /// Replay store
    #[must_use]
    pub fn replay(&self) -> &ReplayBuffer {
        &self.replay
    }

    /// Number of updates performed
    #[must_use]
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Clear temporally correlated exploration state
    pub fn reset_noise(&mut self) {
        self.noise.reset();
    }

    fn networks(&self) -> [(&'static str, &Mlp); 6] {
        [
            (NETWORK_NAMES[0], &self.actor),
            (NETWORK_NAMES[1], &self.actor_target),
            (NETWORK_NAMES[2], &self.critic),
            (NETWORK_NAMES[3], &self.critic_target),
            (NETWORK_NAMES[4], &self.critic2),
            (NETWORK_NAMES[5], &self.critic2_target),
        ]
    }

    fn network_mut(&mut self, name: &str) -> Option<&mut Mlp> {
        match name {
            "actor" => Some(&mut self.actor),
            "actor_target" => Some(&mut self.actor_target),
            "critic" => Some(&mut self.critic),
            "critic_target" => Some(&mut self.critic_target),
            "critic2" => Some(&mut self.critic2),
            "critic2_target" => Some(&mut self.critic2_target),
            _ => None,
        }
    }

    fn single_row(&self, observation: &VectorObservation) -> Result<Array2<f32>> {
        RLError::check_dim(self.config.observe_dim, observation.dim())?;
        observation
            .data
            .clone()
            .into_shape((1, self.config.observe_dim))
            .map_err(|e| RLError::Computation(e.to_string()))
    }

    fn deterministic(&self, observation: &VectorObservation) -> Result<ContinuousAction> {
        let row = self.single_row(observation)?;
        let out = self.actor.forward(&row.view())?;
        Ok(ContinuousAction(out.row(0).to_owned()))
    }

    fn state_action(observations: &ArrayView2<f32>, actions: &ArrayView2<f32>) -> Result<Array2<f32>> {
        concatenate(Axis(1), &[observations.view(), actions.view()])
            .map_err(|e| RLError::Computation(format!("state-action concat: {e}")))
    }

    /// `r + discount * (1 - terminal) * min(Q1'(s', a'), Q2'(s', a'))`
    fn value_targets(&mut self, batch: &crate::buffer::Batch) -> Result<Array2<f32>> {
        let mut next_actions = self.actor_target.forward(&batch.next_observations.view())?;
        if let Some(TargetPolicyNoise { std, clip }) = self.config.target_policy_noise {
            let dist = Normal::new(0.0, std).map_err(|e| RLError::Computation(e.to_string()))?;
            let bound = self.config.max_action;
            let rng = &mut self.rng;
            next_actions.mapv_inplace(|a| (a + dist.sample(&mut *rng).clamp(-clip, clip)).clamp(-bound, bound));
        }

        let next_sa = Self::state_action(&batch.next_observations.view(), &next_actions.view())?;
        let q1 = self.critic_target.forward(&next_sa.view())?;
        let q2 = self.critic2_target.forward(&next_sa.view())?;

        let discount = self.config.discount;
        let mut targets = Array2::zeros(q1.dim());
        Zip::from(&mut targets)
            .and(&batch.rewards)
            .and(&batch.terminals)
            .and(&q1)
            .and(&q2)
            .for_each(|y, &r, &done, &a, &b| *y = r + discount * (1.0 - done) * a.min(b));
        Ok(targets)
    }

    fn train_critic(critic: &Mlp, input: &Array2<f32>, targets: &Array2<f32>, reduction: Reduction) -> Result<(f32, crate::nn::Gradients)> {
        let (q, cache) = critic.forward_train(&input.view())?;
        let (loss, grad) = mse_loss(&q, targets, reduction)?;
        let (grads, _) = critic.backward(&cache, &grad)?;
        Ok((loss, grads))
    }

    /// Maximise `Q1(s, actor(s))` w.r.t. the actor only
    fn train_actor(&mut self, observations: &Array2<f32>) -> Result<f32> {
        let (actions, actor_cache) = self.actor.forward_train(&observations.view())?;
        let sa = Self::state_action(&observations.view(), &actions.view())?;
        let (q, critic_cache) = self.critic.forward_train(&sa.view())?;

        #[allow(clippy::cast_precision_loss)]
        let n = q.nrows().max(1) as f32;
        let policy_loss = -q.sum() / n;
        let grad_q = Array2::from_elem(q.dim(), -1.0 / n);
        let (_, grad_sa) = self.critic.backward(&critic_cache, &grad_q)?;
        let grad_actions = grad_sa.slice(s![.., self.config.observe_dim..]).to_owned();
        let (actor_grads, _) = self.actor.backward(&actor_cache, &grad_actions)?;
        self.actor_optim.step(&mut self.actor, &actor_grads)?;
        Ok(policy_loss)
    }

    fn soft_update_targets(&mut self) -> Result<()> {
        let tau = self.config.update_rate;
        self.actor_target.soft_update(&self.actor, tau)?;
        self.critic_target.soft_update(&self.critic, tau)?;
        self.critic2_target.soft_update(&self.critic2, tau)?;
        Ok(())
    }

    fn checkpoint_path(dir: &Path, stem: &str, version: u64) -> PathBuf {
        dir.join(format!("{stem}_{version}.json"))
    }

    /// Versions present on disk for every network
    async fn complete_versions(dir: &Path, names: &NameMap) -> Result<BTreeSet<u64>> {
        let mut found: BTreeMap<&'static str, BTreeSet<u64>> = BTreeMap::new();
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else { continue };
            let Some(stem) = file_name.strip_suffix(".json") else { continue };
            for name in NETWORK_NAMES {
                let prefix = format!("{}_", names.resolve(name));
                if let Some(version) = stem.strip_prefix(&prefix).and_then(|v| v.parse::<u64>().ok()) {
                    found.entry(name).or_default().insert(version);
                }
            }
        }

        let mut complete: Option<BTreeSet<u64>> = None;
        for name in NETWORK_NAMES {
            let versions = found.remove(name).unwrap_or_default();
            complete = Some(match complete {
                None => versions,
                Some(acc) => acc.intersection(&versions).copied().collect(),
            });
        }
        Ok(complete.unwrap_or_default())
    }
}

#[async_trait]
impl Agent for DdpgTd3 {
    async fn act(&self, observation: &VectorObservation) -> Result<ContinuousAction> {
        self.deterministic(observation)
    }

    async fn act_with_noise(
        &mut self,
        observation: &VectorObservation,
        noise: &NoiseParams,
        mode: NoiseMode,
    ) -> Result<ContinuousAction> {
        let action = self.deterministic(observation)?;
        let noisy = self.noise.apply(&action.0, noise, mode, &mut self.rng)?;
        Ok(ContinuousAction(noisy))
    }

    fn begin_episode(&mut self) {
        self.reset_noise();
    }

    fn store_observe(&mut self, transition: Transition) {
        self.replay.push(transition);
    }

    async fn update(&mut self, update_policy: bool, update_targets: bool) -> Result<UpdateStats> {
        let Some(batch) = self.replay.sample_batch(self.config.batch_size, &mut self.rng)? else {
            debug!("Replay store empty, skipping update");
            return Ok(UpdateStats::default());
        };
        RLError::check_dim(self.config.observe_dim, batch.observations.ncols())?;
        RLError::check_dim(self.config.action_dim, batch.actions.ncols())?;

        let targets = self.value_targets(&batch)?;
        let sa = Self::state_action(&batch.observations.view(), &batch.actions.view())?;

        let reduction = self.config.reduction;
        let (loss1, grads1) = Self::train_critic(&self.critic, &sa, &targets, reduction)?;
        self.critic_optim.step(&mut self.critic, &grads1)?;
        let (loss2, grads2) = Self::train_critic(&self.critic2, &sa, &targets, reduction)?;
        self.critic2_optim.step(&mut self.critic2, &grads2)?;

        let policy_loss = if update_policy {
            Some(self.train_actor(&batch.observations)?)
        } else {
            None
        };

        if update_targets {
            self.soft_update_targets()?;
        }

        self.updates += 1;
        let stats = UpdateStats {
            policy_loss,
            value_loss: (loss1 + loss2) / 2.0,
            performed: true,
        };
        debug!(
            update = self.updates,
            value_loss = stats.value_loss,
            policy_loss = ?stats.policy_loss,
            "TD3 update"
        );
        Ok(stats)
    }

    async fn save(&self, dir: &Path, names: &NameMap, version: u64) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;
        for (name, net) in self.networks() {
            let path = Self::checkpoint_path(dir, names.resolve(name), version);
            let json = serde_json::to_string(net)?;
            tokio::fs::write(&path, json).await?;
        }
        info!(dir = %dir.display(), version, "Saved DDPG/TD3 networks");
        Ok(())
    }

    async fn load(&mut self, dir: &Path, names: &NameMap) -> Result<Option<u64>> {
        let Some(version) = Self::complete_versions(dir, names).await?.last().copied() else {
            info!(dir = %dir.display(), "No complete checkpoint found");
            return Ok(None);
        };

        // Nothing is replaced until every network has been read and checked
        let mut loaded = Vec::with_capacity(NETWORK_NAMES.len());
        for (name, current) in self.networks() {
            let path = Self::checkpoint_path(dir, names.resolve(name), version);
            let json = tokio::fs::read_to_string(&path).await?;
            let net: Mlp = serde_json::from_str(&json)
                .map_err(|e| RLError::Checkpoint(format!("{}: {e}", path.display())))?;
            current.check_same_shape(&net)?;
            loaded.push((name, net));
        }
        for (name, net) in loaded {
            *self
                .network_mut(name)
                .ok_or_else(|| RLError::Checkpoint(format!("unknown network {name}")))? = net;
        }
        info!(dir = %dir.display(), version, "Loaded DDPG/TD3 networks");
        Ok(Some(version))
    }

    fn replay_len(&self) -> usize {
        self.replay.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlkit_core::Reward;

    fn tiny_config() -> DdpgTd3Config {
        DdpgTd3Config {
            observe_dim: 3,
            action_dim: 2,
            hidden_dims: vec![16, 16],
            batch_size: 8,
            replay_size: 64,
            seed: Some(9),
            ..DdpgTd3Config::default()
        }
    }

    fn fill(agent: &mut DdpgTd3, n: usize) {
        for i in 0..n {
            let v = i as f32 / n as f32;
            agent.store_observe(Transition::new(
                VectorObservation::new(vec![v, -v, 0.5]),
                ContinuousAction::new(vec![v, -v]),
                VectorObservation::new(vec![v + 0.1, -v, 0.5]),
                Reward(f64::from(v)),
                i % 10 == 9,
            ));
        }
    }

    #[tokio::test]
    async fn test_act_is_bounded_and_deterministic() {
        let agent = DdpgTd3::new(tiny_config()).unwrap();
        let obs = VectorObservation::new(vec![0.1, 0.2, 0.3]);
        let a = agent.act(&obs).await.unwrap();
        let b = agent.act(&obs).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dim(), 2);
        assert!(a.0.iter().all(|v| v.abs() <= 1.0));
    }

    #[tokio::test]
    async fn test_act_rejects_wrong_observation_width() {
        let agent = DdpgTd3::new(tiny_config()).unwrap();
        let obs = VectorObservation::new(vec![0.0; 4]);
        assert!(matches!(
            agent.act(&obs).await,
            Err(RLError::DimensionMismatch { expected: 3, actual: 4 })
        ));
    }

    #[tokio::test]
    async fn test_act_with_noise_perturbs() {
        let mut agent = DdpgTd3::new(tiny_config()).unwrap();
        let obs = VectorObservation::new(vec![0.1, 0.2, 0.3]);
        let clean = agent.act(&obs).await.unwrap();
        let noisy = agent
            .act_with_noise(&obs, &NoiseParams::repeat((0.0, 0.2), 2), NoiseMode::Normal)
            .await
            .unwrap();
        assert_ne!(clean, noisy);
    }

    #[tokio::test]
    async fn test_begin_episode_restarts_ou_noise() {
        let config = DdpgTd3Config { action_dim: 1, ..tiny_config() };
        let mode = NoiseMode::OrnsteinUhlenbeck { theta: 0.15, dt: 1.0 };
        // OU starts at the mean; zero std keeps it there only from a fresh state
        let params = NoiseParams(vec![(0.5, 0.0)]);
        let walk = NoiseParams(vec![(0.5, 1.0)]);
        let obs = VectorObservation::new(vec![0.1, 0.2, 0.3]);

        let mut agent = DdpgTd3::new(config).unwrap();
        let clean = agent.act(&obs).await.unwrap();
        agent.act_with_noise(&obs, &walk, mode).await.unwrap();
        let drifted = agent.act_with_noise(&obs, &params, mode).await.unwrap();
        assert!((drifted.0[0] - clean.0[0] - 0.5).abs() > 1e-4);

        agent.begin_episode();
        let fresh = agent.act_with_noise(&obs, &params, mode).await.unwrap();
        approx::assert_abs_diff_eq!(fresh.0[0], clean.0[0] + 0.5, epsilon = 1e-6);
    }

    #[tokio::test]
    async fn test_update_on_empty_store_is_skipped() {
        let mut agent = DdpgTd3::new(tiny_config()).unwrap();
        let stats = agent.update(true, true).await.unwrap();
        assert!(!stats.performed);
        assert_eq!(agent.updates(), 0);
    }

    #[tokio::test]
    async fn test_targets_move_only_on_target_updates() {
        let mut agent = DdpgTd3::new(tiny_config()).unwrap();
        fill(&mut agent, 32);
        let (actor_t, critic_t, critic2_t) = agent.targets();
        let (actor_t, critic_t, critic2_t) = (actor_t.clone(), critic_t.clone(), critic2_t.clone());
        let actor_before = agent.actor().clone();

        let stats = agent.update(false, false).await.unwrap();
        assert!(stats.performed);
        assert!(stats.policy_loss.is_none());
        assert_eq!(agent.targets().0, &actor_t);
        assert_eq!(agent.targets().1, &critic_t);
        assert_eq!(agent.targets().2, &critic2_t);
        assert_eq!(agent.actor(), &actor_before, "actor must not move without update_policy");
        assert_ne!(agent.critics().0, &critic_t, "critic must train every update");

        let stats = agent.update(true, true).await.unwrap();
        assert!(stats.policy_loss.is_some());
        assert_ne!(agent.actor(), &actor_before);
        assert_ne!(agent.targets().0, &actor_t);
        assert_ne!(agent.targets().1, &critic_t);
        assert_ne!(agent.targets().2, &critic2_t);
    }

    #[tokio::test]
    async fn test_value_targets_use_twin_minimum() {
        let mut agent = DdpgTd3::new(DdpgTd3Config {
            target_policy_noise: None,
            discount: 0.5,
            ..tiny_config()
        })
        .unwrap();
        fill(&mut agent, 8);
        let mut rng = StdRng::seed_from_u64(0);
        let batch = agent.replay().sample_batch(8, &mut rng).unwrap().unwrap();
        let targets = agent.value_targets(&batch).unwrap();

        let next_actions = agent.actor_target.forward(&batch.next_observations.view()).unwrap();
        let sa = DdpgTd3::state_action(&batch.next_observations.view(), &next_actions.view()).unwrap();
        let q1 = agent.critic_target.forward(&sa.view()).unwrap();
        let q2 = agent.critic2_target.forward(&sa.view()).unwrap();
        for i in 0..batch.len() {
            let expected =
                batch.rewards[[i, 0]] + 0.5 * (1.0 - batch.terminals[[i, 0]]) * q1[[i, 0]].min(q2[[i, 0]]);
            approx::assert_abs_diff_eq!(targets[[i, 0]], expected, epsilon = 1e-5);
        }
    }

    #[tokio::test]
    async fn test_save_then_load_latest_complete_version() {
        let dir = tempfile::tempdir().unwrap();
        let mut names = NameMap::default();
        names.0.insert("actor".into(), "policy".into());

        let mut agent = DdpgTd3::new(tiny_config()).unwrap();
        agent.save(dir.path(), &names, 500).await.unwrap();
        fill(&mut agent, 16);
        agent.update(true, true).await.unwrap();
        agent.save(dir.path(), &names, 1000).await.unwrap();
        assert!(dir.path().join("policy_1000.json").exists());

        // an incomplete newer version must be ignored
        tokio::fs::write(dir.path().join("policy_1500.json"), "{}").await.unwrap();

        let saved_actor = agent.actor().clone();
        let mut restored = DdpgTd3::new(DdpgTd3Config { seed: Some(77), ..tiny_config() }).unwrap();
        assert_ne!(restored.actor(), &saved_actor);
        let version = restored.load(dir.path(), &names).await.unwrap();
        assert_eq!(version, Some(1000));
        assert_eq!(restored.actor(), &saved_actor);
    }

    #[tokio::test]
    async fn test_load_from_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = DdpgTd3::new(tiny_config()).unwrap();
        assert_eq!(agent.load(dir.path(), &NameMap::default()).await.unwrap(), None);
        let missing = dir.path().join("missing");
        assert_eq!(agent.load(&missing, &NameMap::default()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_networks_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let source = DdpgTd3::new(tiny_config()).unwrap();
        source.save(dir.path(), &NameMap::default(), 1).await.unwrap();

        // last network in load order has the wrong shape
        let odd = DdpgTd3::new(DdpgTd3Config {
            hidden_dims: vec![4],
            ..tiny_config()
        })
        .unwrap();
        let json = serde_json::to_string(odd.targets().2).unwrap();
        tokio::fs::write(dir.path().join("critic2_target_1.json"), json).await.unwrap();

        let mut agent = DdpgTd3::new(DdpgTd3Config { seed: Some(5), ..tiny_config() }).unwrap();
        let actor = agent.actor().clone();
        let (critic, critic2) = (agent.critics().0.clone(), agent.critics().1.clone());
        let target_actor = agent.targets().0.clone();

        assert!(agent.load(dir.path(), &NameMap::default()).await.is_err());
        assert_eq!(agent.actor(), &actor);
        assert_eq!(agent.critics().0, &critic);
        assert_eq!(agent.critics().1, &critic2);
        assert_eq!(agent.targets().0, &target_actor);
    }

    #[tokio::test]
    async fn test_load_rejects_shape_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let small = DdpgTd3::new(tiny_config()).unwrap();
        small.save(dir.path(), &NameMap::default(), 1).await.unwrap();

        let mut wide = DdpgTd3::new(DdpgTd3Config {
            hidden_dims: vec![8],
            ..tiny_config()
        })
        .unwrap();
        assert!(matches!(
            wide.load(dir.path(), &NameMap::default()).await,
            Err(RLError::DimensionMismatch { .. })
        ));
    }
}
