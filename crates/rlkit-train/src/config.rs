//! Training configuration
//!
//! A [`TrainConfig`] is built once, in layers: compiled-in defaults, then an
//! optional JSON file, then `key=value` overrides. The result is validated
//! and handed to the trainer as an `Arc<TrainConfig>`; nothing mutates it
//! afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use rlkit_agent::{DdpgTd3Config, Reduction, TargetPolicyNoise};
use rlkit_core::{EnvironmentConfig, NameMap, NoiseMode, NoiseParams, RLError, Result};

/// File name of the scalar telemetry stream inside `log/train_log/`
pub const SCALARS_FILE: &str = "scalars.jsonl";

/// Every knob of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    /// Start from fresh networks; when false the latest checkpoint is loaded
    pub restart: bool,
    /// Number of epochs
    pub max_epochs: u64,
    /// Episodes per epoch
    pub max_episodes: u64,
    /// Step cap per episode
    pub max_steps: u64,
    /// Replay store capacity
    pub replay_size: usize,
    /// Number of agents sharing one environment
    pub agent_num: usize,
    /// Exploration noise, one pair per action dimension of a single agent
    pub explore_noise_params: NoiseParams,
    /// Exploration noise family
    pub explore_noise_mode: NoiseMode,
    /// Target policy smoothing noise; empty disables smoothing
    pub policy_noise_params: NoiseParams,
    /// Smoothing noise is clipped to `[-clip, clip]`
    pub policy_noise_clip: f32,
    /// Run directory holding `model/` and `log/`
    pub root_dir: PathBuf,
    /// Network name to checkpoint file stem
    pub save_map: NameMap,
    /// Observation width per agent
    pub observe_dim: usize,
    /// Action width per agent
    pub action_dim: usize,
    /// Hidden layer sizes of actor and critics
    pub hidden_dims: Vec<usize>,
    /// Transitions per update
    pub batch_size: usize,
    /// Global steps collected before rendering and updates begin
    pub warmup_steps: u64,
    /// Save every this many episodes
    pub model_save_int: u64,
    /// Render every this many episodes
    pub profile_int: u64,
    /// Discount factor
    pub discount: f32,
    /// Target smoothing rate
    pub update_rate: f32,
    /// Adam step size
    pub learning_rate: f32,
    /// Critic loss reduction
    pub reduction: Reduction,
    /// Registered environment name
    pub env: String,
    /// Seed for environment and agent
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            restart: true,
            max_epochs: 20,
            max_episodes: 1000,
            max_steps: 2000,
            replay_size: 500_000,
            agent_num: 1,
            explore_noise_params: NoiseParams::repeat((0.0, 0.2), 1),
            explore_noise_mode: NoiseMode::Normal,
            policy_noise_params: NoiseParams::repeat((0.0, 0.1), 1),
            policy_noise_clip: 0.5,
            root_dir: PathBuf::from("runs/pendulum"),
            save_map: NameMap::default(),
            observe_dim: 3,
            action_dim: 1,
            hidden_dims: vec![400, 300],
            batch_size: 100,
            warmup_steps: 20,
            model_save_int: 500,
            profile_int: 50,
            discount: 0.99,
            update_rate: 0.005,
            learning_rate: 1e-3,
            reduction: Reduction::Sum,
            env: "pendulum".to_string(),
            seed: None,
        }
    }
}

impl TrainConfig {
    /// Layer an optional JSON file and `key=value` overrides over the defaults
    pub fn load<S: AsRef<str>>(file: Option<&Path>, overrides: &[S]) -> Result<Self> {
        let mut value = serde_json::to_value(Self::default())?;

        if let Some(path) = file {
            let text = std::fs::read_to_string(path)?;
            let layer: Value = serde_json::from_str(&text)?;
            merge(&mut value, layer);
        }

        for raw in overrides {
            apply_override(&mut value, raw.as_ref())?;
        }

        let config: Self = serde_json::from_value(value)
            .map_err(|e| RLError::Config(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the loop cannot run
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max_steps", self.max_steps),
            ("model_save_int", self.model_save_int),
            ("profile_int", self.profile_int),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(RLError::Config(format!("{name} must be positive")));
            }
        }
        if self.agent_num == 0 || self.observe_dim == 0 || self.action_dim == 0 {
            return Err(RLError::Config(
                "agent_num, observe_dim and action_dim must be positive".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(RLError::Config("batch_size must be positive".into()));
        }
        RLError::check_dim(self.action_dim, self.explore_noise_params.dim())?;
        if self.policy_noise_params.dim() != 0 {
            RLError::check_dim(self.action_dim, self.policy_noise_params.dim())?;
        }
        if !(0.0..=1.0).contains(&self.update_rate) {
            return Err(RLError::Config(format!(
                "update_rate must lie in [0, 1], got {}",
                self.update_rate
            )));
        }
        Ok(())
    }

    /// Checkpoint directory
    #[must_use]
    pub fn model_dir(&self) -> PathBuf {
        self.root_dir.join("model")
    }

    /// Log directory
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.root_dir.join("log")
    }

    /// Animation directory
    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.log_dir().join("images")
    }

    /// Telemetry directory
    #[must_use]
    pub fn train_log_dir(&self) -> PathBuf {
        self.log_dir().join("train_log")
    }

    /// Telemetry stream path
    #[must_use]
    pub fn scalars_path(&self) -> PathBuf {
        self.train_log_dir().join(SCALARS_FILE)
    }

    /// Agent configuration for one agent of the layout
    #[must_use]
    pub fn agent_config(&self) -> DdpgTd3Config {
        DdpgTd3Config {
            observe_dim: self.observe_dim,
            action_dim: self.action_dim,
            hidden_dims: self.hidden_dims.clone(),
            max_action: 1.0,
            discount: self.discount,
            update_rate: self.update_rate,
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            replay_size: self.replay_size,
            reduction: self.reduction,
            target_policy_noise: self.target_policy_noise(),
            seed: self.seed,
        }
    }

    /// Smoothing noise for target actions.
    ///
    /// The agent draws one std for all dimensions, so the widest configured
    /// std is used.
    #[must_use]
    pub fn target_policy_noise(&self) -> Option<TargetPolicyNoise> {
        self.policy_noise_params
            .0
            .iter()
            .map(|&(_, std)| std)
            .reduce(f32::max)
            .map(|std| TargetPolicyNoise {
                std,
                clip: self.policy_noise_clip,
            })
    }

    /// Environment configuration; the loop enforces `max_steps` itself
    #[must_use]
    pub fn env_config(&self) -> EnvironmentConfig {
        EnvironmentConfig {
            seed: self.seed,
            max_steps: None,
            params: Map::new(),
        }
    }
}

/// Recursively overlay `layer` onto `base`; objects merge, everything else replaces
fn merge(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, layer) => *base = layer,
    }
}

/// Apply one `dotted.key=value` override.
///
/// The value is parsed as JSON; anything that does not parse is taken as a
/// plain string, so `--set env=pendulum` works without quoting.
fn apply_override(config: &mut Value, raw: &str) -> Result<()> {
    let (key, text) = raw
        .split_once('=')
        .ok_or_else(|| RLError::Config(format!("override `{raw}` is not key=value")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(RLError::Config(format!("override `{raw}` has an empty key")));
    }
    let value = serde_json::from_str(text.trim()).unwrap_or_else(|_| Value::String(text.trim().to_string()));

    let mut layer = value;
    for part in key.rsplit('.') {
        let mut object = Map::new();
        object.insert(part.to_string(), layer);
        layer = Value::Object(object);
    }
    merge(config, layer);
    Ok(())
}
