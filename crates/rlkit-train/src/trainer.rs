//! Episodic off-policy training loop
//!
//! Epochs contain episodes, episodes contain steps. Every episode:
//! - saves the agent when the episode index is a multiple of
//!   `model_save_int`
//! - collects at most `max_steps` transitions, with noisy actions, or with
//!   deterministic actions and frame capture when the episode is profiled
//! - once warm-up is over, runs one agent update per collected step, with the
//!   policy and targets only touched on every other update

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use rlkit_core::{
    Agent, ContinuousAction, Counter, Environment, Frame, RLError, RenderMode, Result, Reward,
    Transition, VectorObservation,
};

use crate::animation::AnimationAssembler;
use crate::config::TrainConfig;
use crate::layout::AgentLayout;
use crate::telemetry::{keys, ScalarSink};

/// What a single environment step produced
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Joint observation after the step
    pub next_observation: VectorObservation,
    /// Shared scalar reward
    pub reward: Reward,
    /// The environment reported the episode over
    pub done: bool,
    /// Stored terminal flag: `done` or the step cap was reached
    pub terminal: bool,
    /// Captured frame on profiled episodes
    pub frame: Option<Frame>,
}

/// Summary of one finished episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeOutcome {
    /// Epoch the episode belonged to
    pub epoch: u64,
    /// Episode index within the epoch
    pub episode: u64,
    /// Steps taken
    pub steps: u64,
    /// Summed reward
    pub total_reward: Reward,
    /// Ended by the environment rather than the step cap
    pub terminated: bool,
    /// Actions were deterministic and frames were captured
    pub rendered: bool,
    /// Checkpoint version written at the start of the episode
    pub saved_as: Option<u64>,
    /// Agent updates run after the episode
    pub updates: u64,
}

/// Totals of a full run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainSummary {
    /// Epochs completed
    pub epochs: u64,
    /// Episodes completed across all epochs
    pub episodes: u64,
    /// Environment steps taken
    pub global_steps: u64,
    /// Agent updates run
    pub updates: u64,
    /// Checkpoint the run resumed from
    pub resumed_from: Option<u64>,
}

/// Absolute checkpoint index of `episode` in `epoch`, counting from 1
pub fn checkpoint_version(epoch: u64, episode: u64, max_episodes: u64) -> Result<u64> {
    epoch
        .saturating_sub(1)
        .checked_mul(max_episodes)
        .and_then(|offset| offset.checked_add(episode))
        .ok_or_else(|| {
            RLError::Config(format!(
                "checkpoint index overflows u64 at epoch {epoch}, episode {episode} with {max_episodes} episodes per epoch"
            ))
        })
}

/// Drives an agent through an environment
pub struct Trainer<E, A, S, G> {
    config: Arc<TrainConfig>,
    layout: AgentLayout,
    env: E,
    agent: A,
    sink: S,
    animator: G,
    epoch: Counter,
    episode: Counter,
    global_step: Counter,
    local_step: Counter,
    updates: u64,
}

impl<E, A, S, G> Trainer<E, A, S, G>
where
    E: Environment,
    A: Agent,
    S: ScalarSink,
    G: AnimationAssembler,
{
    /// Wire up the collaborators; fails if the environment does not match the layout
    pub fn new(config: Arc<TrainConfig>, env: E, agent: A, sink: S, animator: G) -> Result<Self> {
        let layout = AgentLayout::new(config.agent_num, config.observe_dim, config.action_dim);
        layout.validate(&env.observation_space(), &env.action_space())?;
        Ok(Self {
            config,
            layout,
            env,
            agent,
            sink,
            animator,
            epoch: Counter::new(),
            episode: Counter::new(),
            global_step: Counter::new(),
            local_step: Counter::new(),
            updates: 0,
        })
    }

    /// Frozen run configuration
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// The environment
    pub fn env(&self) -> &E {
        &self.env
    }

    /// The agent
    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// The telemetry sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The animation assembler
    pub fn animator(&self) -> &G {
        &self.animator
    }

    /// Current `(epoch, episode, global_step, local_step)`
    pub fn counters(&self) -> (u64, u64, u64, u64) {
        (
            self.epoch.get(),
            self.episode.get(),
            self.global_step.get(),
            self.local_step.get(),
        )
    }

    /// Take the collaborators back
    pub fn into_parts(self) -> (E, A, S, G) {
        (self.env, self.agent, self.sink, self.animator)
    }

    /// Load the newest checkpoint unless the run restarts from scratch
    pub async fn restore(&mut self) -> Result<Option<u64>> {
        if self.config.restart {
            return Ok(None);
        }
        let version = self
            .agent
            .load(&self.config.model_dir(), &self.config.save_map)
            .await?;
        match version {
            Some(v) => info!("Resumed from checkpoint {}", v),
            None => info!("No checkpoint under {}, starting fresh", self.config.model_dir().display()),
        }
        Ok(version)
    }

    /// Run every epoch
    pub async fn run(&mut self) -> Result<TrainSummary> {
        let resumed_from = self.restore().await?;
        let mut summary = TrainSummary {
            resumed_from,
            ..TrainSummary::default()
        };

        while self.epoch < self.config.max_epochs {
            let outcomes = self.run_epoch().await?;
            summary.epochs += 1;
            summary.episodes += outcomes.len() as u64;
        }

        self.sink.flush()?;
        summary.global_steps = self.global_step.get();
        summary.updates = self.updates;
        info!(
            "Training finished: {} epochs, {} episodes, {} steps, {} updates",
            summary.epochs, summary.episodes, summary.global_steps, summary.updates
        );
        Ok(summary)
    }

    /// Advance the epoch counter and rewind the episode counter
    pub fn begin_epoch(&mut self) -> u64 {
        let epoch = self.epoch.count();
        self.episode.reset();
        info!("Begin epoch {}", epoch);
        epoch
    }

    /// Run all episodes of the next epoch
    pub async fn run_epoch(&mut self) -> Result<Vec<EpisodeOutcome>> {
        self.begin_epoch();
        let mut outcomes = Vec::new();
        while self.episode < self.config.max_episodes {
            outcomes.push(self.run_episode().await?);
        }
        Ok(outcomes)
    }

    /// Run the next episode of the current epoch
    pub async fn run_episode(&mut self) -> Result<EpisodeOutcome> {
        let config = Arc::clone(&self.config);
        let epoch = self.epoch.get();
        let episode = self.episode.count();
        let render = episode % config.profile_int == 0 && self.global_step > config.warmup_steps;

        let saved_as = if episode % config.model_save_int == 0 {
            let version = checkpoint_version(epoch, episode, config.max_episodes)?;
            self.agent
                .save(&config.model_dir(), &config.save_map, version)
                .await?;
            info!("Saved model {}", version);
            Some(version)
        } else {
            None
        };

        let episode_begin = Instant::now();
        let (mut observation, _) = self.env.reset().await?;
        self.agent.begin_episode();
        let mut total_reward = Reward::default();
        let mut frames = Vec::new();
        let mut terminated = false;

        while !terminated && self.local_step < config.max_steps {
            let outcome = self.step(&observation, render, total_reward).await?;
            total_reward += outcome.reward;
            terminated = outcome.done;
            frames.extend(outcome.frame);
            observation = outcome.next_observation;
        }

        let steps = self.local_step.get();
        info!("Sum reward: {}, epoch={}, episode={}", total_reward, epoch, episode);

        let mut updates = 0;
        if self.global_step > config.warmup_steps {
            for i in 0..steps {
                let delayed = i % 2 == 0;
                let update_begin = Instant::now();
                let stats = self.agent.update(delayed, delayed).await?;
                updates += 1;
                debug!(
                    policy_loss = ?stats.policy_loss,
                    value_loss = stats.value_loss,
                    performed = stats.performed,
                    "Update losses"
                );
                info!(
                    "Train step {} completed in {:.3} s",
                    i,
                    update_begin.elapsed().as_secs_f64()
                );
            }
        }
        self.updates += updates;

        if render {
            let path = config.images_dir().join(format!("{epoch}_{episode}.gif"));
            self.animator.assemble(&frames, &path)?;
            info!("Saved animation {}", path.display());
        }

        self.local_step.reset();
        info!(
            "Episode {} completed in {:.3} s",
            episode,
            episode_begin.elapsed().as_secs_f64()
        );

        Ok(EpisodeOutcome {
            epoch,
            episode,
            steps,
            total_reward,
            terminated,
            rendered: render,
            saved_as,
            updates,
        })
    }

    /// One environment step for all agents
    async fn step(
        &mut self,
        observation: &VectorObservation,
        render: bool,
        reward_so_far: Reward,
    ) -> Result<StepOutcome> {
        let global_step = self.global_step.count();
        let local_step = self.local_step.count();
        let step_begin = Instant::now();

        let mut joint = ContinuousAction::zeros(self.layout.joint_action_dim());
        for ag in 0..self.layout.agent_num {
            let view = self.layout.observation(observation, ag)?;
            let action = if render {
                self.agent.act(&view).await?
            } else {
                self.agent
                    .act_with_noise(&view, &self.config.explore_noise_params, self.config.explore_noise_mode)
                    .await?
            };
            RLError::check_dim(self.layout.action_dim, action.dim())?;
            self.layout.action_mut(&mut joint, ag)?.assign(&action.0);
        }
        let joint = joint.clamped(-1.0, 1.0);

        let step = self.env.step(&joint).await?;
        let frame = if render {
            self.env.render(RenderMode::RgbArray).await?
        } else {
            None
        };

        let terminal = step.done || self.local_step == self.config.max_steps;
        for ag in 0..self.layout.agent_num {
            self.agent.store_observe(Transition::new(
                self.layout.observation(observation, ag)?,
                self.layout.action(&joint, ag)?,
                self.layout.observation(&step.observation, ag)?,
                step.reward,
                terminal,
            ));
        }

        let step_time = step_begin.elapsed().as_secs_f64();
        #[allow(clippy::cast_precision_loss)]
        let scalars = [
            (keys::ACTION_MIN, f64::from(joint.min())),
            (keys::ACTION_MEAN, f64::from(joint.mean())),
            (keys::ACTION_MAX, f64::from(joint.max())),
            (keys::STEP_TIME, step_time),
            (keys::EPISODIC_REWARD, step.reward.value()),
            (keys::EPISODIC_SUM_REWARD, (reward_so_far + step.reward).value()),
            (keys::EPISODE_LENGTH, local_step as f64),
        ];
        for (name, value) in scalars {
            self.sink.add_scalar(name, value, global_step)?;
        }
        info!("Step {} completed in {:.3} s", local_step, step_time);

        Ok(StepOutcome {
            next_observation: step.observation,
            reward: step.reward,
            done: step.done,
            terminal,
            frame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_version_counts_across_epochs() {
        assert_eq!(checkpoint_version(1, 2, 4).unwrap(), 2);
        assert_eq!(checkpoint_version(2, 2, 4).unwrap(), 6);
        assert_eq!(checkpoint_version(0, 3, 4).unwrap(), 3);
    }

    #[test]
    fn test_checkpoint_version_overflow_is_a_config_error() {
        assert!(matches!(checkpoint_version(3, 1, u64::MAX / 2 + 1), Err(RLError::Config(_))));
        assert!(matches!(checkpoint_version(2, 1, u64::MAX), Err(RLError::Config(_))));
        assert_eq!(checkpoint_version(1, u64::MAX, u64::MAX).unwrap(), u64::MAX);
    }
}
