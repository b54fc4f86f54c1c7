//! Classic continuous-control environments

use async_trait::async_trait;
use plotters::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use tracing::info;

use rlkit_core::{
    BoxSpace, ContinuousAction, Environment, EnvironmentConfig, Frame, RLError, RenderMode, Result,
    Reward, Step, StepInfo, VectorObservation,
};

const FRAME_SIZE: u32 = 200;

fn seeded_rng(config: &EnvironmentConfig) -> StdRng {
    config.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

fn draw_error<E: std::fmt::Display>(e: E) -> RLError {
    RLError::Environment(format!("failed to draw frame: {e}"))
}

/// Render onto a white `FRAME_SIZE` square bitmap
fn draw_frame<F>(draw: F) -> Result<Frame>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>) -> Result<()>,
{
    let side = FRAME_SIZE as usize;
    let mut pixels = vec![0u8; side * side * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (FRAME_SIZE, FRAME_SIZE)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;
        draw(&root)?;
        root.present().map_err(draw_error)?;
    }
    Frame::from_raw(FRAME_SIZE, FRAME_SIZE, pixels)
        .ok_or_else(|| RLError::Environment("frame buffer has the wrong size".into()))
}

#[allow(clippy::cast_possible_truncation)]
fn pixel((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

/// Single scalar from a one-dimensional action, clipped to `[-1, 1]`
fn scalar_action(action: &ContinuousAction) -> Result<f64> {
    if action.dim() != 1 {
        return Err(RLError::InvalidAction(format!(
            "expected a 1-dimensional action, got {}",
            action.dim()
        )));
    }
    let value = f64::from(action.0[0]);
    if value.is_nan() {
        return Err(RLError::InvalidAction("action is NaN".into()));
    }
    Ok(value.clamp(-1.0, 1.0))
}

/// Pendulum swing-up
///
/// Observation `[cos θ, sin θ, θ̇]`; action `[-1, 1]` scaled to the maximum
/// torque. The episode never terminates on its own; wrap it in a
/// [`TimeLimit`](crate::TimeLimit).
pub struct Pendulum {
    theta: f64,
    theta_dot: f64,
    config: PendulumConfig,
    rng: StdRng,
}

#[derive(Debug, Clone)]
struct PendulumConfig {
    gravity: f64,
    mass: f64,
    length: f64,
    dt: f64,
    max_speed: f64,
    max_torque: f64,
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            gravity: 10.0,
            mass: 1.0,
            length: 1.0,
            dt: 0.05,
            max_speed: 8.0,
            max_torque: 2.0,
        }
    }
}

impl Pendulum {
    /// Create a new Pendulum environment
    #[must_use]
    pub fn new(config: &EnvironmentConfig) -> Self {
        let mut config_values = PendulumConfig::default();
        if let Some(g) = config.params.get("gravity").and_then(serde_json::Value::as_f64) {
            config_values.gravity = g;
        }
        Self {
            theta: PI,
            theta_dot: 0.0,
            config: config_values,
            rng: seeded_rng(config),
        }
    }

    fn observation(&self) -> VectorObservation {
        VectorObservation::from(vec![self.theta.cos(), self.theta.sin(), self.theta_dot])
    }

    fn angle_normalize(x: f64) -> f64 {
        (x + PI).rem_euclid(2.0 * PI) - PI
    }
}

#[async_trait]
impl Environment for Pendulum {
    fn observation_space(&self) -> BoxSpace {
        #[allow(clippy::cast_possible_truncation)]
        let speed = self.config.max_speed as f32;
        BoxSpace {
            low: vec![-1.0, -1.0, -speed],
            high: vec![1.0, 1.0, speed],
        }
    }

    fn action_space(&self) -> BoxSpace {
        BoxSpace::uniform(1, -1.0, 1.0)
    }

    async fn reset(&mut self) -> Result<(VectorObservation, StepInfo)> {
        self.theta = self.rng.gen_range(-PI..PI);
        self.theta_dot = self.rng.gen_range(-1.0..1.0);
        Ok((self.observation(), StepInfo::default()))
    }

    async fn step(&mut self, action: &ContinuousAction) -> Result<Step> {
        let c = &self.config;
        let u = scalar_action(action)? * c.max_torque;
        let th = self.theta;
        let thdot = self.theta_dot;

        let cost = Self::angle_normalize(th).powi(2) + 0.1 * thdot.powi(2) + 0.001 * u.powi(2);

        let new_thdot = (thdot
            + (3.0 * c.gravity / (2.0 * c.length) * th.sin() + 3.0 / (c.mass * c.length.powi(2)) * u) * c.dt)
            .clamp(-c.max_speed, c.max_speed);
        self.theta = th + new_thdot * c.dt;
        self.theta_dot = new_thdot;

        Ok(Step {
            observation: self.observation(),
            reward: Reward(-cost),
            done: false,
            truncated: false,
            info: StepInfo::default(),
        })
    }

    async fn render(&self, mode: RenderMode) -> Result<Option<Frame>> {
        match mode {
            RenderMode::Human => {
                info!(theta = self.theta, theta_dot = self.theta_dot, "Pendulum state");
                Ok(None)
            }
            RenderMode::RgbArray => {
                let center = f64::from(FRAME_SIZE) / 2.0;
                let rod = f64::from(FRAME_SIZE) * 0.4;
                let tip = (center + rod * self.theta.sin(), center - rod * self.theta.cos());
                let frame = draw_frame(|root| {
                    root.draw(&PathElement::new(
                        vec![pixel((center, center)), pixel(tip)],
                        RGBColor(204, 77, 77).stroke_width(5),
                    ))
                    .map_err(draw_error)?;
                    root.draw(&Circle::new(pixel((center, center)), 4, BLACK.filled()))
                        .map_err(draw_error)
                })?;
                Ok(Some(frame))
            }
        }
    }
}

/// Mountain car with a continuous engine force
///
/// Observation `[position, velocity]`; action `[-1, 1]`. Reaching the goal
/// position ends the episode with a +100 bonus; every step costs `0.1 u²`.
pub struct MountainCarContinuous {
    position: f64,
    velocity: f64,
    config: MountainCarConfig,
    rng: StdRng,
}

#[derive(Debug, Clone)]
struct MountainCarConfig {
    min_position: f64,
    max_position: f64,
    max_speed: f64,
    goal_position: f64,
    goal_velocity: f64,
    power: f64,
    gravity: f64,
}

impl Default for MountainCarConfig {
    fn default() -> Self {
        Self {
            min_position: -1.2,
            max_position: 0.6,
            max_speed: 0.07,
            goal_position: 0.45,
            goal_velocity: 0.0,
            power: 0.0015,
            gravity: 0.0025,
        }
    }
}

impl MountainCarContinuous {
    /// Create a new Mountain Car environment
    #[must_use]
    pub fn new(config: &EnvironmentConfig) -> Self {
        Self {
            position: -0.5,
            velocity: 0.0,
            config: MountainCarConfig::default(),
            rng: seeded_rng(config),
        }
    }

    fn observation(&self) -> VectorObservation {
        VectorObservation::from(vec![self.position, self.velocity])
    }

    fn height(x: f64) -> f64 {
        (3.0 * x).sin() * 0.45 + 0.55
    }
}

#[async_trait]
impl Environment for MountainCarContinuous {
    fn observation_space(&self) -> BoxSpace {
        let c = &self.config;
        #[allow(clippy::cast_possible_truncation)]
        let space = BoxSpace {
            low: vec![c.min_position as f32, -c.max_speed as f32],
            high: vec![c.max_position as f32, c.max_speed as f32],
        };
        space
    }

    fn action_space(&self) -> BoxSpace {
        BoxSpace::uniform(1, -1.0, 1.0)
    }

    async fn reset(&mut self) -> Result<(VectorObservation, StepInfo)> {
        self.position = self.rng.gen_range(-0.6..-0.4);
        self.velocity = 0.0;
        Ok((self.observation(), StepInfo::default()))
    }

    async fn step(&mut self, action: &ContinuousAction) -> Result<Step> {
        let force = scalar_action(action)?;
        let c = &self.config;

        self.velocity = (self.velocity + force * c.power - c.gravity * (3.0 * self.position).cos())
            .clamp(-c.max_speed, c.max_speed);
        self.position = (self.position + self.velocity).clamp(c.min_position, c.max_position);

        // Stop at the left wall
        if self.position <= c.min_position && self.velocity < 0.0 {
            self.velocity = 0.0;
        }

        let done = self.position >= c.goal_position && self.velocity >= c.goal_velocity;
        let mut reward = -0.1 * force.powi(2);
        if done {
            reward += 100.0;
        }

        Ok(Step {
            observation: self.observation(),
            reward: Reward(reward),
            done,
            truncated: false,
            info: StepInfo::default(),
        })
    }

    async fn render(&self, mode: RenderMode) -> Result<Option<Frame>> {
        match mode {
            RenderMode::Human => {
                info!(position = self.position, velocity = self.velocity, "MountainCar state");
                Ok(None)
            }
            RenderMode::RgbArray => {
                let c = &self.config;
                let size = f64::from(FRAME_SIZE);
                let scale = size / (c.max_position - c.min_position);
                let to_px = |x: f64| ((x - c.min_position) * scale, size - Self::height(x) * scale * 0.9);

                let track: Vec<(i32, i32)> = (0_i32..=100)
                    .map(|i| c.min_position + (c.max_position - c.min_position) * f64::from(i) / 100.0)
                    .map(|x| pixel(to_px(x)))
                    .collect();
                let flag = to_px(c.goal_position);
                let frame = draw_frame(|root| {
                    root.draw(&PathElement::new(track, BLACK.stroke_width(1)))
                        .map_err(draw_error)?;
                    root.draw(&PathElement::new(
                        vec![pixel(flag), pixel((flag.0, flag.1 - 20.0))],
                        RGBColor(204, 204, 0).stroke_width(1),
                    ))
                    .map_err(draw_error)?;
                    root.draw(&Circle::new(pixel(to_px(self.position)), 5, RGBColor(77, 77, 204).filled()))
                        .map_err(draw_error)
                })?;
                Ok(Some(frame))
            }
        }
    }
}
