//! Reinforcement learning environments for rlkit
//!
//! This crate provides continuous-control environments with RGB rendering:
//! - Pendulum swing-up
//! - Continuous mountain car
//! - A time-limit wrapper and a name-based registry

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classic;
pub mod registry;
pub mod wrappers;

// Re-export environments
pub use classic::{MountainCarContinuous, Pendulum};
pub use registry::{list_envs, make_env, register_env, BoxedEnv, EnvRegistry};
pub use wrappers::TimeLimit;

// Re-export core types
pub use rlkit_core::{BoxSpace, ContinuousAction, Environment, EnvironmentConfig, Frame, RenderMode, Reward, Step};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{make_env, EnvRegistry, MountainCarContinuous, Pendulum, TimeLimit};
    pub use rlkit_core::prelude::*;
}
