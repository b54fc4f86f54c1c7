//! Core reinforcement learning traits and types for rlkit
//!
//! This crate provides the shared vocabulary of the toolkit: continuous
//! actions and box spaces, observations, transitions, the [`Environment`]
//! and [`Agent`] contracts, exploration noise and loop counters.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod agent;
pub mod counter;
pub mod environment;
pub mod error;
pub mod noise;
pub mod observation;
pub mod reward;
pub mod trajectory;

// Re-export core traits and types
pub use action::{BoxSpace, ContinuousAction};
pub use agent::{Agent, NameMap, UpdateStats};
pub use counter::Counter;
pub use environment::{Environment, EnvironmentConfig, Frame, RenderMode, Step, StepInfo};
pub use error::{RLError, Result};
pub use noise::{NoiseGenerator, NoiseMode, NoiseParams};
pub use observation::VectorObservation;
pub use reward::Reward;
pub use trajectory::Transition;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Agent, BoxSpace, ContinuousAction, Environment, Frame, NoiseMode, NoiseParams,
        RenderMode, Result, Reward, Step, Transition, VectorObservation,
    };
}
