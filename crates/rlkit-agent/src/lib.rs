//! Reinforcement learning agents for rlkit
//!
//! This crate provides the off-policy actor-critic stack used by the
//! training loop:
//! - A bounded FIFO replay buffer
//! - Dense networks with layer-wise backpropagation and Adam
//! - DDPG with TD3 extensions (twin critics, target smoothing, delayed
//!   policy updates) and versioned checkpoints

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod nn;
pub mod optim;
pub mod td3;

// Re-export agents
pub use td3::{DdpgTd3, DdpgTd3Config, TargetPolicyNoise};

// Re-export utilities
pub use buffer::{Batch, ReplayBuffer};
pub use nn::{Activation, Mlp, MlpConfig};
pub use optim::{Adam, AdamConfig, Reduction};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{DdpgTd3, DdpgTd3Config, ReplayBuffer};
    pub use rlkit_core::prelude::*;
}
