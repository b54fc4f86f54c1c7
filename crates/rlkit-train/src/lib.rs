//! Training loop for rlkit
//!
//! This crate ties an [`Environment`](rlkit_core::Environment) and an
//! [`Agent`](rlkit_core::Agent) together:
//! - A layered, validated run configuration
//! - The epoch/episode/step loop with warm-up, checkpointing and
//!   alternating policy updates
//! - Scalar telemetry sinks and GIF animation of profiled episodes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod config;
pub mod dirs;
pub mod layout;
pub mod telemetry;
pub mod trainer;

pub use animation::{AnimationAssembler, GifAssembler};
pub use config::TrainConfig;
pub use dirs::{prep_dir_default, RunDirs};
pub use layout::AgentLayout;
pub use telemetry::{JsonlScalarWriter, MemorySink, ScalarRecord, ScalarSink};
pub use trainer::{checkpoint_version, EpisodeOutcome, StepOutcome, TrainSummary, Trainer};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{AnimationAssembler, GifAssembler, ScalarSink, TrainConfig, Trainer};
    pub use rlkit_core::prelude::*;
}
