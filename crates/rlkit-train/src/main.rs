// rlkit-train
// Command-line entry point for DDPG/TD3 training runs

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rlkit_agent::DdpgTd3;
use rlkit_env::make_env;
use rlkit_train::{prep_dir_default, GifAssembler, JsonlScalarWriter, TrainConfig, Trainer};

#[derive(Parser)]
#[command(name = "rlkit-train")]
#[command(about = "Train a DDPG/TD3 agent on a registered environment", version)]
struct Cli {
    /// JSON file layered over the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override a single key, e.g. `--set max_steps=200` or `--set save_map.actor=policy`
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Run directory
    #[arg(long)]
    root_dir: Option<PathBuf>,

    /// Registered environment name
    #[arg(short, long)]
    env: Option<String>,

    /// Seed for environment and agent
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    /// `--set` overrides followed by the dedicated flags, which win
    fn overrides(&self) -> Vec<String> {
        let mut overrides = self.set.clone();
        if let Some(root) = &self.root_dir {
            overrides.push(format!("root_dir={}", serde_json::Value::from(root.display().to_string())));
        }
        if let Some(env) = &self.env {
            overrides.push(format!("env={}", serde_json::Value::from(env.as_str())));
        }
        if let Some(seed) = self.seed {
            overrides.push(format!("seed={seed}"));
        }
        overrides
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = TrainConfig::load(cli.config.as_deref(), &cli.overrides()).context("Failed to load configuration")?;
    let config = Arc::new(config);

    info!("Environment: {}", config.env);
    info!("Run directory: {}", config.root_dir.display());
    info!(
        "Epochs: {}, episodes: {}, steps: {}",
        config.max_epochs, config.max_episodes, config.max_steps
    );

    prep_dir_default(&config.root_dir)
        .await
        .context("Failed to prepare run directory")?;

    let env = make_env(&config.env, &config.env_config())
        .with_context(|| format!("Failed to create environment `{}`", config.env))?;
    let agent = DdpgTd3::new(config.agent_config()).context("Failed to create agent")?;
    let sink = JsonlScalarWriter::create(config.scalars_path()).context("Failed to open telemetry stream")?;

    let mut trainer = Trainer::new(Arc::clone(&config), env, agent, sink, GifAssembler::default())
        .context("Environment does not match the configured agent layout")?;
    let summary = trainer.run().await.context("Training failed")?;

    info!(
        "Done: {} epochs, {} episodes, {} steps, {} updates",
        summary.epochs, summary.episodes, summary.global_steps, summary.updates
    );
    Ok(())
}
