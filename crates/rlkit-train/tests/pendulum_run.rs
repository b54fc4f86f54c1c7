//! Short real run: DDPG/TD3 on the pendulum, writing to a temporary directory

use std::sync::Arc;

use rlkit_agent::DdpgTd3;
use rlkit_core::Agent;
use rlkit_env::make_env;
use rlkit_train::telemetry::keys;
use rlkit_train::{prep_dir_default, GifAssembler, JsonlScalarWriter, ScalarRecord, TrainConfig, Trainer};

fn small_config(root: &std::path::Path, extra: &[String]) -> TrainConfig {
    let mut overrides = vec![
        format!("root_dir={}", serde_json::Value::from(root.display().to_string())),
        "max_epochs=1".to_string(),
        "max_episodes=2".to_string(),
        "max_steps=10".to_string(),
        "warmup_steps=5".to_string(),
        "model_save_int=1".to_string(),
        "profile_int=2".to_string(),
        "batch_size=8".to_string(),
        "hidden_dims=[16, 16]".to_string(),
        "seed=11".to_string(),
    ];
    overrides.extend_from_slice(extra);
    TrainConfig::load(None, &overrides).unwrap()
}

#[tokio::test]
async fn test_pendulum_run_writes_checkpoints_telemetry_and_animation() {
    let root = tempfile::tempdir().unwrap();
    let config = Arc::new(small_config(root.path(), &[]));
    prep_dir_default(&config.root_dir).await.unwrap();

    let env = make_env(&config.env, &config.env_config()).unwrap();
    let agent = DdpgTd3::new(config.agent_config()).unwrap();
    let sink = JsonlScalarWriter::create(config.scalars_path()).unwrap();
    let mut trainer = Trainer::new(Arc::clone(&config), env, agent, sink, GifAssembler::default()).unwrap();

    let summary = trainer.run().await.unwrap();
    assert_eq!(summary.global_steps, 20);
    assert_eq!(summary.updates, 20);
    assert_eq!(trainer.agent().replay_len(), 20);

    let model = config.model_dir();
    for version in [1, 2] {
        assert!(model.join(format!("actor_{version}.json")).exists());
        assert!(model.join(format!("critic2_target_{version}.json")).exists());
    }
    assert!(config.images_dir().join("1_2.gif").exists());

    drop(trainer);
    let text = std::fs::read_to_string(config.scalars_path()).unwrap();
    let records: Vec<ScalarRecord> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(records.len(), 20 * keys::STEP_KEYS.len());
    assert!(records
        .iter()
        .filter(|r| r.name.starts_with("action_"))
        .all(|r| (-1.0..=1.0).contains(&r.value)));
}

#[tokio::test]
async fn test_resume_loads_latest_checkpoint() {
    let root = tempfile::tempdir().unwrap();
    let first = Arc::new(small_config(root.path(), &[]));
    prep_dir_default(&first.root_dir).await.unwrap();

    let env = make_env(&first.env, &first.env_config()).unwrap();
    let agent = DdpgTd3::new(first.agent_config()).unwrap();
    let sink = rlkit_train::MemorySink::new();
    let mut trainer = Trainer::new(Arc::clone(&first), env, agent, sink, GifAssembler::default()).unwrap();
    trainer.run().await.unwrap();

    let resumed = Arc::new(small_config(root.path(), &["restart=false".to_string()]));
    let env = make_env(&resumed.env, &resumed.env_config()).unwrap();
    let agent = DdpgTd3::new(resumed.agent_config()).unwrap();
    let mut trainer = Trainer::new(resumed, env, agent, rlkit_train::MemorySink::new(), GifAssembler::default()).unwrap();
    assert_eq!(trainer.restore().await.unwrap(), Some(2));
}
