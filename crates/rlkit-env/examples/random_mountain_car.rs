//! Example: uniformly random forces on the continuous mountain car

use rand::SeedableRng;
use rlkit_core::{ContinuousAction, Environment, EnvironmentConfig};
use rlkit_env::make_env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = EnvironmentConfig {
        seed: Some(0),
        max_steps: Some(999),
        ..EnvironmentConfig::default()
    };
    let mut env = make_env("mountain_car_continuous", &config)?;
    let action_space = env.action_space();
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);

    let num_episodes = 5;
    let mut episode_rewards = Vec::new();

    for episode in 0..num_episodes {
        env.reset().await?;
        let mut total_reward = 0.0;
        let mut steps = 0;
        let reached_goal = loop {
            let action = ContinuousAction(action_space.sample(&mut rng));
            let step = env.step(&action).await?;
            total_reward += step.reward.value();
            steps += 1;

            if step.done {
                break !step.truncated;
            }
        };

        episode_rewards.push(total_reward);
        println!(
            "Episode {}: Total Reward = {:.2}, Steps = {}, Reached goal = {}",
            episode + 1,
            total_reward,
            steps,
            reached_goal
        );
    }

    let avg_reward: f64 = episode_rewards.iter().sum::<f64>() / f64::from(num_episodes);
    println!("\nAverage Reward over {num_episodes} episodes: {avg_reward:.2}");

    env.close().await?;
    Ok(())
}

