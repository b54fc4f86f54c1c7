//! Environment wrappers

use async_trait::async_trait;

use rlkit_core::{BoxSpace, ContinuousAction, Environment, Frame, RenderMode, Result, Step, StepInfo, VectorObservation};

/// Time limit wrapper
///
/// Marks the step that reaches `max_steps` as `done` and `truncated`.
pub struct TimeLimit<E> {
    /// Inner environment
    pub env: E,
    /// Maximum steps
    pub max_steps: usize,
    /// Current step count
    pub steps: usize,
}

impl<E> TimeLimit<E> {
    /// Create a new time limit wrapper
    pub fn new(env: E, max_steps: usize) -> Self {
        Self {
            env,
            max_steps,
            steps: 0,
        }
    }
}

#[async_trait]
impl<E> Environment for TimeLimit<E>
where
    E: Environment,
{
    fn observation_space(&self) -> BoxSpace {
        self.env.observation_space()
    }

    fn action_space(&self) -> BoxSpace {
        self.env.action_space()
    }

    async fn reset(&mut self) -> Result<(VectorObservation, StepInfo)> {
        self.steps = 0;
        self.env.reset().await
    }

    async fn step(&mut self, action: &ContinuousAction) -> Result<Step> {
        self.steps += 1;
        let mut step = self.env.step(action).await?;

        if self.steps >= self.max_steps && !step.done {
            step.truncated = true;
            step.done = true;
        }

        Ok(step)
    }

    async fn render(&self, mode: RenderMode) -> Result<Option<Frame>> {
        self.env.render(mode).await
    }

    async fn close(&mut self) -> Result<()> {
        self.env.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pendulum;
    use rlkit_core::EnvironmentConfig;

    #[tokio::test]
    async fn test_time_limit_truncates() {
        let mut env = TimeLimit::new(Pendulum::new(&EnvironmentConfig::default()), 3);
        env.reset().await.unwrap();
        let action = ContinuousAction::new(vec![0.0]);

        for _ in 0..2 {
            let step = env.step(&action).await.unwrap();
            assert!(!step.done);
        }
        let step = env.step(&action).await.unwrap();
        assert!(step.done && step.truncated);

        env.reset().await.unwrap();
        assert_eq!(env.steps, 0);
    }
}
