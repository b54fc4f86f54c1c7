//! Environment registry for creating environments by name

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rlkit_core::{Environment, EnvironmentConfig, RLError, Result};

use crate::{MountainCarContinuous, Pendulum, TimeLimit};

/// Boxed environment as produced by the registry
pub type BoxedEnv = Box<dyn Environment>;

type EnvConstructor = Box<dyn Fn(&EnvironmentConfig) -> Result<BoxedEnv> + Send + Sync>;

lazy_static::lazy_static! {
    static ref REGISTRY: Arc<Mutex<EnvRegistry>> = Arc::new(Mutex::new(EnvRegistry::with_builtins()));
}

/// Name to constructor table
pub struct EnvRegistry {
    /// Registered environments
    envs: HashMap<String, EnvConstructor>,
}

impl EnvRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self { envs: HashMap::new() }
    }

    /// Registry pre-populated with `pendulum` and `mountain_car_continuous`
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("pendulum", |config| Ok(Box::new(Pendulum::new(config)) as BoxedEnv));
        registry.register("mountain_car_continuous", |config| {
            Ok(Box::new(MountainCarContinuous::new(config)) as BoxedEnv)
        });
        registry
    }

    /// Register an environment
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&EnvironmentConfig) -> Result<BoxedEnv> + Send + Sync + 'static,
    {
        self.envs.insert(name.into(), Box::new(constructor));
    }

    /// Create an environment by name, applying `config.max_steps` as a time limit
    pub fn make(&self, name: &str, config: &EnvironmentConfig) -> Result<BoxedEnv> {
        let constructor = self
            .envs
            .get(name)
            .ok_or_else(|| RLError::Environment(format!("Unknown environment: {name}")))?;
        let env = constructor(config)?;
        Ok(match config.max_steps {
            Some(max_steps) => Box::new(TimeLimit::new(env, max_steps)) as BoxedEnv,
            None => env,
        })
    }

    /// List registered environments
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.envs.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for EnvRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn global() -> Result<std::sync::MutexGuard<'static, EnvRegistry>> {
    REGISTRY
        .lock()
        .map_err(|_| RLError::Environment("environment registry poisoned".into()))
}

/// Register an environment globally
pub fn register_env<F>(name: impl Into<String>, constructor: F) -> Result<()>
where
    F: Fn(&EnvironmentConfig) -> Result<BoxedEnv> + Send + Sync + 'static,
{
    global()?.register(name, constructor);
    Ok(())
}

/// Create an environment by name
pub fn make_env(name: &str, config: &EnvironmentConfig) -> Result<BoxedEnv> {
    global()?.make(name, config)
}

/// List all registered environments
pub fn list_envs() -> Result<Vec<String>> {
    Ok(global()?.list())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlkit_core::ContinuousAction;

    #[tokio::test]
    async fn test_make_builtin_with_time_limit() {
        let config = EnvironmentConfig {
            seed: Some(1),
            max_steps: Some(2),
            ..EnvironmentConfig::default()
        };
        let mut env = make_env("pendulum", &config).unwrap();
        assert_eq!(env.action_space().dim(), 1);
        env.reset().await.unwrap();
        let action = ContinuousAction::new(vec![0.0]);
        assert!(!env.step(&action).await.unwrap().done);
        assert!(env.step(&action).await.unwrap().truncated);
    }

    #[test]
    fn test_unknown_environment() {
        assert!(matches!(
            make_env("bipedal_walker", &EnvironmentConfig::default()),
            Err(RLError::Environment(_))
        ));
    }

    #[test]
    fn test_register_custom() {
        register_env("pendulum_alias", |config| Ok(Box::new(Pendulum::new(config)) as BoxedEnv)).unwrap();
        let names = list_envs().unwrap();
        assert!(names.contains(&"pendulum_alias".to_string()));
        assert!(names.contains(&"mountain_car_continuous".to_string()));
    }
}
