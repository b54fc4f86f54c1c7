//! Exploration noise applied to continuous actions
//!
//! Noise is parameterized per action dimension. For every mode except
//! [`NoiseMode::Uniform`] a parameter pair is `(mean, std)`; for uniform noise
//! it is `(low, high)`.

use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{RLError, Result};

/// Per-dimension noise parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoiseParams(pub Vec<(f32, f32)>);

impl NoiseParams {
    /// The same `(a, b)` pair repeated for `dim` dimensions
    #[must_use]
    pub fn repeat(pair: (f32, f32), dim: usize) -> Self {
        Self(vec![pair; dim])
    }

    /// Number of dimensions covered
    #[must_use]
    pub fn dim(&self) -> usize {
        self.0.len()
    }
}

/// Noise distribution family
///
/// Serialized as `{"mode": "clipped_normal", "ratio": 2.0}`. Modes without
/// parameters also accept a bare name such as `"normal"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NoiseMode {
    /// Additive `U(low, high)`
    Uniform,
    /// Additive `N(mean, std)`
    Normal,
    /// Additive `N(mean, std)` clipped to `mean ± ratio * std`
    ClippedNormal {
        /// Clip ratio in units of std
        ratio: f32,
    },
    /// Temporally correlated Ornstein-Uhlenbeck process around `mean`
    OrnsteinUhlenbeck {
        /// Mean reversion rate
        theta: f32,
        /// Integration step
        dt: f32,
    },
}

impl Default for NoiseMode {
    fn default() -> Self {
        Self::Normal
    }
}

impl<'de> Deserialize<'de> for NoiseMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(tag = "mode", rename_all = "snake_case")]
        enum Tagged {
            Uniform,
            Normal,
            ClippedNormal { ratio: f32 },
            OrnsteinUhlenbeck { theta: f32, dt: f32 },
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Tagged(Tagged),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Name(name) => match name.as_str() {
                "uniform" => Ok(Self::Uniform),
                "normal" => Ok(Self::Normal),
                other @ ("clipped_normal" | "ornstein_uhlenbeck") => Err(serde::de::Error::custom(format!(
                    "noise mode `{other}` takes parameters, e.g. {{\"mode\": \"{other}\", ...}}"
                ))),
                other => Err(serde::de::Error::custom(format!("unknown noise mode `{other}`"))),
            },
            Repr::Tagged(Tagged::Uniform) => Ok(Self::Uniform),
            Repr::Tagged(Tagged::Normal) => Ok(Self::Normal),
            Repr::Tagged(Tagged::ClippedNormal { ratio }) => Ok(Self::ClippedNormal { ratio }),
            Repr::Tagged(Tagged::OrnsteinUhlenbeck { theta, dt }) => Ok(Self::OrnsteinUhlenbeck { theta, dt }),
        }
    }
}

/// Stateful noise source; only the OU mode carries state between calls.
#[derive(Debug, Clone, Default)]
pub struct NoiseGenerator {
    ou_state: Option<Array1<f32>>,
}

impl NoiseGenerator {
    /// Create a generator with empty OU state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the OU process state (call at episode boundaries)
    pub fn reset(&mut self) {
        self.ou_state = None;
    }

    /// Draw one noise sample of `params.dim()` elements
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        params: &NoiseParams,
        mode: NoiseMode,
        rng: &mut R,
    ) -> Result<Array1<f32>> {
        match mode {
            NoiseMode::Uniform => params
                .0
                .iter()
                .map(|&(low, high)| {
                    if low < high {
                        Ok(rng.gen_range(low..high))
                    } else if low == high {
                        Ok(low)
                    } else {
                        Err(RLError::Computation(format!(
                            "uniform noise bounds reversed: ({low}, {high})"
                        )))
                    }
                })
                .collect(),
            NoiseMode::Normal => params
                .0
                .iter()
                .map(|&(mean, std)| normal(mean, std).map(|d| d.sample(&mut *rng)))
                .collect(),
            NoiseMode::ClippedNormal { ratio } => params
                .0
                .iter()
                .map(|&(mean, std)| {
                    let bound = (ratio * std).abs();
                    normal(mean, std).map(|d| d.sample(&mut *rng).clamp(mean - bound, mean + bound))
                })
                .collect(),
            NoiseMode::OrnsteinUhlenbeck { theta, dt } => {
                let dim = params.dim();
                let state = match self.ou_state.take() {
                    Some(state) if state.len() == dim => state,
                    _ => params.0.iter().map(|&(mean, _)| mean).collect(),
                };
                let unit = normal(0.0, 1.0)?;
                let next: Array1<f32> = state
                    .iter()
                    .zip(&params.0)
                    .map(|(&x, &(mean, std))| {
                        x + theta * (mean - x) * dt + std * dt.sqrt() * unit.sample(&mut *rng)
                    })
                    .collect();
                self.ou_state = Some(next.clone());
                Ok(next)
            }
        }
    }

    /// Add a noise sample to `action`
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        action: &Array1<f32>,
        params: &NoiseParams,
        mode: NoiseMode,
        rng: &mut R,
    ) -> Result<Array1<f32>> {
        RLError::check_dim(action.len(), params.dim())?;
        Ok(action + &self.sample(params, mode, rng)?)
    }
}

fn normal(mean: f32, std: f32) -> Result<Normal<f32>> {
    Normal::new(mean, std).map_err(|e| RLError::Computation(format!("invalid normal noise: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let mut gen = NoiseGenerator::new();
        let mut rng = StdRng::seed_from_u64(0);
        let action = Array1::zeros(3);
        let params = NoiseParams::repeat((0.0, 0.1), 4);
        let err = gen.apply(&action, &params, NoiseMode::Normal, &mut rng).unwrap_err();
        assert!(matches!(err, RLError::DimensionMismatch { expected: 3, actual: 4 }));
    }

    #[test]
    fn test_zero_std_normal_adds_mean() {
        let mut gen = NoiseGenerator::new();
        let mut rng = StdRng::seed_from_u64(1);
        let action = Array1::from_vec(vec![0.5, -0.5]);
        let params = NoiseParams(vec![(0.1, 0.0), (-0.2, 0.0)]);
        let noisy = gen.apply(&action, &params, NoiseMode::Normal, &mut rng).unwrap();
        approx::assert_relative_eq!(noisy[0], 0.6);
        approx::assert_relative_eq!(noisy[1], -0.7);
    }

    #[test]
    fn test_clipped_normal_stays_within_ratio() {
        let mut gen = NoiseGenerator::new();
        let mut rng = StdRng::seed_from_u64(2);
        let params = NoiseParams::repeat((0.0, 1.0), 8);
        for _ in 0..200 {
            let noise = gen
                .sample(&params, NoiseMode::ClippedNormal { ratio: 0.5 }, &mut rng)
                .unwrap();
            assert!(noise.iter().all(|v| v.abs() <= 0.5));
        }
    }

    #[test]
    fn test_uniform_within_bounds() {
        let mut gen = NoiseGenerator::new();
        let mut rng = StdRng::seed_from_u64(3);
        let params = NoiseParams::repeat((-0.3, 0.3), 4);
        for _ in 0..200 {
            let noise = gen.sample(&params, NoiseMode::Uniform, &mut rng).unwrap();
            assert!(noise.iter().all(|v| (-0.3..0.3).contains(v)));
        }
    }

    #[test]
    fn test_ou_state_persists_until_reset() {
        let mut gen = NoiseGenerator::new();
        let mut rng = StdRng::seed_from_u64(4);
        let params = NoiseParams::repeat((0.0, 0.2), 2);
        let mode = NoiseMode::OrnsteinUhlenbeck { theta: 0.15, dt: 0.01 };

        gen.sample(&params, mode, &mut rng).unwrap();
        assert!(gen.ou_state.is_some());
        gen.reset();
        assert!(gen.ou_state.is_none());
    }

    #[test]
    fn test_noise_mode_serde_tag() {
        let mode: NoiseMode = serde_json::from_str(r#"{"mode":"clipped_normal","ratio":0.5}"#).unwrap();
        assert_eq!(mode, NoiseMode::ClippedNormal { ratio: 0.5 });

        let ou = NoiseMode::OrnsteinUhlenbeck { theta: 0.15, dt: 0.01 };
        let json = serde_json::to_string(&ou).unwrap();
        assert_eq!(serde_json::from_str::<NoiseMode>(&json).unwrap(), ou);
    }

    #[test]
    fn test_noise_mode_bare_names() {
        assert_eq!(serde_json::from_str::<NoiseMode>(r#""normal""#).unwrap(), NoiseMode::Normal);
        assert_eq!(serde_json::from_str::<NoiseMode>(r#""uniform""#).unwrap(), NoiseMode::Uniform);
        assert_eq!(
            serde_json::from_str::<NoiseMode>(r#"{"mode":"normal"}"#).unwrap(),
            NoiseMode::Normal
        );

        let err = serde_json::from_str::<NoiseMode>(r#""clipped_normal""#).unwrap_err();
        assert!(err.to_string().contains("takes parameters"));
        let err = serde_json::from_str::<NoiseMode>(r#""brownian""#).unwrap_err();
        assert!(err.to_string().contains("unknown noise mode"));
    }
}
