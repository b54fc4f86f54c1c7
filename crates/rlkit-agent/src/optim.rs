//! Optimizers and loss criteria

use ndarray::{Array1, Array2, Zip};
use serde::{Deserialize, Serialize};

use rlkit_core::{RLError, Result};

use crate::nn::{Gradients, Mlp};

/// Adam hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdamConfig {
    /// Step size
    pub learning_rate: f32,
    /// First moment decay
    pub beta1: f32,
    /// Second moment decay
    pub beta2: f32,
    /// Numerical stabiliser
    pub epsilon: f32,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

/// Adam optimizer bound to one network's shape
#[derive(Debug, Clone)]
pub struct Adam {
    config: AdamConfig,
    momentum: Vec<(Array2<f32>, Array1<f32>)>,
    velocity: Vec<(Array2<f32>, Array1<f32>)>,
    t: i32,
}

impl Adam {
    /// Zero-initialised moments shaped like `net`
    #[must_use]
    pub fn new(config: AdamConfig, net: &Mlp) -> Self {
        let zeros: Vec<_> = net
            .layers()
            .iter()
            .map(|l| (Array2::zeros(l.weight.dim()), Array1::zeros(l.bias.len())))
            .collect();
        Self {
            config,
            momentum: zeros.clone(),
            velocity: zeros,
            t: 0,
        }
    }

    /// Number of steps taken so far
    #[must_use]
    pub fn steps(&self) -> i32 {
        self.t
    }

    /// Apply one descent step of `grads` to `net`
    pub fn step(&mut self, net: &mut Mlp, grads: &Gradients) -> Result<()> {
        RLError::check_dim(self.momentum.len(), grads.layers.len())?;
        RLError::check_dim(self.momentum.len(), net.layers().len())?;

        self.t = self.t.saturating_add(1);
        let AdamConfig {
            learning_rate: lr,
            beta1,
            beta2,
            epsilon,
        } = self.config;
        let bias1 = 1.0 - beta1.powi(self.t);
        let bias2 = 1.0 - beta2.powi(self.t);

        let update = |p: &mut f32, g: f32, m: &mut f32, v: &mut f32| {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            let m_hat = *m / bias1;
            let v_hat = *v / bias2;
            *p -= lr * m_hat / (v_hat.sqrt() + epsilon);
        };

        for (((layer, (dw, db)), (mw, mb)), (vw, vb)) in net
            .layers_mut()
            .iter_mut()
            .zip(&grads.layers)
            .zip(&mut self.momentum)
            .zip(&mut self.velocity)
        {
            if layer.weight.dim() != dw.dim() || layer.bias.len() != db.len() {
                return Err(RLError::DimensionMismatch {
                    expected: layer.weight.len() + layer.bias.len(),
                    actual: dw.len() + db.len(),
                });
            }
            Zip::from(&mut layer.weight)
                .and(dw)
                .and(mw)
                .and(vw)
                .for_each(|p, &g, m, v| update(p, g, m, v));
            Zip::from(&mut layer.bias)
                .and(db)
                .and(mb)
                .and(vb)
                .for_each(|p, &g, m, v| update(p, g, m, v));
        }
        Ok(())
    }
}

/// How per-element losses are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    /// Sum over all elements
    #[default]
    Sum,
    /// Mean over all elements
    Mean,
}

/// Mean squared error and its gradient w.r.t. `prediction`
pub fn mse_loss(prediction: &Array2<f32>, target: &Array2<f32>, reduction: Reduction) -> Result<(f32, Array2<f32>)> {
    if prediction.dim() != target.dim() {
        return Err(RLError::DimensionMismatch {
            expected: prediction.len(),
            actual: target.len(),
        });
    }
    let diff = prediction - target;
    let sum = diff.mapv(|d| d * d).sum();
    #[allow(clippy::cast_precision_loss)]
    let n = diff.len().max(1) as f32;
    Ok(match reduction {
        Reduction::Sum => (sum, diff * 2.0),
        Reduction::Mean => (sum / n, diff * (2.0 / n)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{Activation, MlpConfig};
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_mse_reductions() {
        let pred = array![[1.0_f32], [3.0]];
        let target = array![[0.0_f32], [1.0]];

        let (loss, grad) = mse_loss(&pred, &target, Reduction::Sum).unwrap();
        assert_abs_diff_eq!(loss, 5.0);
        assert_eq!(grad, array![[2.0_f32], [4.0]]);

        let (loss, grad) = mse_loss(&pred, &target, Reduction::Mean).unwrap();
        assert_abs_diff_eq!(loss, 2.5);
        assert_eq!(grad, array![[1.0_f32], [2.0]]);
    }

    #[test]
    fn test_adam_reduces_regression_loss() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut net = Mlp::new(
            MlpConfig {
                input_dim: 2,
                hidden_dims: vec![16],
                output_dim: 1,
                hidden_activation: Activation::Relu,
                output_activation: Activation::Identity,
                output_scale: 1.0,
            },
            &mut rng,
        );
        let mut adam = Adam::new(
            AdamConfig {
                learning_rate: 1e-2,
                ..AdamConfig::default()
            },
            &net,
        );
        let x = array![[0.0_f32, 1.0], [1.0, 0.0], [1.0, 1.0], [0.5, -0.5]];
        let y = array![[1.0_f32], [-1.0], [0.0], [-1.0]];

        let initial = mse_loss(&net.forward(&x.view()).unwrap(), &y, Reduction::Mean).unwrap().0;
        for _ in 0..300 {
            let (pred, cache) = net.forward_train(&x.view()).unwrap();
            let (_, grad) = mse_loss(&pred, &y, Reduction::Mean).unwrap();
            let (grads, _) = net.backward(&cache, &grad).unwrap();
            adam.step(&mut net, &grads).unwrap();
        }
        let trained = mse_loss(&net.forward(&x.view()).unwrap(), &y, Reduction::Mean).unwrap().0;

        assert_eq!(adam.steps(), 300);
        assert!(trained < initial * 0.5, "loss {initial} -> {trained}");
    }
}
