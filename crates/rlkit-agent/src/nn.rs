//! Multi-layer perceptrons on `ndarray` with layer-wise backpropagation
//!
//! Networks here are fixed stacks of dense layers with elementwise
//! activations. Each layer caches its input during a training forward pass,
//! which is all the backward pass needs; there is no general autodiff graph.
//! Weights are stored `(in, out)` so a batch `(B, in)` maps to `(B, out)` with
//! a single `dot`.

use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use rand::Rng;
use serde::{Deserialize, Serialize};

use rlkit_core::{RLError, Result};

/// Elementwise activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// `f(x) = x`
    Identity,
    /// `f(x) = max(x, 0)`
    Relu,
    /// `f(x) = tanh(x)`
    Tanh,
}

impl Activation {
    fn apply(self, x: &mut Array2<f32>) {
        match self {
            Self::Identity => {}
            Self::Relu => x.mapv_inplace(|v| v.max(0.0)),
            Self::Tanh => x.mapv_inplace(f32::tanh),
        }
    }

    /// Derivative expressed through the activated output `y = f(x)`
    fn derivative_from_output(self, y: f32) -> f32 {
        match self {
            Self::Identity => 1.0,
            Self::Relu => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Tanh => 1.0 - y * y,
        }
    }
}

/// MLP configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Input dimension
    pub input_dim: usize,
    /// Hidden layer sizes
    pub hidden_dims: Vec<usize>,
    /// Output dimension
    pub output_dim: usize,
    /// Activation after every hidden layer
    pub hidden_activation: Activation,
    /// Activation after the output layer
    pub output_activation: Activation,
    /// Constant multiplier applied after the output activation
    pub output_scale: f32,
}

impl MlpConfig {
    /// Deterministic policy: `obs -> hidden -> tanh * max_action`
    #[must_use]
    pub fn actor(observe_dim: usize, action_dim: usize, hidden_dims: Vec<usize>, max_action: f32) -> Self {
        Self {
            input_dim: observe_dim,
            hidden_dims,
            output_dim: action_dim,
            hidden_activation: Activation::Relu,
            output_activation: Activation::Tanh,
            output_scale: max_action,
        }
    }

    /// State-action value: `obs ++ act -> hidden -> 1`
    #[must_use]
    pub fn critic(observe_dim: usize, action_dim: usize, hidden_dims: Vec<usize>) -> Self {
        Self {
            input_dim: observe_dim + action_dim,
            hidden_dims,
            output_dim: 1,
            hidden_activation: Activation::Relu,
            output_activation: Activation::Identity,
            output_scale: 1.0,
        }
    }
}

/// Dense layer, `y = x W + b`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Linear {
    /// `(in, out)`
    pub weight: Array2<f32>,
    /// `(out,)`
    pub bias: Array1<f32>,
}

impl Linear {
    /// Xavier-uniform weights, zero bias
    pub fn new<R: Rng + ?Sized>(in_dim: usize, out_dim: usize, rng: &mut R) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let limit = (6.0 / (in_dim + out_dim) as f32).sqrt();
        Self {
            weight: Array2::from_shape_fn((in_dim, out_dim), |_| rng.gen_range(-limit..limit)),
            bias: Array1::zeros(out_dim),
        }
    }

    fn forward(&self, x: &ArrayView2<f32>) -> Array2<f32> {
        x.dot(&self.weight) + &self.bias
    }
}

/// Gradients for every layer of an [`Mlp`], in layer order
#[derive(Debug, Clone)]
pub struct Gradients {
    /// `(dW, db)` per layer
    pub layers: Vec<(Array2<f32>, Array1<f32>)>,
}

/// Activations recorded by [`Mlp::forward_train`]
#[derive(Debug, Clone)]
pub struct ForwardCache {
    /// Input of each layer
    inputs: Vec<Array2<f32>>,
    /// Activated (pre-scale) output of each layer
    outputs: Vec<Array2<f32>>,
}

/// Multi-layer perceptron
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mlp {
    config: MlpConfig,
    layers: Vec<Linear>,
}

impl Mlp {
    /// Create a randomly initialised network
    pub fn new<R: Rng + ?Sized>(config: MlpConfig, rng: &mut R) -> Self {
        let mut layers = Vec::with_capacity(config.hidden_dims.len() + 1);
        let mut prev_dim = config.input_dim;
        for &hidden_dim in &config.hidden_dims {
            layers.push(Linear::new(prev_dim, hidden_dim, rng));
            prev_dim = hidden_dim;
        }
        layers.push(Linear::new(prev_dim, config.output_dim, rng));
        Self { config, layers }
    }

    /// Network configuration
    #[must_use]
    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    /// Layers in forward order
    #[must_use]
    pub fn layers(&self) -> &[Linear] {
        &self.layers
    }

    /// Mutable layers, for optimizers
    pub fn layers_mut(&mut self) -> &mut [Linear] {
        &mut self.layers
    }

    fn activation(&self, layer: usize) -> Activation {
        if layer + 1 == self.layers.len() {
            self.config.output_activation
        } else {
            self.config.hidden_activation
        }
    }

    fn check_input(&self, x: &ArrayView2<f32>) -> Result<()> {
        RLError::check_dim(self.config.input_dim, x.ncols())
    }

    /// Inference pass over a `(B, input_dim)` batch
    pub fn forward(&self, x: &ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(x)?;
        let mut hidden = x.to_owned();
        for (i, layer) in self.layers.iter().enumerate() {
            hidden = layer.forward(&hidden.view());
            self.activation(i).apply(&mut hidden);
        }
        Ok(hidden * self.config.output_scale)
    }

    /// Forward pass that records what [`Mlp::backward`] needs
    pub fn forward_train(&self, x: &ArrayView2<f32>) -> Result<(Array2<f32>, ForwardCache)> {
        self.check_input(x)?;
        let mut cache = ForwardCache {
            inputs: Vec::with_capacity(self.layers.len()),
            outputs: Vec::with_capacity(self.layers.len()),
        };
        let mut hidden = x.to_owned();
        for (i, layer) in self.layers.iter().enumerate() {
            let mut out = layer.forward(&hidden.view());
            self.activation(i).apply(&mut out);
            cache.inputs.push(hidden);
            cache.outputs.push(out.clone());
            hidden = out;
        }
        Ok((hidden * self.config.output_scale, cache))
    }

    /// Backpropagate `grad_output = dL/dy` through the recorded pass.
    ///
    /// Returns parameter gradients and `dL/dx`.
    pub fn backward(&self, cache: &ForwardCache, grad_output: &Array2<f32>) -> Result<(Gradients, Array2<f32>)> {
        let last = cache
            .outputs
            .last()
            .ok_or_else(|| RLError::Computation("empty forward cache".into()))?;
        if last.dim() != grad_output.dim() {
            return Err(RLError::DimensionMismatch {
                expected: last.len(),
                actual: grad_output.len(),
            });
        }

        let mut grads = Vec::with_capacity(self.layers.len());
        let mut grad = grad_output * self.config.output_scale;
        for i in (0..self.layers.len()).rev() {
            let act = self.activation(i);
            Zip::from(&mut grad)
                .and(&cache.outputs[i])
                .for_each(|g, &y| *g *= act.derivative_from_output(y));
            let d_weight = cache.inputs[i].t().dot(&grad);
            let d_bias = grad.sum_axis(Axis(0));
            let grad_input = grad.dot(&self.layers[i].weight.t());
            grads.push((d_weight, d_bias));
            grad = grad_input;
        }
        grads.reverse();

        Ok((Gradients { layers: grads }, grad))
    }

    /// Polyak averaging toward `source`: `self = tau * source + (1 - tau) * self`
    pub fn soft_update(&mut self, source: &Mlp, tau: f32) -> Result<()> {
        self.check_same_shape(source)?;
        for (target, src) in self.layers.iter_mut().zip(&source.layers) {
            Zip::from(&mut target.weight)
                .and(&src.weight)
                .for_each(|t, &s| *t = polyak_update(*t, s, tau));
            Zip::from(&mut target.bias)
                .and(&src.bias)
                .for_each(|t, &s| *t = polyak_update(*t, s, tau));
        }
        Ok(())
    }

    /// Overwrite all parameters with `source`'s
    pub fn copy_from(&mut self, source: &Mlp) -> Result<()> {
        self.soft_update(source, 1.0)
    }

    /// Fail unless `other` has identical layer shapes
    pub fn check_same_shape(&self, other: &Mlp) -> Result<()> {
        RLError::check_dim(self.layers.len(), other.layers.len())?;
        for (a, b) in self.layers.iter().zip(&other.layers) {
            if a.weight.dim() != b.weight.dim() || a.bias.len() != b.bias.len() {
                return Err(RLError::DimensionMismatch {
                    expected: a.weight.len() + a.bias.len(),
                    actual: b.weight.len() + b.bias.len(),
                });
            }
        }
        Ok(())
    }

    /// Total number of scalar parameters
    #[must_use]
    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(|l| l.weight.len() + l.bias.len()).sum()
    }
}

/// Polyak averaging of a single weight
#[must_use]
pub fn polyak_update(target_weight: f32, source_weight: f32, tau: f32) -> f32 {
    tau * source_weight + (1.0 - tau) * target_weight
}
