//! Stochastic gradient descent with momentum, L2 penalty and norm clipping.

use candle_core::backprop::GradStore;
use candle_core::{Result, Tensor, Var};
use candle_nn::Optimizer;

/// Hyperparameters of [`MomentumSgd`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SgdConfig {
    pub learn_rate: f64,
    pub momentum: f64,
    pub l2: f64,
    /// Global gradient norm cap; `None` disables clipping.
    pub max_grad_norm: Option<f64>,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            learn_rate: 0.001,
            momentum: 0.9,
            l2: 1e-6,
            max_grad_norm: Some(10.0),
        }
    }
}

struct VarState {
    var: Var,
    velocity: Tensor,
}

/// Momentum SGD over a fixed set of variables.
///
/// Per step: `g += l2 * w`, rescale all gradients if their joint norm
/// exceeds `max_grad_norm`, `v = momentum * v + g`, `w -= learn_rate * v`.
pub struct MomentumSgd {
    vars: Vec<VarState>,
    config: SgdConfig,
}

impl MomentumSgd {
    pub fn config(&self) -> &SgdConfig {
        &self.config
    }
}

impl Optimizer for MomentumSgd {
    type Config = SgdConfig;

    fn new(vars: Vec<Var>, config: SgdConfig) -> Result<Self> {
        let vars = vars
            .into_iter()
            .filter(|var| var.dtype().is_float())
            .map(|var| {
                let velocity = var.as_detached_tensor().zeros_like()?;
                Ok(VarState { var, velocity })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { vars, config })
    }

    fn step(&mut self, grads: &GradStore) -> Result<()> {
        let mut updates = Vec::with_capacity(self.vars.len());
        let mut sq_norm = 0f64;

        for (idx, state) in self.vars.iter().enumerate() {
            let Some(grad) = grads.get(&state.var) else {
                continue;
            };
            let grad = if self.config.l2 > 0.0 {
                (grad + (state.var.as_detached_tensor() * self.config.l2)?)?
            } else {
                grad.clone()
            };
            if self.config.max_grad_norm.is_some() {
                sq_norm += f64::from(grad.sqr()?.sum_all()?.to_scalar::<f32>()?);
            }
            updates.push((idx, grad));
        }

        let norm = sq_norm.sqrt();
        let scale = match self.config.max_grad_norm {
            Some(max) if max > 0.0 && norm > max => max / norm,
            _ => 1.0,
        };
        if scale < 1.0 {
            tracing::trace!(norm, scale, "clipping gradients");
        }

        for (idx, grad) in updates {
            let state = &mut self.vars[idx];
            let grad = if scale < 1.0 { (grad * scale)? } else { grad };
            let velocity = ((&state.velocity * self.config.momentum)? + grad)?;
            let weights = state.var.as_detached_tensor();
            state.var.set(&(weights - (&velocity * self.config.learn_rate)?)?)?;
            state.velocity = velocity;
        }

        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.config.learn_rate
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.config.learn_rate = lr;
    }
}
