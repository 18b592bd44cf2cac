//! Adam optimizer

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use super::Optimizer;
use crate::{Error, Result};

/// Adam with bias-corrected step size.
///
/// θ_t = θ_{t-1} - lr_t * m_t / (√v_t + ε), lr_t = lr * √(1 - β2^t) / (1 - β1^t)
#[derive(Debug, Clone)]
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: u64,
    m: Vec<Option<Array2<f32>>>, // First moment
    v: Vec<Option<Array2<f32>>>, // Second moment
}

/// Serializable Adam settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdamConfig {
    pub lr: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self { lr: 0.001, beta1: 0.9, beta2: 0.999, epsilon: 1e-7 }
    }
}

impl AdamConfig {
    pub fn with_lr(lr: f32) -> Self {
        Self { lr, ..Self::default() }
    }

    pub fn build(&self) -> Adam {
        Adam::new(self.lr, self.beta1, self.beta2, self.epsilon)
    }
}

impl Adam {
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self { lr, beta1, beta2, epsilon, t: 0, m: Vec::new(), v: Vec::new() }
    }

    /// Adam with the usual β1 = 0.9, β2 = 0.999.
    pub fn default_params(lr: f32) -> Self {
        AdamConfig::with_lr(lr).build()
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.t
    }

    #[must_use]
    pub fn beta1(&self) -> f32 {
        self.beta1
    }

    #[must_use]
    pub fn beta2(&self) -> f32 {
        self.beta2
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [&mut Array2<f32>], grads: &[Array2<f32>]) -> Result<()> {
        if params.len() != grads.len() {
            return Err(Error::shape("optimizer gradients", &[params.len()], &[grads.len()]));
        }
        if let Some((p, g)) = params.iter().zip(grads).find(|(p, g)| p.shape() != g.shape()) {
            return Err(Error::shape("optimizer gradient", p.shape(), g.shape()));
        }
        if self.m.len() < params.len() {
            self.m.resize(params.len(), None);
            self.v.resize(params.len(), None);
        }
        self.t += 1;

        let t = i32::try_from(self.t).unwrap_or(i32::MAX);
        let lr_t = self.lr * ((1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t)));
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);

        for (i, (param, grad)) in params.iter_mut().zip(grads).enumerate() {
            let m = self.m[i].get_or_insert_with(|| Array2::zeros(grad.raw_dim()));
            let v = self.v[i].get_or_insert_with(|| Array2::zeros(grad.raw_dim()));
            Zip::from(&mut **param).and(m).and(v).and(grad).for_each(|p, m, v, &g| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                *p -= lr_t * *m / (v.sqrt() + epsilon);
            });
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.t = 0;
        self.m.clear();
        self.v.clear();
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}
