//! A trainable member of an ensemble.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use ndarray::Array2;
use rand::Rng;

use super::{is_trainable, Phase, Role};
use crate::nn::{Gradients, LossFn, Model, Network};
use crate::optim::{Adam, AdamConfig, Optimizer};
use crate::Result;

/// One network with its role and its own optimizer.
#[derive(Debug, Clone)]
pub struct SubModel {
    name: String,
    role: Role,
    network: Network,
    optimizer: Adam,
}

impl SubModel {
    pub fn new(name: impl Into<String>, role: Role, network: impl Into<Network>, optimizer: &AdamConfig) -> Self {
        Self { name: name.into(), role, network: network.into(), optimizer: optimizer.build() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn optimizer(&self) -> &Adam {
        &self.optimizer
    }

    /// Inference pass.
    pub fn forward(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        self.network.forward(x)
    }

    /// Whether this sub-model may be updated under `phase`.
    pub fn is_trainable(&self, phase: Option<Phase>) -> bool {
        is_trainable(phase, self.role)
    }

    /// Apply gradients if `phase` unfreezes this role.
    ///
    /// Returns `Ok(false)` and leaves every parameter untouched when the role
    /// is frozen.
    pub fn apply_gradients(&mut self, grads: &[Array2<f32>], phase: Option<Phase>) -> Result<bool> {
        if !self.is_trainable(phase) {
            return Ok(false);
        }
        let mut params = self.network.parameters_mut();
        self.optimizer.step(&mut params, grads)?;
        Ok(true)
    }

    /// Forward, loss, backward and update in one go.
    ///
    /// Returns the loss, or `None` if the role was frozen and nothing moved.
    pub fn train_step(
        &mut self,
        x: &Array2<f32>,
        targets: &Array2<f32>,
        loss: &dyn LossFn,
        phase: Option<Phase>,
    ) -> Result<Option<f32>> {
        let (output, cache) = self.network.forward_train(x)?;
        let (value, grad) = loss.evaluate(&output, targets)?;
        let (grads, _) = self.network.backward(&cache, &grad);
        Ok(self.apply_gradients(&grads, phase)?.then_some(value))
    }

    /// Gradients of `loss` w.r.t. the parameters and the input, without
    /// updating anything.
    pub fn gradients(
        &self,
        x: &Array2<f32>,
        targets: &Array2<f32>,
        loss: &dyn LossFn,
        scale: f32,
    ) -> Result<(f32, Gradients, Array2<f32>)> {
        let (output, cache) = self.network.forward_train(x)?;
        let (value, mut grad) = loss.evaluate(&output, targets)?;
        if scale != 1.0 {
            grad *= scale;
        }
        let (grads, grad_input) = self.network.backward(&cache, &grad);
        Ok((value, grads, grad_input))
    }

    /// Redraw parameters and forget optimizer state.
    pub fn reinitialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.network.reinitialize(rng);
        self.optimizer.reset();
    }

    pub fn parameter_shapes(&self) -> Vec<Vec<usize>> {
        self.network.parameter_shapes()
    }

    /// Hash of the exact bit patterns of every parameter.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for param in self.network.parameters() {
            param.shape().hash(&mut hasher);
            for v in param.iter() {
                v.to_bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    /// Copy of every parameter.
    pub fn parameters_snapshot(&self) -> Vec<Array2<f32>> {
        self.network.parameters().into_iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{Activation, BinaryCrossEntropy, Sequential};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn discriminator() -> SubModel {
        let net = Sequential::mlp(2, &[8], 1, Activation::Sigmoid, &mut StdRng::seed_from_u64(1));
        SubModel::new("d", Role::Discriminator, net, &AdamConfig::with_lr(0.01))
    }

    fn batch() -> (Array2<f32>, Array2<f32>) {
        let x = Array2::from_shape_fn((4, 2), |(i, j)| (i + j) as f32 * 0.1);
        let y = Array2::from_shape_fn((4, 1), |(i, _)| (i % 2) as f32);
        (x, y)
    }

    #[test]
    fn test_frozen_role_is_untouched() {
        let mut d = discriminator();
        let (x, y) = batch();
        let before = d.fingerprint();
        for phase in [None, Some(Phase::Generator)] {
            assert_eq!(d.train_step(&x, &y, &BinaryCrossEntropy, phase).unwrap(), None);
        }
        assert_eq!(d.fingerprint(), before);
        assert_eq!(d.optimizer().step_count(), 0);
    }

    #[test]
    fn test_unfrozen_role_moves() {
        let mut d = discriminator();
        let (x, y) = batch();
        let before = d.fingerprint();
        let loss = d.train_step(&x, &y, &BinaryCrossEntropy, Some(Phase::Discriminator)).unwrap();
        assert!(loss.is_some_and(f32::is_finite));
        assert_ne!(d.fingerprint(), before);
    }

    #[test]
    fn test_gradients_do_not_update() {
        let d = discriminator();
        let (x, y) = batch();
        let before = d.fingerprint();
        let (_, grads, gx) = d.gradients(&x, &y, &BinaryCrossEntropy, 0.5).unwrap();
        assert_eq!(grads.len(), 4);
        assert_eq!(gx.shape(), &[4, 2]);
        assert_eq!(d.fingerprint(), before);
    }

    #[test]
    fn test_reinitialize_keeps_shapes_changes_values() {
        let mut d = discriminator();
        let shapes = d.parameter_shapes();
        let before = d.parameters_snapshot();
        d.reinitialize(&mut StdRng::seed_from_u64(77));
        assert_eq!(d.parameter_shapes(), shapes);
        assert_ne!(d.parameters_snapshot()[0], before[0]);
    }
}
