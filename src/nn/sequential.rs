use ndarray::Array2;
use rand::Rng;

use super::{Activation, Dense, DenseCache, Gradients};
use crate::{Error, Result};

/// A stack of dense layers applied in order.
#[derive(Debug, Clone)]
pub struct Sequential {
    layers: Vec<Dense>,
}

impl Sequential {
    pub fn new(layers: Vec<Dense>) -> Self {
        Self { layers }
    }

    /// Multi-layer perceptron: ReLU hidden layers, then `output` with
    /// `output_activation`.
    pub fn mlp<R: Rng + ?Sized>(
        input: usize,
        hidden: &[usize],
        output: usize,
        output_activation: Activation,
        rng: &mut R,
    ) -> Self {
        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut fan_in = input;
        for &width in hidden {
            layers.push(Dense::new(fan_in, width, Activation::Relu, true, rng));
            fan_in = width;
        }
        layers.push(Dense::new(fan_in, output, output_activation, true, rng));
        Self { layers }
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, Dense::input_dim)
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, Dense::output_dim)
    }

    pub fn forward(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        let Some((first, rest)) = self.layers.split_first() else {
            return Err(Error::shape("empty network", &[1], &[0]));
        };
        let mut h = first.forward(x)?;
        for layer in rest {
            h = layer.forward(&h)?;
        }
        Ok(h)
    }

    pub fn forward_train(&self, x: &Array2<f32>) -> Result<(Array2<f32>, Vec<DenseCache>)> {
        let mut caches = Vec::with_capacity(self.layers.len());
        let mut h = x.clone();
        for layer in &self.layers {
            let (out, cache) = layer.forward_train(&h)?;
            caches.push(cache);
            h = out;
        }
        if caches.is_empty() {
            return Err(Error::shape("empty network", &[1], &[0]));
        }
        Ok((h, caches))
    }

    pub fn backward(&self, caches: &[DenseCache], grad_output: &Array2<f32>) -> (Gradients, Array2<f32>) {
        let mut per_layer = Vec::with_capacity(self.layers.len());
        let mut grad = grad_output.clone();
        for (layer, cache) in self.layers.iter().zip(caches).rev() {
            let (grads, grad_input) = layer.backward(cache, &grad);
            per_layer.push(grads);
            grad = grad_input;
        }
        per_layer.reverse();
        (per_layer.into_iter().flatten().collect(), grad)
    }

    pub fn parameters(&self) -> Vec<&Array2<f32>> {
        self.layers.iter().flat_map(Dense::parameters).collect()
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Array2<f32>> {
        self.layers.iter_mut().flat_map(Dense::parameters_mut).collect()
    }

    pub fn reinitialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for layer in &mut self.layers {
            layer.reinitialize(rng);
        }
    }
}
