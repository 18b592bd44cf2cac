//! The [`Model`] abstraction and the concrete network enum.

use ndarray::Array2;
use rand::Rng;

use super::{ConditionalCache, ConditionalGenerator, DenseCache, Gradients, Sequential};
use crate::Result;

/// A differentiable batch-first network.
pub trait Model {
    /// State saved by [`Model::forward_train`] for the backward pass.
    type Cache;

    fn input_dim(&self) -> usize;

    fn output_dim(&self) -> usize;

    /// Inference pass. Fails on an input of the wrong width.
    fn forward(&self, x: &Array2<f32>) -> Result<Array2<f32>>;

    fn forward_train(&self, x: &Array2<f32>) -> Result<(Array2<f32>, Self::Cache)>;

    /// Gradients for every parameter, plus the gradient w.r.t. the input.
    fn backward(&self, cache: &Self::Cache, grad_output: &Array2<f32>) -> (Gradients, Array2<f32>);

    fn parameters(&self) -> Vec<&Array2<f32>>;

    fn parameters_mut(&mut self) -> Vec<&mut Array2<f32>>;

    /// Redraw every parameter from the construction distribution.
    fn reinitialize<R: Rng + ?Sized>(&mut self, rng: &mut R);

    fn parameter_shapes(&self) -> Vec<Vec<usize>> {
        self.parameters().iter().map(|p| p.shape().to_vec()).collect()
    }

    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.len()).sum()
    }

    /// Output for `x` and the gradient of `seed(output)` w.r.t. `x`.
    ///
    /// `seed` turns the output into the upstream gradient, e.g. a one-hot
    /// selector for the column whose input gradient is wanted.
    fn value_and_input_grad<F>(&self, x: &Array2<f32>, seed: F) -> Result<(Array2<f32>, Array2<f32>)>
    where
        F: FnOnce(&Array2<f32>) -> Array2<f32>,
    {
        let (output, cache) = self.forward_train(x)?;
        let upstream = seed(&output);
        let (_, grad_input) = self.backward(&cache, &upstream);
        Ok((output, grad_input))
    }
}

impl Model for Sequential {
    type Cache = Vec<DenseCache>;

    fn input_dim(&self) -> usize {
        Sequential::input_dim(self)
    }

    fn output_dim(&self) -> usize {
        Sequential::output_dim(self)
    }

    fn forward(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        Sequential::forward(self, x)
    }

    fn forward_train(&self, x: &Array2<f32>) -> Result<(Array2<f32>, Self::Cache)> {
        Sequential::forward_train(self, x)
    }

    fn backward(&self, cache: &Self::Cache, grad_output: &Array2<f32>) -> (Gradients, Array2<f32>) {
        Sequential::backward(self, cache, grad_output)
    }

    fn parameters(&self) -> Vec<&Array2<f32>> {
        Sequential::parameters(self)
    }

    fn parameters_mut(&mut self) -> Vec<&mut Array2<f32>> {
        Sequential::parameters_mut(self)
    }

    fn reinitialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        Sequential::reinitialize(self, rng);
    }
}

impl Model for ConditionalGenerator {
    type Cache = ConditionalCache;

    fn input_dim(&self) -> usize {
        ConditionalGenerator::input_dim(self)
    }

    fn output_dim(&self) -> usize {
        ConditionalGenerator::output_dim(self)
    }

    fn forward(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        ConditionalGenerator::forward(self, x)
    }

    fn forward_train(&self, x: &Array2<f32>) -> Result<(Array2<f32>, Self::Cache)> {
        ConditionalGenerator::forward_train(self, x)
    }

    fn backward(&self, cache: &Self::Cache, grad_output: &Array2<f32>) -> (Gradients, Array2<f32>) {
        ConditionalGenerator::backward(self, cache, grad_output)
    }

    fn parameters(&self) -> Vec<&Array2<f32>> {
        ConditionalGenerator::parameters(self)
    }

    fn parameters_mut(&mut self) -> Vec<&mut Array2<f32>> {
        ConditionalGenerator::parameters_mut(self)
    }

    fn reinitialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        ConditionalGenerator::reinitialize(self, rng);
    }
}

/// Any architecture a sub-model can hold.
#[derive(Debug, Clone)]
pub enum Network {
    Sequential(Sequential),
    Conditional(ConditionalGenerator),
}

#[derive(Debug, Clone)]
pub enum NetworkCache {
    Sequential(Vec<DenseCache>),
    Conditional(ConditionalCache),
}

impl From<Sequential> for Network {
    fn from(net: Sequential) -> Self {
        Self::Sequential(net)
    }
}

impl From<ConditionalGenerator> for Network {
    fn from(net: ConditionalGenerator) -> Self {
        Self::Conditional(net)
    }
}

impl Model for Network {
    type Cache = NetworkCache;

    fn input_dim(&self) -> usize {
        match self {
            Self::Sequential(n) => Model::input_dim(n),
            Self::Conditional(n) => Model::input_dim(n),
        }
    }

    fn output_dim(&self) -> usize {
        match self {
            Self::Sequential(n) => Model::output_dim(n),
            Self::Conditional(n) => Model::output_dim(n),
        }
    }

    fn forward(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        match self {
            Self::Sequential(n) => Model::forward(n, x),
            Self::Conditional(n) => Model::forward(n, x),
        }
    }

    fn forward_train(&self, x: &Array2<f32>) -> Result<(Array2<f32>, Self::Cache)> {
        match self {
            Self::Sequential(n) => {
                Model::forward_train(n, x).map(|(y, c)| (y, NetworkCache::Sequential(c)))
            }
            Self::Conditional(n) => {
                Model::forward_train(n, x).map(|(y, c)| (y, NetworkCache::Conditional(c)))
            }
        }
    }

    fn backward(&self, cache: &Self::Cache, grad_output: &Array2<f32>) -> (Gradients, Array2<f32>) {
        match (self, cache) {
            (Self::Sequential(n), NetworkCache::Sequential(c)) => Model::backward(n, c, grad_output),
            (Self::Conditional(n), NetworkCache::Conditional(c)) => Model::backward(n, c, grad_output),
            // A cache from another network carries nothing usable.
            _ => (Vec::new(), Array2::zeros((grad_output.nrows(), self.input_dim()))),
        }
    }

    fn parameters(&self) -> Vec<&Array2<f32>> {
        match self {
            Self::Sequential(n) => Model::parameters(n),
            Self::Conditional(n) => Model::parameters(n),
        }
    }

    fn parameters_mut(&mut self) -> Vec<&mut Array2<f32>> {
        match self {
            Self::Sequential(n) => Model::parameters_mut(n),
            Self::Conditional(n) => Model::parameters_mut(n),
        }
    }

    fn reinitialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match self {
            Self::Sequential(n) => Model::reinitialize(n, rng),
            Self::Conditional(n) => Model::reinitialize(n, rng),
        }
    }
}
