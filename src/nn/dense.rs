//! Fully connected layer.

use ndarray::{Array2, Axis};
use rand::Rng;

use super::{glorot_normal, Activation};
use crate::{Error, Result};

/// `y = act(x · W + b)` with `W` stored as `in × out`.
///
/// The bias is kept as a `1 × out` row so every parameter is a matrix.
#[derive(Debug, Clone)]
pub struct Dense {
    weight: Array2<f32>,
    bias: Option<Array2<f32>>,
    activation: Activation,
}

/// What [`Dense::backward`] needs from the forward pass.
#[derive(Debug, Clone)]
pub struct DenseCache {
    input: Array2<f32>,
    output: Array2<f32>,
}

impl DenseCache {
    pub fn output(&self) -> &Array2<f32> {
        &self.output
    }
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(
        input: usize,
        output: usize,
        activation: Activation,
        use_bias: bool,
        rng: &mut R,
    ) -> Self {
        Self {
            weight: glorot_normal(input, output, rng),
            bias: use_bias.then(|| Array2::zeros((1, output))),
            activation,
        }
    }

    pub fn input_dim(&self) -> usize {
        self.weight.nrows()
    }

    pub fn output_dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    fn check_input(&self, x: &Array2<f32>) -> Result<()> {
        if x.ncols() != self.input_dim() {
            return Err(Error::shape("dense input", &[x.nrows(), self.input_dim()], x.shape()));
        }
        Ok(())
    }

    fn affine(&self, x: &Array2<f32>) -> Array2<f32> {
        let mut z = x.dot(&self.weight);
        if let Some(bias) = &self.bias {
            z += bias;
        }
        self.activation.apply(&mut z);
        z
    }

    pub fn forward(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        self.check_input(x)?;
        Ok(self.affine(x))
    }

    pub fn forward_train(&self, x: &Array2<f32>) -> Result<(Array2<f32>, DenseCache)> {
        self.check_input(x)?;
        let output = self.affine(x);
        Ok((output.clone(), DenseCache { input: x.clone(), output }))
    }

    /// Returns parameter gradients (weight, then bias if present) and the
    /// gradient w.r.t. the layer input.
    pub fn backward(&self, cache: &DenseCache, grad_output: &Array2<f32>) -> (Vec<Array2<f32>>, Array2<f32>) {
        let dz = self.activation.backward(&cache.output, grad_output);
        let mut grads = vec![cache.input.t().dot(&dz)];
        if self.bias.is_some() {
            grads.push(dz.sum_axis(Axis(0)).insert_axis(Axis(0)));
        }
        let grad_input = dz.dot(&self.weight.t());
        (grads, grad_input)
    }

    pub fn parameters(&self) -> Vec<&Array2<f32>> {
        std::iter::once(&self.weight).chain(self.bias.as_ref()).collect()
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Array2<f32>> {
        std::iter::once(&mut self.weight).chain(self.bias.as_mut()).collect()
    }

    /// Redraw weights and zero the bias, keeping shapes.
    pub fn reinitialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.weight = glorot_normal(self.input_dim(), self.output_dim(), rng);
        if let Some(bias) = &mut self.bias {
            bias.fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layer(activation: Activation) -> Dense {
        Dense::new(3, 2, activation, true, &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_forward_shape() {
        let d = layer(Activation::Relu);
        let y = d.forward(&Array2::ones((5, 3))).unwrap();
        assert_eq!(y.shape(), &[5, 2]);
    }

    #[test]
    fn test_forward_rejects_wrong_width() {
        let d = layer(Activation::Linear);
        assert!(matches!(d.forward(&Array2::ones((5, 4))), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_no_bias_has_single_parameter() {
        let d = Dense::new(4, 4, Activation::Linear, false, &mut StdRng::seed_from_u64(1));
        assert_eq!(d.parameters().len(), 1);
    }

    #[test]
    fn test_weight_gradient_matches_finite_difference() {
        let d = layer(Activation::Sigmoid);
        let x = array![[0.5, -0.2, 0.1], [0.3, 0.8, -0.6]];
        let (_, cache) = d.forward_train(&x).unwrap();
        let seed = Array2::ones((2, 2));
        let (grads, _) = d.backward(&cache, &seed);

        let h = 1e-3;
        let mut up = d.clone();
        up.weight[[1, 0]] += h;
        let mut down = d.clone();
        down.weight[[1, 0]] -= h;
        let numeric = (up.forward(&x).unwrap().sum() - down.forward(&x).unwrap().sum()) / (2.0 * h);
        assert_relative_eq!(grads[0][[1, 0]], numeric, epsilon = 1e-2);
    }

    #[test]
    fn test_input_gradient_shape() {
        let d = layer(Activation::Linear);
        let x = Array2::zeros((4, 3));
        let (_, cache) = d.forward_train(&x).unwrap();
        let (grads, gx) = d.backward(&cache, &Array2::ones((4, 2)));
        assert_eq!(gx.shape(), &[4, 3]);
        assert_eq!(grads[1].shape(), &[1, 2]);
        assert_relative_eq!(grads[1][[0, 0]], 4.0);
    }

    #[test]
    fn test_reinitialize_keeps_shape() {
        let mut d = layer(Activation::Relu);
        let before = d.weight.clone();
        d.bias.as_mut().unwrap().fill(3.0);
        d.reinitialize(&mut StdRng::seed_from_u64(99));
        assert_eq!(d.weight.shape(), before.shape());
        assert_ne!(d.weight, before);
        assert!(d.bias.as_ref().unwrap().iter().all(|&b| b == 0.0));
    }
}
