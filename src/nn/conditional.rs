//! Generator conditioned on a one-hot code.

use ndarray::{concatenate, s, Array2, Axis};
use rand::Rng;

use super::{Activation, Dense, DenseCache, Gradients, Sequential};
use crate::{Error, Result};

/// Maps `[noise | one-hot code]` rows to points.
///
/// The noise and the code each go through a bias-free linear embedding of the
/// same width; the noise embedding is scaled by `noise_scale` so the code is
/// not drowned out. The sum passes through a ReLU and then the trunk.
#[derive(Debug, Clone)]
pub struct ConditionalGenerator {
    noise_embed: Dense,
    code_embed: Dense,
    noise_scale: f32,
    trunk: Sequential,
}

#[derive(Debug, Clone)]
pub struct ConditionalCache {
    noise: DenseCache,
    code: DenseCache,
    hidden: Array2<f32>,
    trunk: Vec<DenseCache>,
}

impl ConditionalGenerator {
    pub fn new<R: Rng + ?Sized>(
        latent_dim: usize,
        code_dim: usize,
        embed_dim: usize,
        hidden: &[usize],
        noise_scale: f32,
        rng: &mut R,
    ) -> Self {
        Self {
            noise_embed: Dense::new(latent_dim, embed_dim, Activation::Linear, false, rng),
            code_embed: Dense::new(code_dim, embed_dim, Activation::Linear, false, rng),
            noise_scale,
            trunk: Sequential::mlp(embed_dim, hidden, 2, Activation::Linear, rng),
        }
    }

    pub fn latent_dim(&self) -> usize {
        self.noise_embed.input_dim()
    }

    pub fn code_dim(&self) -> usize {
        self.code_embed.input_dim()
    }

    pub fn input_dim(&self) -> usize {
        self.latent_dim() + self.code_dim()
    }

    pub fn output_dim(&self) -> usize {
        self.trunk.output_dim()
    }

    fn split(&self, x: &Array2<f32>) -> Result<(Array2<f32>, Array2<f32>)> {
        if x.ncols() != self.input_dim() {
            return Err(Error::shape(
                "conditional generator input",
                &[x.nrows(), self.input_dim()],
                x.shape(),
            ));
        }
        let latent = self.latent_dim();
        Ok((x.slice(s![.., ..latent]).to_owned(), x.slice(s![.., latent..]).to_owned()))
    }

    fn embed(&self, noise: &Array2<f32>, code: &Array2<f32>) -> Array2<f32> {
        let mut hidden = noise * self.noise_scale + code;
        Activation::Relu.apply(&mut hidden);
        hidden
    }

    pub fn forward(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        let (noise, code) = self.split(x)?;
        let hidden = self.embed(&self.noise_embed.forward(&noise)?, &self.code_embed.forward(&code)?);
        self.trunk.forward(&hidden)
    }

    pub fn forward_train(&self, x: &Array2<f32>) -> Result<(Array2<f32>, ConditionalCache)> {
        let (noise, code) = self.split(x)?;
        let (noise_out, noise_cache) = self.noise_embed.forward_train(&noise)?;
        let (code_out, code_cache) = self.code_embed.forward_train(&code)?;
        let hidden = self.embed(&noise_out, &code_out);
        let (output, trunk) = self.trunk.forward_train(&hidden)?;
        Ok((output, ConditionalCache { noise: noise_cache, code: code_cache, hidden, trunk }))
    }

    pub fn backward(&self, cache: &ConditionalCache, grad_output: &Array2<f32>) -> (Gradients, Array2<f32>) {
        let (trunk_grads, grad_hidden) = self.trunk.backward(&cache.trunk, grad_output);
        let grad_embed = Activation::Relu.backward(&cache.hidden, &grad_hidden);
        let (noise_grads, grad_noise) =
            self.noise_embed.backward(&cache.noise, &(&grad_embed * self.noise_scale));
        let (code_grads, grad_code) = self.code_embed.backward(&cache.code, &grad_embed);

        let grads = noise_grads.into_iter().chain(code_grads).chain(trunk_grads).collect();
        let grad_input = concatenate![Axis(1), grad_noise, grad_code];
        (grads, grad_input)
    }

    pub fn parameters(&self) -> Vec<&Array2<f32>> {
        let mut params = self.noise_embed.parameters();
        params.extend(self.code_embed.parameters());
        params.extend(self.trunk.parameters());
        params
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Array2<f32>> {
        let mut params = self.noise_embed.parameters_mut();
        params.extend(self.code_embed.parameters_mut());
        params.extend(self.trunk.parameters_mut());
        params
    }

    pub fn reinitialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.noise_embed.reinitialize(rng);
        self.code_embed.reinitialize(rng);
        self.trunk.reinitialize(rng);
    }
}
