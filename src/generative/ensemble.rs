//! A named set of sub-models trained together.

use ndarray::{concatenate, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{
    is_trainable, Conditioning, EnsembleConfig, Phase, Role, SubModel, VariantSpec, VisualBuffers,
};
use crate::config::validate_ensemble;
use crate::data::Point;
use crate::nn::{Activation, ConditionalGenerator, Sequential};
use crate::tensor::{to_points, TensorPool};
use crate::Result;

/// Generators, discriminators and an optional classifier for one GAN family.
///
/// Owns the iteration counter, the phase that gates updates, the visual
/// buffers and the tensor pool for iteration-scoped allocations.
#[derive(Debug)]
pub struct Ensemble {
    pub(crate) config: EnsembleConfig,
    pub(crate) spec: VariantSpec,
    pub(crate) generators: Vec<SubModel>,
    pub(crate) discriminators: Vec<SubModel>,
    pub(crate) classifier: Option<SubModel>,
    pub(crate) phase: Option<Phase>,
    pub(crate) iteration: u64,
    pub(crate) buffers: VisualBuffers,
    pub(crate) pool: TensorPool,
    pub(crate) rng: StdRng,
}

impl Ensemble {
    /// Build every sub-model from `config`.
    pub fn new(config: EnsembleConfig) -> Result<Self> {
        validate_ensemble(&config)?;
        let spec = config.variant.spec(config.codes);
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let generators = (0..spec.generators)
            .map(|i| {
                let name = indexed("generator", i, spec.generators);
                let net = build_generator(&config, &spec, &mut rng);
                SubModel::new(name, Role::Generator, net, &config.generator_optimizer)
            })
            .collect();

        let head = spec.labelling.output_width();
        let head_activation = if head == 1 { Activation::Sigmoid } else { Activation::Softmax };
        let discriminators = (0..spec.discriminators)
            .map(|i| {
                let name = indexed("discriminator", i, spec.discriminators);
                let net = Sequential::mlp(2, &config.discriminator_widths(), head, head_activation, &mut rng);
                SubModel::new(name, Role::Discriminator, net, &config.discriminator_optimizer)
            })
            .collect();

        let classifier = spec.classifier_classes.map(|classes| {
            let net =
                Sequential::mlp(2, &config.discriminator_widths(), classes, Activation::Softmax, &mut rng);
            SubModel::new("classifier", Role::Classifier, net, &config.classifier_optimizer)
        });

        tracing::debug!(
            ensemble = %config.name,
            variant = %config.variant,
            generators = spec.generators,
            discriminators = spec.discriminators,
            classifier = classifier.is_some(),
            "built ensemble"
        );

        Ok(Self {
            buffers: VisualBuffers::new(spec.generators),
            config,
            spec,
            generators,
            discriminators,
            classifier,
            phase: None,
            iteration: 0,
            pool: TensorPool::new(),
            rng,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn spec(&self) -> &VariantSpec {
        &self.spec
    }

    pub fn generators(&self) -> &[SubModel] {
        &self.generators
    }

    pub fn discriminators(&self) -> &[SubModel] {
        &self.discriminators
    }

    pub fn classifier(&self) -> Option<&SubModel> {
        self.classifier.as_ref()
    }

    /// Every sub-model, generators first.
    pub fn sub_models(&self) -> impl Iterator<Item = &SubModel> {
        self.generators.iter().chain(&self.discriminators).chain(&self.classifier)
    }

    /// Completed training iterations.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// The phase currently running, if any.
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    /// `(name, trainable)` for every sub-model, derived from the phase.
    pub fn trainable_flags(&self) -> Vec<(String, bool)> {
        self.sub_models().map(|m| (m.name().to_string(), is_trainable(self.phase, m.role()))).collect()
    }

    pub fn buffers(&self) -> &VisualBuffers {
        &self.buffers
    }

    pub fn pool(&self) -> &TensorPool {
        &self.pool
    }

    /// Drop whatever the buffers hold, e.g. after the source was cleared.
    pub fn clear_buffers(&mut self) {
        self.buffers.clear();
    }

    /// Redraw all parameters from the construction distribution.
    ///
    /// Shapes, the iteration counter and the buffers are kept; optimizer
    /// moments are discarded along with the weights they described.
    pub fn reinitialize(&mut self) {
        let Self { generators, discriminators, classifier, rng, .. } = self;
        for model in generators.iter_mut().chain(discriminators.iter_mut()).chain(classifier.iter_mut()) {
            model.reinitialize(rng);
        }
        tracing::info!(ensemble = %self.config.name, "weights reinitialized");
    }

    /// `(name, shapes)` for every sub-model.
    pub fn parameter_shapes(&self) -> Vec<(String, Vec<Vec<usize>>)> {
        self.sub_models().map(|m| (m.name().to_string(), m.parameter_shapes())).collect()
    }

    /// Generator input for `codes` (one per row): noise, plus one-hot
    /// columns for code-conditioned generators.
    pub(crate) fn generator_input(&self, noise: &Array2<f32>, codes: &[usize]) -> Result<Array2<f32>> {
        match self.spec.conditioning {
            Conditioning::SampledCode { codes: depth } => {
                let one_hot = self.pool.one_hot(codes, depth)?;
                Ok(concatenate![Axis(1), *noise, *one_hot])
            }
            _ => Ok(noise.clone()),
        }
    }

    /// Draw `n` fresh samples, spread round-robin over the generators.
    ///
    /// Leaves the buffers, the counter and every weight alone.
    pub fn generate(&mut self, n: usize) -> Result<Vec<Point>> {
        let gens = self.generators.len().max(1);
        let mut out = Vec::with_capacity(n);
        for g in 0..gens {
            let rows = n / gens + usize::from(g < n % gens);
            if rows == 0 {
                continue;
            }
            let noise = self.pool.random_normal(rows, self.config.latent_dim, &mut self.rng);
            let codes: Vec<usize> = match self.spec.conditioning {
                Conditioning::SampledCode { codes } => {
                    (0..rows).map(|_| self.rng.random_range(0..codes)).collect()
                }
                _ => Vec::new(),
            };
            let input = self.generator_input(&noise, &codes)?;
            out.extend(to_points(&self.generators[g].forward(&input)?));
        }
        Ok(out)
    }
}

fn indexed(base: &str, i: usize, count: usize) -> String {
    if count == 1 {
        base.to_string()
    } else {
        format!("{base} {i}")
    }
}

fn build_generator(config: &EnsembleConfig, spec: &VariantSpec, rng: &mut StdRng) -> crate::nn::Network {
    match spec.conditioning {
        Conditioning::SampledCode { codes } => {
            let hidden: Vec<usize> =
                (1..config.gen_layers).map(|i| config.gen_start_dim << i).collect();
            ConditionalGenerator::new(
                config.latent_dim,
                codes,
                config.gen_start_dim,
                &hidden,
                config.latent_norm,
                rng,
            )
            .into()
        }
        _ => Sequential::mlp(config.latent_dim, &config.generator_widths(), 2, Activation::Linear, rng).into(),
    }
}
