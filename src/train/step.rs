//! One training iteration.
//!
//! Order within an iteration is fixed: sample, generate (and snapshot),
//! route, discriminator phase, generator phase, metrics. The phase flag on
//! the ensemble is set for exactly the duration of each update phase and is
//! cleared before any suspension point, so an iteration abandoned at an
//! `.await` never leaves a sub-model unfrozen.

use ndarray::{s, Array2};
use rand::Rng;

use super::routing::{broadcast, partition_by_route};
use super::StepRecord;
use crate::data::{Point, SampleSource};
use crate::generative::{Conditioning, Ensemble, Labelling, Phase, Routing};
use crate::nn::{BinaryCrossEntropy, CategoricalCrossEntropy, Gradients, LossFn, Model};
use crate::tensor::{argmax_rows, point_rows, Tensor};
use crate::trace::{TraceStep, TRACER};
use crate::Result;

/// Iteration-scoped inputs and outputs, all counted by the pool.
struct Batch {
    real: Tensor,
    /// Generator input: noise, plus one-hot codes for code-conditioned families
    input: Tensor,
    codes: Vec<usize>,
    fakes: Vec<Tensor>,
}

struct Losses {
    discriminators: Vec<Option<f32>>,
    generators: Vec<f32>,
    classifier: Vec<f32>,
}

impl Ensemble {
    /// Run one full training iteration against `source`.
    ///
    /// Suspends twice, after each update phase. Fails with
    /// [`crate::Error::EmptySource`] if there is nothing to sample; the
    /// counter only advances on success.
    pub async fn train_step(&mut self, source: &SampleSource) -> Result<StepRecord> {
        self.pool.reset_peak();
        let outcome = self.iterate(source).await;
        self.phase = None;
        let losses = outcome?;

        self.iteration += 1;
        let mut record = TRACER.span(TraceStep::Metrics, self.name(), || {
            StepRecord::new(self.iteration, losses.discriminators, losses.generators, &losses.classifier)
        });
        record.live_tensors = self.pool.live();
        record.peak_tensors = self.pool.peak();
        Ok(record)
    }

    async fn iterate(&mut self, source: &SampleSource) -> Result<Losses> {
        let name = self.config.name.clone();
        let mut batch = TRACER.span(TraceStep::Sample, name.as_str(), || self.sample(source))?;
        TRACER.span(TraceStep::Generate, name.as_str(), || self.generate_fakes(&mut batch))?;
        let partitions = TRACER.span(TraceStep::Route, name.as_str(), || self.route(&batch))?;

        let discriminators = TRACER.span(TraceStep::Discriminate, name.as_str(), || {
            self.with_phase(Phase::Discriminator, |e| e.discriminator_phase(&batch, &partitions))
        })?;
        tokio::task::yield_now().await;

        let (generators, classifier) = TRACER.span(TraceStep::Adversarial, name.as_str(), || {
            self.with_phase(Phase::Generator, |e| e.generator_phase(&batch))
        })?;
        tokio::task::yield_now().await;

        Ok(Losses { discriminators, generators, classifier })
    }

    /// Run `f` with `phase` set. The phase is cleared on exit, unwinding
    /// included.
    fn with_phase<T>(&mut self, phase: Phase, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.phase = Some(phase);
        let mut scope = PhaseScope { ensemble: self };
        f(&mut *scope.ensemble)
    }

    fn sample(&mut self, source: &SampleSource) -> Result<Batch> {
        let batch_size = self.config.batch_size;
        let points = source.sample_batch(batch_size, &mut self.rng)?;
        let real = self.pool.points(&points);
        let noise = self.pool.random_normal(batch_size, self.config.latent_dim, &mut self.rng);

        let (input, codes) = match self.spec.conditioning {
            Conditioning::SampledCode { codes: depth } => {
                let codes: Vec<usize> = (0..batch_size).map(|_| self.rng.random_range(0..depth)).collect();
                (self.pool.track(self.generator_input(&noise, &codes)?), codes)
            }
            Conditioning::None | Conditioning::GeneratorIndex => (noise, Vec::new()),
        };

        self.buffers.write_real(&points);
        self.buffers.write_codes(&codes);
        Ok(Batch { real, input, codes, fakes: Vec::with_capacity(self.generators.len()) })
    }

    /// Inference pass of every generator on the shared input. Buffers are
    /// written here, before any weight in this iteration changes.
    fn generate_fakes(&mut self, batch: &mut Batch) -> Result<()> {
        for (g, generator) in self.generators.iter().enumerate() {
            let fake = self.pool.track(generator.forward(&batch.input)?);
            self.buffers.write_fakes(g, point_rows(&fake));
            batch.fakes.push(fake);
        }
        Ok(())
    }

    /// Real-batch indices each discriminator trains on.
    fn route(&mut self, batch: &Batch) -> Result<Vec<Vec<usize>>> {
        let domains = self.discriminators.len();
        match (self.spec.routing, &self.classifier) {
            (Routing::Classifier, Some(router)) => {
                let probs = self.pool.track(router.forward(&batch.real)?);
                let routes = argmax_rows(&probs);
                self.buffers.write_routes(&routes);
                Ok(partition_by_route(&routes, domains))
            }
            _ => {
                self.buffers.write_routes(&[]);
                Ok(broadcast(batch.real.rows(), domains))
            }
        }
    }

    fn discriminator_phase(&mut self, batch: &Batch, partitions: &[Vec<usize>]) -> Result<Vec<Option<f32>>> {
        let phase = self.phase;
        let mut losses = Vec::with_capacity(self.discriminators.len());

        for (d, rows) in partitions.iter().enumerate() {
            if rows.is_empty() {
                tracing::trace!(ensemble = %self.config.name, discriminator = d, "no routed points, skipped");
                losses.push(None);
                continue;
            }
            let judged = self.spec.generators_judged_by(d);
            let real = self.pool.gather_rows(&batch.real, rows);
            let mut parts = vec![real.view()];
            parts.extend(judged.iter().map(|&g| batch.fakes[g].view()));
            let x = self.pool.concat_rows(&parts)?;

            let loss = match self.spec.labelling {
                Labelling::Binary => {
                    let mut labels = Array2::zeros((x.nrows(), 1));
                    labels.slice_mut(s![..rows.len(), ..]).fill(1.0);
                    let y = self.pool.track(labels);
                    self.discriminators[d].train_step(&x, &y, &BinaryCrossEntropy, phase)?
                }
                Labelling::SourceClass { generators } => {
                    let mut classes = vec![generators; rows.len()];
                    for &g in &judged {
                        classes.extend(std::iter::repeat(g).take(batch.fakes[g].rows()));
                    }
                    let y = self.pool.one_hot(&classes, generators + 1)?;
                    self.discriminators[d].train_step(&x, &y, &CategoricalCrossEntropy, phase)?
                }
            };
            losses.push(loss);
        }
        Ok(losses)
    }

    /// Update every generator against its (frozen) discriminator, plus the
    /// classifier term where there is one. The classifier's gradients are
    /// averaged over generators and applied once.
    fn generator_phase(&mut self, batch: &Batch) -> Result<(Vec<f32>, Vec<f32>)> {
        let phase = self.phase;
        let rows = batch.input.rows();
        let Self { config, spec, generators, discriminators, classifier, pool, .. } = self;

        let mut adversarial = Vec::with_capacity(generators.len());
        let mut auxiliary = Vec::new();
        let mut classifier_grads: Option<Gradients> = None;

        for (g, generator) in generators.iter_mut().enumerate() {
            let (output, cache) = generator.network().forward_train(&batch.input)?;
            let fake = pool.track(output);

            let d = spec.discriminator_for(g);
            let (target, loss): (Tensor, &dyn LossFn) = match spec.labelling {
                Labelling::Binary => (pool.full(rows, 1, 1.0), &BinaryCrossEntropy as &dyn LossFn),
                Labelling::SourceClass { generators: k } => {
                    (pool.one_hot(&vec![k; rows], k + 1)?, &CategoricalCrossEntropy as &dyn LossFn)
                }
            };
            let (adv_loss, frozen, mut grad_fake) = discriminators[d].gradients(&fake, &target, loss, 1.0)?;
            // Discriminators are frozen in this phase and refuse the update.
            discriminators[d].apply_gradients(&frozen, phase)?;
            adversarial.push(adv_loss);

            if let Some(cls) = classifier.as_ref() {
                let classes = match spec.conditioning {
                    Conditioning::SampledCode { .. } => batch.codes.clone(),
                    Conditioning::None | Conditioning::GeneratorIndex => vec![g; rows],
                };
                let target = pool.one_hot(&classes, cls.network().output_dim())?;
                let (aux_loss, grads, grad_aux) =
                    cls.gradients(&fake, &target, &CategoricalCrossEntropy, config.q_weight)?;
                grad_fake += &grad_aux;
                auxiliary.push(aux_loss);
                accumulate(&mut classifier_grads, grads);
            }

            let (grads, _) = generator.network().backward(&cache, &grad_fake);
            generator.apply_gradients(&grads, phase)?;
        }

        if let (Some(cls), Some(mut grads)) = (classifier.as_mut(), classifier_grads) {
            let n = generators.len().max(1) as f32;
            grads.iter_mut().for_each(|g| *g /= n);
            cls.apply_gradients(&grads, phase)?;
        }
        Ok((adversarial, auxiliary))
    }
}

/// Clears the ensemble's phase when dropped.
struct PhaseScope<'a> {
    ensemble: &'a mut Ensemble,
}

impl Drop for PhaseScope<'_> {
    fn drop(&mut self) {
        self.ensemble.phase = None;
    }
}

fn accumulate(total: &mut Option<Gradients>, grads: Gradients) {
    match total {
        Some(sum) => sum.iter_mut().zip(&grads).for_each(|(s, g)| *s += g),
        None => *total = Some(grads),
    }
}

/// Points in the last real batch routed to each discriminator.
pub fn routed_counts(ensemble: &Ensemble) -> Vec<usize> {
    let domains = ensemble.discriminators().len();
    let routes = &ensemble.buffers().real_routes;
    if routes.is_empty() {
        return vec![ensemble.buffers().real.len(); domains];
    }
    partition_by_route(routes, domains).iter().map(Vec::len).collect()
}

/// Last fake batch of every generator, flattened, with the generator index.
pub fn labelled_fakes(ensemble: &Ensemble) -> Vec<(usize, Point)> {
    ensemble
        .buffers()
        .fakes
        .iter()
        .enumerate()
        .flat_map(|(g, pts)| pts.iter().map(move |p| (g, *p)))
        .collect()
}
