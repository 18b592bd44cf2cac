//! Per-iteration training record.

use serde::Serialize;

/// What one training iteration produced, besides updated weights.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    /// Value of the ensemble's counter after this iteration
    pub iteration: u64,
    /// One entry per discriminator; `None` when it was skipped
    pub discriminator_losses: Vec<Option<f32>>,
    /// Mean over discriminators that trained
    pub discriminator_loss: Option<f32>,
    /// Adversarial loss of each generator
    pub generator_losses: Vec<f32>,
    pub generator_loss: f32,
    /// Mean auxiliary classifier loss, for families with a classifier
    pub classifier_loss: Option<f32>,
    /// Iteration tensors still alive once the step returned
    pub live_tensors: usize,
    /// Most iteration tensors alive at once during the step
    pub peak_tensors: usize,
}

fn mean(values: impl IntoIterator<Item = f32>) -> Option<f32> {
    let (sum, count) = values.into_iter().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f32)
}

impl StepRecord {
    pub(crate) fn new(
        iteration: u64,
        discriminator_losses: Vec<Option<f32>>,
        generator_losses: Vec<f32>,
        classifier_losses: &[f32],
    ) -> Self {
        Self {
            iteration,
            discriminator_loss: mean(discriminator_losses.iter().flatten().copied()),
            discriminator_losses,
            generator_loss: mean(generator_losses.iter().copied()).unwrap_or(f32::NAN),
            generator_losses,
            classifier_loss: mean(classifier_losses.iter().copied()),
            live_tensors: 0,
            peak_tensors: 0,
        }
    }

    /// Discriminators skipped this iteration.
    pub fn skipped_discriminators(&self) -> usize {
        self.discriminator_losses.iter().filter(|l| l.is_none()).count()
    }

    /// Every reported loss is a finite number.
    pub fn is_finite(&self) -> bool {
        self.discriminator_losses.iter().flatten().all(|l| l.is_finite())
            && self.generator_losses.iter().all(|l| l.is_finite())
            && self.classifier_loss.map_or(true, f32::is_finite)
    }

    /// Losses under their plot series names.
    ///
    /// Aggregates always come first; per-member series follow when there is
    /// more than one generator or discriminator.
    pub fn loss_samples(&self) -> Vec<(String, f32)> {
        let mut samples = Vec::new();
        if let Some(d) = self.discriminator_loss {
            samples.push(("discriminator loss".to_string(), d));
        }
        samples.push(("generator loss".to_string(), self.generator_loss));
        if let Some(c) = self.classifier_loss {
            samples.push(("classifier loss".to_string(), c));
        }
        if self.discriminator_losses.len() > 1 {
            for (i, loss) in self.discriminator_losses.iter().enumerate() {
                if let Some(loss) = loss {
                    samples.push((format!("discriminator {i} loss"), *loss));
                }
            }
        }
        if self.generator_losses.len() > 1 {
            for (i, loss) in self.generator_losses.iter().enumerate() {
                samples.push((format!("generator {i} loss"), *loss));
            }
        }
        samples
    }
}
