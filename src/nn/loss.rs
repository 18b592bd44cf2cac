//! Cross-entropy losses over probability outputs.
//!
//! Both losses take the network's *activated* output (sigmoid or softmax
//! probabilities) and return the batch-mean loss together with its gradient
//! w.r.t. those probabilities. Probabilities are clipped to
//! `[LOSS_EPSILON, 1 - LOSS_EPSILON]` before taking logs.

use ndarray::{Array2, Zip};

use crate::{Error, Result};

/// Clipping bound for probabilities inside the logarithm.
pub const LOSS_EPSILON: f32 = 1e-7;

/// A loss over a batch of predictions.
pub trait LossFn {
    /// Mean loss and its gradient w.r.t. `predictions`.
    fn evaluate(&self, predictions: &Array2<f32>, targets: &Array2<f32>) -> Result<(f32, Array2<f32>)>;

    fn name(&self) -> &'static str;
}

fn check_shapes(name: &'static str, predictions: &Array2<f32>, targets: &Array2<f32>) -> Result<()> {
    if predictions.shape() != targets.shape() {
        return Err(Error::shape(name, targets.shape(), predictions.shape()));
    }
    Ok(())
}

fn clip(p: f32) -> f32 {
    p.clamp(LOSS_EPSILON, 1.0 - LOSS_EPSILON)
}

/// Binary cross-entropy over a single sigmoid column (or several independent ones).
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCrossEntropy;

impl LossFn for BinaryCrossEntropy {
    fn evaluate(&self, predictions: &Array2<f32>, targets: &Array2<f32>) -> Result<(f32, Array2<f32>)> {
        check_shapes(self.name(), predictions, targets)?;
        let n = predictions.len().max(1) as f32;
        let total = Zip::from(predictions).and(targets).fold(0.0f32, |acc, &p, &t| {
            let p = clip(p);
            acc - (t * p.ln() + (1.0 - t) * (1.0 - p).ln())
        });
        let grad = Zip::from(predictions).and(targets).map_collect(|&p, &t| {
            let p = clip(p);
            (p - t) / (p * (1.0 - p)) / n
        });
        Ok((total / n, grad))
    }

    fn name(&self) -> &'static str {
        "binary_cross_entropy"
    }
}

/// Categorical cross-entropy against one-hot (or soft) target rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoricalCrossEntropy;

impl LossFn for CategoricalCrossEntropy {
    fn evaluate(&self, predictions: &Array2<f32>, targets: &Array2<f32>) -> Result<(f32, Array2<f32>)> {
        check_shapes(self.name(), predictions, targets)?;
        let rows = predictions.nrows().max(1) as f32;
        let total = Zip::from(predictions)
            .and(targets)
            .fold(0.0f32, |acc, &p, &t| if t == 0.0 { acc } else { acc - t * clip(p).ln() });
        let grad = Zip::from(predictions).and(targets).map_collect(|&p, &t| -t / clip(p) / rows);
        Ok((total / rows, grad))
    }

    fn name(&self) -> &'static str {
        "categorical_cross_entropy"
    }
}
