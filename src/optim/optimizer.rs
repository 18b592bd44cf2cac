//! Optimizer trait

use ndarray::Array2;

use crate::Result;

/// Trait for optimization algorithms.
///
/// Parameters and gradients arrive as parallel lists in a fixed order; the
/// optimizer keys its per-parameter state on that position.
pub trait Optimizer {
    /// Apply one update. Fails without touching anything if the gradient
    /// list does not line up with the parameters.
    fn step(&mut self, params: &mut [&mut Array2<f32>], grads: &[Array2<f32>]) -> Result<()>;

    /// Forget accumulated state (moments, step count).
    fn reset(&mut self);

    fn lr(&self) -> f32;

    fn set_lr(&mut self, lr: f32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Plain gradient descent, to exercise the trait surface.
    struct Sgd {
        lr: f32,
    }

    impl Optimizer for Sgd {
        fn step(&mut self, params: &mut [&mut Array2<f32>], grads: &[Array2<f32>]) -> Result<()> {
            for (p, g) in params.iter_mut().zip(grads) {
                p.scaled_add(-self.lr, g);
            }
            Ok(())
        }

        fn reset(&mut self) {}

        fn lr(&self) -> f32 {
            self.lr
        }

        fn set_lr(&mut self, lr: f32) {
            self.lr = lr;
        }
    }

    #[test]
    fn test_trait_object_step() {
        let mut opt: Box<dyn Optimizer> = Box::new(Sgd { lr: 0.5 });
        let mut w = array![[1.0, 2.0]];
        opt.step(&mut [&mut w], &[array![[2.0, 2.0]]]).unwrap();
        assert_eq!(w, array![[0.0, 1.0]]);
        opt.set_lr(0.1);
        assert_eq!(opt.lr(), 0.1);
    }
}
