use ndarray::{Array2, Axis, Zip};
use serde::{Deserialize, Serialize};

/// Element-wise or row-wise output non-linearity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Linear,
    Relu,
    Sigmoid,
    /// Row-wise softmax
    Softmax,
}

impl Activation {
    /// Apply in place to pre-activations.
    pub fn apply(self, z: &mut Array2<f32>) {
        match self {
            Self::Linear => {}
            Self::Relu => z.mapv_inplace(|v| v.max(0.0)),
            Self::Sigmoid => z.mapv_inplace(sigmoid),
            Self::Softmax => {
                for mut row in z.axis_iter_mut(Axis(0)) {
                    let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
                    row.mapv_inplace(|v| (v - max).exp());
                    let sum = row.sum();
                    if sum > 0.0 {
                        row.mapv_inplace(|v| v / sum);
                    }
                }
            }
        }
    }

    /// Gradient w.r.t. pre-activations, given the activated output `a`.
    pub fn backward(self, a: &Array2<f32>, grad: &Array2<f32>) -> Array2<f32> {
        match self {
            Self::Linear => grad.clone(),
            Self::Relu => {
                Zip::from(a).and(grad).map_collect(|&a, &g| if a > 0.0 { g } else { 0.0 })
            }
            Self::Sigmoid => Zip::from(a).and(grad).map_collect(|&a, &g| g * a * (1.0 - a)),
            Self::Softmax => {
                let dot = (a * grad).sum_axis(Axis(1)).insert_axis(Axis(1));
                a * &(grad - &dot)
            }
        }
    }
}

pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_relu() {
        let mut z = array![[-1.0, 0.0, 2.0]];
        Activation::Relu.apply(&mut z);
        assert_eq!(z, array![[0.0, 0.0, 2.0]]);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let mut z = array![[1.0, 2.0, 3.0], [1000.0, 1000.0, 1000.0]];
        Activation::Softmax.apply(&mut z);
        for row in z.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-6);
        }
        assert_relative_eq!(z[[1, 0]], 1.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_sigmoid_backward_matches_finite_difference() {
        let z = 0.3f32;
        let h = 1e-3;
        let numeric = (sigmoid(z + h) - sigmoid(z - h)) / (2.0 * h);
        let a = array![[sigmoid(z)]];
        let analytic = Activation::Sigmoid.backward(&a, &array![[1.0]]);
        assert_relative_eq!(analytic[[0, 0]], numeric, epsilon = 1e-3);
    }

    #[test]
    fn test_softmax_backward_matches_finite_difference() {
        let z = array![[0.2f32, -0.4, 1.1]];
        let weights = array![[0.5f32, -1.0, 2.0]];
        let objective = |z: &Array2<f32>| {
            let mut a = z.clone();
            Activation::Softmax.apply(&mut a);
            (&a * &weights).sum()
        };
        let mut a = z.clone();
        Activation::Softmax.apply(&mut a);
        let analytic = Activation::Softmax.backward(&a, &weights);
        for j in 0..3 {
            let mut up = z.clone();
            up[[0, j]] += 1e-3;
            let mut down = z.clone();
            down[[0, j]] -= 1e-3;
            let numeric = (objective(&up) - objective(&down)) / 2e-3;
            assert_relative_eq!(analytic[[0, j]], numeric, epsilon = 1e-2);
        }
    }

    #[test]
    fn test_serde_names() {
        let yaml = serde_yaml::to_string(&Activation::Softmax).unwrap();
        assert!(yaml.contains("softmax"));
    }
}
