use ndarray::Array2;
use rand::Rng;
use rand_distr::StandardNormal;

/// Glorot (Xavier) normal initialisation: `N(0, 2 / (fan_in + fan_out))`.
pub fn glorot_normal<R: Rng + ?Sized>(fan_in: usize, fan_out: usize, rng: &mut R) -> Array2<f32> {
    let std = (2.0 / (fan_in + fan_out).max(1) as f32).sqrt();
    Array2::from_shape_simple_fn((fan_in, fan_out), || {
        let z: f32 = rng.sample(StandardNormal);
        z * std
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_shape() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(glorot_normal(3, 7, &mut rng).shape(), &[3, 7]);
    }

    #[test]
    fn test_variance_scales_with_fans() {
        let mut rng = StdRng::seed_from_u64(1);
        let w = glorot_normal(100, 100, &mut rng);
        let var = w.mapv(|v| v * v).mean().unwrap();
        assert!((var - 0.01).abs() < 0.002, "variance {var}");
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let a = glorot_normal(4, 4, &mut StdRng::seed_from_u64(9));
        let b = glorot_normal(4, 4, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
