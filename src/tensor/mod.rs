//! Counted iteration tensors.
//!
//! Everything the step engine allocates for one iteration (real batch, noise,
//! codes, fakes, labels) is created through a [`TensorPool`]. The pool counts
//! live tensors and remembers the high-water mark, which is how the engine
//! proves that an iteration releases everything it allocated. Model weights
//! and the visual buffers are long-lived and are not counted.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndarray::{concatenate, Array2, ArrayView2, Axis};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::data::Point;
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Counters {
    live: AtomicUsize,
    peak: AtomicUsize,
}

/// Allocator and accountant for iteration-scoped tensors.
#[derive(Debug, Clone, Default)]
pub struct TensorPool {
    counters: Arc<Counters>,
}

impl TensorPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tensors currently alive.
    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::Acquire)
    }

    /// Highest live count since the last [`TensorPool::reset_peak`].
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::Acquire)
    }

    /// Start a new high-water window at the current live count.
    pub fn reset_peak(&self) {
        self.counters.peak.store(self.live(), Ordering::Release);
    }

    /// Take ownership of an array and count it.
    pub fn track(&self, data: Array2<f32>) -> Tensor {
        let live = self.counters.live.fetch_add(1, Ordering::AcqRel) + 1;
        self.counters.peak.fetch_max(live, Ordering::AcqRel);
        Tensor { data, counters: Arc::clone(&self.counters) }
    }

    pub fn zeros(&self, rows: usize, cols: usize) -> Tensor {
        self.track(Array2::zeros((rows, cols)))
    }

    pub fn full(&self, rows: usize, cols: usize, value: f32) -> Tensor {
        self.track(Array2::from_elem((rows, cols), value))
    }

    /// `rows × cols` standard normal draws.
    pub fn random_normal<R: Rng + ?Sized>(&self, rows: usize, cols: usize, rng: &mut R) -> Tensor {
        self.track(Array2::from_shape_simple_fn((rows, cols), || rng.sample(StandardNormal)))
    }

    /// One row per index with a single 1.0 in column `index`.
    pub fn one_hot(&self, indices: &[usize], depth: usize) -> Result<Tensor> {
        let mut data = Array2::zeros((indices.len(), depth));
        for (row, &index) in indices.iter().enumerate() {
            if index >= depth {
                return Err(Error::shape("one-hot index", &[depth], &[index]));
            }
            data[[row, index]] = 1.0;
        }
        Ok(self.track(data))
    }

    /// A `n × 2` tensor of point coordinates.
    pub fn points(&self, points: &[Point]) -> Tensor {
        self.track(Array2::from_shape_fn((points.len(), 2), |(i, j)| {
            if j == 0 {
                points[i].x
            } else {
                points[i].y
            }
        }))
    }

    /// Stack tensors vertically. All parts must have the same width.
    pub fn concat_rows(&self, parts: &[ArrayView2<'_, f32>]) -> Result<Tensor> {
        let width = parts.first().map_or(0, |p| p.ncols());
        if let Some(bad) = parts.iter().find(|p| p.ncols() != width) {
            return Err(Error::shape("row concat", &[width], &[bad.ncols()]));
        }
        let data = if parts.is_empty() {
            Array2::zeros((0, 0))
        } else {
            concatenate(Axis(0), parts).map_err(|_| Error::shape("row concat", &[width], &[]))?
        };
        Ok(self.track(data))
    }

    /// Select rows of `source` by index, in the given order.
    pub fn gather_rows(&self, source: &Array2<f32>, rows: &[usize]) -> Tensor {
        self.track(source.select(Axis(0), rows))
    }
}

/// An iteration-scoped array. Dropping it releases its slot in the pool.
#[derive(Debug)]
pub struct Tensor {
    data: Array2<f32>,
    counters: Arc<Counters>,
}

impl Tensor {
    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Release the slot and keep the data as a plain array.
    pub fn into_array(mut self) -> Array2<f32> {
        std::mem::replace(&mut self.data, Array2::zeros((0, 0)))
    }
}

impl Deref for Tensor {
    type Target = Array2<f32>;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl Drop for Tensor {
    fn drop(&mut self) {
        self.counters.live.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Rows of an `n × 2` array as points.
pub fn point_rows(data: &Array2<f32>) -> impl Iterator<Item = Point> + '_ {
    data.rows().into_iter().map(|row| Point::new(row[0], row.get(1).copied().unwrap_or(0.0)))
}

/// Convert an `n × 2` array back into points.
pub fn to_points(data: &Array2<f32>) -> Vec<Point> {
    point_rows(data).collect()
}

/// Row-wise arg-max. Ties resolve to the lowest index.
pub fn argmax_rows(data: &Array2<f32>) -> Vec<usize> {
    data.rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
                .0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_drop_releases_slot() {
        let pool = TensorPool::new();
        {
            let _a = pool.zeros(2, 2);
            let _b = pool.full(1, 3, 1.0);
            assert_eq!(pool.live(), 2);
        }
        assert_eq!(pool.live(), 0);
        assert_eq!(pool.peak(), 2);
    }

    #[test]
    fn test_into_array_releases_slot() {
        let pool = TensorPool::new();
        let t = pool.full(2, 2, 3.0);
        let arr = t.into_array();
        assert_eq!(pool.live(), 0);
        assert_eq!(arr, Array2::from_elem((2, 2), 3.0));
    }

    #[test]
    fn test_reset_peak() {
        let pool = TensorPool::new();
        let keep = pool.zeros(1, 1);
        drop(pool.zeros(1, 1));
        assert_eq!(pool.peak(), 2);
        pool.reset_peak();
        assert_eq!(pool.peak(), 1);
        drop(keep);
    }

    #[test]
    fn test_one_hot() {
        let pool = TensorPool::new();
        let t = pool.one_hot(&[2, 0], 3).unwrap();
        assert_eq!(*t.data(), array![[0.0, 0.0, 1.0], [1.0, 0.0, 0.0]]);
        assert!(pool.one_hot(&[3], 3).is_err());
    }

    #[test]
    fn test_concat_rows() {
        let pool = TensorPool::new();
        let a = array![[1.0, 2.0]];
        let b = array![[3.0, 4.0], [5.0, 6.0]];
        let t = pool.concat_rows(&[a.view(), b.view()]).unwrap();
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t[[2, 1]], 6.0);
        let c = array![[1.0]];
        assert!(pool.concat_rows(&[a.view(), c.view()]).is_err());
    }

    #[test]
    fn test_random_normal_shape_and_spread() {
        let pool = TensorPool::new();
        let mut rng = StdRng::seed_from_u64(42);
        let t = pool.random_normal(200, 10, &mut rng);
        assert_eq!(t.shape(), &[200, 10]);
        let mean = t.mean().unwrap();
        assert!(mean.abs() < 0.1);
    }

    #[test]
    fn test_points_round_trip() {
        let pool = TensorPool::new();
        let pts = vec![Point::new(0.1, 0.2), Point::new(-0.3, 0.4)];
        let t = pool.points(&pts);
        assert_eq!(to_points(t.data()), pts);
    }

    #[test]
    fn test_gather_rows() {
        let pool = TensorPool::new();
        let src = array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
        let t = pool.gather_rows(&src, &[2, 0]);
        assert_eq!(*t.data(), array![[2.0, 2.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_argmax_rows() {
        let data = array![[0.1, 0.7, 0.2], [0.5, 0.5, 0.0], [0.0, 0.0, 0.9]];
        assert_eq!(argmax_rows(&data), vec![1, 0, 2]);
    }
}
