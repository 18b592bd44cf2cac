//! The shared, append-only collection of painted points.

use std::sync::{Arc, PoisonError, RwLock};

use rand::Rng;

use super::Point;
use crate::{Error, Result};

/// Cloneable handle onto the session's painted points.
///
/// Every clone sees the same underlying sequence. Appends only take a short
/// write lock, so the input side never waits on a training iteration; the
/// sampler copies values out and never hands out references.
#[derive(Debug, Clone, Default)]
pub struct SampleSource {
    points: Arc<RwLock<Vec<Point>>>,
}

impl SampleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source pre-filled with points.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        Self { points: Arc::new(RwLock::new(points.into_iter().collect())) }
    }

    pub fn append(&self, point: Point) {
        self.points.write().unwrap_or_else(PoisonError::into_inner).push(point);
    }

    pub fn extend(&self, points: impl IntoIterator<Item = Point>) {
        self.points.write().unwrap_or_else(PoisonError::into_inner).extend(points);
    }

    pub fn len(&self) -> usize {
        self.points.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every point currently in the source.
    pub fn snapshot(&self) -> Vec<Point> {
        self.points.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Drop every point. The only way the source ever shrinks.
    pub fn clear(&self) {
        self.points.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Draw `n` points uniformly at random, with replacement.
    ///
    /// Each draw is an independent index into the source as it was when the
    /// read lock was taken; later appends do not affect a batch in flight.
    pub fn sample_batch<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<Point>> {
        let points = self.points.read().unwrap_or_else(PoisonError::into_inner);
        if points.is_empty() {
            return Err(Error::EmptySource);
        }
        Ok((0..n).map(|_| points[rng.random_range(0..points.len())]).collect())
    }

    /// Whether two handles share the same storage.
    pub fn same_source(&self, other: &SampleSource) -> bool {
        Arc::ptr_eq(&self.points, &other.points)
    }
}
