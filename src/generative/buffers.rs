//! Per-ensemble visual buffers.

use crate::data::Point;

/// Latest samples for the scatter plot.
///
/// Overwritten in place each iteration; capacity is reused, so the buffers
/// stay at their batch-sized allocation for the life of the ensemble.
#[derive(Debug, Clone, Default)]
pub struct VisualBuffers {
    /// Last real batch
    pub real: Vec<Point>,
    /// Router's choice for each real point (empty without routing)
    pub real_routes: Vec<usize>,
    /// Last fake batch of each generator, snapshotted before any update
    pub fakes: Vec<Vec<Point>>,
    /// Sampled code of each fake (empty without sampled codes)
    pub codes: Vec<usize>,
}

impl VisualBuffers {
    pub fn new(generators: usize) -> Self {
        Self { fakes: vec![Vec::new(); generators], ..Self::default() }
    }

    pub fn write_real(&mut self, points: &[Point]) {
        overwrite(&mut self.real, points);
    }

    pub fn write_routes(&mut self, routes: &[usize]) {
        overwrite(&mut self.real_routes, routes);
    }

    pub fn write_codes(&mut self, codes: &[usize]) {
        overwrite(&mut self.codes, codes);
    }

    pub fn write_fakes(&mut self, generator: usize, points: impl IntoIterator<Item = Point>) {
        if let Some(buf) = self.fakes.get_mut(generator) {
            buf.clear();
            buf.extend(points);
        }
    }

    /// Empty every buffer, keeping one fake slot per generator.
    pub fn clear(&mut self) {
        self.real.clear();
        self.real_routes.clear();
        self.codes.clear();
        self.fakes.iter_mut().for_each(Vec::clear);
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty() && self.fakes.iter().all(Vec::is_empty)
    }

    /// Total points held.
    pub fn len(&self) -> usize {
        self.real.len() + self.fakes.iter().map(Vec::len).sum::<usize>()
    }
}

fn overwrite<T: Copy>(dst: &mut Vec<T>, src: &[T]) {
    dst.clear();
    dst.extend_from_slice(src);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_reuses_capacity() {
        let mut buffers = VisualBuffers::new(2);
        buffers.write_real(&[Point::new(0.0, 0.0); 16]);
        let cap = buffers.real.capacity();
        buffers.write_real(&[Point::new(1.0, 1.0); 16]);
        assert_eq!(buffers.real.capacity(), cap);
        assert_eq!(buffers.real[0], Point::new(1.0, 1.0));
    }

    #[test]
    fn test_fakes_ignore_unknown_generator() {
        let mut buffers = VisualBuffers::new(1);
        buffers.write_fakes(3, [Point::default()]);
        assert!(buffers.is_empty());
        buffers.write_fakes(0, [Point::default(); 4]);
        assert_eq!(buffers.len(), 4);
    }

    #[test]
    fn test_clear_keeps_slots() {
        let mut buffers = VisualBuffers::new(3);
        buffers.write_real(&[Point::default()]);
        buffers.write_codes(&[1]);
        buffers.clear();
        assert!(buffers.is_empty());
        assert!(buffers.codes.is_empty());
        assert_eq!(buffers.fakes.len(), 3);
    }
}
