//! Spray-can brush used to paint training points.
//!
//! A stroke drops `points_per_stroke` samples around the pointer, each offset
//! by a 2-D Gaussian with `std = radius / 3`, truncated at three standard
//! deviations so nothing lands outside the drawn circle.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Point;

/// Pixel surface the brush paints on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Map a pixel position into normalised space, centred on the origin.
    pub fn normalize(&self, pixel: Point) -> Point {
        Point::new(pixel.x / self.width - 0.5, pixel.y / self.height - 0.5)
    }

    /// Inverse of [`Canvas::normalize`].
    pub fn to_pixel(&self, point: Point) -> Point {
        Point::new((point.x + 0.5) * self.width, (point.y + 0.5) * self.height)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(400.0, 400.0)
    }
}

/// Brush settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    /// Radius of the drawn circle, in the units of the surface painted on
    pub radius: f32,
    /// Points dropped per stroke
    pub points_per_stroke: usize,
}

impl Default for Brush {
    fn default() -> Self {
        Self { radius: 20.0, points_per_stroke: 50 }
    }
}

impl Brush {
    pub fn new(radius: f32, points_per_stroke: usize) -> Self {
        Self { radius, points_per_stroke }
    }

    /// Spray one stroke centred on `center`.
    pub fn stroke<R: Rng + ?Sized>(&self, center: Point, rng: &mut R) -> Vec<Point> {
        let std_dev = self.radius / 3.0;
        (0..self.points_per_stroke)
            .map(|_| {
                let (dx, dy) = truncated_gaussian_pair(rng);
                Point::new(center.x + std_dev * dx, center.y + std_dev * dy)
            })
            .collect()
    }

    /// Spray a stroke at a pixel position and return normalised points.
    pub fn stroke_on<R: Rng + ?Sized>(&self, canvas: &Canvas, pixel: Point, rng: &mut R) -> Vec<Point> {
        self.stroke(pixel, rng).into_iter().map(|p| canvas.normalize(p)).collect()
    }
}

/// Two independent standard normals (Marsaglia polar method), clamped to ±3.
fn truncated_gaussian_pair<R: Rng + ?Sized>(rng: &mut R) -> (f32, f32) {
    let (u, v, s) = loop {
        let u = rng.random::<f32>() * 2.0 - 1.0;
        let v = rng.random::<f32>() * 2.0 - 1.0;
        let s = u * u + v * v;
        if s > 0.0 && s < 1.0 {
            break (u, v, s);
        }
    };
    let mul = (-2.0 * s.ln() / s).sqrt();
    ((u * mul).clamp(-3.0, 3.0), (v * mul).clamp(-3.0, 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_canvas_normalize_centre() {
        let canvas = Canvas::new(400.0, 200.0);
        let p = canvas.normalize(Point::new(200.0, 100.0));
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(p.y, 0.0);
    }

    #[test]
    fn test_canvas_round_trip() {
        let canvas = Canvas::default();
        let p = Point::new(123.0, 77.0);
        let back = canvas.to_pixel(canvas.normalize(p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-3);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-3);
    }

    #[test]
    fn test_stroke_count() {
        let brush = Brush::new(10.0, 37);
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(brush.stroke(Point::default(), &mut rng).len(), 37);
    }

    #[test]
    fn test_stroke_is_centred() {
        let brush = Brush::new(0.3, 2000);
        let mut rng = StdRng::seed_from_u64(9);
        let points = brush.stroke(Point::new(0.2, -0.4), &mut rng);
        let mean_x = points.iter().map(|p| p.x).sum::<f32>() / points.len() as f32;
        let mean_y = points.iter().map(|p| p.y).sum::<f32>() / points.len() as f32;
        assert_relative_eq!(mean_x, 0.2, epsilon = 0.01);
        assert_relative_eq!(mean_y, -0.4, epsilon = 0.01);
    }

    #[test]
    fn test_stroke_on_canvas_is_normalised() {
        let canvas = Canvas::new(400.0, 400.0);
        let brush = Brush::new(20.0, 100);
        let mut rng = StdRng::seed_from_u64(2);
        for p in brush.stroke_on(&canvas, Point::new(200.0, 200.0), &mut rng) {
            assert!(p.x.abs() <= 0.051 && p.y.abs() <= 0.051, "{p:?}");
        }
    }

    proptest! {
        #[test]
        fn prop_stroke_stays_within_radius_box(
            radius in 0.01f32..50.0,
            seed in any::<u64>(),
        ) {
            let brush = Brush::new(radius, 64);
            let mut rng = StdRng::seed_from_u64(seed);
            for p in brush.stroke(Point::default(), &mut rng) {
                prop_assert!(p.x.abs() <= radius * 1.0001);
                prop_assert!(p.y.abs() <= radius * 1.0001);
            }
        }
    }
}
