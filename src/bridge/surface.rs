//! Decision surfaces and gradient fields over a fixed grid.

use ndarray::Array2;

use super::{GradientFrame, SurfaceFrame};
use crate::data::Point;
use crate::generative::{Ensemble, Labelling};
use crate::nn::Model;
use crate::tensor::{argmax_rows, to_points};
use crate::Result;

/// Square grid of sample positions spanning [-1, 1]², x varying fastest.
#[derive(Debug, Clone)]
pub struct Grid {
    size: usize,
    positions: Array2<f32>,
}

impl Grid {
    pub fn new(size: usize) -> Self {
        let size = size.max(2);
        let step = 2.0 / (size - 1) as f32;
        let coord = |i: usize| -1.0 + step * i as f32;
        let positions = Array2::from_shape_fn((size * size, 2), |(n, axis)| {
            if axis == 0 {
                coord(n % size)
            } else {
                coord(n / size)
            }
        });
        Self { size, positions }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// `size² × 2` positions.
    pub fn positions(&self) -> &Array2<f32> {
        &self.positions
    }

    pub fn points(&self) -> Vec<Point> {
        to_points(&self.positions)
    }
}

/// Every surface and gradient field an ensemble exposes.
///
/// Binary discriminators give their "real" probability and its gradient.
/// A multi-class discriminator gives one surface per class and the gradient
/// of the real class. A classifier gives one surface per class and the
/// gradient of whichever class wins at each node.
pub fn ensemble_surfaces(
    ensemble: &Ensemble,
    grid: &Grid,
    iteration: u64,
) -> Result<(Vec<SurfaceFrame>, Vec<GradientFrame>)> {
    let x = grid.positions();
    let mut surfaces = Vec::new();
    let mut fields = Vec::new();
    let surface = |name: String, values: Vec<f32>| SurfaceFrame { name, iteration, size: grid.size(), values };
    let field = |name: &str, grad: &Array2<f32>| GradientFrame {
        name: name.to_string(),
        iteration,
        positions: grid.points(),
        vectors: to_points(grad),
    };

    match ensemble.spec().labelling {
        Labelling::Binary => {
            for disc in ensemble.discriminators() {
                let (out, grad) = disc.network().value_and_input_grad(x, |y| Array2::ones(y.raw_dim()))?;
                surfaces.push(surface(disc.name().to_string(), out.column(0).to_vec()));
                fields.push(field(disc.name(), &grad));
            }
        }
        Labelling::SourceClass { generators } => {
            for disc in ensemble.discriminators() {
                let (out, grad) = disc.network().value_and_input_grad(x, |y| {
                    let mut seed = Array2::zeros(y.raw_dim());
                    seed.column_mut(generators).fill(1.0);
                    seed
                })?;
                for class in 0..=generators {
                    let name = if class == generators {
                        format!("{} real", disc.name())
                    } else {
                        format!("{} class {class}", disc.name())
                    };
                    surfaces.push(surface(name, out.column(class).to_vec()));
                }
                fields.push(field(disc.name(), &grad));
            }
        }
    }

    if let Some(cls) = ensemble.classifier() {
        let (out, grad) = cls.network().value_and_input_grad(x, |y| {
            let mut seed = Array2::zeros(y.raw_dim());
            for (row, winner) in argmax_rows(y).into_iter().enumerate() {
                seed[[row, winner]] = 1.0;
            }
            seed
        })?;
        for class in 0..out.ncols() {
            surfaces.push(surface(format!("{} {class}", cls.name()), out.column(class).to_vec()));
        }
        fields.push(field(cls.name(), &grad));
    }

    Ok((surfaces, fields))
}
