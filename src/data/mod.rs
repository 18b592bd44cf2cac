//! Painted training data: points, the shared sample source and the brush.

mod brush;
mod point;
mod source;

pub use brush::{Brush, Canvas};
pub use point::Point;
pub use source::SampleSource;
