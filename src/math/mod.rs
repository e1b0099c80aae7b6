/// Linear algebra and coordinate-space primitives.

pub mod matrix;
pub mod range;
pub mod screen;
pub mod utils;
pub mod vector;

pub use matrix::Matrix;
pub use range::{Range2D, Range3D};
pub use screen::{ScreenRangeConverter, ScreenRangeWithDataFocusArea};
pub use vector::Vector;
