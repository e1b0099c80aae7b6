/// Escape-time rendering of the Mandelbrot set.
///
/// Each pixel of the evaluation window is mapped to `c` in world space and the
/// orbit `z <- z^2 + c` is followed from `z = c` until `|z|^2` passes the
/// threshold or the iteration limit is spent.

use std::ops::ControlFlow;

use num_complex::Complex64;

use super::{Completion, FractalGenerator, FractalOutput};
use crate::engine::types::{Color, Pixel};
use crate::error::Result;
use crate::lighting::Palette;
use crate::math::ScreenRangeWithDataFocusArea;

/// Colour of points that never diverge.
pub fn interior_color() -> Color {
    Color::black()
}

/// Iteration on which the orbit of `c` escaped, or `None` if it stayed bounded.
///
/// The orbit starts at `z = c`, so the first squaring is iteration 1.
#[inline]
pub fn escape_iterations(c: Complex64, limit: u32, threshold: f64) -> Option<u32> {
    let mut z = c;
    for n in 1..limit {
        z = z * z + c;
        if z.norm_sqr() > threshold {
            return Some(n);
        }
    }
    None
}

pub struct EscapeTimeGenerator {
    pub area: ScreenRangeWithDataFocusArea,
    pub iteration_limit: u32,
    pub threshold: f64,
    pub palette: Palette,
    pub interior: Color,
}

impl EscapeTimeGenerator {
    pub fn pixel_color(&self, px: u32, py: u32) -> Color {
        let (x, y) = self.area.screen.screen_to_world(px as f64, py as f64);
        match escape_iterations(Complex64::new(x, y), self.iteration_limit, self.threshold) {
            Some(n) => self.palette.escape_color(n, self.iteration_limit),
            None => self.interior.clone(),
        }
    }
}

impl FractalGenerator for EscapeTimeGenerator {
    fn name(&self) -> &str {
        "Mandelbrot"
    }

    fn run(&mut self, emit: &mut dyn FnMut(FractalOutput) -> ControlFlow<()>) -> Result<Completion> {
        let rows = self.area.pixel_rows();
        // column by column, top to bottom
        for px in self.area.pixel_columns() {
            for py in rows.clone() {
                let color = self.pixel_color(px, py);
                if emit(FractalOutput::Pixel(Pixel { x: px, y: py, color })).is_break() {
                    return Ok(Completion::Stopped);
                }
            }
        }
        Ok(Completion::Finished)
    }
}
