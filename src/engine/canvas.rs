/// Host drawing surface abstraction.
///
/// The core never touches a raster directly: it calls a [`Canvas2D`] with
/// world coordinates and the host converts and paints. Implementations are
/// assumed single-threaded, so background job output must be marshalled back
/// to the owning thread before it reaches a canvas.

use crate::engine::types::{Color, DrawCommand};
use crate::math::utils::{are_colinear, solve_texture_affine};
use crate::math::Vector;

/// Host-owned image used as a texture source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureRef {
    pub id: u32,
    pub width: f64,
    pub height: f64,
}

/// Quad corner: a screen position and its texture position as a fraction of the image size.
#[derive(Clone, Debug, PartialEq)]
pub struct TexturedVertex {
    pub vertex: Vector,
    pub texture_percentage: (f64, f64),
}

pub trait Canvas2D {
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: &Color);
    fn draw_point(&mut self, x: f64, y: f64, color: &Color);
    fn draw_circle(&mut self, x: f64, y: f64, radius: f64, color: &Color);
    /// Clip to the quad outline and paint `image` through `transform`
    /// (`m11, m12, m21, m22, dx, dy`, canvas `setTransform` order).
    fn draw_clipped_textured_quad(&mut self, image: &TextureRef, quad: &[TexturedVertex; 4], transform: [f64; 6]);
    fn erase(&mut self);
    fn fill_background(&mut self, color: &Color);
    fn raster_size(&self) -> (u32, u32);
}

// ─── Helpers over any canvas ─────────────────────────────────────

/// Draw a line, falling back to a point when both ends coincide.
pub fn draw_segment<C: Canvas2D + ?Sized>(canvas: &mut C, x1: f64, y1: f64, x2: f64, y2: f64, color: &Color) {
    if x1 == x2 && y1 == y2 {
        canvas.draw_point(x1, y1, color);
    } else {
        canvas.draw_line(x1, y1, x2, y2, color);
    }
}

pub fn draw_triangle_outline<C: Canvas2D + ?Sized>(
    canvas: &mut C,
    (x1, y1): (f64, f64),
    (x2, y2): (f64, f64),
    (x3, y3): (f64, f64),
    color: &Color,
) {
    draw_segment(canvas, x1, y1, x2, y2, color);
    draw_segment(canvas, x2, y2, x3, y3, color);
    draw_segment(canvas, x3, y3, x1, y1, color);
}

/// True when the triangle has zero area and should be drawn as an outline.
pub fn is_degenerate_triangle(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> bool {
    are_colinear(a.0, a.1, b.0, b.1, c.0, c.1)
}

/// Solve the texture transform for `quad` and paint it.
///
/// The first three corners determine the affine map. A degenerate texture
/// triangle draws nothing and returns `false`.
pub fn draw_textured_quad<C: Canvas2D + ?Sized>(canvas: &mut C, image: &TextureRef, quad: &[TexturedVertex; 4]) -> bool {
    let screen = [0, 1, 2].map(|i| (quad[i].vertex.x(), quad[i].vertex.y()));
    let texture = [0, 1, 2].map(|i| {
        let (pu, pv) = quad[i].texture_percentage;
        (pu * image.width, pv * image.height)
    });
    match solve_texture_affine(screen, texture) {
        Some(transform) => {
            canvas.draw_clipped_textured_quad(image, quad, transform);
            true
        }
        None => {
            log::warn!("skipping textured quad {}: degenerate texture coordinates", image.id);
            false
        }
    }
}

/// Canvas that records every call as a [`DrawCommand`].
///
/// Used by the wasm binding to hand a frame to JavaScript, and by tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingCanvas {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<DrawCommand>,
    pub background: Option<Color>,
    pub erase_count: u32,
    pub textured_quads: Vec<(u32, [f64; 6])>,
}

impl RecordingCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, ..Default::default() }
    }

    /// Remove and return everything recorded so far.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Canvas2D for RecordingCanvas {
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: &Color) {
        self.commands.push(DrawCommand::Line { x1, y1, x2, y2, color: color.clone() });
    }

    fn draw_point(&mut self, x: f64, y: f64, color: &Color) {
        self.commands.push(DrawCommand::Point { x, y, color: color.clone() });
    }

    fn draw_circle(&mut self, x: f64, y: f64, radius: f64, color: &Color) {
        self.commands.push(DrawCommand::Circle { x, y, radius, color: color.clone() });
    }

    fn draw_clipped_textured_quad(&mut self, image: &TextureRef, _quad: &[TexturedVertex; 4], transform: [f64; 6]) {
        self.textured_quads.push((image.id, transform));
    }

    fn erase(&mut self) {
        self.erase_count += 1;
        self.commands.clear();
    }

    fn fill_background(&mut self, color: &Color) {
        self.background = Some(color.clone());
    }

    fn raster_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_segment_is_point() {
        let mut canvas = RecordingCanvas::new(10, 10);
        let red = Color::new("red");
        draw_segment(&mut canvas, 1.0, 2.0, 1.0, 2.0, &red);
        draw_segment(&mut canvas, 1.0, 2.0, 3.0, 4.0, &red);
        assert_eq!(
            canvas.commands,
            vec![
                DrawCommand::Point { x: 1.0, y: 2.0, color: red.clone() },
                DrawCommand::Line { x1: 1.0, y1: 2.0, x2: 3.0, y2: 4.0, color: red },
            ]
        );
    }

    #[test]
    fn test_triangle_outline_three_lines() {
        let mut canvas = RecordingCanvas::new(10, 10);
        draw_triangle_outline(&mut canvas, (0.0, 0.0), (1.0, 0.0), (0.0, 1.0), &Color::white());
        assert_eq!(canvas.commands.len(), 3);
        assert!(!is_degenerate_triangle((0.0, 0.0), (1.0, 0.0), (0.0, 1.0)));
        assert!(is_degenerate_triangle((0.0, 0.0), (1.0, 1.0), (2.0, 2.0)));
    }

    #[test]
    fn test_textured_quad_transform() {
        let mut canvas = RecordingCanvas::new(100, 100);
        let image = TextureRef { id: 3, width: 64.0, height: 32.0 };
        let quad = [
            TexturedVertex { vertex: Vector::from_xy(10.0, 10.0), texture_percentage: (0.0, 0.0) },
            TexturedVertex { vertex: Vector::from_xy(74.0, 10.0), texture_percentage: (1.0, 0.0) },
            TexturedVertex { vertex: Vector::from_xy(10.0, 42.0), texture_percentage: (0.0, 1.0) },
            TexturedVertex { vertex: Vector::from_xy(74.0, 42.0), texture_percentage: (1.0, 1.0) },
        ];
        assert!(draw_textured_quad(&mut canvas, &image, &quad));
        let (id, [m11, m12, m21, m22, dx, dy]) = canvas.textured_quads[0];
        assert_eq!(id, 3);
        // pure translation by (10, 10)
        assert!((m11 - 1.0).abs() < 1e-12 && m12.abs() < 1e-12);
        assert!(m21.abs() < 1e-12 && (m22 - 1.0).abs() < 1e-12);
        assert!((dx - 10.0).abs() < 1e-12 && (dy - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_erase_clears_and_counts() {
        let mut canvas = RecordingCanvas::new(4, 4);
        canvas.draw_point(0.0, 0.0, &Color::black());
        canvas.fill_background(&Color::new("navy"));
        canvas.erase();
        assert!(canvas.commands.is_empty());
        assert_eq!(canvas.erase_count, 1);
        assert_eq!(canvas.background, Some(Color::new("navy")));
        assert_eq!(canvas.raster_size(), (4, 4));
    }
}
