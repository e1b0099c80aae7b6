/// Self-similar line fractals drawn synchronously by recursion.

use serde::{Deserialize, Serialize};

use crate::engine::canvas::{draw_segment, draw_triangle_outline, Canvas2D};
use crate::engine::types::Color;
use crate::math::{Range2D, Vector};

/// Sierpinski triangle: every triangle is outlined, then split at its edge midpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SierpinskiTriangle {
    pub depth_limit: u32,
    pub color: Color,
    pub seeds: [Vector; 3],
}

impl SierpinskiTriangle {
    /// Seeds at the bottom corners of `range` and the top of the y axis.
    pub fn new(range: &Range2D) -> Self {
        Self {
            depth_limit: 7,
            color: Color::new("red"),
            seeds: [
                Vector::from_xy(range.x_min, range.y_min),
                Vector::from_xy(0.0, range.y_max),
                Vector::from_xy(range.x_max, range.y_min),
            ],
        }
    }

    /// Number of triangles outlined for the current depth limit.
    pub fn triangle_count(&self) -> usize {
        (0..=self.depth_limit).map(|d| 3usize.pow(d)).sum()
    }

    /// Outline every triangle onto `canvas`; returns the triangles drawn.
    /// The background is left to the caller.
    pub fn draw<C: Canvas2D + ?Sized>(&self, canvas: &mut C) -> usize {
        let [a, b, c] = &self.seeds;
        let drawn = self.process(canvas, a, b, c, 0);
        log::debug!("sierpinski: {drawn} triangles to depth {}", self.depth_limit);
        drawn
    }

    fn process<C: Canvas2D + ?Sized>(&self, canvas: &mut C, v1: &Vector, v2: &Vector, v3: &Vector, depth: u32) -> usize {
        draw_triangle_outline(canvas, (v1.x(), v1.y()), (v2.x(), v2.y()), (v3.x(), v3.y()), &self.color);
        if depth >= self.depth_limit {
            return 1;
        }
        let m12 = v1.midpoint_with(v2);
        let m23 = v2.midpoint_with(v3);
        let m31 = v3.midpoint_with(v1);
        1 + self.process(canvas, v1, &m12, &m31, depth + 1)
            + self.process(canvas, &m12, v2, &m23, depth + 1)
            + self.process(canvas, &m31, &m23, v3, depth + 1)
    }
}

/// Branching fern built from line segments.
///
/// Each segment sprouts two side branches at `branch_point` along its length,
/// perpendicular to it and `scale / 2` of its length long, and continues from
/// the branch point to its own end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FernLine {
    pub depth_limit: u32,
    pub branch_point: f64,
    pub scale: f64,
    pub color: Color,
    pub seeds: [Vector; 2],
}

impl Default for FernLine {
    fn default() -> Self {
        Self {
            depth_limit: 5,
            branch_point: 0.4,
            scale: 0.6,
            color: Color::new("green"),
            seeds: [Vector::from_xy(0.0, -10.0), Vector::from_xy(0.0, 10.0)],
        }
    }
}

impl FernLine {
    pub fn line_count(&self) -> usize {
        (0..=self.depth_limit).map(|d| 3usize.pow(d)).sum()
    }

    pub fn draw<C: Canvas2D + ?Sized>(&self, canvas: &mut C) -> usize {
        let [a, b] = &self.seeds;
        let drawn = self.process(canvas, a, b, 0);
        log::debug!("fern line: {drawn} segments to depth {}", self.depth_limit);
        drawn
    }

    fn process<C: Canvas2D + ?Sized>(&self, canvas: &mut C, v1: &Vector, v2: &Vector, depth: u32) -> usize {
        draw_segment(canvas, v1.x(), v1.y(), v2.x(), v2.y(), &self.color);
        if depth >= self.depth_limit {
            return 1;
        }
        let length = v2.distance_to(v1);
        let direction = v2.difference_with(v1).normalized();
        let branch = v1.sum_with(&direction.scaled(self.branch_point * length));
        let arm = length * self.scale * 0.5;
        let end1 = branch.sum_with(&direction.perpendicular_clockwise().normalized().scaled(arm));
        let end2 = branch.sum_with(&direction.perpendicular_counter_clockwise().normalized().scaled(arm));

        1 + self.process(canvas, &branch, &end1, depth + 1)
            + self.process(canvas, &branch, &end2, depth + 1)
            + self.process(canvas, &branch, v2, depth + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::canvas::RecordingCanvas;
    use crate::engine::types::DrawCommand;

    #[test]
    fn test_sierpinski_counts() {
        let tri = SierpinskiTriangle::new(&Range2D::standard());
        let mut canvas = RecordingCanvas::new(100, 100);
        let drawn = tri.draw(&mut canvas);
        assert_eq!(drawn, tri.triangle_count());
        assert_eq!(drawn, 3280);
        assert_eq!(canvas.commands.len(), 3 * 3280);
        assert_eq!(canvas.background, None);
    }

    #[test]
    fn test_sierpinski_first_level() {
        let mut tri = SierpinskiTriangle::new(&Range2D::standard());
        tri.depth_limit = 1;
        let mut canvas = RecordingCanvas::new(100, 100);
        assert_eq!(tri.draw(&mut canvas), 4);
        let red = Color::new("red");
        // outer triangle first, then the corner triangle at (-10, -10)
        assert_eq!(canvas.commands[0], DrawCommand::Line { x1: -10.0, y1: -10.0, x2: 0.0, y2: 10.0, color: red.clone() });
        assert_eq!(canvas.commands[3], DrawCommand::Line { x1: -10.0, y1: -10.0, x2: -5.0, y2: 0.0, color: red });
    }

    #[test]
    fn test_fern_line_first_branches() {
        let mut fern = FernLine::default();
        fern.depth_limit = 1;
        let mut canvas = RecordingCanvas::new(100, 100);
        assert_eq!(fern.draw(&mut canvas), 4);
        let green = Color::new("green");
        // trunk of length 20 branches at y = -2 with arms of length 6
        assert_eq!(canvas.commands[1], DrawCommand::Line { x1: 0.0, y1: -2.0, x2: 6.0, y2: -2.0, color: green.clone() });
        assert_eq!(canvas.commands[2], DrawCommand::Line { x1: 0.0, y1: -2.0, x2: -6.0, y2: -2.0, color: green.clone() });
        assert_eq!(canvas.commands[3], DrawCommand::Line { x1: 0.0, y1: -2.0, x2: 0.0, y2: 10.0, color: green });
    }

    #[test]
    fn test_fern_line_default_depth() {
        let fern = FernLine::default();
        let mut canvas = RecordingCanvas::new(100, 100);
        assert_eq!(fern.draw(&mut canvas), 364);
        assert_eq!(fern.line_count(), 364);
    }
}
