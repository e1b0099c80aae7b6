/// Plottable functions: a curve, its first or second derivative, or its running integral.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::expr::Expression;
use super::integral::IntegralEstimator;
use super::tracer::{CurveTracer, Segment};
use super::{calculable, derivative1, derivative2, DifferentiableFunction, DEFAULT_DELTA};
use crate::engine::canvas::{draw_segment, Canvas2D};
use crate::engine::types::Color;
use crate::error::Result;
use crate::math::Range2D;

/// Step used by the running integral; coarser than the derivative step to keep redraws cheap.
pub const DEFAULT_INTEGRAL_DELTA: f64 = 1e-2;

/// Default spacing between traced samples, in world units.
pub const DEFAULT_X_INCREMENT: f64 = 0.1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DrawableKind {
    Curve,
    Derivative1 { delta: f64 },
    Derivative2 { delta: f64 },
    /// `F(x) = integral of f from lower_bound to x`, signed, so `F` is negative
    /// left of a bound where `f > 0`. No bound means the left edge of the view.
    #[serde(rename_all = "camelCase")]
    Integral { delta: f64, lower_bound: Option<f64> },
}

impl DrawableKind {
    pub fn derivative1() -> Self {
        Self::Derivative1 { delta: DEFAULT_DELTA }
    }

    pub fn derivative2() -> Self {
        Self::Derivative2 { delta: DEFAULT_DELTA }
    }

    pub fn integral() -> Self {
        Self::Integral { delta: DEFAULT_INTEGRAL_DELTA, lower_bound: None }
    }
}

/// One function plotted in one colour. All variants share the same evaluator.
#[derive(Clone)]
pub struct Drawable {
    pub kind: DrawableKind,
    pub function: Arc<dyn DifferentiableFunction>,
    pub color: Color,
    pub x_increment: f64,
}

impl std::fmt::Debug for Drawable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drawable")
            .field("kind", &self.kind)
            .field("color", &self.color)
            .field("x_increment", &self.x_increment)
            .finish_non_exhaustive()
    }
}

impl Drawable {
    pub fn new(kind: DrawableKind, function: Arc<dyn DifferentiableFunction>, color: Color) -> Self {
        Self { kind, function, color, x_increment: DEFAULT_X_INCREMENT }
    }

    /// Parse `source` with the sandboxed expression language.
    pub fn from_expression(source: &str, kind: DrawableKind, color: Color) -> Result<Self> {
        let expression = Expression::parse(source)?;
        Ok(Self::new(kind, Arc::new(expression), color))
    }

    pub fn with_x_increment(mut self, x_increment: f64) -> Self {
        self.x_increment = x_increment;
        self
    }

    /// Value of this drawable at `x`; `view_x_min` anchors an unbounded integral.
    pub fn evaluate_at(&self, x: f64, view_x_min: f64) -> Option<f64> {
        let f = self.function.as_ref();
        match self.kind {
            DrawableKind::Curve => calculable(f, x),
            DrawableKind::Derivative1 { delta } => derivative1(f, x, delta),
            DrawableKind::Derivative2 { delta } => derivative2(f, x, delta),
            DrawableKind::Integral { delta, lower_bound } => {
                let a = lower_bound.unwrap_or(view_x_min);
                let estimator = IntegralEstimator::new(delta);
                // left of the bound: F(x) = -integral from x to a
                let value = if x < a {
                    -estimator.estimate(f, x, a).simpson_sum
                } else {
                    estimator.estimate(f, a, x).simpson_sum
                };
                Some(value).filter(|v| v.is_finite())
            }
        }
    }

    /// Segments across the x extent of `range`.
    pub fn trace(&self, range: &Range2D) -> Vec<Segment> {
        let bound = Bound { drawable: self, view_x_min: range.x_min };
        CurveTracer::new(&bound, range.x_min, range.x_max, self.x_increment).segments().collect()
    }

    /// Trace and draw onto `canvas`; returns the number of primitives drawn.
    pub fn draw<C: Canvas2D + ?Sized>(&self, canvas: &mut C, range: &Range2D) -> usize {
        let bound = Bound { drawable: self, view_x_min: range.x_min };
        let tracer = CurveTracer::new(&bound, range.x_min, range.x_max, self.x_increment);
        let mut drawn = 0;
        for segment in tracer.segments() {
            match segment {
                Segment::Line { x1, y1, x2, y2 } => draw_segment(canvas, x1, y1, x2, y2, &self.color),
                Segment::Point { x, y } => canvas.draw_point(x, y, &self.color),
            }
            drawn += 1;
        }
        log::debug!("drew {:?} with {drawn} primitives", self.kind);
        drawn
    }
}

/// A drawable pinned to a view so it can be traced as a plain function.
struct Bound<'a> {
    drawable: &'a Drawable,
    view_x_min: f64,
}

impl DifferentiableFunction for Bound<'_> {
    fn evaluate(&self, x: f64) -> Option<f64> {
        self.drawable.evaluate_at(x, self.view_x_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::canvas::RecordingCanvas;
    use crate::engine::types::DrawCommand;

    #[test]
    fn test_curve_from_expression() {
        let d = Drawable::from_expression("x^2", DrawableKind::Curve, Color::white()).unwrap();
        assert_eq!(d.evaluate_at(3.0, -10.0), Some(9.0));
        let segs = d.trace(&Range2D::standard());
        assert_eq!(segs.len(), 200);
    }

    #[test]
    fn test_derivative_variants() {
        let d1 = Drawable::from_expression("x^2", DrawableKind::derivative1(), Color::white()).unwrap();
        let d2 = Drawable::from_expression("x^2", DrawableKind::derivative2(), Color::white()).unwrap();
        assert!((d1.evaluate_at(4.0, 0.0).unwrap() - 8.0).abs() < 1e-6);
        assert!((d2.evaluate_at(4.0, 0.0).unwrap() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_integral_variant() {
        let bounded = Drawable::new(
            DrawableKind::Integral { delta: 1e-3, lower_bound: Some(0.0) },
            Arc::new(|x: f64| 2.0 * x),
            Color::white(),
        );
        assert!((bounded.evaluate_at(3.0, -10.0).unwrap() - 9.0).abs() < 1e-6);

        let from_view = Drawable::new(DrawableKind::integral(), Arc::new(|_x: f64| 1.0), Color::white());
        assert!((from_view.evaluate_at(1.0, -2.0).unwrap() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_integral_left_of_lower_bound_is_signed() {
        let from_zero = Drawable::new(
            DrawableKind::Integral { delta: 1e-3, lower_bound: Some(0.0) },
            Arc::new(|_x: f64| 1.0),
            Color::white(),
        );
        assert!((from_zero.evaluate_at(-2.0, -10.0).unwrap() + 2.0).abs() < 1e-6);
        assert!((from_zero.evaluate_at(2.0, -10.0).unwrap() - 2.0).abs() < 1e-6);

        // the traced left half is not flat
        let segs = from_zero.with_x_increment(1.0).trace(&Range2D::new(-4.0, 0.0, -5.0, 5.0));
        let Segment::Line { y1, .. } = segs[0] else {
            panic!("expected a line");
        };
        assert!((y1 + 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_draw_gap_on_canvas() {
        let d = Drawable::from_expression("1/x", DrawableKind::Curve, Color::new("#ff0000"))
            .unwrap()
            .with_x_increment(0.25);
        let mut canvas = RecordingCanvas::new(100, 100);
        let drawn = d.draw(&mut canvas, &Range2D::new(-1.0, 1.0, -1.0, 1.0));
        assert_eq!(drawn, 7);
        assert!(canvas.commands.contains(&DrawCommand::Point { x: -0.25, y: -4.0, color: Color::new("#ff0000") }));
    }

    #[test]
    fn test_kind_json() {
        let json = serde_json::to_string(&DrawableKind::integral()).unwrap();
        assert_eq!(json, r#"{"kind":"integral","delta":0.01,"lowerBound":null}"#);
        let back: DrawableKind = serde_json::from_str(r#"{"kind":"derivative1","delta":0.001}"#).unwrap();
        assert_eq!(back, DrawableKind::derivative1());
        let curve: DrawableKind = serde_json::from_str(r#"{"kind":"curve"}"#).unwrap();
        assert_eq!(curve, DrawableKind::Curve);
    }
}
