/// Numerical calculus over user functions.
///
/// Functions are evaluated pointwise through [`DifferentiableFunction`].
/// A sample is "calculable" when evaluation succeeds with a finite value;
/// anything else (failure, NaN, infinity) is a gap, never an error.

pub mod drawable;
pub mod expr;
pub mod integral;
pub mod tracer;

use std::sync::Arc;

pub use drawable::{Drawable, DrawableKind};
pub use expr::Expression;
pub use integral::{CalculusResult, IntegralEstimator};
pub use tracer::{CurveTracer, Segment};

/// Default finite-difference step.
pub const DEFAULT_DELTA: f64 = 1e-3;

pub trait DifferentiableFunction: Send + Sync {
    /// `None` when the function has no value at `x`.
    fn evaluate(&self, x: f64) -> Option<f64>;
}

impl<F> DifferentiableFunction for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn evaluate(&self, x: f64) -> Option<f64> {
        Some(self(x))
    }
}

/// Evaluate and keep only finite results.
#[inline]
pub fn calculable<F: DifferentiableFunction + ?Sized>(f: &F, x: f64) -> Option<f64> {
    f.evaluate(x).filter(|v| v.is_finite())
}

/// Fourth-order central difference for f'(x).
///
/// `(8f(x+h) - 8f(x-h) + f(x-2h) - f(x+2h)) / 12h`
pub fn derivative1<F: DifferentiableFunction + ?Sized>(f: &F, x: f64, h: f64) -> Option<f64> {
    let f1 = calculable(f, x + h)?;
    let fm1 = calculable(f, x - h)?;
    let f2 = calculable(f, x + 2.0 * h)?;
    let fm2 = calculable(f, x - 2.0 * h)?;
    Some((8.0 * f1 - 8.0 * fm1 + fm2 - f2) / (12.0 * h))
}

/// Fourth-order central difference for f''(x).
///
/// `(16f(x+h) - f(x+2h) - 30f(x) + 16f(x-h) - f(x-2h)) / 12h^2`
pub fn derivative2<F: DifferentiableFunction + ?Sized>(f: &F, x: f64, h: f64) -> Option<f64> {
    let f0 = calculable(f, x)?;
    let f1 = calculable(f, x + h)?;
    let fm1 = calculable(f, x - h)?;
    let f2 = calculable(f, x + 2.0 * h)?;
    let fm2 = calculable(f, x - 2.0 * h)?;
    Some((16.0 * f1 - f2 - 30.0 * f0 + 16.0 * fm1 - fm2) / (12.0 * h * h))
}

/// f' as a function in its own right, so it can be traced or differentiated again.
#[derive(Clone)]
pub struct Derivative1 {
    pub function: Arc<dyn DifferentiableFunction>,
    pub delta: f64,
}

impl Derivative1 {
    pub fn new(function: Arc<dyn DifferentiableFunction>) -> Self {
        Self { function, delta: DEFAULT_DELTA }
    }
}

impl DifferentiableFunction for Derivative1 {
    fn evaluate(&self, x: f64) -> Option<f64> {
        derivative1(self.function.as_ref(), x, self.delta)
    }
}

/// f'' as a function in its own right.
#[derive(Clone)]
pub struct Derivative2 {
    pub function: Arc<dyn DifferentiableFunction>,
    pub delta: f64,
}

impl Derivative2 {
    pub fn new(function: Arc<dyn DifferentiableFunction>) -> Self {
        Self { function, delta: DEFAULT_DELTA }
    }
}

impl DifferentiableFunction for Derivative2 {
    fn evaluate(&self, x: f64) -> Option<f64> {
        derivative2(self.function.as_ref(), x, self.delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64) -> f64 {
        x * x
    }

    #[test]
    fn test_derivatives_of_square() {
        let mut x = -10.0;
        while x <= 10.0 {
            let d1 = derivative1(&square, x, DEFAULT_DELTA).unwrap();
            let d2 = derivative2(&square, x, DEFAULT_DELTA).unwrap();
            assert!((d1 - 2.0 * x).abs() < 1e-3, "f'({x}) = {d1}");
            assert!((d2 - 2.0).abs() < 1e-3, "f''({x}) = {d2}");
            x += 0.5;
        }
    }

    #[test]
    fn test_derivative_of_sin() {
        let d = derivative1(&f64::sin, 0.3, DEFAULT_DELTA).unwrap();
        assert!((d - 0.3f64.cos()).abs() < 1e-9);
    }

    #[test]
    fn test_derivative_gap_near_pole() {
        let inv = |x: f64| 1.0 / x;
        assert_eq!(derivative2(&inv, 0.0, DEFAULT_DELTA), None);
        assert_eq!(derivative1(&inv, 2.0 * DEFAULT_DELTA, DEFAULT_DELTA), None);
    }

    #[test]
    fn test_derivative_structs_compose() {
        let cube: Arc<dyn DifferentiableFunction> = Arc::new(|x: f64| x * x * x);
        let d1: Arc<dyn DifferentiableFunction> = Arc::new(Derivative1::new(cube.clone()));
        let d1_of_d1 = Derivative1 { function: d1, delta: 1e-2 };
        let d2 = Derivative2::new(cube);
        // both approximate 6x
        assert!((d1_of_d1.evaluate(1.5).unwrap() - 9.0).abs() < 1e-3);
        assert!((d2.evaluate(1.5).unwrap() - 9.0).abs() < 1e-3);
    }

    #[test]
    fn test_calculable_filters_non_finite() {
        assert_eq!(calculable(&|x: f64| x.sqrt(), -1.0), None);
        assert_eq!(calculable(&|x: f64| 1.0 / x, 0.0), None);
        assert_eq!(calculable(&|x: f64| x + 1.0, 1.0), Some(2.0));
    }
}
