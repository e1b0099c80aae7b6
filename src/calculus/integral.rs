/// Definite integral approximation with five rules computed in one pass.

use serde::{Deserialize, Serialize};

use super::{calculable, DifferentiableFunction, DEFAULT_DELTA};

/// Outcome of one integral evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculusResult {
    pub interval_start: f64,
    pub interval_end: f64,
    pub subinterval_count: u64,
    pub left_sum: f64,
    pub right_sum: f64,
    pub midpoint_sum: f64,
    pub trapezoidal_sum: f64,
    pub simpson_sum: f64,
}

/// Riemann sums at a fixed step width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntegralEstimator {
    pub delta: f64,
}

impl Default for IntegralEstimator {
    fn default() -> Self {
        Self { delta: DEFAULT_DELTA }
    }
}

impl IntegralEstimator {
    pub fn new(delta: f64) -> Self {
        Self { delta }
    }

    /// Number of whole steps of `delta` in `[a, b]`; zero for empty or reversed intervals.
    pub fn subinterval_count(&self, a: f64, b: f64) -> u64 {
        let n = (b - a) / self.delta;
        if n.is_finite() && n > 0.0 {
            // absorb representation error such as 1 / 0.001 = 999.999...
            (n + 1e-9).floor() as u64
        } else {
            0
        }
    }

    /// Left, right and midpoint sums over `[a, b]`, then trapezoid and Simpson
    /// from those. Samples that are not calculable contribute nothing.
    pub fn estimate<F: DifferentiableFunction + ?Sized>(&self, f: &F, a: f64, b: f64) -> CalculusResult {
        let h = self.delta;
        let n = self.subinterval_count(a, b);

        let sample = |x: f64| calculable(f, x).unwrap_or(0.0);
        let mut left = 0.0;
        let mut right = 0.0;
        let mut mid = 0.0;
        let mut f_left = sample(a);
        for i in 0..n {
            let x0 = a + i as f64 * h;
            let f_right = sample(a + (i + 1) as f64 * h);
            left += f_left;
            right += f_right;
            mid += sample(x0 + 0.5 * h);
            f_left = f_right;
        }
        left *= h;
        right *= h;
        mid *= h;

        let trapezoidal = (left + right) / 2.0;
        CalculusResult {
            interval_start: a,
            interval_end: b,
            subinterval_count: n,
            left_sum: left,
            right_sum: right,
            midpoint_sum: mid,
            trapezoidal_sum: trapezoidal,
            simpson_sum: (2.0 * mid + trapezoidal) / 3.0,
        }
    }
}
