/// Iterated function systems drawn by random walk ("chaos game").
///
/// A running point starts at the origin. Each step picks one affine map with
/// probability proportional to its weight, applies `p <- M p + offset` and
/// emits the new point in the colour of the chosen map.

use std::ops::ControlFlow;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{Completion, FractalGenerator, FractalOutput};
use crate::engine::types::{Color, ColoredPoint};
use crate::error::{MathVizError, Result};
use crate::math::{Matrix, Vector};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub matrix: Matrix,
    pub offset: Vector,
    pub weight: f64,
    pub color: Color,
}

impl AffineTransform {
    pub fn new(matrix: Matrix, offset: Vector, weight: f64, color: Color) -> Self {
        Self { matrix, offset, weight, color }
    }

    pub fn dimension(&self) -> usize {
        self.offset.len()
    }

    /// `out = matrix * point + offset`.
    pub fn apply(&self, point: &[f64], out: &mut [f64]) -> Result<()> {
        self.matrix.multiply_slice_on_right(point, out)?;
        for (o, d) in out.iter_mut().zip(&self.offset.elements) {
            *o += d;
        }
        Ok(())
    }
}

/// A validated set of maps sharing one dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct IfsSystem {
    name: String,
    transforms: Vec<AffineTransform>,
    total_weight: f64,
}

impl IfsSystem {
    /// Every matrix must be square with the offset's length, and the weights
    /// must sum to something positive.
    pub fn new(transforms: Vec<AffineTransform>) -> Result<Self> {
        let Some(first) = transforms.first() else {
            return Err(MathVizError::InvalidConfig("an IFS needs at least one transform".into()));
        };
        let n = first.dimension();
        for t in &transforms {
            if t.matrix.rows() != n || t.matrix.columns() != n || t.dimension() != n {
                return Err(MathVizError::DimensionMismatch {
                    operation: "ifs transform",
                    left: (t.matrix.rows(), t.matrix.columns()),
                    right: (t.dimension(), 1),
                });
            }
            if !(t.weight.is_finite() && t.weight >= 0.0) {
                return Err(MathVizError::InvalidConfig(format!("transform weight {} is not usable", t.weight)));
            }
        }
        let total_weight: f64 = transforms.iter().map(|t| t.weight).sum();
        if total_weight <= 0.0 {
            return Err(MathVizError::InvalidConfig("IFS weights sum to zero".into()));
        }
        Ok(Self { name: "IFS".to_string(), transforms, total_weight })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Barnsley's fern: stem, successive leaflets, left and right leaflets.
    pub fn barnsley_fern() -> Self {
        let t = |rows: [[f64; 2]; 2], offset: (f64, f64), weight: f64, color: &str| {
            let matrix = Matrix::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap_or_else(|_| Matrix::zeros(2, 2));
            AffineTransform::new(matrix, Vector::from_xy(offset.0, offset.1), weight, Color::new(color))
        };
        let transforms = vec![
            t([[0.0, 0.0], [0.0, 0.16]], (0.0, 0.0), 0.01, "brown"),
            t([[0.85, 0.04], [-0.04, 0.85]], (0.0, 1.6), 0.85, "#00FF80"),
            t([[0.2, -0.23], [0.26, 0.22]], (0.0, 1.6), 0.07, "#00FF60"),
            t([[-0.15, 0.28], [0.26, 0.24]], (0.0, 0.44), 0.07, "#00FF40"),
        ];
        let total_weight = transforms.iter().map(|t| t.weight).sum();
        Self { name: "Barnsley Fern".to_string(), transforms, total_weight }
    }

    pub fn transforms(&self) -> &[AffineTransform] {
        &self.transforms
    }

    pub fn dimension(&self) -> usize {
        self.transforms.first().map_or(0, AffineTransform::dimension)
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Map owning the cumulative weight bucket that contains `r`, for `r` in `[0, total_weight)`.
    pub fn select(&self, r: f64) -> &AffineTransform {
        let mut upper = 0.0;
        for t in &self.transforms {
            upper += t.weight;
            if r < upper {
                return t;
            }
        }
        // r at or past the rounded total
        &self.transforms[self.transforms.len() - 1]
    }
}

pub struct IfsGenerator {
    system: IfsSystem,
    iterations: u64,
    rng: StdRng,
}

impl IfsGenerator {
    pub fn new(system: IfsSystem, iterations: u64) -> Self {
        Self { system, iterations, rng: StdRng::from_entropy() }
    }

    /// Reproducible walk.
    pub fn with_seed(system: IfsSystem, iterations: u64, seed: u64) -> Self {
        Self { system, iterations, rng: StdRng::seed_from_u64(seed) }
    }
}

impl FractalGenerator for IfsGenerator {
    fn name(&self) -> &str {
        self.system.name()
    }

    fn run(&mut self, emit: &mut dyn FnMut(FractalOutput) -> ControlFlow<()>) -> Result<Completion> {
        let n = self.system.dimension();
        let mut point = vec![0.0; n];
        let mut next = vec![0.0; n];
        // the first step always takes the first map
        let mut r = 0.0;
        for _ in 0..self.iterations {
            let transform = self.system.select(r);
            transform.apply(&point, &mut next)?;
            std::mem::swap(&mut point, &mut next);

            let out = ColoredPoint::new(Vector::new(point.clone()), transform.color.clone());
            if emit(FractalOutput::Point(out)).is_break() {
                return Ok(Completion::Stopped);
            }
            r = self.rng.gen::<f64>() * self.system.total_weight;
        }
        Ok(Completion::Finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(gen: &mut IfsGenerator) -> Vec<ColoredPoint> {
        let mut points = Vec::new();
        gen.run(&mut |out| {
            if let FractalOutput::Point(p) = out {
                points.push(p);
            }
            ControlFlow::Continue(())
        })
        .unwrap();
        points
    }

    #[test]
    fn test_select_buckets() {
        let fern = IfsSystem::barnsley_fern();
        assert!((fern.total_weight() - 1.0).abs() < 1e-12);
        assert_eq!(fern.select(0.0).color.as_str(), "brown");
        assert_eq!(fern.select(0.005).color.as_str(), "brown");
        assert_eq!(fern.select(0.01).color.as_str(), "#00FF80");
        assert_eq!(fern.select(0.5).color.as_str(), "#00FF80");
        assert_eq!(fern.select(0.9).color.as_str(), "#00FF60");
        assert_eq!(fern.select(0.95).color.as_str(), "#00FF40");
        assert_eq!(fern.select(1.0).color.as_str(), "#00FF40");
    }

    #[test]
    fn test_apply_adds_offset() {
        let fern = IfsSystem::barnsley_fern();
        let leaflet = &fern.transforms()[1];
        let mut out = [0.0; 2];
        leaflet.apply(&[1.0, 1.0], &mut out).unwrap();
        // [0.85 + 0.04, -0.04 + 0.85] + [0, 1.6]
        assert!((out[0] - 0.89).abs() < 1e-12);
        assert!((out[1] - 2.41).abs() < 1e-12);
    }

    #[test]
    fn test_walk_is_seeded_and_bounded() {
        let mut a = IfsGenerator::with_seed(IfsSystem::barnsley_fern(), 5000, 7);
        let mut b = IfsGenerator::with_seed(IfsSystem::barnsley_fern(), 5000, 7);
        let pa = collect(&mut a);
        let pb = collect(&mut b);
        assert_eq!(pa.len(), 5000);
        assert_eq!(pa, pb);
        // first step is the stem map applied to the origin
        assert_eq!(pa[0].color.as_str(), "brown");
        assert_eq!(pa[0].point, Vector::from_xy(0.0, 0.0));
        // the fern attractor lives inside its default window
        for p in &pa {
            assert!(p.point.x() > -2.2 && p.point.x() < 2.8, "x = {}", p.point.x());
            assert!(p.point.y() >= 0.0 && p.point.y() < 10.0, "y = {}", p.point.y());
        }
        let leaflets = pa.iter().filter(|p| p.color.as_str() == "#00FF80").count();
        assert!(leaflets > 3500 && leaflets < 4900, "{leaflets} leaflet points");
    }

    #[test]
    fn test_stop_early() {
        let mut gen = IfsGenerator::with_seed(IfsSystem::barnsley_fern(), 60_000, 1);
        let mut n = 0;
        let done = gen
            .run(&mut |_| {
                n += 1;
                if n >= 10 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(done, Completion::Stopped);
        assert_eq!(n, 10);
    }

    #[test]
    fn test_invalid_systems() {
        assert!(IfsSystem::new(vec![]).is_err());
        let bad = AffineTransform::new(Matrix::identity(3), Vector::from_xy(0.0, 0.0), 1.0, Color::white());
        assert!(matches!(IfsSystem::new(vec![bad]), Err(MathVizError::DimensionMismatch { .. })));
        let zero = AffineTransform::new(Matrix::identity(2), Vector::from_xy(0.0, 0.0), 0.0, Color::white());
        assert!(matches!(IfsSystem::new(vec![zero]), Err(MathVizError::InvalidConfig(_))));
        let ok = AffineTransform::new(Matrix::identity(2), Vector::from_xy(1.0, 0.0), 2.0, Color::white());
        let system = IfsSystem::new(vec![ok]).unwrap();
        assert_eq!(system.dimension(), 2);
        assert_eq!(system.name(), "IFS");
    }

    #[test]
    fn test_generator_reports_system_name() {
        let fern = IfsGenerator::with_seed(IfsSystem::barnsley_fern(), 1, 0);
        assert_eq!(fern.name(), "Barnsley Fern");
        let halving = AffineTransform::new(
            Matrix::from_rows(vec![vec![0.5, 0.0], vec![0.0, 0.5]]).unwrap(),
            Vector::from_xy(0.0, 0.0),
            1.0,
            Color::white(),
        );
        let custom = IfsSystem::new(vec![halving]).unwrap().with_name("Halving");
        assert_eq!(IfsGenerator::new(custom, 1).name(), "Halving");
    }

    #[test]
    fn test_transform_json() {
        let fern = IfsSystem::barnsley_fern();
        let json = serde_json::to_string(&fern.transforms()[0]).unwrap();
        let back: AffineTransform = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fern.transforms()[0]);
    }
}
