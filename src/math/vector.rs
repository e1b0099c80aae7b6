/// N-dimensional vector with f64 elements.
///
/// Binary operations between two vectors of different length walk the
/// shorter operand; extra elements of the longer one are left alone.
/// Mutating methods (`add`, `normalize`, ...) change `self` in place, the
/// matching getters (`sum_with`, `normalized`, ...) return a new vector.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use super::utils::TOLERANCE;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Vector {
    pub elements: Vec<f64>,
}

impl Vector {
    pub fn new(elements: Vec<f64>) -> Self {
        Self { elements }
    }

    /// Zero-filled vector of `len` elements.
    pub fn zeros(len: usize) -> Self {
        Self { elements: vec![0.0; len] }
    }

    pub fn from_xyz(x: f64, y: f64, z: f64) -> Self {
        Self { elements: vec![x, y, z] }
    }

    pub fn from_xy(x: f64, y: f64) -> Self {
        Self { elements: vec![x, y] }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.elements
    }

    /// Replace every element.
    pub fn set(&mut self, elements: &[f64]) {
        self.elements.clear();
        self.elements.extend_from_slice(elements);
    }

    /// First element, or 0 when absent.
    pub fn x(&self) -> f64 {
        self.elements.first().copied().unwrap_or(0.0)
    }

    pub fn y(&self) -> f64 {
        self.elements.get(1).copied().unwrap_or(0.0)
    }

    pub fn z(&self) -> f64 {
        self.elements.get(2).copied().unwrap_or(0.0)
    }

    /// Parse a delimited line such as `"vn 0.5 0 0.866025"`.
    ///
    /// Tokens that are not numbers are skipped. A blank delimiter splits on
    /// any run of whitespace.
    pub fn from_delimited_str(line: &str, delimiter: &str) -> Self {
        let parse = |token: &str| token.trim().parse::<f64>().ok();
        let elements = if delimiter.trim().is_empty() {
            line.split_whitespace().filter_map(parse).collect()
        } else {
            line.split(delimiter).filter_map(parse).collect()
        };
        Self { elements }
    }

    // ─── Element-wise arithmetic ─────────────────────────────────

    pub fn add(&mut self, other: &Vector) {
        for (a, b) in self.elements.iter_mut().zip(&other.elements) {
            *a += b;
        }
    }

    pub fn subtract(&mut self, other: &Vector) {
        for (a, b) in self.elements.iter_mut().zip(&other.elements) {
            *a -= b;
        }
    }

    pub fn sum_with(&self, other: &Vector) -> Vector {
        let mut result = self.clone();
        result.add(other);
        result
    }

    pub fn difference_with(&self, other: &Vector) -> Vector {
        let mut result = self.clone();
        result.subtract(other);
        result
    }

    pub fn multiply_by_scalar(&mut self, scalar: f64) {
        for e in &mut self.elements {
            *e *= scalar;
        }
    }

    /// Divide every element; a zero divisor yields IEEE infinities or NaN.
    pub fn divide_by_scalar(&mut self, scalar: f64) {
        for e in &mut self.elements {
            *e /= scalar;
        }
    }

    pub fn scaled(&self, scalar: f64) -> Vector {
        let mut result = self.clone();
        result.multiply_by_scalar(scalar);
        result
    }

    pub fn negate(&mut self) {
        for e in &mut self.elements {
            *e = -*e;
        }
    }

    pub fn negated(&self) -> Vector {
        let mut result = self.clone();
        result.negate();
        result
    }

    /// `self[i] = coefficient * other[i]` for `i < limit`.
    pub fn copy_from_with_limit(&mut self, coefficient: f64, other: &Vector, limit: usize) {
        for (a, b) in self.elements.iter_mut().zip(&other.elements).take(limit) {
            *a = coefficient * b;
        }
    }

    /// `self[i] += coefficient * other[i]` for `i < limit`.
    pub fn add_scaled_with_limit(&mut self, coefficient: f64, other: &Vector, limit: usize) {
        for (a, b) in self.elements.iter_mut().zip(&other.elements).take(limit) {
            *a += coefficient * b;
        }
    }

    pub fn midpoint_with(&self, other: &Vector) -> Vector {
        let mut result = self.sum_with(other);
        result.divide_by_scalar(2.0);
        result
    }

    /// `w1 * self + w2 * other` over the shared elements; the tail of `self` is kept as is.
    pub fn weighted_average_with(&self, w1: f64, other: &Vector, w2: f64) -> Vector {
        let mut result = self.clone();
        for (a, b) in result.elements.iter_mut().zip(&other.elements) {
            *a = *a * w1 + b * w2;
        }
        result
    }

    // ─── Products and norms ──────────────────────────────────────

    /// Sum of `self[i] * other[i]` for every index of `other`.
    ///
    /// # Panics
    /// When `other` is longer than `self`.
    pub fn dot_product(&self, other: &Vector) -> f64 {
        assert!(
            other.len() <= self.len(),
            "dot product operand of length {} exceeds vector of length {}",
            other.len(),
            self.len()
        );
        other
            .elements
            .iter()
            .enumerate()
            .map(|(i, b)| self.elements[i] * b)
            .sum()
    }

    /// Right-handed cross product of the first three elements.
    ///
    /// # Panics
    /// When either operand has fewer than three elements.
    pub fn cross_product(&self, other: &Vector) -> Vector {
        let mut out = [0.0; 3];
        cross_product_slices(&self.elements, &other.elements, &mut out);
        Vector::new(out.to_vec())
    }

    pub fn magnitude(&self) -> f64 {
        self.elements.iter().map(|e| e * e).sum::<f64>().sqrt()
    }

    /// Scale to unit length. A zero vector is left unchanged.
    pub fn normalize(&mut self) {
        let mag = self.magnitude();
        if mag != 0.0 {
            self.divide_by_scalar(mag);
        }
    }

    pub fn normalized(&self) -> Vector {
        let mut result = self.clone();
        result.normalize();
        result
    }

    /// Euclidean distance; missing elements of the shorter vector count as zero.
    pub fn distance_to(&self, other: &Vector) -> f64 {
        let longest = self.len().max(other.len());
        (0..longest)
            .map(|i| {
                let a = self.elements.get(i).copied().unwrap_or(0.0);
                let b = other.elements.get(i).copied().unwrap_or(0.0);
                (a - b) * (a - b)
            })
            .sum::<f64>()
            .sqrt()
    }

    // ─── 2D helpers ──────────────────────────────────────────────

    pub fn perpendicular_clockwise(&self) -> Vector {
        Vector::from_xy(self.y(), -self.x())
    }

    pub fn perpendicular_counter_clockwise(&self) -> Vector {
        Vector::from_xy(-self.y(), self.x())
    }

    pub fn is_2d(&self) -> bool {
        self.z() == 0.0
    }

    /// Treat `self` as the eye and test whether the front of triangle `face` is visible.
    ///
    /// # Panics
    /// When `face` has fewer than three vertices.
    pub fn can_see(&self, face: &[Vector]) -> bool {
        let edge1 = face[1].difference_with(&face[0]);
        let edge2 = face[2].difference_with(&face[1]);
        let normal = edge1.cross_product(&edge2);
        0.0 <= self.x() * normal.x() + self.y() * normal.y() + self.z() * normal.z()
    }
}

/// Cross product on raw slices, writing into `out`.
#[inline]
pub fn cross_product_slices(a: &[f64], b: &[f64], out: &mut [f64; 3]) {
    out[0] = a[1] * b[2] - a[2] * b[1];
    out[1] = a[2] * b[0] - a[0] * b[2];
    out[2] = a[0] * b[1] - a[1] * b[0];
}

impl PartialEq for Vector {
    /// Same length and every element within `TOLERANCE`.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .elements
                .iter()
                .zip(&other.elements)
                .all(|(a, b)| (a - b).abs() <= TOLERANCE)
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.elements[index]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.elements[index]
    }
}

impl From<Vec<f64>> for Vector {
    fn from(elements: Vec<f64>) -> Self {
        Self { elements }
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<")?;
        for (i, e) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{e}")?;
        }
        write!(f, ">")
    }
}
