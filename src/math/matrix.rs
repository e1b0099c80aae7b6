/// Dense row-major matrix of f64, always fully initialized.
///
/// Vector products follow the homogeneous convention: a matrix with one
/// more column than the vector has elements treats the vector as if it had
/// a trailing 1, so the last column acts as a translation term. The padded
/// vector is never built.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use super::utils::TOLERANCE;
use super::vector::{cross_product_slices, Vector};
use crate::error::{MathVizError, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Matrix {
    rows: usize,
    columns: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Zero-filled `rows x columns` matrix.
    pub fn zeros(rows: usize, columns: usize) -> Self {
        Self { rows, columns, data: vec![0.0; rows * columns] }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Build from nested rows. Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let columns = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * columns);
        for row in &rows {
            if row.len() != columns {
                return Err(MathVizError::DimensionMismatch {
                    operation: "from_rows",
                    left: (rows.len(), columns),
                    right: (1, row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self { rows: rows.len(), columns, data })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        if row < self.rows && column < self.columns {
            Some(self.data[row * self.columns + column])
        } else {
            None
        }
    }

    pub fn set(&mut self, row: usize, column: usize, value: f64) -> Result<()> {
        self.check_index(row, column)?;
        self.data[row * self.columns + column] = value;
        Ok(())
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.columns..(row + 1) * self.columns]
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows).map(|r| self.row(r).to_vec()).collect()
    }

    fn check_index(&self, row: usize, column: usize) -> Result<()> {
        if row < self.rows && column < self.columns {
            Ok(())
        } else {
            Err(MathVizError::IndexOutOfRange {
                row,
                column,
                rows: self.rows,
                columns: self.columns,
            })
        }
    }

    // ─── Shape editing ───────────────────────────────────────────

    /// Grow or shrink to `rows x columns`, keeping overlapping cells and
    /// zero-filling new ones.
    pub fn resize(&mut self, rows: usize, columns: usize) {
        if rows == self.rows && columns == self.columns {
            return;
        }
        let mut data = vec![0.0; rows * columns];
        for r in 0..rows.min(self.rows) {
            for c in 0..columns.min(self.columns) {
                data[r * columns + c] = self.data[r * self.columns + c];
            }
        }
        self.rows = rows;
        self.columns = columns;
        self.data = data;
    }

    /// Overwrite row `row`, growing the matrix (zero-filled) when needed.
    pub fn set_row(&mut self, row: usize, values: &[f64]) {
        self.resize(self.rows.max(row + 1), self.columns.max(values.len()));
        let start = row * self.columns;
        self.data[start..start + values.len()].copy_from_slice(values);
    }

    /// Overwrite column `column`, growing the matrix (zero-filled) when needed.
    pub fn set_column(&mut self, column: usize, values: &[f64]) {
        self.resize(self.rows.max(values.len()), self.columns.max(column + 1));
        for (r, v) in values.iter().enumerate() {
            self.data[r * self.columns + column] = *v;
        }
    }

    /// Copy row `source` over row `destination`.
    pub fn copy_row(&mut self, source: usize, destination: usize) -> Result<()> {
        self.check_index(source, 0)?;
        self.check_index(destination, 0)?;
        let cols = self.columns;
        self.data.copy_within(source * cols..(source + 1) * cols, destination * cols);
        Ok(())
    }

    /// Full transpose; non-square matrices swap their dimensions.
    pub fn transpose(&mut self) {
        let mut data = vec![0.0; self.data.len()];
        for r in 0..self.rows {
            for c in 0..self.columns {
                data[c * self.rows + r] = self.data[r * self.columns + c];
            }
        }
        std::mem::swap(&mut self.rows, &mut self.columns);
        self.data = data;
    }

    pub fn transposed(&self) -> Matrix {
        let mut m = self.clone();
        m.transpose();
        m
    }

    // ─── Products ────────────────────────────────────────────────

    /// `self x rhs`. Requires `self.columns == rhs.rows`.
    pub fn multiply_by(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.columns != rhs.rows {
            return Err(MathVizError::DimensionMismatch {
                operation: "multiply_by",
                left: (self.rows, self.columns),
                right: (rhs.rows, rhs.columns),
            });
        }
        if self.rows == 4 && self.columns == 4 && rhs.columns == 4 {
            return Ok(multiply_4x4(self, rhs));
        }
        let mut out = Matrix::zeros(self.rows, rhs.columns);
        for r in 0..self.rows {
            for k in 0..self.columns {
                let a = self.data[r * self.columns + k];
                for c in 0..rhs.columns {
                    out.data[r * rhs.columns + c] += a * rhs.data[k * rhs.columns + c];
                }
            }
        }
        Ok(out)
    }

    /// Multiply with `values` as a column vector, writing one element per row into `out`.
    ///
    /// `values.len()` must equal `columns` or `columns - 1`; the latter adds
    /// the last column as translation.
    pub fn multiply_slice_on_right(&self, values: &[f64], out: &mut [f64]) -> Result<()> {
        let homogeneous = self.columns == values.len() + 1;
        if !(homogeneous || self.columns == values.len()) || out.len() < self.rows {
            return Err(MathVizError::DimensionMismatch {
                operation: "multiply_on_right",
                left: (self.rows, self.columns),
                right: (values.len(), 1),
            });
        }
        for (r, slot) in out.iter_mut().enumerate().take(self.rows) {
            let row = self.row(r);
            let mut sum: f64 = row.iter().zip(values).map(|(m, v)| m * v).sum();
            if homogeneous {
                sum += row[values.len()];
            }
            *slot = sum;
        }
        Ok(())
    }

    /// `self x v`, one output element per matrix row.
    pub fn multiply_vector_on_right(&self, v: &Vector) -> Result<Vector> {
        let mut out = vec![0.0; self.rows];
        self.multiply_slice_on_right(v.as_slice(), &mut out)?;
        Ok(Vector::new(out))
    }

    /// Transform `v` in place, keeping its length. A homogeneous `w` row is dropped.
    pub fn transform_on_right(&self, v: &mut Vector) -> Result<()> {
        let len = v.len();
        if self.rows < len {
            return Err(MathVizError::DimensionMismatch {
                operation: "transform_on_right",
                left: (self.rows, self.columns),
                right: (len, 1),
            });
        }
        let mut out = vec![0.0; self.rows];
        self.multiply_slice_on_right(v.as_slice(), &mut out)?;
        out.truncate(len);
        v.set(&out);
        Ok(())
    }

    // ─── Camera ──────────────────────────────────────────────────

    /// Write a right-handed look-at view matrix into `self` (resized to 4x4).
    ///
    /// Rows are `right`, `up`, `backward`, each followed by `-dot(row, camera)`,
    /// then `[0, 0, 0, 1]`. `column_major` stores the transpose instead.
    /// A camera sitting on its focal point leaves the basis rows zero.
    pub fn set_look_at_matrix(
        &mut self,
        camera: &Vector,
        focal_point: &Vector,
        up: &Vector,
        column_major: bool,
    ) {
        let mut forward = focal_point.difference_with(camera);
        forward.normalize();

        let up3 = [up.x(), up.y(), up.z()];
        let fwd3 = [forward.x(), forward.y(), forward.z()];
        let mut right3 = [0.0; 3];
        cross_product_slices(&fwd3, &up3, &mut right3);
        let mut right = Vector::new(right3.to_vec());
        right.normalize();

        let mut camera_up3 = [0.0; 3];
        cross_product_slices(right.as_slice(), &fwd3, &mut camera_up3);
        let backward3 = [-fwd3[0], -fwd3[1], -fwd3[2]];

        let cam3 = [camera.x(), camera.y(), camera.z()];
        let dot3 = |a: &[f64]| -(a[0] * cam3[0] + a[1] * cam3[1] + a[2] * cam3[2]);

        self.resize(4, 4);
        let basis: [&[f64]; 3] = [right.as_slice(), &camera_up3, &backward3];
        for (r, row) in basis.iter().enumerate() {
            self.data[r * 4..r * 4 + 3].copy_from_slice(&row[..3]);
            self.data[r * 4 + 3] = dot3(row);
        }
        self.data[12..16].copy_from_slice(&[0.0, 0.0, 0.0, 1.0]);

        if column_major {
            self.transpose();
        }
    }
}

/// Unrolled 4x4 product.
#[inline(always)]
fn multiply_4x4(a: &Matrix, b: &Matrix) -> Matrix {
    let (a, b) = (&a.data, &b.data);
    let mut data = vec![0.0; 16];
    for r in 0..4 {
        let (a0, a1, a2, a3) = (a[r * 4], a[r * 4 + 1], a[r * 4 + 2], a[r * 4 + 3]);
        for c in 0..4 {
            data[r * 4 + c] = a0 * b[c] + a1 * b[4 + c] + a2 * b[8 + c] + a3 * b[12 + c];
        }
    }
    Matrix { rows: 4, columns: 4, data }
}

impl PartialEq for Matrix {
    /// Same shape and every cell within `TOLERANCE`.
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.columns == other.columns
            && self.data.iter().zip(&other.data).all(|(a, b)| (a - b).abs() <= TOLERANCE)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, column): (usize, usize)) -> &f64 {
        assert!(row < self.rows && column < self.columns, "matrix index ({row}, {column}) out of range");
        &self.data[row * self.columns + column]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, column): (usize, usize)) -> &mut f64 {
        assert!(row < self.rows && column < self.columns, "matrix index ({row}, {column}) out of range");
        &mut self.data[row * self.columns + column]
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = MathVizError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Matrix::from_rows(rows)
    }
}

impl From<Matrix> for Vec<Vec<f64>> {
    fn from(m: Matrix) -> Self {
        m.to_rows()
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for r in 0..self.rows {
            if r > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for (c, v) in self.row(r).iter().enumerate() {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{v}")?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}
