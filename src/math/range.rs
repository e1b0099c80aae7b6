/// Axis-aligned world windows.
///
/// `max >= min` is not enforced; a reversed window yields a negative extent.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range2D {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Range2D {
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self { x_min, x_max, y_min, y_max }
    }

    /// The `[-10, 10]` square used by curve plots.
    pub const fn standard() -> Self {
        Self::new(-10.0, 10.0, -10.0, 10.0)
    }

    #[inline]
    pub fn x_range(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[inline]
    pub fn y_range(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// False only for the all-zero window.
    pub fn has_data(&self) -> bool {
        self.x_min != 0.0 || self.x_max != 0.0 || self.y_min != 0.0 || self.y_max != 0.0
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// Parse from a flat `[x_min, x_max, y_min, y_max]` slice.
    pub fn from_buffer(buf: &[f64]) -> Option<Self> {
        match buf {
            [x_min, x_max, y_min, y_max, ..] => Some(Self::new(*x_min, *x_max, *y_min, *y_max)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range3D {
    #[serde(flatten)]
    pub xy: Range2D,
    pub z_min: f64,
    pub z_max: f64,
}

impl Range3D {
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64, z_min: f64, z_max: f64) -> Self {
        Self { xy: Range2D::new(x_min, x_max, y_min, y_max), z_min, z_max }
    }

    #[inline]
    pub fn z_range(&self) -> f64 {
        self.z_max - self.z_min
    }
}
