/// Plain data passed between the generators, the session and the host canvas.
/// Every type here serializes with camelCase field names so it can cross the
/// wasm boundary as JSON unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::Vector;

/// CSS colour string, either a name (`"black"`) or `"#rrggbb"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub String);

impl Color {
    pub fn new(css: impl Into<String>) -> Self {
        Self(css.into())
    }

    pub fn black() -> Self {
        Self::new("black")
    }

    pub fn white() -> Self {
        Self::new("white")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Color {
    fn from(css: &str) -> Self {
        Self::new(css)
    }
}

/// A point with a colour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColoredPoint {
    pub point: Vector,
    pub color: Color,
}

impl ColoredPoint {
    pub fn new(point: Vector, color: Color) -> Self {
        Self { point, color }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vector,
    pub radius: f64,
    pub color: Color,
}

/// Raster position plus colour, produced by escape-time jobs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
    pub color: Color,
}

/// One primitive in world coordinates, as handed to a `Canvas2D`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DrawCommand {
    Line { x1: f64, y1: f64, x2: f64, y2: f64, color: Color },
    Point { x: f64, y: f64, color: Color },
    Circle { x: f64, y: f64, radius: f64, color: Color },
}
