/// Engine-wide tunables.
///
/// Every constant the calculus layer and the fractal generators depend on lives
/// here, so a host can override them from JSON or from a flat `Float64Array`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MathVizError, Result};
use crate::lighting::Palette;
use crate::math::Range2D;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Finite-difference step for derivatives.
    pub derivative_step: f64,
    /// Spacing between traced samples, in world units.
    pub draw_increment: f64,
    pub ifs_iterations: u64,
    pub escape_iteration_limit: u32,
    /// Squared modulus past which an orbit counts as divergent.
    pub divergence_threshold: f64,
    pub ifs_timeout_secs: f64,
    pub escape_timeout_secs: f64,
    pub standard_range: Range2D,
    pub mandelbrot_range: Range2D,
    pub fern_range: Range2D,
    pub palette: Palette,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            derivative_step: 1e-3,
            draw_increment: 0.1,
            ifs_iterations: 60_000,
            escape_iteration_limit: 80,
            divergence_threshold: 4.0,
            ifs_timeout_secs: 30.0,
            escape_timeout_secs: 60.0,
            standard_range: Range2D::standard(),
            mandelbrot_range: Range2D::new(-2.00, 0.47, -1.12, 1.12),
            fern_range: Range2D::new(-2.1818, 3.76, 0.0, 10.0),
            palette: Palette::Hue,
        }
    }
}

impl EngineConfig {
    /// Parse and validate. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build from a flat buffer. Anything shorter than the full layout yields the defaults.
    ///
    /// Layout: `[derivative_step, draw_increment, ifs_iterations,
    /// escape_iteration_limit, divergence_threshold, ifs_timeout_secs,
    /// escape_timeout_secs]`
    pub fn from_buffer(data: &[f64]) -> Self {
        if data.len() < 7 {
            return Self::default();
        }
        Self {
            derivative_step: data[0],
            draw_increment: data[1],
            ifs_iterations: data[2] as u64,
            escape_iteration_limit: data[3] as u32,
            divergence_threshold: data[4],
            ifs_timeout_secs: data[5],
            escape_timeout_secs: data[6],
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("derivativeStep", self.derivative_step),
            ("drawIncrement", self.draw_increment),
            ("divergenceThreshold", self.divergence_threshold),
            ("ifsTimeoutSecs", self.ifs_timeout_secs),
            ("escapeTimeoutSecs", self.escape_timeout_secs),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(MathVizError::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }
        if self.ifs_iterations == 0 {
            return Err(MathVizError::InvalidConfig("ifsIterations must be at least 1".into()));
        }
        if self.escape_iteration_limit == 0 {
            return Err(MathVizError::InvalidConfig("escapeIterationLimit must be at least 1".into()));
        }
        Ok(())
    }

    /// Falls back to the default budget when the stored value is not a valid duration.
    pub fn ifs_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.ifs_timeout_secs).unwrap_or(Duration::from_secs(30))
    }

    pub fn escape_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.escape_timeout_secs).unwrap_or(Duration::from_secs(60))
    }
}
