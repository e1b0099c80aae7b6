/// Fractal generators.
///
/// Background fractals (the IFS random walk and escape-time rasters) implement
/// [`FractalGenerator`] and hand each result to a callback as soon as it is
/// produced, which lets the job layer tag, forward and stop them. The
/// recursive fractals are small enough to draw straight onto a canvas.
///
/// [`FractalKind`] maps UI names to generators the same way for every host.

pub mod escape_time;
pub mod ifs;
pub mod recursive;

use std::ops::ControlFlow;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::engine::types::{ColoredPoint, Pixel};
use crate::error::{MathVizError, Result};
use crate::math::{Range2D, ScreenRangeConverter, ScreenRangeWithDataFocusArea};

/// One item produced by a generator.
#[derive(Clone, Debug, PartialEq)]
pub enum FractalOutput {
    /// World-space point from an IFS walk.
    Point(ColoredPoint),
    /// Raster pixel from an escape-time pass.
    Pixel(Pixel),
}

/// How a generator run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The whole budget was produced.
    Finished,
    /// The sink asked to stop early.
    Stopped,
}

/// A fractal that can be produced incrementally off the rendering thread.
pub trait FractalGenerator: Send {
    /// Human-readable name.
    fn name(&self) -> &str;

    /// Produce output in generation order. A `Break` from `emit` ends the run
    /// before the next item and yields [`Completion::Stopped`].
    fn run(&mut self, emit: &mut dyn FnMut(FractalOutput) -> ControlFlow<()>) -> Result<Completion>;
}

/// Per-request overrides for [`FractalKind::create`]. Unset fields fall back to the config.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FractalParams {
    /// World window to display.
    pub range: Option<Range2D>,
    /// Sub-window actually evaluated by escape-time passes.
    pub focus: Option<Range2D>,
    pub iterations: Option<u64>,
    pub iteration_limit: Option<u32>,
    pub threshold: Option<f64>,
    /// Fixed RNG seed for reproducible IFS walks.
    pub seed: Option<u64>,
    /// Maps of a user-defined IFS; replaces the Barnsley preset when set.
    pub transforms: Option<Vec<ifs::AffineTransform>>,
}

impl FractalParams {
    /// Parse from a flat buffer: `[x_min, x_max, y_min, y_max, iterations, iteration_limit, threshold]`.
    /// Zero or missing entries mean "use the default".
    pub fn from_buffer(data: &[f64]) -> Self {
        let positive = |i: usize| data.get(i).copied().filter(|v| v.is_finite() && *v > 0.0);
        Self {
            range: Range2D::from_buffer(data).filter(|r| r.has_data()),
            focus: None,
            iterations: positive(4).map(|v| v as u64),
            iteration_limit: positive(5).map(|v| v as u32),
            threshold: positive(6),
            seed: None,
            transforms: None,
        }
    }
}

/// Fractal identifier matching the UI names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FractalKind {
    None,
    BarnsleyFern,
    /// Random walk over caller-supplied affine maps.
    Ifs,
    Mandelbrot,
    SierpinskiTriangle,
    FernLine,
}

impl FractalKind {
    /// Parse from a display name or a camelCase id. Unknown names map to `None`.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "Barnsley Fern" | "barnsleyFern" | "fern" => FractalKind::BarnsleyFern,
            "IFS" | "ifs" => FractalKind::Ifs,
            "Mandelbrot" | "mandelbrot" => FractalKind::Mandelbrot,
            "Sierpinski Triangle" | "sierpinskiTriangle" | "sierpinski" => FractalKind::SierpinskiTriangle,
            "Fern Line" | "fernLine" => FractalKind::FernLine,
            _ => FractalKind::None,
        }
    }

    /// True for kinds that run as a cancellable background job.
    pub fn is_background(&self) -> bool {
        matches!(self, FractalKind::BarnsleyFern | FractalKind::Ifs | FractalKind::Mandelbrot)
    }

    pub fn default_range(&self, config: &EngineConfig) -> Range2D {
        match self {
            FractalKind::BarnsleyFern => config.fern_range,
            FractalKind::Mandelbrot => config.mandelbrot_range,
            _ => config.standard_range,
        }
    }

    /// World window shown for this kind on `screen`'s raster.
    ///
    /// An explicit `params.range` is used as given. The default Mandelbrot
    /// window is widened so pixels are square; the set itself is still
    /// evaluated over the unwidened window (see [`FractalKind::create`]).
    pub fn display_range(&self, config: &EngineConfig, params: &FractalParams, screen: &ScreenRangeConverter) -> Range2D {
        if let Some(range) = params.range {
            return range;
        }
        let range = self.default_range(config);
        match self {
            FractalKind::Mandelbrot => {
                let mut fit = ScreenRangeConverter::with_size(range, screen.width, screen.height);
                fit.fit_square_pixels();
                fit.range
            }
            _ => range,
        }
    }

    /// Wall-clock budget for a background job of this kind.
    pub fn timeout(&self, config: &EngineConfig) -> Option<Duration> {
        match self {
            FractalKind::BarnsleyFern | FractalKind::Ifs => Some(config.ifs_timeout()),
            FractalKind::Mandelbrot => Some(config.escape_timeout()),
            _ => None,
        }
    }

    /// Create a boxed generator for a background kind.
    ///
    /// `screen` supplies the raster size; its window is replaced by
    /// [`display_range`](Self::display_range). IFS kinds walk
    /// `params.transforms` when given, validated here; `Ifs` requires them.
    pub fn create(
        &self,
        config: &EngineConfig,
        params: &FractalParams,
        screen: &ScreenRangeConverter,
    ) -> Result<Box<dyn FractalGenerator>> {
        match self {
            FractalKind::BarnsleyFern | FractalKind::Ifs => {
                let iterations = params.iterations.unwrap_or(config.ifs_iterations);
                let system = match (&params.transforms, self) {
                    (Some(transforms), _) => ifs::IfsSystem::new(transforms.clone())?,
                    (None, FractalKind::BarnsleyFern) => ifs::IfsSystem::barnsley_fern(),
                    (None, _) => return Err(MathVizError::InvalidConfig("an IFS needs transforms".into())),
                };
                let generator = match params.seed {
                    Some(seed) => ifs::IfsGenerator::with_seed(system, iterations, seed),
                    None => ifs::IfsGenerator::new(system, iterations),
                };
                Ok(Box::new(generator))
            }
            FractalKind::Mandelbrot => {
                let range = self.display_range(config, params, screen);
                let mut area = ScreenRangeWithDataFocusArea::new(ScreenRangeConverter::with_size(
                    range,
                    screen.width,
                    screen.height,
                ));
                let default_focus = params.range.is_none().then_some(config.mandelbrot_range);
                if let Some(focus) = params.focus.or(default_focus) {
                    area.set_data_evaluation_range(focus);
                }
                Ok(Box::new(escape_time::EscapeTimeGenerator {
                    area,
                    iteration_limit: params.iteration_limit.unwrap_or(config.escape_iteration_limit),
                    threshold: params.threshold.unwrap_or(config.divergence_threshold),
                    palette: config.palette.clone(),
                    interior: escape_time::interior_color(),
                }))
            }
            other => Err(MathVizError::InvalidConfig(format!("{other:?} is not a background fractal"))),
        }
    }
}
