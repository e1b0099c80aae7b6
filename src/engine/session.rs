/// Host-owned drawing context.
///
/// A `Session` holds everything one canvas needs: the engine config, the
/// current world window, the plotted functions, an optional 3D scene and the
/// fractal slot with its job. Hosts create one per canvas; nothing here is
/// global.
///
/// Entry points: [`Session::on_resize`], [`Session::draw`],
/// [`Session::start_fractal`], [`Session::cancel_fractal`] and
/// [`Session::trace_curve`].

use super::camera::{Renderer3D, ViewMatrixBuilder};
use super::canvas::{draw_textured_quad, Canvas2D, TextureRef, TexturedVertex};
use super::job::{FractalEngine, JobId, JobStatus};
use super::types::{Circle, Color, ColoredPoint};
use super::wire::FractalMessage;
use crate::calculus::{CalculusResult, Drawable, DrawableKind, IntegralEstimator, Segment};
use crate::calculus::drawable::DEFAULT_INTEGRAL_DELTA;
use crate::config::EngineConfig;
use crate::error::{MathVizError, Result};
use crate::formulas::recursive::{FernLine, SierpinskiTriangle};
use crate::formulas::{FractalKind, FractalParams};
use crate::math::{Range2D, ScreenRangeConverter};

/// The fractal shown by a session and the single job that feeds it.
struct FractalSlot {
    kind: FractalKind,
    /// Request the job was started with; a resize restarts from it.
    params: FractalParams,
    engine: FractalEngine,
    /// Pixel mapping captured when the job started.
    screen: ScreenRangeConverter,
    received: Vec<FractalMessage>,
}

impl Default for FractalSlot {
    fn default() -> Self {
        Self {
            kind: FractalKind::None,
            params: FractalParams::default(),
            engine: FractalEngine::new(),
            screen: ScreenRangeConverter::standard(),
            received: Vec::new(),
        }
    }
}

pub struct Session {
    config: EngineConfig,
    screen: ScreenRangeConverter,
    pub background: Color,
    drawables: Vec<Drawable>,
    renderer: Option<Renderer3D>,
    points: Vec<ColoredPoint>,
    circles: Vec<Circle>,
    quads: Vec<(TextureRef, [TexturedVertex; 4])>,
    fractal: FractalSlot,
}

impl Default for Session {
    fn default() -> Self {
        Self::from_valid_config(EngineConfig::default())
    }
}

impl Session {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: EngineConfig) -> Self {
        let screen = ScreenRangeConverter::new(config.standard_range, 0.0, 0.0);
        Self {
            config,
            screen,
            background: Color::black(),
            drawables: Vec::new(),
            renderer: None,
            points: Vec::new(),
            circles: Vec::new(),
            quads: Vec::new(),
            fractal: FractalSlot::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn screen(&self) -> &ScreenRangeConverter {
        &self.screen
    }

    pub fn range(&self) -> Range2D {
        self.screen.range2d()
    }

    /// Replace the world window, keeping the raster size.
    pub fn set_range(&mut self, range: Range2D) {
        self.screen.set_range(range);
        self.screen.resize(self.screen.width, self.screen.height);
    }

    // ─── Host entry points ───────────────────────────────────────

    /// The drawing surface changed size.
    ///
    /// A background fractal computed for the old raster is superseded and
    /// started again at the new size; the new job id is returned.
    pub fn on_resize(&mut self, width: u32, height: u32) -> Result<Option<JobId>> {
        let (width, height) = (width as f64, height as f64);
        let changed = width != self.screen.width || height != self.screen.height;
        log::debug!("resize to {width}x{height}");
        self.screen.resize(width, height);

        let kind = self.fractal.kind;
        if !(changed && kind.is_background()) {
            return Ok(None);
        }
        log::info!("restarting {kind:?} for the {width}x{height} raster");
        let params = self.fractal.params.clone();
        self.start_fractal(kind, params)
    }

    /// Repaint everything onto `canvas`; returns the number of primitives drawn.
    ///
    /// Gaps in traced curves are not errors. A 3D primitive whose dimension
    /// does not match the camera aborts the draw.
    pub fn draw<C: Canvas2D + ?Sized>(&mut self, canvas: &mut C) -> Result<usize> {
        canvas.erase();
        canvas.fill_background(&self.background);
        let range = self.range();

        let mut drawn = 0;
        for (image, quad) in &self.quads {
            if draw_textured_quad(canvas, image, quad) {
                drawn += 1;
            }
        }
        for drawable in &self.drawables {
            drawn += drawable.draw(canvas, &range);
        }

        let kind = self.fractal.kind;
        drawn += match kind {
            FractalKind::SierpinskiTriangle => SierpinskiTriangle::new(&range).draw(canvas),
            FractalKind::FernLine => FernLine::default().draw(canvas),
            FractalKind::BarnsleyFern | FractalKind::Ifs | FractalKind::Mandelbrot => {
                self.pump_fractal(usize::MAX);
                for msg in &self.fractal.received {
                    draw_message(canvas, &self.fractal.screen, msg);
                }
                self.fractal.received.len()
            }
            FractalKind::None => 0,
        };

        if let Some(renderer) = &self.renderer {
            for p in &self.points {
                renderer.draw_colored_point(canvas, p)?;
            }
            for c in &self.circles {
                renderer.draw_circle(canvas, c)?;
            }
            drawn += self.points.len() + self.circles.len();
        }
        Ok(drawn)
    }

    /// Show `kind`, replacing whatever fractal was shown before.
    ///
    /// Background kinds start a job and return its id. When threads are not
    /// available the generator runs to completion before this returns.
    pub fn start_fractal(&mut self, kind: FractalKind, params: FractalParams) -> Result<Option<JobId>> {
        if kind == FractalKind::None {
            return Err(MathVizError::InvalidConfig("unknown fractal".into()));
        }
        // an invalid request leaves the current fractal in place
        let generator = if kind.is_background() {
            Some(kind.create(&self.config, &params, &self.screen)?)
        } else {
            None
        };
        let range = kind.display_range(&self.config, &params, &self.screen);
        self.set_range(range);
        self.fractal.engine.cancel();
        self.fractal.received.clear();
        self.fractal.kind = kind;
        self.fractal.screen = self.screen;
        self.fractal.params = params.clone();

        let Some(generator) = generator else {
            return Ok(None);
        };
        let id = match self.fractal.engine.start(generator, kind.timeout(&self.config)) {
            Ok(id) => id,
            Err(MathVizError::UnsupportedFeature(feature)) => {
                log::warn!("{feature} unavailable, generating {kind:?} inline");
                let generator = kind.create(&self.config, &params, &self.screen)?;
                self.fractal.engine.run_blocking(generator)
            }
            Err(e) => return Err(e),
        };
        Ok(Some(id))
    }

    /// Stop the running fractal job, if any. What was already received stays drawn.
    pub fn cancel_fractal(&mut self) -> Option<JobId> {
        self.fractal.engine.cancel()
    }

    /// Segments of `expression` across `range` (the current window when `None`).
    pub fn trace_curve(&self, expression: &str, range: Option<Range2D>) -> Result<Vec<Segment>> {
        let range = range.unwrap_or_else(|| self.range());
        let drawable = Drawable::from_expression(expression, DrawableKind::Curve, Color::white())?
            .with_x_increment(self.config.draw_increment);
        Ok(drawable.trace(&range))
    }

    // ─── Fractal results ─────────────────────────────────────────

    /// Collect up to `max` new results from the active job and return them.
    /// They are also kept so the next `draw` repaints them.
    pub fn pump_fractal(&mut self, max: usize) -> Vec<FractalMessage> {
        let fresh = self.fractal.engine.poll(max);
        self.fractal.received.extend(fresh.iter().cloned());
        fresh
    }

    pub fn fractal_kind(&self) -> FractalKind {
        self.fractal.kind
    }

    pub fn fractal_job(&self) -> Option<JobId> {
        self.fractal.engine.active_id()
    }

    pub fn fractal_status(&self) -> Option<JobStatus> {
        self.fractal.engine.status()
    }

    pub fn fractal_results(&self) -> &[FractalMessage] {
        &self.fractal.received
    }

    /// Block until the active job ends, keeping everything it produced.
    pub fn wait_for_fractal(&mut self) -> Option<JobStatus> {
        let rest = self.fractal.engine.wait();
        self.fractal.received.extend(rest);
        self.fractal.engine.status()
    }

    // ─── Functions ───────────────────────────────────────────────

    pub fn add_drawable(&mut self, drawable: Drawable) -> usize {
        self.drawables.push(drawable);
        self.drawables.len() - 1
    }

    /// Parse and plot `expression`; returns its index.
    pub fn add_curve(&mut self, expression: &str, kind: DrawableKind, color: Color) -> Result<usize> {
        let drawable = Drawable::from_expression(expression, kind, color)?.with_x_increment(self.config.draw_increment);
        Ok(self.add_drawable(drawable))
    }

    /// Drawable kind for a UI name, using the configured derivative step.
    pub fn drawable_kind(&self, name: &str) -> Result<DrawableKind> {
        let delta = self.config.derivative_step;
        match name {
            "curve" => Ok(DrawableKind::Curve),
            "derivative1" => Ok(DrawableKind::Derivative1 { delta }),
            "derivative2" => Ok(DrawableKind::Derivative2 { delta }),
            "integral" => Ok(DrawableKind::Integral { delta: DEFAULT_INTEGRAL_DELTA, lower_bound: None }),
            other => Err(MathVizError::InvalidConfig(format!("unknown drawable kind `{other}`"))),
        }
    }

    pub fn remove_drawable(&mut self, index: usize) -> Option<Drawable> {
        (index < self.drawables.len()).then(|| self.drawables.remove(index))
    }

    pub fn clear_drawables(&mut self) {
        self.drawables.clear();
    }

    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    /// Definite integral of `expression` over `[a, b]` at the configured step.
    pub fn integrate(&self, expression: &str, a: f64, b: f64) -> Result<CalculusResult> {
        let drawable = Drawable::from_expression(expression, DrawableKind::Curve, Color::white())?;
        Ok(IntegralEstimator::new(self.config.derivative_step).estimate(drawable.function.as_ref(), a, b))
    }

    // ─── 3D scene ────────────────────────────────────────────────

    pub fn set_camera(&mut self, camera: &ViewMatrixBuilder) {
        self.renderer = Some(Renderer3D::new(camera.projector()));
    }

    pub fn add_point3d(&mut self, point: ColoredPoint) {
        self.points.push(point);
    }

    pub fn add_circle3d(&mut self, circle: Circle) {
        self.circles.push(circle);
    }

    /// Paint `image` through a quad given in world coordinates on every draw.
    pub fn add_textured_quad(&mut self, image: TextureRef, quad: [TexturedVertex; 4]) {
        self.quads.push((image, quad));
    }

    pub fn clear_scene(&mut self) {
        self.points.clear();
        self.circles.clear();
        self.quads.clear();
    }
}

/// Escape-time pixels go back through the job's pixel mapping; IFS points are already in world space.
fn draw_message<C: Canvas2D + ?Sized>(canvas: &mut C, screen: &ScreenRangeConverter, msg: &FractalMessage) {
    match msg {
        FractalMessage::Pixel { x, y, color, .. } => {
            let (wx, wy) = screen.screen_to_world(*x as f64, *y as f64);
            canvas.draw_point(wx, wy, color);
        }
        FractalMessage::Point { elements, color, .. } => {
            if let [x, y, ..] = elements.as_slice() {
                canvas.draw_point(*x, *y, color);
            }
        }
    }
}
