/// Math visualization core compiled to WebAssembly.
///
/// Linear algebra, coordinate mapping, a look-at camera, numerical calculus
/// with gap-aware curve tracing, and fractal generators that run as
/// cancellable background jobs. Everything is reached through a [`Session`]
/// (or [`WasmSession`] from JavaScript); the crate keeps no global state.

use wasm_bindgen::prelude::*;

pub mod calculus;
pub mod config;
pub mod engine;
pub mod error;
pub mod formulas;
pub mod lighting;
pub mod logging;
pub mod math;

pub use config::EngineConfig;
pub use engine::Session;
pub use error::{MathVizError, Result};

use calculus::Segment;
use engine::canvas::RecordingCanvas;
use engine::types::Color;
use formulas::{FractalKind, FractalParams};
use math::Range2D;

/// Initialize the WASM module (runs once on load).
#[wasm_bindgen(start)]
pub fn init() {
    logging::init();
}

#[inline]
fn js_error(e: MathVizError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// A session plus the canvas it records into, exported to JavaScript.
///
/// Drawing returns the recorded primitives as JSON; the page replays them
/// onto its own `CanvasRenderingContext2D`.
#[wasm_bindgen]
pub struct WasmSession {
    inner: Session,
    canvas: RecordingCanvas,
}

#[wasm_bindgen]
impl WasmSession {
    /// `config_json` may be omitted for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> std::result::Result<WasmSession, JsValue> {
        let config = match config_json {
            Some(json) => EngineConfig::from_json(&json).map_err(js_error)?,
            None => EngineConfig::default(),
        };
        let inner = Session::new(config).map_err(js_error)?;
        Ok(WasmSession { inner, canvas: RecordingCanvas::default() })
    }

    /// Build from a `Float64Array` laid out as in `EngineConfig::from_buffer`.
    #[wasm_bindgen(js_name = fromBuffer)]
    pub fn from_buffer(config: &[f64]) -> std::result::Result<WasmSession, JsValue> {
        let inner = Session::new(EngineConfig::from_buffer(config)).map_err(js_error)?;
        Ok(WasmSession { inner, canvas: RecordingCanvas::default() })
    }

    /// Returns the id of the background fractal job restarted for the new size.
    #[wasm_bindgen(js_name = onResize)]
    pub fn on_resize(&mut self, width: u32, height: u32) -> std::result::Result<Option<f64>, JsValue> {
        self.canvas.width = width;
        self.canvas.height = height;
        let id = self.inner.on_resize(width, height).map_err(js_error)?;
        Ok(id.map(|id| id as f64))
    }

    /// Repaint and return `{background, commands}` as JSON.
    pub fn draw(&mut self) -> std::result::Result<String, JsValue> {
        self.inner.draw(&mut self.canvas).map_err(js_error)?;
        let frame = serde_json::json!({
            "background": self.canvas.background,
            "commands": self.canvas.take_commands(),
        });
        Ok(frame.to_string())
    }

    /// Start a fractal by name. Returns the job id for background kinds.
    #[wasm_bindgen(js_name = startFractal)]
    pub fn start_fractal(&mut self, kind: &str, params_json: Option<String>) -> std::result::Result<Option<f64>, JsValue> {
        let params: FractalParams = match params_json {
            Some(json) => serde_json::from_str(&json).map_err(|e| js_error(e.into()))?,
            None => FractalParams::default(),
        };
        let id = self.inner.start_fractal(FractalKind::from_name(kind), params).map_err(js_error)?;
        Ok(id.map(|id| id as f64))
    }

    /// Start a fractal with parameters from a flat buffer (see `FractalParams::from_buffer`).
    #[wasm_bindgen(js_name = startFractalBuffer)]
    pub fn start_fractal_buffer(&mut self, kind: &str, params: &[f64]) -> std::result::Result<Option<f64>, JsValue> {
        let id = self
            .inner
            .start_fractal(FractalKind::from_name(kind), FractalParams::from_buffer(params))
            .map_err(js_error)?;
        Ok(id.map(|id| id as f64))
    }

    #[wasm_bindgen(js_name = cancelFractal)]
    pub fn cancel_fractal(&mut self) -> Option<f64> {
        self.inner.cancel_fractal().map(|id| id as f64)
    }

    /// New fractal results since the last call, as a JSON array of worker messages.
    #[wasm_bindgen(js_name = pollFractal)]
    pub fn poll_fractal(&mut self, max: u32) -> std::result::Result<String, JsValue> {
        let fresh = self.inner.pump_fractal(max as usize);
        serde_json::to_string(&fresh).map_err(|e| js_error(e.into()))
    }

    /// `"completed"`, `"cancelled"`, `"timedOut"`, `"failed"`, or nothing while running.
    #[wasm_bindgen(js_name = fractalStatus)]
    pub fn fractal_status(&self) -> Option<String> {
        let status = self.inner.fractal_status()?;
        serde_json::to_value(status).ok().and_then(|v| v.as_str().map(str::to_owned))
    }

    /// Segments of `expression` as JSON. `range` is `[x_min, x_max, y_min, y_max]`
    /// or empty for the current window.
    #[wasm_bindgen(js_name = traceCurve)]
    pub fn trace_curve(&self, expression: &str, range: &[f64]) -> std::result::Result<String, JsValue> {
        let segments = self.inner.trace_curve(expression, Range2D::from_buffer(range)).map_err(js_error)?;
        serde_json::to_string(&segments).map_err(|e| js_error(e.into()))
    }

    /// Segments of `expression` packed as `[x1, y1, x2, y2]` quadruples;
    /// a lone point repeats its coordinates.
    #[wasm_bindgen(js_name = traceCurveBuffer)]
    pub fn trace_curve_buffer(&self, expression: &str, range: &[f64]) -> std::result::Result<js_sys::Float64Array, JsValue> {
        let segments = self.inner.trace_curve(expression, Range2D::from_buffer(range)).map_err(js_error)?;
        Ok(js_sys::Float64Array::from(pack_segments(&segments).as_slice()))
    }

    /// Plot `expression`; `kind` is `curve`, `derivative1`, `derivative2` or `integral`.
    #[wasm_bindgen(js_name = addCurve)]
    pub fn add_curve(&mut self, expression: &str, kind: &str, color: &str) -> std::result::Result<u32, JsValue> {
        let kind = self.inner.drawable_kind(kind).map_err(js_error)?;
        let index = self.inner.add_curve(expression, kind, Color::new(color)).map_err(js_error)?;
        Ok(index as u32)
    }

    #[wasm_bindgen(js_name = clearCurves)]
    pub fn clear_curves(&mut self) {
        self.inner.clear_drawables();
    }

    /// All five sums of the integral over `[a, b]`, as JSON.
    pub fn integrate(&self, expression: &str, a: f64, b: f64) -> std::result::Result<String, JsValue> {
        let result = self.inner.integrate(expression, a, b).map_err(js_error)?;
        serde_json::to_string(&result).map_err(|e| js_error(e.into()))
    }
}

fn pack_segments(segments: &[Segment]) -> Vec<f64> {
    let mut out = Vec::with_capacity(segments.len() * 4);
    for s in segments {
        match *s {
            Segment::Line { x1, y1, x2, y2 } => out.extend_from_slice(&[x1, y1, x2, y2]),
            Segment::Point { x, y } => out.extend_from_slice(&[x, y, x, y]),
        }
    }
    out
}
