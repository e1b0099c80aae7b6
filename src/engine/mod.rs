/// Rendering engine: camera, canvas seam, fractal jobs and the host session.

pub mod camera;
pub mod canvas;
pub mod job;
pub mod session;
pub mod types;
pub mod wire;

pub use camera::{Projector, Renderer3D, ViewMatrixBuilder};
pub use canvas::{Canvas2D, RecordingCanvas};
pub use job::{CancelToken, FractalEngine, JobId, JobStatus};
pub use session::Session;
pub use types::{Circle, Color, ColoredPoint, DrawCommand, Pixel};
pub use wire::FractalMessage;
