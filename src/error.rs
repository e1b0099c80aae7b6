/// Error type shared by every module in the crate.
///
/// Only conditions that must abort a call live here. Evaluation failures of
/// user functions are absorbed by the calculus layer, and cancellation or
/// timeout of a fractal job is reported as a `JobStatus`, not an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MathVizError {
    /// Matrix product or transform with incompatible shapes.
    #[error("dimension mismatch in {operation}: left is {left:?}, right is {right:?}")]
    DimensionMismatch {
        operation: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("index ({row}, {column}) out of range for a {rows}x{columns} matrix")]
    IndexOutOfRange {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },

    /// Expression text could not be parsed.
    #[error("parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("unknown variable or function `{0}`")]
    UnknownVariable(String),

    /// The host cannot provide a capability the core needs (e.g. threads on wasm32).
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, MathVizError>;
