use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("spread must be positive on both axes, got ({0}, {1})")]
    InvalidSpread(f32, f32),

    #[error("prior scale must be positive, got {0}")]
    InvalidScale(f32),

    #[error("step radius must be positive, got {0}")]
    InvalidRadius(f32),

    #[error("iteration budget must be positive")]
    InvalidIterations,

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("{name} map has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        name: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    #[error("frame dimensions must be non-zero")]
    EmptyFrame,
}
