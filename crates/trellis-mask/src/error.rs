use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaskError {
    #[error("no mask loaded")]
    NotLoaded,

    #[error("dimension mismatch for {width}x{height}: expected {expected} bytes, got {actual}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
}

pub type Result<T> = std::result::Result<T, MaskError>;
