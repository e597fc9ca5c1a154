use thiserror::Error;

#[derive(Error, Debug)]
pub enum TensorError {
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },
    #[error("expected at least 2 dimensions, got {0}")]
    NotAMatrix(usize),
    #[error("strides {strides:?} with offset {offset} reach element {max_index} but storage holds {len}")]
    OutOfBounds {
        strides: Vec<usize>,
        offset: usize,
        max_index: usize,
        len: usize,
    },
    #[error("stride rank {strides} does not match shape rank {dims}")]
    StrideRank { strides: usize, dims: usize },
    #[error("invalid CSR structure: {0}")]
    InvalidCsr(String),
    #[error("{what} value {value} does not fit in a 32-bit index")]
    IndexOverflow { what: &'static str, value: i64 },
    #[error("storage lock poisoned")]
    StoragePoisoned,
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TensorError>;
