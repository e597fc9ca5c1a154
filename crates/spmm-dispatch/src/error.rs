use std::fmt;

use thiserror::Error;

/// Status codes reported by an SpMM primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveStatus {
    NotSupported,
    InvalidValue,
    InsufficientWorkspace,
    ExecutionFailed,
}

impl fmt::Display for PrimitiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveStatus::NotSupported => write!(f, "not supported"),
            PrimitiveStatus::InvalidValue => write!(f, "invalid value"),
            PrimitiveStatus::InsufficientWorkspace => write!(f, "insufficient workspace"),
            PrimitiveStatus::ExecutionFailed => write!(f, "execution failed"),
        }
    }
}

/// Which step of the two-step primitive protocol failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveStage {
    BufferSize,
    Execute,
}

impl fmt::Display for PrimitiveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveStage::BufferSize => write!(f, "buffer size query"),
            PrimitiveStage::Execute => write!(f, "execute"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SpmmError {
    #[error("tensor error: {0}")]
    Tensor(#[from] spmm_tensor::TensorError),
    #[error("addmm shape mismatch: A[{m}x{k}] @ B[{k2}x{n}] -> C{c:?}")]
    ShapeMismatch {
        m: usize,
        k: usize,
        k2: usize,
        n: usize,
        c: Vec<usize>,
    },
    #[error("SpMM primitive {stage} failed: {status}")]
    Primitive {
        stage: PrimitiveStage,
        status: PrimitiveStatus,
    },
    #[error("scratch allocation of {requested} bytes exceeds limit of {limit} bytes")]
    AllocationFailed { requested: usize, limit: usize },
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("stream fault: {0}")]
    StreamFault(String),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SpmmError>;
