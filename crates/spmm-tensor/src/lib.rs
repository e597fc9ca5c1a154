//! `spmm-tensor` - Matrix types for the spmm-runtime dispatch layer.
//!
//! This crate provides:
//! - A `DenseMatrix` over shared strided storage with layout queries
//! - A validated `CsrMatrix` with checked 32-bit index narrowing
//! - The `Element` trait and `DType` tags for real, complex and 16-bit floats
//! - Shape and stride utilities

pub mod csr;
pub mod dense;
pub mod dtype;
pub mod element;
pub mod error;
pub mod shape;
pub mod storage;

// Re-export primary types at the crate root for convenience.
pub use csr::{CsrIndices32, CsrMatrix, IndexWidth};
pub use dense::DenseMatrix;
pub use dtype::DType;
pub use element::Element;
pub use error::{Result, TensorError};
pub use shape::Shape;
pub use storage::Storage;
