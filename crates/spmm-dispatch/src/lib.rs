//! `spmm-dispatch` - Sparse × dense multiply-accumulate dispatch for spmm-runtime.
//!
//! Computes `C = alpha * A @ op(B) + beta * C` for a CSR matrix `A` and dense
//! strided `B`, `C` through a fixed-layout SpMM primitive:
//! - `normalize` makes dense operands BLAS-compatible, borrowing when it can
//! - `layout` decides whether `B` is handed over as its transpose view
//! - `generic` drives the two-step primitive protocol and the copy-back
//! - `legacy` is the column-major fallback for toolkits without the generic API
//! - `engine` selects one of the two once, from `SpmmConfig`

pub mod allocator;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod generic;
pub mod host;
pub mod layout;
pub mod legacy;
pub mod matmul;
pub mod normalize;
pub mod primitive;
pub mod stream;

pub use allocator::{AllocatorStats, CachingAllocator, ScratchBlock};
pub use config::{Capabilities, SpmmAlgorithm, SpmmConfig, ToolkitVersion};
pub use descriptor::{DenseDescriptor, SparseDescriptor, SparseIndices};
pub use engine::{SpmmEngine, SpmmPath};
pub use error::{PrimitiveStage, PrimitiveStatus, Result, SpmmError};
pub use generic::GenericSpmm;
pub use host::HostSpmm;
pub use layout::{decide_transpose, reconcile, DenseLayout, Operation, ReconciledPlan};
pub use legacy::LegacySpmm;
pub use matmul::{MatmulRequest, SparseDenseMatmul};
pub use normalize::{prepare_dense, Prepared};
pub use primitive::{SpmmArgs, SpmmPrimitive};
pub use stream::Stream;
