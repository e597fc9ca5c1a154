use std::fmt::Debug;

use spmm_tensor::{DType, Element};

use crate::allocator::ScratchBlock;
use crate::config::SpmmAlgorithm;
use crate::descriptor::{DenseDescriptor, SparseDescriptor};
use crate::error::PrimitiveStatus;
use crate::layout::Operation;
use crate::stream::Stream;

/// Arguments of one `C = alpha * op(A) @ op(B) + beta * C` call.
#[derive(Debug, Clone)]
pub struct SpmmArgs<T: Element> {
    pub op_a: Operation,
    pub op_b: Operation,
    pub alpha: T,
    pub beta: T,
    pub a: SparseDescriptor<T>,
    pub b: DenseDescriptor<T>,
    pub c: DenseDescriptor<T>,
    pub compute_type: DType,
    pub algorithm: SpmmAlgorithm,
}

/// A fixed-layout sparse × dense multiply-accumulate library.
///
/// Calls follow a two-step protocol: `buffer_size` reports the scratch space
/// the call needs, then `execute` is given a block of at least that size and
/// enqueues the work on `stream`. Both steps are mandatory and ordered.
/// Implementations only accept dense operand pairs that share a layout.
pub trait SpmmPrimitive: Send + Sync + Debug {
    /// Returns the name of this primitive (e.g., "host").
    fn name(&self) -> &str;

    /// Scratch bytes needed to execute `args`.
    fn buffer_size<T: Element>(&self, args: &SpmmArgs<T>) -> Result<usize, PrimitiveStatus>;

    /// Enqueue the multiply-accumulate on `stream`.
    ///
    /// A returned status means nothing was enqueued.
    fn execute<T: Element>(
        &self,
        stream: &Stream,
        args: SpmmArgs<T>,
        scratch: ScratchBlock,
    ) -> Result<(), PrimitiveStatus>;
}
