//! Mapping from Rust scalar types to [`DType`].

use std::fmt::Debug;
use std::ops::{Add, Mul};

use half::{bf16, f16};
use num_complex::{Complex32, Complex64};

use crate::dtype::DType;

/// Scalar types that can be stored in a [`DenseMatrix`](crate::DenseMatrix)
/// or as the values of a [`CsrMatrix`](crate::CsrMatrix).
///
/// Only the ring operations needed by a multiply-accumulate are required.
pub trait Element:
    Copy + Send + Sync + Debug + PartialEq + 'static + Add<Output = Self> + Mul<Output = Self>
{
    /// The runtime dtype tag for this type.
    const DTYPE: DType;

    /// Additive identity, used to clear accumulators and to detect
    /// `beta == 0`.
    fn zero() -> Self;
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn zero() -> Self {
        0.0
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    #[inline]
    fn zero() -> Self {
        0.0
    }
}

impl Element for f16 {
    const DTYPE: DType = DType::F16;

    #[inline]
    fn zero() -> Self {
        f16::ZERO
    }
}

impl Element for bf16 {
    const DTYPE: DType = DType::BF16;

    #[inline]
    fn zero() -> Self {
        bf16::ZERO
    }
}

impl Element for Complex32 {
    const DTYPE: DType = DType::Complex64;

    #[inline]
    fn zero() -> Self {
        Complex32::new(0.0, 0.0)
    }
}

impl Element for Complex64 {
    const DTYPE: DType = DType::Complex128;

    #[inline]
    fn zero() -> Self {
        Complex64::new(0.0, 0.0)
    }
}
