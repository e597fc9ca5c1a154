//! Host SpMM kernels.

use spmm_tensor::Element;

use crate::descriptor::DenseDescriptor;
use crate::error::Result;
use crate::layout::{DenseLayout, Operation};
use crate::primitive::SpmmArgs;

/// Position of `(row, col)` relative to the descriptor's offset.
fn position(layout: DenseLayout, ld: usize, row: usize, col: usize) -> usize {
    match layout {
        DenseLayout::RowMajor => row * ld + col,
        DenseLayout::ColumnMajor => row + col * ld,
    }
}

/// Number of storage elements from the offset to the last element.
fn span<T: Element>(d: &DenseDescriptor<T>) -> usize {
    if d.rows() == 0 || d.cols() == 0 {
        return 0;
    }
    position(d.layout(), d.ld(), d.rows() - 1, d.cols() - 1) + 1
}

/// `C = alpha * A @ op(B) + beta * C` over descriptor views.
///
/// Dense operands are addressed only through their descriptor's layout and
/// leading dimension. `B` is copied out before `C` is locked, so the operands
/// may share storage. With `beta == 0` the previous contents of `C` are not
/// read.
pub fn spmm_descriptors<T: Element>(args: &SpmmArgs<T>) -> Result<()> {
    let b = &args.b;
    let b_data: Vec<T> = {
        let data = b.matrix().storage().read()?;
        let start = b.matrix().offset();
        data[start..start + span(b)].to_vec()
    };
    let transpose_b = args.op_b == Operation::Transpose;
    let b_at = |p: usize, j: usize| {
        let (row, col) = if transpose_b { (j, p) } else { (p, j) };
        b_data[position(b.layout(), b.ld(), row, col)]
    };

    let c = &args.c;
    let n = c.cols();
    let base = c.matrix().offset();
    let zero = T::zero();
    let mut acc = vec![zero; n];
    let mut data = c.matrix().storage().write()?;

    for i in 0..args.a.rows() {
        acc.fill(zero);
        for (p, v) in args.a.row(i) {
            for (j, slot) in acc.iter_mut().enumerate() {
                *slot = *slot + v * b_at(p, j);
            }
        }
        for (j, &sum) in acc.iter().enumerate() {
            let pos = base + position(c.layout(), c.ld(), i, j);
            let scaled = args.alpha * sum;
            data[pos] = if args.beta == zero {
                scaled
            } else {
                scaled + args.beta * data[pos]
            };
        }
    }
    Ok(())
}

/// Column-major CSR × dense kernel on raw arrays.
///
/// `b` is `k x n` with leading dimension `ldb`, `c` is `m x n` with leading
/// dimension `ldc`; both column-major.
#[allow(clippy::too_many_arguments)]
pub fn csrmm_column_major<T: Element>(
    m: usize,
    n: usize,
    alpha: T,
    row_pointers: &[i32],
    column_indices: &[i32],
    values: &[T],
    b: &[T],
    ldb: usize,
    beta: T,
    c: &mut [T],
    ldc: usize,
) {
    let zero = T::zero();
    for j in 0..n {
        for i in 0..m {
            let start = row_pointers[i] as usize;
            let end = row_pointers[i + 1] as usize;
            let mut sum = zero;
            for e in start..end {
                let p = column_indices[e] as usize;
                sum = sum + values[e] * b[p + j * ldb];
            }
            let pos = i + j * ldc;
            c[pos] = if beta == zero {
                alpha * sum
            } else {
                alpha * sum + beta * c[pos]
            };
        }
    }
}
