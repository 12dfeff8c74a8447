// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pattern-specific iteration kernels and the dispatcher.
//!
//! Each kernel walks the output exactly once, parallelised over its
//! outermost axis (channels for 3-D/4-D, rows for 2-D). The inner loops
//! decompose into a handful of run primitives over contiguous float runs;
//! on `aarch64` those primitives process four lanes at a time with a
//! scalar tail, selected at compile time.
//!
//! The dispatcher is a single match from [`BinaryOpKind`] to a
//! monomorphized generic kernel, so every (pattern × operation) pair
//! inlines its functor without a combinatorial kernel table.

use crate::broadcast::{squeeze_inner, BroadcastPattern};
use crate::op::{
    BinaryFunctor, BinaryOpKind, OpAdd, OpDiv, OpMax, OpMin, OpMul, OpPow, OpRdiv, OpRpow,
    OpRsub, OpSub,
};
use crate::parallel::parallel_chunks_mut;
use mat_core::{Mat, MatView, Options};

// ── Run primitives ─────────────────────────────────────────────

/// `out[i] = op(a[i], b[i])` over equal-length runs.
#[inline]
fn run_binary<Op: BinaryFunctor>(a: &[f32], b: &[f32], out: &mut [f32]) {
    #[cfg(target_arch = "aarch64")]
    {
        unsafe { neon::run_binary::<Op>(a, b, out) }
    }
    #[cfg(not(target_arch = "aarch64"))]
    {
        for ((o, &x), &y) in out.iter_mut().zip(a.iter()).zip(b.iter()) {
            *o = Op::apply(x, y);
        }
    }
}

/// `out[i] = op(a[i], b0)` with a single broadcast value.
#[inline]
fn run_scalar<Op: BinaryFunctor>(a: &[f32], b0: f32, out: &mut [f32]) {
    #[cfg(target_arch = "aarch64")]
    {
        unsafe { neon::run_scalar::<Op>(a, b0, out) }
    }
    #[cfg(not(target_arch = "aarch64"))]
    {
        for (o, &x) in out.iter_mut().zip(a.iter()) {
            *o = Op::apply(x, b0);
        }
    }
}

/// `data[i] = op(data[i], b0)` in place.
#[inline]
fn run_scalar_inplace<Op: BinaryFunctor>(data: &mut [f32], b0: f32) {
    #[cfg(target_arch = "aarch64")]
    {
        unsafe { neon::run_scalar_inplace::<Op>(data, b0) }
    }
    #[cfg(not(target_arch = "aarch64"))]
    {
        for x in data.iter_mut() {
            *x = Op::apply(*x, b0);
        }
    }
}

/// Tiles a broadcast cell across the run.
///
/// When `cell` carries one packed element of `k` lanes it is applied
/// lane-for-lane to every logical element of `a`; otherwise its single
/// float is splat across all lanes.
#[inline]
fn run_cell<Op: BinaryFunctor>(a: &[f32], cell: &[f32], k: usize, out: &mut [f32]) {
    if k <= 1 || cell.len() != k {
        run_scalar::<Op>(a, cell[0], out);
        return;
    }
    #[cfg(target_arch = "aarch64")]
    if k == 4 {
        unsafe { neon::run_cell4::<Op>(a, cell, out) }
        return;
    }
    for (oc, ac) in out.chunks_exact_mut(k).zip(a.chunks_exact(k)) {
        for ((o, &x), &v) in oc.iter_mut().zip(ac.iter()).zip(cell.iter()) {
            *o = Op::apply(x, v);
        }
    }
}

/// `out` and `a` hold `b.len()` logical elements of `k` lanes each; every
/// `b[j]` is splat across the `k` lanes of element `j`.
#[inline]
fn run_stretch<Op: BinaryFunctor>(a: &[f32], b: &[f32], k: usize, out: &mut [f32]) {
    if k == 1 {
        run_binary::<Op>(a, b, out);
        return;
    }
    for ((oc, ac), &v) in out
        .chunks_exact_mut(k)
        .zip(a.chunks_exact(k))
        .zip(b.iter())
    {
        for (o, &x) in oc.iter_mut().zip(ac.iter()) {
            *o = Op::apply(x, v);
        }
    }
}

#[cfg(target_arch = "aarch64")]
mod neon {
    //! NEON forms of the run primitives: four lanes per step, scalar tail.
    //!
    //! Lane and scalar forms agree bit-for-bit (the pow functors route
    //! their lanes through scalar `powf`), so target selection never
    //! changes results.

    use crate::op::BinaryFunctor;
    use std::arch::aarch64::*;

    pub(super) unsafe fn run_binary<Op: BinaryFunctor>(a: &[f32], b: &[f32], out: &mut [f32]) {
        let n = out.len();
        let mut i = 0;
        while i + 4 <= n {
            let x = vld1q_f32(a.as_ptr().add(i));
            let y = vld1q_f32(b.as_ptr().add(i));
            vst1q_f32(out.as_mut_ptr().add(i), Op::apply_lane(x, y));
            i += 4;
        }
        while i < n {
            out[i] = Op::apply(a[i], b[i]);
            i += 1;
        }
    }

    pub(super) unsafe fn run_scalar<Op: BinaryFunctor>(a: &[f32], b0: f32, out: &mut [f32]) {
        let n = out.len();
        let y = vdupq_n_f32(b0);
        let mut i = 0;
        while i + 4 <= n {
            let x = vld1q_f32(a.as_ptr().add(i));
            vst1q_f32(out.as_mut_ptr().add(i), Op::apply_lane(x, y));
            i += 4;
        }
        while i < n {
            out[i] = Op::apply(a[i], b0);
            i += 1;
        }
    }

    pub(super) unsafe fn run_scalar_inplace<Op: BinaryFunctor>(data: &mut [f32], b0: f32) {
        let n = data.len();
        let y = vdupq_n_f32(b0);
        let mut i = 0;
        while i + 4 <= n {
            let x = vld1q_f32(data.as_ptr().add(i));
            vst1q_f32(data.as_mut_ptr().add(i), Op::apply_lane(x, y));
            i += 4;
        }
        while i < n {
            data[i] = Op::apply(data[i], b0);
            i += 1;
        }
    }

    /// Packed-cell broadcast for the native lane width.
    pub(super) unsafe fn run_cell4<Op: BinaryFunctor>(a: &[f32], cell: &[f32], out: &mut [f32]) {
        let n = out.len();
        let y = vld1q_f32(cell.as_ptr());
        let mut i = 0;
        while i + 4 <= n {
            let x = vld1q_f32(a.as_ptr().add(i));
            vst1q_f32(out.as_mut_ptr().add(i), Op::apply_lane(x, y));
            i += 4;
        }
        while i < n {
            out[i] = Op::apply(a[i], cell[i % 4]);
            i += 1;
        }
    }
}

// ── Pattern walks ──────────────────────────────────────────────

/// Outer-loop granularity for the flat walks: one channel for 3-D/4-D,
/// one row otherwise.
fn flat_chunk_len(dims: usize, cstep: usize, row_step: usize) -> usize {
    if dims >= 3 {
        cstep
    } else {
        row_step
    }
}

/// Scalar walk: every element of A against one immediate value.
fn kernel_scalar<Op: BinaryFunctor>(a: &Mat, b0: f32, c: &mut Mat, opt: &Options) {
    let chunk = flat_chunk_len(a.dims(), a.cstep(), a.w() * a.elempack());
    parallel_chunks_mut(c.as_mut_slice(), chunk, opt.num_threads, |i, out| {
        let off = i * chunk;
        run_scalar::<Op>(&a.as_slice()[off..off + out.len()], b0, out);
    });
}

/// Scalar walk, in place.
fn kernel_scalar_inplace<Op: BinaryFunctor>(m: &mut Mat, b0: f32, opt: &Options) {
    let chunk = flat_chunk_len(m.dims(), m.cstep(), m.w() * m.elempack());
    parallel_chunks_mut(m.as_mut_slice(), chunk, opt.num_threads, |_i, data| {
        run_scalar_inplace::<Op>(data, b0);
    });
}

/// Identical geometry, pure elementwise walk.
fn kernel_elementwise<Op: BinaryFunctor>(a: &Mat, b: &Mat, c: &mut Mat, opt: &Options) {
    let chunk = flat_chunk_len(a.dims(), a.cstep(), a.w() * a.elempack());
    parallel_chunks_mut(c.as_mut_slice(), chunk, opt.num_threads, |i, out| {
        let off = i * chunk;
        run_binary::<Op>(
            &a.as_slice()[off..off + out.len()],
            &b.as_slice()[off..off + out.len()],
            out,
        );
    });
}

/// Inner-axis broadcast: five sub-walks keyed by (A.dims, B.dims), with B
/// already squeezed to its reduced rank.
fn kernel_inner<Op: BinaryFunctor>(a: &Mat, b: &MatView<'_>, c: &mut Mat, opt: &Options) {
    let k = a.elempack();
    let ep = b.elempack();
    match (a.dims(), b.dims()) {
        (2, 1) => {
            // Each B element covers one row of A.
            let row_len = a.w() * k;
            parallel_chunks_mut(c.as_mut_slice(), row_len, opt.num_threads, |y, out| {
                run_cell::<Op>(a.row(y), b.cell(y), k, out);
            });
        }
        (3, 1) | (4, 1) => {
            // Each B element covers one full channel of A.
            let step = a.cstep();
            parallel_chunks_mut(c.as_mut_slice(), step, opt.num_threads, |q, out| {
                run_cell::<Op>(a.channel(q), b.cell(q), k, out);
            });
        }
        (3, 2) => {
            // B[q, y] covers row y of channel q.
            let step = a.cstep();
            let row_len = a.w() * k;
            parallel_chunks_mut(c.as_mut_slice(), step, opt.num_threads, |q, out| {
                let ach = a.channel(q);
                let brow = b.row(q);
                for (y, (oc, ar)) in out
                    .chunks_exact_mut(row_len)
                    .zip(ach.chunks_exact(row_len))
                    .enumerate()
                {
                    run_cell::<Op>(ar, &brow[y * ep..(y + 1) * ep], k, oc);
                }
            });
        }
        (4, 2) => {
            // B[q, z] covers the (h·w) plane at depth z of channel q.
            let step = a.cstep();
            let plane_len = a.w() * a.h() * k;
            parallel_chunks_mut(c.as_mut_slice(), step, opt.num_threads, |q, out| {
                let ach = a.channel(q);
                let brow = b.row(q);
                for (z, (oc, ar)) in out
                    .chunks_exact_mut(plane_len)
                    .zip(ach.chunks_exact(plane_len))
                    .enumerate()
                {
                    run_cell::<Op>(ar, &brow[z * ep..(z + 1) * ep], k, oc);
                }
            });
        }
        (4, 3) => {
            // B[q, z, y] covers row y at depth z; walking A's rows in
            // storage order advances B's per-channel cursor by one row per
            // step, i.e. index z·h + y.
            let step = a.cstep();
            let row_len = a.w() * k;
            parallel_chunks_mut(c.as_mut_slice(), step, opt.num_threads, |q, out| {
                let ach = a.channel(q);
                let bch = b.channel(q);
                for (i, (oc, ar)) in out
                    .chunks_exact_mut(row_len)
                    .zip(ach.chunks_exact(row_len))
                    .enumerate()
                {
                    run_cell::<Op>(ar, &bch[i * ep..(i + 1) * ep], k, oc);
                }
            });
        }
        _ => {}
    }
}

/// Outer-axis broadcast: B covers the width and is repeated along the outer
/// axes, clamping depth and row lookups to B's extents.
fn kernel_outer<Op: BinaryFunctor>(a: &Mat, b: &Mat, c: &mut Mat, opt: &Options) {
    let k = a.elempack();
    if a.dims() == 2 {
        // One flat length-w vector, tiled along h.
        let row_len = a.w() * k;
        parallel_chunks_mut(c.as_mut_slice(), row_len, opt.num_threads, |y, out| {
            run_stretch::<Op>(a.row(y), b.as_slice(), k, out);
        });
        return;
    }

    let step = a.cstep();
    let (h, d) = (a.h(), a.d());
    let row_len = a.w() * k;
    let (bw, bh, bd) = (b.w(), b.h(), b.d());
    parallel_chunks_mut(c.as_mut_slice(), step, opt.num_threads, |q, out| {
        let ach = a.channel(q);
        let bs = b.as_slice();
        for z in 0..d {
            let z1 = z.min(bd - 1);
            for y in 0..h {
                let y1 = y.min(bh - 1);
                let boff = (z1 * bh + y1) * bw;
                let brow = &bs[boff..boff + bw];
                let off = (z * h + y) * row_len;
                run_stretch::<Op>(&ach[off..off + row_len], brow, k, &mut out[off..off + row_len]);
            }
        }
    });
}

/// Shared-row broadcast: both 3-D, B has one row per channel that every
/// output row reuses.
fn kernel_shared_row<Op: BinaryFunctor>(a: &Mat, b: &Mat, c: &mut Mat, opt: &Options) {
    let k = a.elempack();
    let step = a.cstep();
    let row_len = a.w() * k;
    let b_packed = b.elempack() == k;
    parallel_chunks_mut(c.as_mut_slice(), step, opt.num_threads, |q, out| {
        let ach = a.channel(q);
        let bch = b.channel(q);
        for (oc, ar) in out.chunks_exact_mut(row_len).zip(ach.chunks_exact(row_len)) {
            if b_packed {
                run_binary::<Op>(ar, bch, oc);
            } else {
                run_stretch::<Op>(ar, bch, k, oc);
            }
        }
    });
}

// ── Dispatch ───────────────────────────────────────────────────

fn exec<Op: BinaryFunctor>(
    pattern: BroadcastPattern,
    a: &Mat,
    b: &Mat,
    c: &mut Mat,
    opt: &Options,
) {
    match pattern {
        BroadcastPattern::Scalar => kernel_scalar::<Op>(a, b.as_slice()[0], c, opt),
        BroadcastPattern::Elementwise => kernel_elementwise::<Op>(a, b, c, opt),
        BroadcastPattern::InnerAxis => {
            let bv = squeeze_inner(b);
            kernel_inner::<Op>(a, &bv, c, opt);
        }
        BroadcastPattern::OuterAxis => kernel_outer::<Op>(a, b, c, opt),
        BroadcastPattern::SharedRow => kernel_shared_row::<Op>(a, b, c, opt),
        BroadcastPattern::Unsupported => {}
    }
}

/// Selects the monomorphized kernel for `(op, pattern)` and runs it.
pub(crate) fn dispatch_binary(
    op: BinaryOpKind,
    pattern: BroadcastPattern,
    a: &Mat,
    b: &Mat,
    c: &mut Mat,
    opt: &Options,
) {
    match op {
        BinaryOpKind::Add => exec::<OpAdd>(pattern, a, b, c, opt),
        BinaryOpKind::Sub => exec::<OpSub>(pattern, a, b, c, opt),
        BinaryOpKind::Mul => exec::<OpMul>(pattern, a, b, c, opt),
        BinaryOpKind::Div => exec::<OpDiv>(pattern, a, b, c, opt),
        BinaryOpKind::Max => exec::<OpMax>(pattern, a, b, c, opt),
        BinaryOpKind::Min => exec::<OpMin>(pattern, a, b, c, opt),
        BinaryOpKind::Pow => exec::<OpPow>(pattern, a, b, c, opt),
        BinaryOpKind::Rsub => exec::<OpRsub>(pattern, a, b, c, opt),
        BinaryOpKind::Rdiv => exec::<OpRdiv>(pattern, a, b, c, opt),
        BinaryOpKind::Rpow => exec::<OpRpow>(pattern, a, b, c, opt),
    }
}

/// Runs the scalar walk against an immediate value.
pub(crate) fn dispatch_scalar(op: BinaryOpKind, a: &Mat, b0: f32, c: &mut Mat, opt: &Options) {
    match op {
        BinaryOpKind::Add => kernel_scalar::<OpAdd>(a, b0, c, opt),
        BinaryOpKind::Sub => kernel_scalar::<OpSub>(a, b0, c, opt),
        BinaryOpKind::Mul => kernel_scalar::<OpMul>(a, b0, c, opt),
        BinaryOpKind::Div => kernel_scalar::<OpDiv>(a, b0, c, opt),
        BinaryOpKind::Max => kernel_scalar::<OpMax>(a, b0, c, opt),
        BinaryOpKind::Min => kernel_scalar::<OpMin>(a, b0, c, opt),
        BinaryOpKind::Pow => kernel_scalar::<OpPow>(a, b0, c, opt),
        BinaryOpKind::Rsub => kernel_scalar::<OpRsub>(a, b0, c, opt),
        BinaryOpKind::Rdiv => kernel_scalar::<OpRdiv>(a, b0, c, opt),
        BinaryOpKind::Rpow => kernel_scalar::<OpRpow>(a, b0, c, opt),
    }
}

/// Runs the scalar walk in place against an immediate value.
pub(crate) fn dispatch_scalar_inplace(op: BinaryOpKind, m: &mut Mat, b0: f32, opt: &Options) {
    match op {
        BinaryOpKind::Add => kernel_scalar_inplace::<OpAdd>(m, b0, opt),
        BinaryOpKind::Sub => kernel_scalar_inplace::<OpSub>(m, b0, opt),
        BinaryOpKind::Mul => kernel_scalar_inplace::<OpMul>(m, b0, opt),
        BinaryOpKind::Div => kernel_scalar_inplace::<OpDiv>(m, b0, opt),
        BinaryOpKind::Max => kernel_scalar_inplace::<OpMax>(m, b0, opt),
        BinaryOpKind::Min => kernel_scalar_inplace::<OpMin>(m, b0, opt),
        BinaryOpKind::Pow => kernel_scalar_inplace::<OpPow>(m, b0, opt),
        BinaryOpKind::Rsub => kernel_scalar_inplace::<OpRsub>(m, b0, opt),
        BinaryOpKind::Rdiv => kernel_scalar_inplace::<OpRdiv>(m, b0, opt),
        BinaryOpKind::Rpow => kernel_scalar_inplace::<OpRpow>(m, b0, opt),
    }
}
