// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shape classification for the broadcasting dispatcher.
//!
//! Given two input tensors, [`classify`] picks the dominant operand, the
//! effective operation, and the iteration pattern the kernels will use.
//! [`squeeze_inner`] then collapses size-1 inner axes of the subordinate
//! operand so the inner-broadcast kernels see exactly the reduced rank they
//! expect.

use crate::BinaryOpKind;
use mat_core::{Mat, MatView};

/// The iteration strategy chosen for a shape pair.
///
/// Selection is ordered; the first matching pattern wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastPattern {
    /// B is a single element applied to every element of A.
    Scalar,
    /// A and B have identical geometry; pure elementwise walk.
    Elementwise,
    /// B's size-1 inner axes are collapsed and each B element covers a
    /// contiguous inner run of A.
    InnerAxis,
    /// B covers A's inner axes and is repeated along outer axes, with
    /// clamped depth/row lookup.
    OuterAxis,
    /// Both 3-D, same width and channels, B has a single row per channel
    /// that every row of A reuses.
    SharedRow,
    /// No kernel covers this pair; the forward call succeeds with the
    /// output left as freshly allocated.
    Unsupported,
}

impl BroadcastPattern {
    /// Returns a human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Elementwise => "elementwise",
            Self::InnerAxis => "inner_axis",
            Self::OuterAxis => "outer_axis",
            Self::SharedRow => "shared_row",
            Self::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for BroadcastPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classifier's verdict: dominant operand `a`, subordinate `b`, the
/// effective operation after a possible swap, and the chosen pattern.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BinaryPlan<'m> {
    pub a: &'m Mat,
    pub b: &'m Mat,
    pub op: BinaryOpKind,
    pub pattern: BroadcastPattern,
    pub swapped: bool,
}

/// True when the tensor holds exactly one float, packing included.
///
/// The packed form matters: a 1-element tensor with `elempack > 1` carries
/// several floats and must not take the scalar fast path.
fn is_single_element(m: &Mat) -> bool {
    m.total() * m.elempack() == 1
}

/// Classifies an input pair into a [`BinaryPlan`].
///
/// The operands are swapped when B outranks A (and is not a scalar), or
/// when ranks are equal and A holds fewer floats; the operation is then
/// replaced by its reverse so the dominant operand always drives the outer
/// parallel loop. This is the sole source of the reversed operations at
/// runtime.
pub(crate) fn classify<'m>(
    a0: &'m Mat,
    b0: &'m Mat,
    op: BinaryOpKind,
) -> BinaryPlan<'m> {
    let b_outranks_a = b0.dims() > a0.dims() && !is_single_element(b0);
    let a_is_smaller = a0.dims() == b0.dims() && a0.float_count() < b0.float_count();
    let swapped = b_outranks_a || a_is_smaller;

    let (a, b) = if swapped { (b0, a0) } else { (a0, b0) };
    let op = if swapped { op.reversed() } else { op };

    BinaryPlan {
        a,
        b,
        op,
        pattern: select_pattern(a, b),
        swapped,
    }
}

/// Ordered pattern selection; first match wins.
fn select_pattern(a: &Mat, b: &Mat) -> BroadcastPattern {
    if is_single_element(b) {
        return BroadcastPattern::Scalar;
    }

    if a.dims() == b.dims()
        && a.w() == b.w()
        && a.h() == b.h()
        && a.d() == b.d()
        && a.c() == b.c()
        && a.elempack() == b.elempack()
    {
        return BroadcastPattern::Elementwise;
    }

    // B broadcast along inner axes: lower rank, or size-1 inner extents
    // with the outer extents matching A.
    let inner = b.dims() < a.dims()
        || (a.dims() == 2 && b.w() == 1 && b.h() == a.h())
        || (a.dims() == 3 && b.w() == 1 && b.h() == 1 && b.c() == a.c())
        || (a.dims() == 3 && b.w() == 1 && b.h() == a.h() && b.c() == a.c())
        || (a.dims() == 4 && b.w() == 1 && b.h() == 1 && b.d() == 1 && b.c() == a.c())
        || (a.dims() == 4 && b.w() == 1 && b.h() == 1 && b.d() == a.d() && b.c() == a.c())
        || (a.dims() == 4 && b.w() == 1 && b.h() == a.h() && b.d() == a.d() && b.c() == a.c());
    if inner {
        return BroadcastPattern::InnerAxis;
    }

    // B broadcast along outer axes: full-width B repeated over rows /
    // depths / channels. Only the unpacked form is supported here.
    let outer = b.elempack() == 1
        && ((a.dims() == 2 && b.w() == a.w() && b.h() == 1)
            || (a.dims() == 3 && b.w() == a.w() && b.h() == 1 && b.c() == 1)
            || (a.dims() == 3 && b.w() == a.w() && b.h() == a.h() && b.c() == 1)
            || (a.dims() == 4 && b.w() == a.w() && b.h() == 1 && b.d() == 1 && b.c() == 1)
            || (a.dims() == 4 && b.w() == a.w() && b.h() == a.h() && b.d() == 1 && b.c() == 1)
            || (a.dims() == 4
                && b.w() == a.w()
                && b.h() == a.h()
                && b.d() == a.d()
                && b.c() == 1));
    if outer {
        return BroadcastPattern::OuterAxis;
    }

    // One row per channel, shared by every row of A. Not covered by the
    // inner templates because B.w != 1 here.
    if a.dims() == 3
        && b.dims() == 3
        && a.w() == b.w()
        && b.h() == 1
        && a.c() == b.c()
        && (b.elempack() == 1 || b.elempack() == a.elempack())
    {
        return BroadcastPattern::SharedRow;
    }

    BroadcastPattern::Unsupported
}

/// Collapses size-1 inner extents of B into a reduced-rank view.
///
/// Applied only for [`BroadcastPattern::InnerAxis`]. A pure view reshape —
/// no data moves. Rules are tried in order and a rule whose target shape
/// cannot hold B's elements is skipped, so a later rule can apply (e.g. a
/// 4-D B with `d == 1` but a real row extent reduces to 3-D, not 1-D).
/// A tensor already in reduced form passes through unchanged.
pub(crate) fn squeeze_inner(b: &Mat) -> MatView<'_> {
    let total = b.total();
    if b.dims() == 2 && b.w() == 1 {
        if let Ok(v) = b.reshape_1d(b.h()) {
            return v;
        }
    }
    if b.dims() == 3 && b.h() == 1 && total == b.c() {
        if let Ok(v) = b.reshape_1d(b.c()) {
            return v;
        }
    }
    if b.dims() == 3 && b.w() == 1 {
        if let Ok(v) = b.reshape_2d(b.h(), b.c()) {
            return v;
        }
    }
    if b.dims() == 4 && b.d() == 1 && total == b.c() {
        if let Ok(v) = b.reshape_1d(b.c()) {
            return v;
        }
    }
    if b.dims() == 4 && b.h() == 1 && total == b.d() * b.c() {
        if let Ok(v) = b.reshape_2d(b.d(), b.c()) {
            return v;
        }
    }
    if b.dims() == 4 && b.w() == 1 {
        if let Ok(v) = b.reshape_3d(b.h(), b.d(), b.c()) {
            return v;
        }
    }
    b.view()
}
