// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: the binary operator end to end.
//!
//! Exercises every broadcast pattern through the public layer interface,
//! plus the cross-cutting invariants: operand-swap symmetry, the scalar
//! fast path, thread-count invariance, inner-axis squeeze idempotence,
//! and allocator failure propagation.

use binary_op::{create_layer, BinaryOp, BinaryOpKind, Layer, LayerError, ParamDict};
use blob_pool::{BlobBudget, PoolAllocator};
use mat_core::{Mat, Options};
use std::sync::Arc;

// ── Helpers ────────────────────────────────────────────────────

fn layer_with(op: BinaryOpKind) -> BinaryOp {
    let mut layer = BinaryOp::new();
    let mut pd = ParamDict::new();
    pd.set_int(0, op.param_code());
    layer.load_param(&pd).unwrap();
    layer
}

fn scalar_layer(op: BinaryOpKind, b: f32) -> BinaryOp {
    let mut layer = BinaryOp::new();
    let mut pd = ParamDict::new();
    pd.set_int(0, op.param_code());
    pd.set_int(1, 1);
    pd.set_float(2, b);
    layer.load_param(&pd).unwrap();
    layer
}

fn forward(op: BinaryOpKind, a: &Mat, b: &Mat, threads: usize) -> Mat {
    let layer = layer_with(op);
    let mut top = layer
        .forward(&[a.clone(), b.clone()], &Options::new(threads))
        .unwrap();
    top.remove(0)
}

fn mat_2d(w: usize, h: usize, f: impl Fn(usize, usize) -> f32) -> Mat {
    let mut values = Vec::with_capacity(w * h);
    for y in 0..h {
        for x in 0..w {
            values.push(f(x, y));
        }
    }
    Mat::from_floats_2d(w, h, &values).unwrap()
}

fn mat_3d(w: usize, h: usize, c: usize, f: impl Fn(usize, usize, usize) -> f32) -> Mat {
    let mut values = Vec::with_capacity(w * h * c);
    for q in 0..c {
        for y in 0..h {
            for x in 0..w {
                values.push(f(x, y, q));
            }
        }
    }
    Mat::from_floats_3d(w, h, c, &values).unwrap()
}

fn mat_4d(
    w: usize,
    h: usize,
    d: usize,
    c: usize,
    f: impl Fn(usize, usize, usize, usize) -> f32,
) -> Mat {
    let mut values = Vec::with_capacity(w * h * d * c);
    for q in 0..c {
        for z in 0..d {
            for y in 0..h {
                for x in 0..w {
                    values.push(f(x, y, z, q));
                }
            }
        }
    }
    Mat::from_floats_4d(w, h, d, c, &values).unwrap()
}

fn assert_bits_eq(a: &Mat, b: &Mat) {
    assert_eq!(a.as_slice().len(), b.as_slice().len());
    for (i, (x, y)) in a.as_slice().iter().zip(b.as_slice()).enumerate() {
        assert_eq!(
            x.to_bits(),
            y.to_bits(),
            "mismatch at flat index {i}: {x} vs {y}"
        );
    }
}

// ── Concrete scenarios ─────────────────────────────────────────

#[test]
fn test_scalar_add() {
    let a = Mat::from_floats_2d(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
    let b = Mat::from_floats_1d(&[10.0]);
    let c = forward(BinaryOpKind::Add, &a, &b, 1);
    assert_eq!(c.as_slice(), &[11.0, 12.0, 13.0, 14.0]);
}

#[test]
fn test_no_broadcast_mul() {
    let a = Mat::from_floats_2d(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    let c = forward(BinaryOpKind::Mul, &a, &a.clone(), 1);
    assert_eq!(c.as_slice(), &[1.0, 4.0, 9.0, 16.0, 25.0, 36.0]);
}

#[test]
fn test_inner_channel_div() {
    // Each channel of A divided by its B element.
    let a = mat_3d(2, 2, 2, |_, _, _| 8.0);
    let b = Mat::from_floats_1d(&[2.0, 4.0]);
    let c = forward(BinaryOpKind::Div, &a, &b, 1);
    assert_eq!(c.channel(0), &[4.0; 4]);
    assert_eq!(c.channel(1), &[2.0; 4]);
}

#[test]
fn test_swap_induced_rsub() {
    // A has lower rank, so the classifier swaps and SUB becomes RSUB;
    // the subtraction direction is preserved. The 1-D subordinate then
    // broadcasts per channel, so channel q is A[q] − 10 throughout.
    let a = Mat::from_floats_1d(&[1.0, 2.0, 3.0, 4.0]);
    let b = mat_3d(4, 2, 2, |_, _, _| 10.0);
    let c = forward(BinaryOpKind::Sub, &a, &b, 1);
    assert_eq!(c.dims(), 3);
    assert_eq!(c.channel(0), &[-9.0; 8]);
    assert_eq!(c.channel(1), &[-8.0; 8]);
}

#[test]
fn test_outer_row_add() {
    let a = mat_2d(2, 3, |x, y| (y * 2 + x) as f32 + 1.0);
    let b = Mat::from_floats_2d(2, 1, &[10.0, 20.0]).unwrap();
    let c = forward(BinaryOpKind::Add, &a, &b, 1);
    assert_eq!(c.as_slice(), &[11.0, 22.0, 13.0, 24.0, 15.0, 26.0]);
}

#[test]
fn test_shared_row_add() {
    // B has one row per channel, reused by every row of A.
    let a = mat_3d(2, 3, 2, |x, y, q| (q * 10 + y + x) as f32);
    let b = mat_3d(2, 1, 2, |x, _, _| x as f32);
    let c = forward(BinaryOpKind::Add, &a, &b, 1);
    for q in 0..2 {
        for y in 0..3 {
            for x in 0..2 {
                let got = c.channel(q)[y * 2 + x];
                let expected = (q * 10 + y + x) as f32 + x as f32;
                assert_eq!(got, expected, "mismatch at (q={q}, y={y}, x={x})");
            }
        }
    }
}

// ── Completeness over the remaining patterns ───────────────────

#[test]
fn test_inner_4d_depth_row_walk() {
    // (A.dims, B.dims) = (4, 3) after squeezing: B[q, z, y] covers each
    // width run.
    let a = mat_4d(3, 2, 2, 2, |_, _, _, _| 1.0);
    let b = mat_4d(1, 2, 2, 2, |_, y, z, q| (q * 100 + z * 10 + y) as f32);
    let c = forward(BinaryOpKind::Add, &a, &b, 1);
    for q in 0..2 {
        for z in 0..2 {
            for y in 0..2 {
                let base = (z * 2 + y) * 3;
                let expected = 1.0 + (q * 100 + z * 10 + y) as f32;
                assert_eq!(&c.channel(q)[base..base + 3], &[expected; 3]);
            }
        }
    }
}

#[test]
fn test_outer_4d_clamped_walk() {
    // B supplies one (h·w) plane reused across every depth of A.
    let a = mat_4d(2, 2, 3, 1, |_, _, _, _| 0.0);
    let b = mat_4d(2, 2, 1, 1, |x, y, _, _| (y * 2 + x) as f32);
    let c = forward(BinaryOpKind::Add, &a, &b, 1);
    for z in 0..3 {
        let base = z * 4;
        assert_eq!(&c.channel(0)[base..base + 4], &[0.0, 1.0, 2.0, 3.0]);
    }
}

#[test]
fn test_unsupported_pair_succeeds_unwritten() {
    let a = mat_2d(3, 2, |_, _| 5.0);
    let b = mat_2d(2, 3, |_, _| 7.0);
    let layer = layer_with(BinaryOpKind::Add);
    let top = layer.forward(&[a, b], &Options::new(1)).unwrap();
    assert_eq!(top[0].dims(), 2);
    assert_eq!((top[0].w(), top[0].h()), (3, 2));
    assert!(top[0].as_slice().iter().all(|&x| x == 0.0));
}

// ── Universal invariants ───────────────────────────────────────

#[test]
fn test_commutative_ops_are_order_insensitive() {
    use BinaryOpKind::*;
    let a = mat_3d(3, 2, 2, |x, y, q| (q * 7 + y * 3 + x) as f32 * 0.5 - 2.0);
    let b = Mat::from_floats_1d(&[1.5, -0.5]);
    for op in [Add, Mul, Max, Min] {
        let ab = forward(op, &a, &b, 1);
        let ba = forward(op, &b, &a, 1);
        assert_bits_eq(&ab, &ba);
    }
}

#[test]
fn test_reverse_ops_mirror_swapped_arguments() {
    use BinaryOpKind::*;
    // Shapes chosen to trigger the swap in the first call.
    let a = Mat::from_floats_1d(&[1.0, 2.0, 4.0, 8.0]);
    let b = mat_3d(4, 2, 2, |x, y, q| (q + y + x) as f32 + 1.0);
    for op in [Sub, Div, Pow] {
        let swapped = forward(op, &a, &b, 1);
        let reversed = forward(op.reversed(), &b, &a, 1);
        assert_bits_eq(&swapped, &reversed);
    }
}

#[test]
fn test_scalar_fast_path_matches_with_scalar_layer() {
    use BinaryOpKind::*;
    let a = mat_3d(3, 2, 2, |x, y, q| (q * 6 + y * 3 + x) as f32 - 4.0);
    for op in [Add, Sub, Mul, Div, Max, Min, Pow, Rsub, Rdiv, Rpow] {
        let b = Mat::from_floats_1d(&[2.5]);
        let two_input = forward(op, &a, &b, 1);

        let layer = scalar_layer(op, 2.5);
        let mut single = layer.forward(&[a.clone()], &Options::new(1)).unwrap();
        assert_bits_eq(&two_input, &single.remove(0));
    }
}

#[test]
fn test_inplace_matches_forward() {
    use BinaryOpKind::*;
    for op in [Add, Div, Rpow] {
        let a = mat_2d(4, 3, |x, y| (y * 4 + x) as f32 * 0.25 + 0.5);
        let layer = scalar_layer(op, 3.0);

        let mut produced = layer.forward(&[a.clone()], &Options::new(1)).unwrap();
        let mut in_place = a.clone();
        layer
            .forward_inplace(&mut in_place, &Options::new(1))
            .unwrap();
        assert_bits_eq(&produced.remove(0), &in_place);
    }
}

#[test]
fn test_thread_count_does_not_change_results() {
    use BinaryOpKind::*;
    let pairs: Vec<(Mat, Mat)> = vec![
        // Scalar.
        (mat_3d(5, 3, 4, |x, y, q| (x + y + q) as f32), {
            Mat::from_floats_1d(&[3.0])
        }),
        // Elementwise.
        (
            mat_3d(5, 3, 4, |x, y, q| (x * y + q) as f32 + 1.0),
            mat_3d(5, 3, 4, |x, y, q| (x + y * q) as f32 - 2.0),
        ),
        // Inner, per channel.
        (
            mat_3d(5, 3, 4, |x, y, q| (x + y + q) as f32 + 1.0),
            Mat::from_floats_1d(&[1.0, 2.0, 3.0, 4.0]),
        ),
        // Inner, (4, 3) walk.
        (
            mat_4d(3, 2, 2, 3, |x, y, z, q| (x + y + z + q) as f32),
            mat_4d(1, 2, 2, 3, |_, y, z, q| (q * 9 + z * 3 + y) as f32 + 1.0),
        ),
        // Outer.
        (
            mat_3d(4, 3, 4, |x, y, q| (x + y + q) as f32 + 2.0),
            mat_3d(4, 1, 1, |x, _, _| (x + 1) as f32),
        ),
        // Shared row.
        (
            mat_3d(4, 3, 2, |x, y, q| (x + y + q) as f32,),
            mat_3d(4, 1, 2, |x, _, q| (q * 4 + x) as f32 + 1.0),
        ),
        // Swap-inducing.
        (
            Mat::from_floats_1d(&[1.0, 2.0, 3.0]),
            mat_3d(3, 4, 2, |x, y, q| (x + y + q) as f32 + 1.0),
        ),
    ];

    for (a, b) in &pairs {
        for op in [Add, Sub, Mul, Div, Max, Min, Pow] {
            let serial = forward(op, a, b, 1);
            let parallel = forward(op, a, b, 4);
            assert_bits_eq(&serial, &parallel);
        }
    }
}

#[test]
fn test_squeeze_is_transparent() {
    // Forward(A, B) must equal Forward(A, reduced(B)) for a B whose inner
    // axes are size 1.
    let a = mat_3d(4, 3, 2, |x, y, q| (q * 12 + y * 4 + x) as f32);
    let b_full = mat_3d(1, 3, 2, |_, y, q| (q * 3 + y) as f32 + 1.0);
    let b_reduced = mat_2d(3, 2, |y, q| (q * 3 + y) as f32 + 1.0);

    let full = forward(BinaryOpKind::Div, &a, &b_full, 1);
    let reduced = forward(BinaryOpKind::Div, &a, &b_reduced, 1);
    assert_bits_eq(&full, &reduced);
}

// ── Registry and allocator integration ─────────────────────────

#[test]
fn test_registry_roundtrip() {
    let mut layer = create_layer("binary_op").unwrap();
    let pd = ParamDict::from_json(r#"{ "0": 2, "1": 1, "2": 3.0 }"#).unwrap();
    layer.load_param(&pd).unwrap();
    assert!(layer.one_blob_only());
    assert!(layer.support_inplace());

    let a = Mat::from_floats_1d(&[1.0, 2.0]);
    let top = layer.forward(&[a], &Options::new(1)).unwrap();
    assert_eq!(top[0].as_slice(), &[3.0, 6.0]);
}

#[test]
fn test_pooled_allocator_feeds_forward() {
    let pool = Arc::new(PoolAllocator::new(BlobBudget::from_mb(1)));
    let opt = Options::new(2).with_allocator(pool.clone());

    let a = mat_3d(8, 4, 2, |x, y, q| (x + y + q) as f32);
    let b = Mat::from_floats_1d(&[2.0, 3.0]);
    let top = layer_with(BinaryOpKind::Mul)
        .forward(&[a.clone(), b], &opt)
        .unwrap();

    assert_eq!(pool.live_floats(), a.float_count());
    assert_eq!(top[0].channel(0)[0], a.channel(0)[0] * 2.0);
    assert_eq!(top[0].channel(1)[0], a.channel(1)[0] * 3.0);
}

#[test]
fn test_budget_exhaustion_surfaces_allocation_error() {
    // Budget below the output size: forward must fail cleanly.
    let pool = Arc::new(PoolAllocator::new(BlobBudget::from_bytes(64)));
    let opt = Options::new(1).with_allocator(pool);

    let a = mat_2d(16, 16, |_, _| 1.0);
    let b = mat_2d(16, 16, |_, _| 1.0);
    let result = layer_with(BinaryOpKind::Add).forward(&[a, b], &opt);
    assert!(matches!(result, Err(LayerError::Allocation(_))));
}

// ── Numeric edges ──────────────────────────────────────────────

#[test]
fn test_host_float_semantics_pass_through() {
    let a = Mat::from_floats_1d(&[1.0, -1.0, 0.0]);
    let b = Mat::from_floats_1d(&[0.0]);
    let c = forward(BinaryOpKind::Div, &a, &b, 1);
    assert!(c.as_slice()[0].is_infinite() && c.as_slice()[0] > 0.0);
    assert!(c.as_slice()[1].is_infinite() && c.as_slice()[1] < 0.0);
    assert!(c.as_slice()[2].is_nan());

    let neg = Mat::from_floats_1d(&[-8.0]);
    let half = Mat::from_floats_1d(&[0.5]);
    let r = forward(BinaryOpKind::Pow, &neg, &half, 1);
    assert!(r.as_slice()[0].is_nan());
}
