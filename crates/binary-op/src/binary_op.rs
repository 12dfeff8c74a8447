// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The binary elementwise operator layer.
//!
//! Two-input form: classifies the shape pair, allocates the output like
//! the dominant operand, and dispatches to the matching broadcast kernel.
//! Single-input form (`with_scalar`): applies the stored immediate against
//! every element, optionally in place.

use crate::broadcast::classify;
use crate::kernels::{dispatch_binary, dispatch_scalar, dispatch_scalar_inplace};
use crate::{BinaryOpKind, Layer, LayerError, ParamDict};
use mat_core::{Mat, Options};

/// Elementwise binary arithmetic with restricted NumPy-style broadcasting.
///
/// # Parameters
/// | key | meaning | default |
/// |-----|-----------------------------------|---------|
/// | 0 | operation code ([`BinaryOpKind`]) | 0 (add) |
/// | 1 | operate against an immediate scalar | 0 |
/// | 2 | the immediate scalar value | 0.0 |
///
/// # Examples
/// ```
/// use binary_op::{BinaryOp, Layer, ParamDict};
/// use mat_core::{Mat, Options};
///
/// let mut layer = BinaryOp::new();
/// layer.load_param(&ParamDict::new()).unwrap(); // defaults to add
///
/// let a = Mat::from_floats_2d(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
/// let b = Mat::from_floats_1d(&[10.0]);
/// let top = layer.forward(&[a, b], &Options::new(1)).unwrap();
/// assert_eq!(top[0].as_slice(), &[11.0, 12.0, 13.0, 14.0]);
/// ```
#[derive(Debug)]
pub struct BinaryOp {
    op_type: BinaryOpKind,
    with_scalar: bool,
    b: f32,
    one_blob_only: bool,
    support_inplace: bool,
}

impl BinaryOp {
    /// Creates an unconfigured layer (add, no immediate scalar).
    pub fn new() -> Self {
        Self {
            op_type: BinaryOpKind::Add,
            with_scalar: false,
            b: 0.0,
            one_blob_only: false,
            support_inplace: false,
        }
    }

    /// The configured operation.
    pub fn op_type(&self) -> BinaryOpKind {
        self.op_type
    }

    /// The configured immediate scalar (meaningful with `with_scalar`).
    pub fn scalar_b(&self) -> f32 {
        self.b
    }
}

impl Default for BinaryOp {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for BinaryOp {
    fn layer_type(&self) -> &'static str {
        "binary_op"
    }

    fn load_param(&mut self, pd: &ParamDict) -> Result<(), LayerError> {
        let code = pd.get_int(0, 0);
        self.op_type = BinaryOpKind::from_param_code(code)
            .ok_or(LayerError::UnknownOperation { code })?;
        self.with_scalar = pd.get_int(1, 0) != 0;
        self.b = pd.get_float(2, 0.0);

        self.one_blob_only = self.with_scalar;
        self.support_inplace = self.with_scalar;

        Ok(())
    }

    fn one_blob_only(&self) -> bool {
        self.one_blob_only
    }

    fn support_inplace(&self) -> bool {
        self.support_inplace
    }

    fn forward(&self, bottom_blobs: &[Mat], opt: &Options) -> Result<Vec<Mat>, LayerError> {
        if self.with_scalar {
            let [a] = bottom_blobs else {
                return Err(LayerError::BlobArity {
                    layer: self.layer_type(),
                    expected: 1,
                    actual: bottom_blobs.len(),
                });
            };
            let mut top = Mat::create_like(a, &*opt.blob_allocator)?;
            dispatch_scalar(self.op_type, a, self.b, &mut top, opt);
            return Ok(vec![top]);
        }

        let [a0, b0] = bottom_blobs else {
            return Err(LayerError::BlobArity {
                layer: self.layer_type(),
                expected: 2,
                actual: bottom_blobs.len(),
            });
        };

        let plan = classify(a0, b0, self.op_type);
        tracing::debug!(
            pattern = %plan.pattern,
            op = %plan.op,
            swapped = plan.swapped,
            "binary_op dispatch"
        );
        if plan.pattern == crate::BroadcastPattern::Unsupported {
            tracing::warn!(
                a_dims = plan.a.dims(),
                b_dims = plan.b.dims(),
                "unsupported broadcast pair; output left unwritten"
            );
        }

        let mut top = Mat::create_like(plan.a, &*opt.blob_allocator)?;
        dispatch_binary(plan.op, plan.pattern, plan.a, plan.b, &mut top, opt);
        Ok(vec![top])
    }

    fn forward_inplace(&self, blob: &mut Mat, opt: &Options) -> Result<(), LayerError> {
        if !self.with_scalar {
            return Err(LayerError::InplaceUnsupported {
                layer: self.layer_type(),
            });
        }
        dispatch_scalar_inplace(self.op_type, blob, self.b, opt);
        Ok(())
    }
}
