// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The layer abstraction and name-keyed registry.
//!
//! A [`Layer`] is configured once via [`Layer::load_param`] and then run
//! any number of times. The `one_blob_only` / `support_inplace` flags tell
//! the surrounding runtime which forward entry to use; they may change as
//! a result of parameter loading (e.g. a binary operator configured with
//! an immediate scalar becomes a single-input, in-place-capable layer).

use crate::{LayerError, ParamDict};
use mat_core::{Mat, Options};

/// A network layer: parameter loading plus forward execution.
pub trait Layer: Send + Sync {
    /// A stable name for this layer type.
    fn layer_type(&self) -> &'static str;

    /// Loads scalar parameters. Called once before any forward.
    fn load_param(&mut self, pd: &ParamDict) -> Result<(), LayerError>;

    /// `true` when the layer consumes a single input blob.
    fn one_blob_only(&self) -> bool {
        false
    }

    /// `true` when the layer may run in place on its single input.
    fn support_inplace(&self) -> bool {
        false
    }

    /// Runs the layer, producing its output blobs.
    fn forward(&self, bottom_blobs: &[Mat], opt: &Options) -> Result<Vec<Mat>, LayerError>;

    /// Runs the layer in place on a single blob.
    ///
    /// The default declines; layers opt in by overriding this together
    /// with [`Layer::support_inplace`].
    fn forward_inplace(&self, _blob: &mut Mat, _opt: &Options) -> Result<(), LayerError> {
        Err(LayerError::InplaceUnsupported {
            layer: self.layer_type(),
        })
    }
}

/// Creates a layer by type name.
///
/// Accepts the canonical snake_case name and common aliases.
///
/// # Errors
/// Returns [`LayerError::UnknownLayer`] for unrecognised names.
///
/// # Examples
/// ```
/// let layer = binary_op::create_layer("binary_op").unwrap();
/// assert_eq!(layer.layer_type(), "binary_op");
/// ```
pub fn create_layer(name: &str) -> Result<Box<dyn Layer>, LayerError> {
    match name.to_lowercase().as_str() {
        "binary_op" | "binaryop" | "binary" => Ok(Box::new(crate::BinaryOp::new())),
        other => Err(LayerError::UnknownLayer(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_known_layer() {
        for name in ["binary_op", "BinaryOp", "binary"] {
            let layer = create_layer(name).unwrap();
            assert_eq!(layer.layer_type(), "binary_op");
            assert!(!layer.one_blob_only());
            assert!(!layer.support_inplace());
        }
    }

    #[test]
    fn test_create_unknown_layer() {
        assert!(matches!(
            create_layer("convolution"),
            Err(LayerError::UnknownLayer(_))
        ));
    }

    #[test]
    fn test_flags_after_scalar_param_load() {
        let mut layer = create_layer("binary_op").unwrap();
        let mut pd = ParamDict::new();
        pd.set_int(1, 1);
        pd.set_float(2, 2.5);
        layer.load_param(&pd).unwrap();
        assert!(layer.one_blob_only());
        assert!(layer.support_inplace());
    }
}
