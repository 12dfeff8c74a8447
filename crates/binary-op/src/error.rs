// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for layer configuration and execution.

/// Errors that can occur loading parameters into or running a layer.
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    /// The output tensor could not be allocated.
    #[error("blob allocation failed: {0}")]
    Allocation(#[from] mat_core::AllocError),

    /// A parameter dict carried an operation code outside the closed set.
    #[error("unknown binary operation code {code}")]
    UnknownOperation { code: i32 },

    /// No layer is registered under the requested name.
    #[error("unknown layer type '{0}'")]
    UnknownLayer(String),

    /// `forward_inplace` was called on a layer not configured for it.
    #[error("layer '{layer}' does not support in-place execution")]
    InplaceUnsupported { layer: &'static str },

    /// The wrong number of input blobs was passed to `forward`.
    #[error("layer '{layer}' expects {expected} input blob(s), got {actual}")]
    BlobArity {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A parameter dictionary could not be parsed.
    #[error("parameter parse error: {0}")]
    ParamParse(String),
}
