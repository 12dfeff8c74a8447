// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor construction and reshaping.

/// Errors that can occur constructing or reinterpreting a [`crate::Mat`].
#[derive(Debug, thiserror::Error)]
pub enum MatError {
    /// The provided buffer does not hold the expected number of floats.
    #[error("buffer size mismatch: expected {expected} floats, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// The requested reshape changes the logical element count.
    #[error("cannot reshape {from} elements into {to}")]
    ReshapeMismatch { from: usize, to: usize },
}
