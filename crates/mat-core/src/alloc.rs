// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Blob allocation for layer outputs.
//!
//! Layers never call the global allocator directly: output buffers come
//! from a [`BlobAllocator`] carried in [`crate::Options`]. This lets a
//! runtime swap in a pooled, budget-enforced allocator without touching
//! layer code.

/// Errors produced by blob allocators.
#[derive(Debug, thiserror::Error)]
pub enum AllocError {
    /// The allocation would exceed the allocator's budget.
    #[error(
        "blob allocation of {requested_bytes} bytes exceeds budget \
         ({available_bytes} bytes available)"
    )]
    OutOfMemory {
        requested_bytes: usize,
        available_bytes: usize,
    },

    /// A zero-length blob was requested.
    #[error("zero-sized blob allocation")]
    ZeroSized,
}

/// Provides zero-initialised `f32` buffers for tensor storage.
///
/// Implementations must be shareable across worker threads; the output
/// allocation happens once per forward call, before any workers spawn.
pub trait BlobAllocator: Send + Sync {
    /// Allocates a zero-filled buffer of `len` floats.
    ///
    /// # Errors
    /// Returns [`AllocError::OutOfMemory`] when the request cannot be
    /// satisfied, or [`AllocError::ZeroSized`] for `len == 0`.
    fn allocate(&self, len: usize) -> Result<Vec<f32>, AllocError>;
}

/// The default allocator: plain heap allocation, no budget.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl BlobAllocator for SystemAllocator {
    fn allocate(&self, len: usize) -> Result<Vec<f32>, AllocError> {
        if len == 0 {
            return Err(AllocError::ZeroSized);
        }
        Ok(vec![0.0; len])
    }
}
