// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-call execution options threaded through every layer forward.

use crate::{BlobAllocator, SystemAllocator};
use std::sync::Arc;

/// Execution options for a forward call.
///
/// Carried by reference through every kernel; cheap to clone (the
/// allocator is behind an `Arc`).
///
/// # Examples
/// ```
/// use mat_core::Options;
/// let opt = Options::default().with_num_threads(1);
/// assert_eq!(opt.num_threads, 1);
/// ```
#[derive(Clone)]
pub struct Options {
    /// Worker count for the kernels' fork-join loops. A value of 1 runs
    /// serially on the caller's thread.
    pub num_threads: usize,
    /// Allocator used for output tensors.
    pub blob_allocator: Arc<dyn BlobAllocator>,
}

impl Options {
    /// Creates options with the given thread count and the system
    /// allocator.
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
            blob_allocator: Arc::new(SystemAllocator),
        }
    }

    /// Replaces the worker count.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads.max(1);
        self
    }

    /// Replaces the blob allocator.
    pub fn with_allocator(mut self, allocator: Arc<dyn BlobAllocator>) -> Self {
        self.blob_allocator = allocator;
        self
    }
}

impl Default for Options {
    /// Defaults to one worker per online CPU core and the system allocator.
    fn default() -> Self {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(threads)
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("num_threads", &self.num_threads)
            .finish()
    }
}
