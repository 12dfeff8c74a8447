// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Budget-enforced pooled allocator for tensor blobs.
//!
//! [`PoolAllocator`] sits behind the [`BlobAllocator`] seam:
//!
//! 1. Enforces a hard ceiling — requests that would push live memory past
//!    the [`BlobBudget`] return `Err(OutOfMemory)`.
//! 2. Maintains a free list of recycled buffers, binned by size class, to
//!    avoid repeated heap allocation in the inference hot path.
//! 3. Tracks allocation statistics for profiling.
//!
//! Buffers are handed out by value (they become tensor storage); callers
//! that want reuse hand them back with [`PoolAllocator::recycle`] once the
//! tensor is retired.
//!
//! # Thread Safety
//! `PoolAllocator` is `Send + Sync`; interior mutability is behind `Mutex`
//! and `AtomicUsize`, so it can be shared as `Arc<PoolAllocator>` in
//! [`mat_core::Options`].

use crate::{AllocationStats, BlobBudget};
use mat_core::{AllocError, BlobAllocator};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Minimum size class: 256 floats (1 KB). Anything smaller is rounded up.
const MIN_SIZE_CLASS: usize = 256;

/// A pooled, budget-enforced implementation of [`BlobAllocator`].
///
/// # Example
/// ```
/// use blob_pool::{BlobBudget, PoolAllocator};
/// use mat_core::BlobAllocator;
///
/// let pool = PoolAllocator::new(BlobBudget::from_mb(1));
/// let buf = pool.allocate(1024).unwrap();
/// assert_eq!(pool.live_floats(), 1024);
///
/// pool.recycle(buf);
/// assert_eq!(pool.live_floats(), 0);
/// ```
pub struct PoolAllocator {
    budget: BlobBudget,
    live_floats: AtomicUsize,
    free_floats: AtomicUsize,
    /// Free buffer cache: size_class → available buffers.
    free_buffers: Mutex<HashMap<usize, Vec<Vec<f32>>>>,
    stats: Mutex<AllocationStats>,
}

impl PoolAllocator {
    /// Creates a pool with the given budget.
    pub fn new(budget: BlobBudget) -> Self {
        Self {
            budget,
            live_floats: AtomicUsize::new(0),
            free_floats: AtomicUsize::new(0),
            free_buffers: Mutex::new(HashMap::new()),
            stats: Mutex::new(AllocationStats::default()),
        }
    }

    /// Returns the configured budget.
    pub fn budget(&self) -> BlobBudget {
        self.budget
    }

    /// Floats currently handed out and not yet recycled.
    pub fn live_floats(&self) -> usize {
        self.live_floats.load(Ordering::Acquire)
    }

    /// Bytes remaining before the budget is exhausted.
    pub fn available_bytes(&self) -> usize {
        self.budget
            .as_bytes()
            .saturating_sub(self.live_floats() * 4)
    }

    /// Returns a buffer to the pool's free list for later reuse.
    pub fn recycle(&self, buffer: Vec<f32>) {
        self.live_floats.fetch_sub(buffer.len(), Ordering::Release);
        self.free_floats.fetch_add(buffer.len(), Ordering::Release);

        if let Ok(mut stats) = self.stats.lock() {
            stats.record_recycle();
        }

        let size_class = size_class_for(buffer.len());
        if let Ok(mut free) = self.free_buffers.lock() {
            free.entry(size_class).or_default().push(buffer);
        }
    }

    /// Returns a snapshot of allocation statistics.
    pub fn stats(&self) -> AllocationStats {
        self.stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Evicts all cached free buffers, releasing memory back to the OS.
    ///
    /// Live buffers are unaffected; only the free list is cleared.
    pub fn shrink(&self) {
        if let Ok(mut free) = self.free_buffers.lock() {
            free.clear();
            self.free_floats.store(0, Ordering::Release);
        }
    }

    /// Approximate float count held in the free list.
    pub fn free_list_floats(&self) -> usize {
        self.free_floats.load(Ordering::Acquire)
    }
}

impl BlobAllocator for PoolAllocator {
    fn allocate(&self, len: usize) -> Result<Vec<f32>, AllocError> {
        if len == 0 {
            return Err(AllocError::ZeroSized);
        }

        let requested_bytes = len * 4;
        let live_bytes = self.live_floats.load(Ordering::Acquire) * 4;
        let budget_bytes = self.budget.as_bytes();

        if live_bytes + requested_bytes > budget_bytes {
            if let Ok(mut stats) = self.stats.lock() {
                stats.record_oom();
            }
            return Err(AllocError::OutOfMemory {
                requested_bytes,
                available_bytes: budget_bytes.saturating_sub(live_bytes),
            });
        }

        // Try the free list first.
        let size_class = size_class_for(len);
        let mut buffer = None;
        if let Ok(mut free) = self.free_buffers.lock() {
            if let Some(class_buffers) = free.get_mut(&size_class) {
                if let Some(mut buf) = class_buffers.pop() {
                    self.free_floats.fetch_sub(buf.len(), Ordering::Release);
                    // Recycled buffers may carry stale values; hand out
                    // zeroed storage of exactly the requested length.
                    buf.clear();
                    buf.resize(len, 0.0);
                    buffer = Some(buf);
                }
            }
        }

        let is_hit = buffer.is_some();
        let data = buffer.unwrap_or_else(|| vec![0.0; len]);

        self.live_floats.fetch_add(len, Ordering::Release);

        if let Ok(mut stats) = self.stats.lock() {
            if is_hit {
                stats.record_cache_hit();
            } else {
                stats.record_cache_miss();
            }
            let live = self.live_floats.load(Ordering::Acquire);
            stats.update_peak(live * 4);
        }

        Ok(data)
    }
}

/// Computes the size class for a request: the smallest power of two that is
/// ≥ `len` and ≥ `MIN_SIZE_CLASS`.
fn size_class_for(len: usize) -> usize {
    len.max(MIN_SIZE_CLASS).next_power_of_two()
}

impl std::fmt::Debug for PoolAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("budget", &self.budget)
            .field("live_floats", &self.live_floats())
            .field("free_list_floats", &self.free_list_floats())
            .finish()
    }
}
