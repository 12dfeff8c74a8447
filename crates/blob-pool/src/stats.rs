// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Allocation statistics for profiling and budget tuning.

/// Cumulative statistics about pool usage.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct AllocationStats {
    /// Total number of allocation requests.
    pub total_allocations: u64,
    /// Allocations served from the free list.
    pub cache_hits: u64,
    /// Allocations that required fresh memory.
    pub cache_misses: u64,
    /// Requests rejected for exceeding the budget.
    pub oom_count: u64,
    /// Peak live memory in bytes.
    pub peak_allocated_bytes: usize,
    /// Number of buffers returned via `recycle`.
    pub total_recycled: u64,
}

impl AllocationStats {
    /// Returns the cache hit ratio in `[0.0, 1.0]`, or 0.0 with no
    /// successful allocations.
    pub fn cache_hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / total as f64
    }

    pub(crate) fn record_cache_hit(&mut self) {
        self.total_allocations += 1;
        self.cache_hits += 1;
    }

    pub(crate) fn record_cache_miss(&mut self) {
        self.total_allocations += 1;
        self.cache_misses += 1;
    }

    pub(crate) fn record_oom(&mut self) {
        self.total_allocations += 1;
        self.oom_count += 1;
    }

    pub(crate) fn record_recycle(&mut self) {
        self.total_recycled += 1;
    }

    pub(crate) fn update_peak(&mut self, current_bytes: usize) {
        if current_bytes > self.peak_allocated_bytes {
            self.peak_allocated_bytes = current_bytes;
        }
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        let peak_kb = self.peak_allocated_bytes as f64 / 1024.0;
        format!(
            "Allocations: {} total ({} hits, {} misses, {:.0}% hit rate), \
             {} OOMs, peak {:.1} KB, {} recycled",
            self.total_allocations,
            self.cache_hits,
            self.cache_misses,
            self.cache_hit_ratio() * 100.0,
            self.oom_count,
            peak_kb,
            self.total_recycled,
        )
    }
}
