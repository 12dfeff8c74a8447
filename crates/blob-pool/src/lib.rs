// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # blob-pool
//!
//! A budget-enforced pooled allocator for tensor blobs on
//! memory-constrained devices.
//!
//! # Key Components
//!
//! - [`BlobBudget`] — a hard memory ceiling with human-readable parsing
//!   (`"512M"`, `"1G"`, etc.).
//! - [`PoolAllocator`] — implements [`mat_core::BlobAllocator`]: enforces
//!   the budget, keeps a free list binned by size class, and tracks
//!   statistics. Retired buffers are returned with
//!   [`PoolAllocator::recycle`] for reuse.
//! - [`AllocationStats`] — cumulative pool metrics (peak usage, cache hit
//!   ratio, OOM count).
//!
//! # Example
//! ```
//! use blob_pool::{BlobBudget, PoolAllocator};
//! use mat_core::{Mat, Options};
//! use std::sync::Arc;
//!
//! let pool = Arc::new(PoolAllocator::new(BlobBudget::from_mb(64)));
//! let opt = Options::default().with_allocator(pool.clone());
//!
//! let tpl = Mat::zeros_3d(8, 8, 4);
//! let out = Mat::create_like(&tpl, &*opt.blob_allocator).unwrap();
//! assert_eq!(out.float_count(), tpl.float_count());
//! assert_eq!(pool.live_floats(), tpl.float_count());
//! ```

mod budget;
mod error;
mod pool;
mod stats;

pub use budget::BlobBudget;
pub use error::PoolError;
pub use pool::PoolAllocator;
pub use stats::AllocationStats;
