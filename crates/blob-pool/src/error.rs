// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for pool configuration.

/// Errors that can occur configuring a [`crate::PoolAllocator`].
///
/// Allocation-time failures use [`mat_core::AllocError`] so the pool can
/// stand behind the [`mat_core::BlobAllocator`] seam.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The budget string could not be parsed.
    #[error("invalid blob budget: {0}")]
    InvalidBudget(String),
}
