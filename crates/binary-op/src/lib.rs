// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # binary-op
//!
//! A broadcasting binary elementwise operator for CPU inference.
//!
//! Given two tensors and an operation from a closed set (add, sub, mul,
//! div, max, min, pow and the argument-reversed forms), produces the
//! per-element result with NumPy-style broadcasting restricted to the
//! shape patterns the surrounding runtime emits. A secondary path applies
//! an immediate scalar to a single input, optionally in place.
//!
//! # Architecture
//! ```text
//! forward
//!   │  classify: pick dominant operand, swap + reverse op, choose pattern
//!   ▼
//! BroadcastPattern ── squeeze_inner (inner broadcasts only)
//!   │
//!   ▼
//! dispatch: one match from BinaryOpKind to a monomorphized kernel
//!   │
//!   ▼
//! iteration kernel: fork-join over channels/rows, vectorizable runs
//! ```
//!
//! The operand swap keeps the larger tensor as the dominant operand so the
//! outer parallel loop always has the maximum iteration count; swapping
//! replaces the operation with its reverse, which is the only way the
//! reversed operations are reached at runtime.
//!
//! # Key Types
//! - [`BinaryOp`] — the layer: parameter loading plus forward execution.
//! - [`BinaryOpKind`] — the closed operation set.
//! - [`BroadcastPattern`] — the chosen iteration strategy for a shape pair.
//! - [`Layer`] / [`create_layer`] — the runtime-facing layer abstraction
//!   and name-keyed registry.
//! - [`ParamDict`] — integer-keyed scalar parameters.

mod binary_op;
mod broadcast;
mod error;
mod kernels;
mod layer;
mod op;
mod parallel;
mod param;

pub use binary_op::BinaryOp;
pub use broadcast::BroadcastPattern;
pub use error::LayerError;
pub use layer::{create_layer, Layer};
pub use op::BinaryOpKind;
pub use param::{ParamDict, ParamValue};
