// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The `Mat` tensor type and its borrowed views.

use crate::{AllocError, BlobAllocator, MatError};

/// An owned tensor of up to four dimensions, stored as contiguous `f32`.
///
/// `Mat` is the data carrier handed between inference layers. Extents are
/// named `w`, `h`, `d`, `c` (width, height, depth, channels) from innermost
/// to outermost; unused higher extents are 1. Storage is channel-major,
/// then depth-major, then row-major.
///
/// # Element Packing
/// `elempack` groups that many physically adjacent floats as one logical
/// element along the outermost axis, so SIMD lanes can be loaded directly.
/// The logical element count is `w·h·d·c`; the physical float count is
/// `w·h·d·c·elempack`.
///
/// # Examples
/// ```
/// use mat_core::Mat;
/// let m = Mat::zeros_3d(4, 3, 2);
/// assert_eq!(m.dims(), 3);
/// assert_eq!(m.total(), 24);
/// assert_eq!(m.channel(1).len(), 12);
/// ```
#[derive(Debug, Clone)]
pub struct Mat {
    dims: usize,
    w: usize,
    h: usize,
    d: usize,
    c: usize,
    elempack: usize,
    data: Vec<f32>,
}

impl Mat {
    /// Creates a zero-filled 1-D tensor of length `w`.
    pub fn zeros_1d(w: usize) -> Self {
        Self::zeros_packed(1, w, 1, 1, 1, 1)
    }

    /// Creates a zero-filled 2-D tensor.
    pub fn zeros_2d(w: usize, h: usize) -> Self {
        Self::zeros_packed(2, w, h, 1, 1, 1)
    }

    /// Creates a zero-filled 3-D tensor.
    pub fn zeros_3d(w: usize, h: usize, c: usize) -> Self {
        Self::zeros_packed(3, w, h, 1, c, 1)
    }

    /// Creates a zero-filled 4-D tensor.
    pub fn zeros_4d(w: usize, h: usize, d: usize, c: usize) -> Self {
        Self::zeros_packed(4, w, h, d, c, 1)
    }

    /// Creates a zero-filled tensor with an explicit packing factor.
    ///
    /// Extents count packed elements: a 3-D tensor with `c = 2` and
    /// `elempack = 4` stores `w·h·8` floats.
    pub fn zeros_packed(
        dims: usize,
        w: usize,
        h: usize,
        d: usize,
        c: usize,
        elempack: usize,
    ) -> Self {
        let len = w * h * d * c * elempack;
        Self {
            dims,
            w,
            h,
            d,
            c,
            elempack,
            data: vec![0.0; len],
        }
    }

    /// Creates a 1-D tensor from a slice of values.
    pub fn from_floats_1d(values: &[f32]) -> Self {
        Self {
            dims: 1,
            w: values.len(),
            h: 1,
            d: 1,
            c: 1,
            elempack: 1,
            data: values.to_vec(),
        }
    }

    /// Creates a 2-D tensor from row-major values.
    ///
    /// # Errors
    /// Returns [`MatError::BufferSizeMismatch`] if `values.len() != w·h`.
    pub fn from_floats_2d(w: usize, h: usize, values: &[f32]) -> Result<Self, MatError> {
        Self::from_floats_packed(2, w, h, 1, 1, 1, values)
    }

    /// Creates a 3-D tensor from channel-major values.
    ///
    /// # Errors
    /// Returns [`MatError::BufferSizeMismatch`] if `values.len() != w·h·c`.
    pub fn from_floats_3d(w: usize, h: usize, c: usize, values: &[f32]) -> Result<Self, MatError> {
        Self::from_floats_packed(3, w, h, 1, c, 1, values)
    }

    /// Creates a 4-D tensor from channel-major values.
    ///
    /// # Errors
    /// Returns [`MatError::BufferSizeMismatch`] if `values.len() != w·h·d·c`.
    pub fn from_floats_4d(
        w: usize,
        h: usize,
        d: usize,
        c: usize,
        values: &[f32],
    ) -> Result<Self, MatError> {
        Self::from_floats_packed(4, w, h, d, c, 1, values)
    }

    /// Creates a tensor from values with explicit geometry and packing.
    ///
    /// # Errors
    /// Returns [`MatError::BufferSizeMismatch`] if the value count does not
    /// match `w·h·d·c·elempack`.
    pub fn from_floats_packed(
        dims: usize,
        w: usize,
        h: usize,
        d: usize,
        c: usize,
        elempack: usize,
        values: &[f32],
    ) -> Result<Self, MatError> {
        let expected = w * h * d * c * elempack;
        if values.len() != expected {
            return Err(MatError::BufferSizeMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            dims,
            w,
            h,
            d,
            c,
            elempack,
            data: values.to_vec(),
        })
    }

    /// Allocates a tensor with the same geometry and packing as `template`,
    /// drawing the buffer from `allocator`.
    ///
    /// # Errors
    /// Returns the allocator's [`AllocError`] when the buffer cannot be
    /// provided; no tensor is produced in that case.
    pub fn create_like(template: &Mat, allocator: &dyn BlobAllocator) -> Result<Self, AllocError> {
        let data = allocator.allocate(template.float_count())?;
        Ok(Self {
            dims: template.dims,
            w: template.w,
            h: template.h,
            d: template.d,
            c: template.c,
            elempack: template.elempack,
            data,
        })
    }

    /// Number of dimensions (1–4).
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Innermost extent.
    pub fn w(&self) -> usize {
        self.w
    }

    /// Row extent.
    pub fn h(&self) -> usize {
        self.h
    }

    /// Depth extent (1 unless `dims == 4`).
    pub fn d(&self) -> usize {
        self.d
    }

    /// Channel extent (1 unless `dims >= 3`).
    pub fn c(&self) -> usize {
        self.c
    }

    /// Packing factor along the outermost axis.
    pub fn elempack(&self) -> usize {
        self.elempack
    }

    /// Logical element count (`w·h·d·c`, counting packed cells once).
    pub fn total(&self) -> usize {
        self.w * self.h * self.d * self.c
    }

    /// Physical float count (`total · elempack`).
    pub fn float_count(&self) -> usize {
        self.total() * self.elempack
    }

    /// Floats per channel (`w·h·d·elempack`).
    pub fn cstep(&self) -> usize {
        self.w * self.h * self.d * self.elempack
    }

    /// Returns `true` if the tensor holds no data (e.g. a failed allocation).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The full storage as a flat slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// The full storage as a mutable flat slice.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// The contiguous run backing channel `q`.
    ///
    /// For tensors with `dims < 3` there is a single channel holding
    /// everything.
    pub fn channel(&self, q: usize) -> &[f32] {
        let step = self.cstep();
        &self.data[q * step..(q + 1) * step]
    }

    /// Mutable access to channel `q`.
    pub fn channel_mut(&mut self, q: usize) -> &mut [f32] {
        let step = self.cstep();
        &mut self.data[q * step..(q + 1) * step]
    }

    /// The contiguous run backing row `y` of a 2-D tensor.
    pub fn row(&self, y: usize) -> &[f32] {
        let step = self.w * self.elempack;
        &self.data[y * step..(y + 1) * step]
    }

    /// Mutable access to row `y` of a 2-D tensor.
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let step = self.w * self.elempack;
        &mut self.data[y * step..(y + 1) * step]
    }

    /// The packed cell at flat logical index `i` (`elempack` floats).
    pub fn cell(&self, i: usize) -> &[f32] {
        &self.data[i * self.elempack..(i + 1) * self.elempack]
    }

    /// Fills the tensor with a constant value.
    pub fn fill(&mut self, value: f32) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    /// Returns a borrowed view with the same geometry.
    pub fn view(&self) -> MatView<'_> {
        MatView {
            dims: self.dims,
            w: self.w,
            h: self.h,
            d: self.d,
            c: self.c,
            elempack: self.elempack,
            data: &self.data,
        }
    }

    /// Reinterprets the storage as a 1-D view of length `w`, without
    /// copying. Packing is preserved.
    ///
    /// # Errors
    /// Returns [`MatError::ReshapeMismatch`] if the logical element counts
    /// differ.
    pub fn reshape_1d(&self, w: usize) -> Result<MatView<'_>, MatError> {
        self.reshape(1, w, 1, 1, 1)
    }

    /// Reinterprets the storage as a 2-D view, without copying.
    pub fn reshape_2d(&self, w: usize, h: usize) -> Result<MatView<'_>, MatError> {
        self.reshape(2, w, h, 1, 1)
    }

    /// Reinterprets the storage as a 3-D view, without copying.
    pub fn reshape_3d(&self, w: usize, h: usize, c: usize) -> Result<MatView<'_>, MatError> {
        self.reshape(3, w, h, 1, c)
    }

    fn reshape(
        &self,
        dims: usize,
        w: usize,
        h: usize,
        d: usize,
        c: usize,
    ) -> Result<MatView<'_>, MatError> {
        let target = w * h * d * c;
        if target != self.total() {
            return Err(MatError::ReshapeMismatch {
                from: self.total(),
                to: target,
            });
        }
        Ok(MatView {
            dims,
            w,
            h,
            d,
            c,
            elempack: self.elempack,
            data: &self.data,
        })
    }
}

/// A borrowed, read-only view over a [`Mat`]'s storage, possibly with a
/// different geometry (see the `reshape_*` methods).
///
/// Views are zero-copy; the borrow checker ties them to the source tensor.
#[derive(Debug, Clone, Copy)]
pub struct MatView<'a> {
    dims: usize,
    w: usize,
    h: usize,
    d: usize,
    c: usize,
    elempack: usize,
    data: &'a [f32],
}

impl<'a> MatView<'a> {
    /// Number of dimensions of the viewed geometry.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Innermost extent.
    pub fn w(&self) -> usize {
        self.w
    }

    /// Row extent.
    pub fn h(&self) -> usize {
        self.h
    }

    /// Depth extent.
    pub fn d(&self) -> usize {
        self.d
    }

    /// Channel extent.
    pub fn c(&self) -> usize {
        self.c
    }

    /// Packing factor along the outermost axis.
    pub fn elempack(&self) -> usize {
        self.elempack
    }

    /// Logical element count.
    pub fn total(&self) -> usize {
        self.w * self.h * self.d * self.c
    }

    /// Floats per channel.
    pub fn cstep(&self) -> usize {
        self.w * self.h * self.d * self.elempack
    }

    /// The full storage as a flat slice.
    pub fn as_slice(&self) -> &[f32] {
        self.data
    }

    /// The contiguous run backing channel `q` of the viewed geometry.
    pub fn channel(&self, q: usize) -> &[f32] {
        let step = self.cstep();
        &self.data[q * step..(q + 1) * step]
    }

    /// The contiguous run backing row `y` of a 2-D view.
    pub fn row(&self, y: usize) -> &[f32] {
        let step = self.w * self.elempack;
        &self.data[y * step..(y + 1) * step]
    }

    /// The packed cell at flat logical index `i` (`elempack` floats).
    pub fn cell(&self, i: usize) -> &[f32] {
        &self.data[i * self.elempack..(i + 1) * self.elempack]
    }
}
