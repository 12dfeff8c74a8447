// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fork-join parallelism for the iteration kernels.
//!
//! Built on `std::thread::scope`: the output is split once into contiguous
//! bands of whole chunks, each band is processed by one worker, and the
//! caller blocks until all workers join. This suits the kernels' predictable
//! workloads better than a work-stealing pool, and keeps the worker count
//! exactly what the caller asked for.

/// Runs `f(chunk_index, chunk)` over consecutive `chunk_len`-sized chunks
/// of `data`, distributing contiguous bands of chunks across up to
/// `num_threads` workers.
///
/// A `num_threads` of 1, or a single chunk, runs serially on the calling
/// thread with no worker creation. Chunks are disjoint, so iterations are
/// independent; `f` may capture shared read-only state.
pub(crate) fn parallel_chunks_mut<F>(data: &mut [f32], chunk_len: usize, num_threads: usize, f: F)
where
    F: Fn(usize, &mut [f32]) + Send + Sync,
{
    if data.is_empty() || chunk_len == 0 {
        return;
    }

    let total_chunks = data.len().div_ceil(chunk_len);
    if num_threads <= 1 || total_chunks <= 1 {
        for (i, chunk) in data.chunks_mut(chunk_len).enumerate() {
            f(i, chunk);
        }
        return;
    }

    let workers = num_threads.min(total_chunks);
    let chunks_per_worker = total_chunks.div_ceil(workers);
    let floats_per_worker = chunks_per_worker * chunk_len;

    std::thread::scope(|scope| {
        let mut remaining = data;
        let mut chunk_offset = 0;

        for worker_id in 0..workers {
            if remaining.is_empty() {
                break;
            }

            let take = if worker_id == workers - 1 {
                remaining.len()
            } else {
                floats_per_worker.min(remaining.len())
            };
            let (band, rest) = remaining.split_at_mut(take);
            remaining = rest;

            let base = chunk_offset;
            chunk_offset += band.len().div_ceil(chunk_len);

            let f_ref = &f;
            scope.spawn(move || {
                for (i, chunk) in band.chunks_mut(chunk_len).enumerate() {
                    f_ref(base + i, chunk);
                }
            });
        }
    });
}
