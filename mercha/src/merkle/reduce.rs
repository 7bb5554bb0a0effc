//! The Merkle reducer: folds a `2^n`-leaf, 64-byte-aligned buffer down to a
//! single 64-byte root using [`merge_hash`] at every internal node.
//!
//! `input` is never mutated by this stage; two scratch buffers (sized `L/2`
//! and `L/4`) are ping-ponged between levels, matching the buffer discipline
//! in the pipeline design. Odd leaf counts are not handled: the tree is
//! assumed perfect, i.e. `input.len()` is a power-of-two multiple of 64.

use std::thread;

use super::compress::merge_hash;
use crate::threads::{split_mut_by_index_ranges, split_ranges, worker_count};

const BLOCK_SIZE: usize = 64;

/// Reduces `input` to a 64-byte root written into `output`.
///
/// # Panics (debug builds only)
///
/// Debug-asserts that `input.len()` is a power-of-two multiple of 64 and at
/// least 64, and that `output.len() == 64`. Violating this is undefined
/// behavior per the pipeline's preconditions; it is the caller's
/// responsibility, not this function's, to enforce it (see [`crate::mercha`]
/// for the full-pipeline entry point that does check it).
pub fn merkel_tree(input: &[u8], output: &mut [u8]) {
    debug_assert_eq!(output.len(), BLOCK_SIZE);
    debug_assert!(input.len() >= BLOCK_SIZE);
    debug_assert_eq!(input.len() % BLOCK_SIZE, 0);
    debug_assert!(input.len().is_power_of_two());

    let length = input.len();

    if length == BLOCK_SIZE {
        output.copy_from_slice(input);
        return;
    }

    let mut a = vec![0u8; length / 2];
    let mut b = vec![0u8; (length / 4).max(1)];

    reduce_level(input, &mut a[..length / 2]);

    let mut level_len = length / 2;
    let mut prev = &mut a;
    let mut cur = &mut b;

    while level_len > BLOCK_SIZE {
        let next_len = level_len / 2;
        reduce_level(&prev[..level_len], &mut cur[..next_len]);
        level_len = next_len;
        std::mem::swap(&mut prev, &mut cur);
    }

    output.copy_from_slice(&prev[..BLOCK_SIZE]);
}

/// Applies `merge_hash` to every consecutive pair of 64-byte blocks in
/// `src`, writing `src.len() / 128` output blocks into `dest`.
fn reduce_level(src: &[u8], dest: &mut [u8]) {
    let num_pairs = dest.len() / BLOCK_SIZE;
    let workers = worker_count();

    if num_pairs >= 4 && workers > 1 {
        let ranges = split_ranges(num_pairs, workers.min(num_pairs));
        let dest_chunks = split_mut_by_index_ranges(dest, &ranges, BLOCK_SIZE);

        thread::scope(|scope| {
            for ((start, end), chunk) in ranges.iter().zip(dest_chunks) {
                let start = *start;
                let end = *end;

                scope.spawn(move || {
                    reduce_pairs(src, chunk, start, end);
                });
            }
        });
    } else {
        reduce_pairs(src, dest, 0, num_pairs);
    }
}

/// Reduces global pair indices `[start, end)` from `src` into the
/// zero-based-local `dest` chunk that corresponds to that range.
fn reduce_pairs(src: &[u8], dest: &mut [u8], start: usize, end: usize) {
    for j in start..end {
        let a = &src[2 * j * BLOCK_SIZE..2 * j * BLOCK_SIZE + BLOCK_SIZE];
        let b = &src[(2 * j + 1) * BLOCK_SIZE..(2 * j + 1) * BLOCK_SIZE + BLOCK_SIZE];

        let local = j - start;
        merge_hash(a, b, &mut dest[local * BLOCK_SIZE..local * BLOCK_SIZE + BLOCK_SIZE]);
    }
}
