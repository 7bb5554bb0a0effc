//! In-place ChaCha20 encryption driver.
//!
//! Splits the buffer into 64-byte blocks, assigns each block an independent
//! counter value, and XORs the corresponding keystream into it. Blocks are
//! independent once counters are assigned, so this is embarrassingly
//! parallel; the tier chosen below only affects latency, never the output
//! bytes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use super::block::{block, init_state};
use crate::simd::xor_into;
use crate::threads::{split_mut_by_index_ranges, split_ranges, worker_count};

const BLOCK_SIZE: usize = 64;

/// Encrypts `buffer` in place with ChaCha20, starting the block counter at
/// `counter0` and wrapping modulo 2^32.
///
/// `buffer.len() == 0` is a no-op. The final block may be partial; only
/// `buffer.len() % 64` bytes of its keystream are consumed.
///
/// # Panics
///
/// Does not panic for any `buffer` length. Callers must not request more
/// than 2^32 blocks (about 256 GiB) per `(key, nonce)` pair: the 32-bit
/// counter wraps silently past that point, per RFC 8439.
pub fn chacha20_encrypt(key: &[u8; 32], nonce: &[u8; 12], counter0: u32, buffer: &mut [u8]) {
    if buffer.is_empty() {
        return;
    }

    let num_blocks = buffer.len().div_ceil(BLOCK_SIZE);
    let workers = worker_count();

    if num_blocks >= 16 && workers > 1 {
        encrypt_work_stealing(key, nonce, counter0, buffer, num_blocks, workers);
    } else if num_blocks >= 8 && workers > 1 {
        encrypt_static_partitioned(key, nonce, counter0, buffer, num_blocks, workers);
    } else if num_blocks >= 2 {
        encrypt_two_at_a_time(key, nonce, counter0, buffer, num_blocks);
    } else {
        encrypt_sequential(key, nonce, counter0, buffer, 0, num_blocks);
    }
}

/// Processes global block indices `[start, end)` sequentially, each using its
/// own freshly built state (counter `counter0 + i`). `buffer` is the byte
/// range that corresponds to `[start, end)`, not necessarily the full
/// ChaCha buffer: `encrypt_static_partitioned` hands each worker its own
/// worker-local chunk alongside the matching global range, so block indices
/// are translated to a chunk-local offset via `i - start`, mirroring how
/// `reduce_pairs` indexes its destination chunk.
fn encrypt_sequential(
    key: &[u8; 32],
    nonce: &[u8; 12],
    counter0: u32,
    buffer: &mut [u8],
    start: usize,
    end: usize,
) {
    for i in start..end {
        let state = init_state(key, nonce, counter0.wrapping_add(i as u32));
        let keystream = block(&state);

        let offset = (i - start) * BLOCK_SIZE;
        let take = BLOCK_SIZE.min(buffer.len() - offset);
        xor_into(&mut buffer[offset..offset + take], &keystream[..take]);
    }
}

/// Tier: `num_blocks >= 2`. Sequential, two blocks' keystream generated
/// before either is applied into the buffer, so the next target region is
/// warmed up without relying on a non-portable prefetch hint.
fn encrypt_two_at_a_time(
    key: &[u8; 32],
    nonce: &[u8; 12],
    counter0: u32,
    buffer: &mut [u8],
    num_blocks: usize,
) {
    let mut i = 0;

    while i + 1 < num_blocks {
        let s0 = init_state(key, nonce, counter0.wrapping_add(i as u32));
        let s1 = init_state(key, nonce, counter0.wrapping_add((i + 1) as u32));
        let k0 = block(&s0);
        let k1 = block(&s1);

        let off0 = i * BLOCK_SIZE;
        xor_into(&mut buffer[off0..off0 + BLOCK_SIZE], &k0);

        let off1 = (i + 1) * BLOCK_SIZE;
        let take1 = BLOCK_SIZE.min(buffer.len() - off1);
        xor_into(&mut buffer[off1..off1 + take1], &k1[..take1]);

        i += 2;
    }

    if i < num_blocks {
        let tail = &mut buffer[i * BLOCK_SIZE..];
        encrypt_sequential(key, nonce, counter0, tail, i, num_blocks);
    }
}

/// Tier: `num_blocks >= 8`, multiple workers. Statically splits the block
/// range across workers; each worker owns a disjoint byte range of `buffer`.
fn encrypt_static_partitioned(
    key: &[u8; 32],
    nonce: &[u8; 12],
    counter0: u32,
    buffer: &mut [u8],
    num_blocks: usize,
    workers: usize,
) {
    let ranges = split_ranges(num_blocks, workers.min(num_blocks));
    let chunks = split_mut_by_index_ranges(buffer, &ranges, BLOCK_SIZE);

    thread::scope(|scope| {
        for ((start, end), chunk) in ranges.iter().zip(chunks) {
            let start = *start;
            let end = *end;

            scope.spawn(move || {
                encrypt_sequential(key, nonce, counter0, chunk, start, end);
            });
        }
    });
}

/// Tier: `num_blocks >= 16`, multiple workers. Workers dynamically claim
/// individual block indices from a shared atomic counter instead of a fixed
/// static split, so a slow block doesn't stall the whole phase.
fn encrypt_work_stealing(
    key: &[u8; 32],
    nonce: &[u8; 12],
    counter0: u32,
    buffer: &mut [u8],
    num_blocks: usize,
    workers: usize,
) {
    let next_block = AtomicUsize::new(0);
    let active_workers = workers.min(num_blocks);

    // Each worker gets its own full-buffer-length scratch slot to write into
    // via split-at-block boundaries computed on the fly, so all writes stay
    // within disjoint stripes despite dynamic assignment. Simplest sound way
    // to express this safely is to let every worker address the full buffer
    // through raw, block-stripe-disjoint pointers.
    let buffer_ptr = SyncMutPtr(buffer.as_mut_ptr());
    let buffer_len = buffer.len();

    thread::scope(|scope| {
        for _ in 0..active_workers {
            let next_block = &next_block;
            let buffer_ptr = buffer_ptr;

            scope.spawn(move || loop {
                let i = next_block.fetch_add(1, Ordering::Relaxed);
                if i >= num_blocks {
                    break;
                }

                let state = init_state(key, nonce, counter0.wrapping_add(i as u32));
                let keystream = block(&state);

                let offset = i * BLOCK_SIZE;
                let take = BLOCK_SIZE.min(buffer_len - offset);

                // SAFETY: block index `i` is claimed by exactly one worker
                // (atomic fetch-add), so the byte stripe
                // `[offset, offset + take)` is written by exactly one
                // thread for the lifetime of this scope.
                let stripe = unsafe {
                    std::slice::from_raw_parts_mut(buffer_ptr.0.add(offset), take)
                };
                xor_into(stripe, &keystream[..take]);
            });
        }
    });
}

/// A raw pointer wrapper that asserts the disjoint-stripe-per-thread
/// invariant documented at each call site, so it can be captured by value
/// into multiple scoped closures.
#[derive(Clone, Copy)]
struct SyncMutPtr(*mut u8);
unsafe impl Send for SyncMutPtr {}
unsafe impl Sync for SyncMutPtr {}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_reference(key: &[u8; 32], nonce: &[u8; 12], counter0: u32, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        encrypt_sequential(key, nonce, counter0, &mut out, 0, out.len().div_ceil(BLOCK_SIZE));
        out
    }

    #[test]
    fn empty_buffer_is_a_no_op() {
        let mut buf: [u8; 0] = [];
        chacha20_encrypt(&[1u8; 32], &[2u8; 12], 0, &mut buf);
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn all_tiers_agree_with_sequential_reference() {
        let key = [0x5Au8; 32];
        let nonce = [0x11u8; 12];

        for len in [64usize, 128, 64 * 7, 64 * 8, 64 * 15, 64 * 16, 64 * 40, 100] {
            let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let expected = xor_reference(&key, &nonce, 0, &data);

            let mut actual = data.clone();
            chacha20_encrypt(&key, &nonce, 0, &mut actual);

            assert_eq!(actual, expected, "length {len}");
        }
    }

    /// Forces the static-partitioned tier (`num_blocks` in `[8, 16)`, more
    /// than one worker) against a worker count that does not evenly divide
    /// the block count, so every worker but the first gets a `start > 0`
    /// chunk. Regression test: `encrypt_sequential` once indexed its output
    /// with the global block index against a worker-local chunk, which
    /// under-ran `chunk.len()` on the first block of every non-leading
    /// worker and panicked on the next.
    #[test]
    fn static_partitioned_tier_with_uneven_split() {
        use crate::threads::set_worker_count_override_for_test;

        struct Guard;
        impl Drop for Guard {
            fn drop(&mut self) {
                set_worker_count_override_for_test(None);
            }
        }
        let _guard = Guard;

        let key = [0x5Au8; 32];
        let nonce = [0x11u8; 12];

        for num_blocks in [8usize, 9, 11, 15] {
            let len = num_blocks * BLOCK_SIZE;
            let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let expected = xor_reference(&key, &nonce, 0, &data);

            for workers in [2usize, 3, 4] {
                set_worker_count_override_for_test(Some(workers));

                let mut actual = data.clone();
                chacha20_encrypt(&key, &nonce, 0, &mut actual);

                assert_eq!(actual, expected, "num_blocks={num_blocks} workers={workers}");
            }
        }
    }

    #[test]
    fn involution_recovers_plaintext() {
        let key = [0x42u8; 32];
        let nonce = [0x07u8; 12];
        let original: Vec<u8> = (0..64 * 20).map(|i| (i * 31 % 256) as u8).collect();

        let mut buf = original.clone();
        chacha20_encrypt(&key, &nonce, 0, &mut buf);
        chacha20_encrypt(&key, &nonce, 0, &mut buf);

        assert_eq!(buf, original);
    }

    #[test]
    fn counter_boundary_matches_two_separate_calls() {
        let key = [0x9au8; 32];
        let nonce = [0x01u8; 12];
        let data: Vec<u8> = (0..128).map(|i| i as u8).collect();

        let mut combined = data.clone();
        chacha20_encrypt(&key, &nonce, 0, &mut combined);

        let mut split = data.clone();
        chacha20_encrypt(&key, &nonce, 0, &mut split[0..64]);
        chacha20_encrypt(&key, &nonce, 1, &mut split[64..128]);

        assert_eq!(combined, split);
    }
}
