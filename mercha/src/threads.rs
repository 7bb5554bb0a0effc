//! Worker-count resolution and static work partitioning.
//!
//! Both the ChaCha20 driver and the Merkle reducer need to split a run of
//! independent, fixed-size work items (blocks, pairs) across a small number
//! of OS threads. This module centralizes that policy so the two stages
//! agree on what "enough work to parallelize" means and how ranges are split.
//!
//! There is no thread pool: each parallel phase spawns scoped threads and
//! joins them before returning, matching the one-barrier-per-phase model in
//! the pipeline's concurrency design. No crate outside `std` is used for
//! this; the corpus this crate is built from reaches for `std::thread`
//! wherever it needs real OS-level concurrency, never a thread-pool crate.

use std::thread;

#[cfg(test)]
std::thread_local! {
    static WORKER_COUNT_OVERRIDE: std::cell::Cell<Option<usize>> = const { std::cell::Cell::new(None) };
}

/// Test-only hook: pins `worker_count()` to `n` for the current thread, so
/// unit tests can exercise the same call at worker counts {1, 2, 4, 8}
/// without depending on the test machine's actual core count.
#[cfg(test)]
pub(crate) fn set_worker_count_override_for_test(n: Option<usize>) {
    WORKER_COUNT_OVERRIDE.with(|cell| cell.set(n));
}

/// Returns the number of worker threads to use, at least 1.
pub(crate) fn worker_count() -> usize {
    #[cfg(test)]
    {
        if let Some(n) = WORKER_COUNT_OVERRIDE.with(|cell| cell.get()) {
            return n;
        }
    }

    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Splits `0..count` into `workers` contiguous ranges, the last absorbing the
/// remainder. Ranges are returned as `(start, end)` pairs; empty ranges are
/// omitted.
pub(crate) fn split_ranges(count: usize, workers: usize) -> Vec<(usize, usize)> {
    if workers <= 1 || count == 0 {
        return vec![(0, count)];
    }

    let per_worker = count / workers;
    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;

    for i in 0..workers {
        if start >= count {
            break;
        }

        let end = if i + 1 == workers {
            count
        } else {
            (start + per_worker).min(count)
        };

        if end > start {
            ranges.push((start, end));
        }

        start = end;
    }

    ranges
}

/// Splits a mutable byte buffer into one sub-slice per `(start, end)` index
/// range, where each index counts `item_size`-byte items. Used to hand
/// disjoint, non-aliasing byte stripes to separate worker threads.
pub(crate) fn split_mut_by_index_ranges<'a>(
    buffer: &'a mut [u8],
    ranges: &[(usize, usize)],
    item_size: usize,
) -> Vec<&'a mut [u8]> {
    let mut chunks = Vec::with_capacity(ranges.len());
    let mut rest = buffer;
    let mut consumed = 0;

    for (start, end) in ranges {
        debug_assert_eq!(*start, consumed);

        let byte_len = ((end - start) * item_size).min(rest.len());
        let (chunk, remainder) = rest.split_at_mut(byte_len);

        chunks.push(chunk);
        rest = remainder;
        consumed = *end;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_ranges_covers_every_index_once() {
        for count in [0, 1, 3, 7, 16, 100] {
            for workers in [1, 2, 3, 4, 8] {
                let ranges = split_ranges(count, workers);
                let mut covered = Vec::new();

                for (start, end) in &ranges {
                    covered.extend(*start..*end);
                }

                let expected: Vec<usize> = (0..count).collect();
                assert_eq!(covered, expected, "count={count} workers={workers}");
            }
        }
    }

    #[test]
    fn split_ranges_last_absorbs_remainder() {
        let ranges = split_ranges(10, 3);
        assert_eq!(ranges, vec![(0, 3), (3, 6), (6, 10)]);
    }

    /// Resets the per-thread worker-count override on drop, so a panicking
    /// assertion in one of the tests below can't leak a pinned override into
    /// whichever other test the harness runs next on this thread.
    struct OverrideGuard;
    impl Drop for OverrideGuard {
        fn drop(&mut self) {
            set_worker_count_override_for_test(None);
        }
    }

    /// Cross-run determinism at worker counts {1, 2, 4, 8} for both the
    /// ChaCha20 driver and the Merkle reducer, the crate's two parallel
    /// phases: the externally visible result must not depend on how many
    /// workers happened to run it.
    #[test]
    fn chacha_and_merkle_agree_across_worker_counts() {
        let _guard = OverrideGuard;

        let key = [0x5Cu8; 32];
        let nonce = [0x3Bu8; 12];
        let data: Vec<u8> = (0..64 * 32).map(|i| (i * 37 + 11) as u8).collect();

        let mut reference_chacha = data.clone();
        set_worker_count_override_for_test(Some(1));
        crate::chacha20_encrypt(&key, &nonce, 0, &mut reference_chacha);

        let mut reference_root = [0u8; 64];
        crate::merkel_tree(&reference_chacha, &mut reference_root);

        for workers in [1, 2, 4, 8] {
            set_worker_count_override_for_test(Some(workers));

            let mut buf = data.clone();
            crate::chacha20_encrypt(&key, &nonce, 0, &mut buf);
            assert_eq!(buf, reference_chacha, "chacha20_encrypt at workers={workers}");

            let mut root = [0u8; 64];
            crate::merkel_tree(&buf, &mut root);
            assert_eq!(root, reference_root, "merkel_tree at workers={workers}");
        }
    }
}
