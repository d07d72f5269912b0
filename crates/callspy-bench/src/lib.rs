//! Benchmark workloads for the callspy observer.
//!
//! Deterministic range patterns shaped like real interception traffic:
//!
//! - [`strided_ranges`]: disjoint buffers, one per vertex attribute
//! - [`coalescing_ranges`]: back-to-back element reads that merge into one
//! - [`scrambled_ranges`]: overlapping ranges in a fixed pseudo-random order

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use callspy_observer::PendingRanges;

/// `count` ranges of `len` bytes, `stride` bytes apart, starting at `base`.
pub fn strided_ranges(base: u64, count: usize, len: u64, stride: u64) -> Vec<(u64, u64)> {
    (0..count as u64).map(|i| (base + i * stride, len)).collect()
}

/// `count` adjacent ranges of `len` bytes starting at `base`. They all
/// merge into one interval.
pub fn coalescing_ranges(base: u64, count: usize, len: u64) -> Vec<(u64, u64)> {
    strided_ranges(base, count, len, len)
}

/// `count` ranges with starts in `[0, span)` and lengths in `[1, max_len]`,
/// from a fixed-seed linear congruential sequence.
pub fn scrambled_ranges(count: usize, span: u64, max_len: u64, seed: u64) -> Vec<(u64, u64)> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        state >> 33
    };
    (0..count)
        .map(|_| (next() % span, next() % max_len + 1))
        .collect()
}

/// Insert every range into a fresh set.
pub fn build_pending(ranges: &[(u64, u64)]) -> PendingRanges {
    let mut set = PendingRanges::new();
    for &(start, len) in ranges {
        set.insert(start, len);
    }
    set
}
