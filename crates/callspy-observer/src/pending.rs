//! The pending-range tracker.
//!
//! [`PendingRanges`] records which bytes were touched without copying them.
//! It keeps the unique minimal set of half-open intervals covering every
//! inserted byte: overlapping and adjacent intervals merge on insert, so
//! iteration is always ascending, disjoint, and non-adjacent.
//!
//! Ends are exclusive `u64`s, so the last address byte (`u64::MAX`) cannot
//! be covered: a range reaching it is truncated to end at `u64::MAX`. No
//! real mapping includes that byte.

use std::collections::BTreeMap;

use callspy_core::Observation;

use crate::memory::MemoryReader;

/// Ordered, merging set of half-open `[start, end)` address intervals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingRanges {
    /// Interval start → interval end (exclusive).
    ranges: BTreeMap<u64, u64>,
}

impl PendingRanges {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `[start, start + len)`, merging with every interval it overlaps
    /// or touches. A zero `len` is a no-op.
    ///
    /// The end saturates at `u64::MAX`, so bytes at or past the last address
    /// are dropped and a range starting at `u64::MAX` is ignored.
    pub fn insert(&mut self, start: u64, len: u64) {
        if len == 0 {
            return;
        }
        let mut lo = start;
        let mut hi = start.saturating_add(len);
        if lo == hi {
            return;
        }

        // The only interval starting at or before `lo` that can touch it is
        // its immediate predecessor.
        if let Some((&s, &e)) = self.ranges.range(..=lo).next_back() {
            if e >= lo {
                lo = s;
                hi = hi.max(e);
                self.ranges.remove(&s);
            }
        }

        // Stored intervals are non-adjacent, so a single pass over those
        // starting inside `[lo, hi]` absorbs everything that touches.
        let absorbed: Vec<(u64, u64)> = self
            .ranges
            .range(lo..=hi)
            .map(|(&s, &e)| (s, e))
            .collect();
        for (s, e) in absorbed {
            self.ranges.remove(&s);
            hi = hi.max(e);
        }

        self.ranges.insert(lo, hi);
    }

    /// Number of disjoint intervals held. Only meaningful as an
    /// empty/non-empty probe; it does not track how many inserts were made.
    pub fn count(&self) -> usize {
        self.ranges.len()
    }

    /// Whether no interval is pending.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Total bytes covered by all intervals.
    pub fn total_bytes(&self) -> u64 {
        self.ranges.iter().map(|(&s, &e)| e - s).sum()
    }

    /// Intervals as `(start, end)` pairs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.ranges.iter().map(|(&s, &e)| (s, e))
    }

    /// Drop every pending interval.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Copy every interval's bytes through `reader` into a new
    /// [`Observation`] appended to `out`, in ascending address order, then
    /// clear the set.
    ///
    /// # Safety
    ///
    /// Every pending interval must satisfy `reader`'s
    /// [`MemoryReader::read`] contract.
    #[allow(unsafe_code)]
    pub unsafe fn materialize_into<R: MemoryReader + ?Sized>(
        &mut self,
        out: &mut Vec<Observation>,
        reader: &R,
    ) {
        out.reserve(self.ranges.len());
        for (start, end) in std::mem::take(&mut self.ranges) {
            let mut bytes = vec![0u8; (end - start) as usize];
            // SAFETY: forwarded from the caller.
            unsafe { reader.read(start, &mut bytes) };
            out.push(Observation::new(start, bytes));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reads `address as u8` for every byte, so captured content is
    /// predictable without real memory.
    struct AddressPattern;

    #[allow(unsafe_code)]
    impl MemoryReader for AddressPattern {
        unsafe fn read(&self, address: u64, out: &mut [u8]) {
            for (i, b) in out.iter_mut().enumerate() {
                *b = address.wrapping_add(i as u64) as u8;
            }
        }
    }

    fn intervals(set: &PendingRanges) -> Vec<(u64, u64)> {
        set.iter().collect()
    }

    #[test]
    fn adjacent_ranges_merge() {
        let mut set = PendingRanges::new();
        set.insert(100, 10);
        set.insert(110, 10);
        assert_eq!(intervals(&set), vec![(100, 120)]);
        assert_eq!(set.count(), 1);
    }

    #[test]
    fn disjoint_ranges_stay_apart() {
        let mut set = PendingRanges::new();
        set.insert(50, 5);
        set.insert(10, 5);
        assert_eq!(intervals(&set), vec![(10, 15), (50, 55)]);
    }

    #[test]
    fn bridging_insert_absorbs_neighbours() {
        let mut set = PendingRanges::new();
        set.insert(0, 4);
        set.insert(8, 4);
        set.insert(16, 4);
        set.insert(2, 16);
        assert_eq!(intervals(&set), vec![(0, 20)]);
    }

    #[test]
    fn contained_insert_is_absorbed() {
        let mut set = PendingRanges::new();
        set.insert(0, 100);
        set.insert(10, 5);
        assert_eq!(intervals(&set), vec![(0, 100)]);
    }

    #[test]
    fn zero_length_is_noop() {
        let mut set = PendingRanges::new();
        set.insert(42, 0);
        assert!(set.is_empty());
    }

    #[test]
    fn end_saturates_below_last_address() {
        let mut set = PendingRanges::new();
        set.insert(u64::MAX - 2, 10);
        assert_eq!(intervals(&set), vec![(u64::MAX - 2, u64::MAX)]);
        assert_eq!(set.total_bytes(), 2);

        // Only the unrepresentable last byte: nothing to record.
        let mut last = PendingRanges::new();
        last.insert(u64::MAX, 1);
        assert!(last.is_empty());
    }

    #[test]
    #[allow(unsafe_code)]
    fn materialize_appends_in_order_and_clears() {
        let mut set = PendingRanges::new();
        set.insert(300, 2);
        set.insert(100, 3);
        let mut out = vec![Observation::new(0, vec![])];
        unsafe { set.materialize_into(&mut out, &AddressPattern) };
        assert!(set.is_empty());
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].address(), 100);
        assert_eq!(out[1].bytes(), &[100, 101, 102]);
        assert_eq!(out[2].address(), 300);
        assert_eq!(out[2].bytes(), &[44, 45]);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        proptest! {
            #[test]
            fn union_is_exact_and_minimal(
                inserts in proptest::collection::vec((0u64..512, 0u64..48), 0..40),
            ) {
                let mut set = PendingRanges::new();
                let mut expected = BTreeSet::new();
                for &(start, len) in &inserts {
                    set.insert(start, len);
                    expected.extend(start..start + len);
                }

                let mut covered = BTreeSet::new();
                let mut prev_end: Option<u64> = None;
                for (s, e) in set.iter() {
                    prop_assert!(s < e);
                    if let Some(prev) = prev_end {
                        // Strictly after, with a gap: no overlap, no adjacency.
                        prop_assert!(s > prev);
                    }
                    covered.extend(s..e);
                    prev_end = Some(e);
                }
                prop_assert_eq!(covered, expected);
            }

            #[test]
            fn insertion_order_does_not_matter(
                mut inserts in proptest::collection::vec((0u64..256, 1u64..32), 1..20),
            ) {
                let mut forward = PendingRanges::new();
                for &(s, l) in &inserts {
                    forward.insert(s, l);
                }
                inserts.reverse();
                let mut backward = PendingRanges::new();
                for &(s, l) in &inserts {
                    backward.insert(s, l);
                }
                prop_assert_eq!(forward, backward);
            }
        }
    }
}
