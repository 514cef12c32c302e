//! Splitting seeded iteration runs into parallel batches.
//!
//! A batch is a contiguous slice of iteration indices; iteration `i` always resolves with
//! seed `base_seed + i`, so the way batches land on threads never changes the result.

/// Batches per worker thread; keeps every thread busy when bout lengths vary.
pub const BATCHES_PER_THREAD: usize = 4;

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Earlier batches take the remainder, so sizes differ by at most one.
///
/// # Example
/// ```
/// # use colosseum::parallel::batch_ranges;
/// let ranges = batch_ranges(10, 3);
/// assert_eq!(ranges, vec![(0, 4), (4, 7), (7, 10)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let count = num_batches.min(total);
    let (base, extra) = (total / count, total % count);
    (0..count)
        .scan(0usize, |start, idx| {
            let end = *start + base + usize::from(idx < extra);
            let range = (*start, end);
            *start = end;
            Some(range)
        })
        .collect()
}

/// Iteration indices of one batch together with the seed each one resolves with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedBatch {
    pub start: usize,
    pub end: usize,
    pub base_seed: u64,
}

impl SeedBatch {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn seeds(&self) -> impl Iterator<Item = u64> {
        let base = self.base_seed;
        (self.start..self.end).map(move |i| base.wrapping_add(i as u64))
    }
}

/// Batches for `iterations` seeded runs spread over `threads` workers.
pub fn seed_batches(iterations: usize, base_seed: u64, threads: usize) -> Vec<SeedBatch> {
    batch_ranges(iterations, threads.max(1) * BATCHES_PER_THREAD)
        .into_iter()
        .map(|(start, end)| SeedBatch {
            start,
            end,
            base_seed,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_cover_every_item_once() {
        let ranges = batch_ranges(103, 8);
        assert_eq!(ranges.len(), 8);
        assert_eq!(ranges.first().map(|r| r.0), Some(0));
        assert_eq!(ranges.last().map(|r| r.1), Some(103));
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
        let sizes: Vec<usize> = ranges.iter().map(|(s, e)| e - s).collect();
        assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1);
    }

    #[test]
    fn never_more_batches_than_items() {
        assert_eq!(batch_ranges(3, 10), vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn empty_inputs_give_no_batches() {
        assert!(batch_ranges(0, 5).is_empty());
        assert!(batch_ranges(10, 0).is_empty());
        assert!(seed_batches(0, 9, 4).is_empty());
    }

    #[test]
    fn seeds_are_offsets_from_the_base() {
        let batches = seed_batches(10, u64::MAX - 1, 1);
        let seeds: Vec<u64> = batches.iter().flat_map(SeedBatch::seeds).collect();
        assert_eq!(seeds.len(), 10);
        assert_eq!(seeds[0], u64::MAX - 1);
        assert_eq!(seeds[1], u64::MAX);
        assert_eq!(seeds[2], 0);
        assert_eq!(batches.iter().map(SeedBatch::len).sum::<usize>(), 10);
    }
}
