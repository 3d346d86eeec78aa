//! Placement planning for batches of reservations.
//!
//! Given the current end of the arena and a list of layouts, [`plan`] picks
//! an offset for each layout. At every step it places the pending layout that
//! needs the least padding at the current end, preferring the largest one
//! when several need the same padding, and the earliest argument when sizes
//! tie as well. The result is deterministic for a given input.

use std::alloc::Layout;

use smallvec::{smallvec, SmallVec};

/// Bytes needed after `end` to reach a multiple of `align`.
///
/// `align` must be a power of two.
#[inline]
pub fn padding_for(end: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    end.wrapping_neg() & (align - 1)
}

/// Where a batch of layouts lands in the arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackPlan {
    /// Offset of each layout, in argument order.
    pub offsets: SmallVec<[usize; 8]>,
    /// Arena length once every layout is placed.
    pub end: usize,
}

impl PackPlan {
    /// Bytes spent on padding between `start` and `end`.
    pub fn padding(&self, start: usize, layouts: &[Layout]) -> usize {
        let sizes: usize = layouts.iter().map(Layout::size).sum();
        self.end - start - sizes
    }
}

/// Plans the placement of `layouts` starting at arena length `start`.
///
/// This is O(n²) in the number of layouts, which stays small (one per type
/// in a single reservation call).
pub fn plan(start: usize, layouts: &[Layout]) -> PackPlan {
    let mut offsets: SmallVec<[usize; 8]> = smallvec![0; layouts.len()];
    let mut pending: SmallVec<[usize; 8]> = (0..layouts.len()).collect();
    let mut end = start;

    while !pending.is_empty() {
        let min_padding = pending
            .iter()
            .map(|&i| padding_for(end, layouts[i].align()))
            .fold(usize::MAX, usize::min);

        // Largest size among the cheapest candidates; the first one wins a tie.
        let mut chosen = 0;
        let mut chosen_size = None;
        for (pos, &i) in pending.iter().enumerate() {
            if padding_for(end, layouts[i].align()) != min_padding {
                continue;
            }
            let size = layouts[i].size();
            if chosen_size.map_or(true, |best| size > best) {
                chosen = pos;
                chosen_size = Some(size);
            }
        }

        let index = pending.remove(chosen);
        offsets[index] = end + min_padding;
        end += min_padding + layouts[index].size();
    }

    PackPlan { offsets, end }
}
