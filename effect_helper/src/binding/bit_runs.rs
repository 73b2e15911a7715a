/// Run decomposition of slot bitmasks
///
/// Binding cost is proportional to the number of contiguous runs of set bits
/// in a stage's usage mask, not to the number of slots: each run becomes one
/// multi-slot bind call.
///
/// # Example
///
/// ```
/// use effect_helper::effect::binding::{BitRuns, SlotRun};
///
/// let runs: Vec<SlotRun> = BitRuns::new(0b1011_0110).collect();
/// assert_eq!(runs, vec![SlotRun { start: 1, count: 2 }, SlotRun { start: 4, count: 2 }, SlotRun { start: 7, count: 1 }]);
/// ```

use std::ops::Range;

/// A maximal run of contiguous set bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRun {
    /// First slot of the run
    pub start: u32,
    /// Number of slots
    pub count: u32,
}

impl SlotRun {
    pub fn slots(&self) -> Range<u32> {
        self.start..self.start + self.count
    }
}

/// Iterator over the maximal runs of a mask of up to 128 slots, lowest first
///
/// Narrower masks are zero-extended (`u128::from(mask)`), which does not
/// change their runs.
#[derive(Debug, Clone)]
pub struct BitRuns {
    mask: u128,
}

impl BitRuns {
    pub fn new(mask: u128) -> Self {
        Self { mask }
    }

    /// Runs of a mask stored as little-endian 32-bit words
    pub fn from_words(words: &[u32; 4]) -> Self {
        Self::new(words_to_mask(words))
    }
}

impl Iterator for BitRuns {
    type Item = SlotRun;

    fn next(&mut self) -> Option<SlotRun> {
        if self.mask == 0 {
            return None;
        }
        let start = self.mask.trailing_zeros();
        let shifted = self.mask >> start;
        // Isolates the lowest clear bit, i.e. the first slot past the run.
        // A run reaching bit 127 wraps to zero, whose trailing_zeros is 128.
        let end_bit = (shifted.wrapping_add(1) | shifted) ^ shifted;
        let count = end_bit.trailing_zeros();

        let consumed = start + count;
        self.mask = if consumed >= u128::BITS {
            0
        } else {
            (shifted >> count) << consumed
        };
        Some(SlotRun { start, count })
    }
}

/// Individual set bits, lowest first
pub fn set_bits(mask: u128) -> impl Iterator<Item = u32> {
    BitRuns::new(mask).flat_map(|run| run.slots())
}

/// Pack four 32-bit words (word 0 = slots 0..32) into one mask
pub fn words_to_mask(words: &[u32; 4]) -> u128 {
    words
        .iter()
        .enumerate()
        .fold(0u128, |acc, (i, word)| acc | (u128::from(*word) << (32 * i)))
}

#[cfg(test)]
#[path = "bit_runs_tests.rs"]
mod tests;
