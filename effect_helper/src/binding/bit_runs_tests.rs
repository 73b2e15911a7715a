//! Unit tests for bit_runs.rs

use crate::binding::{set_bits, words_to_mask, BitRuns, SlotRun};

fn runs(mask: u128) -> Vec<(u32, u32)> {
    BitRuns::new(mask).map(|r| (r.start, r.count)).collect()
}

/// Reference decomposition, one bit at a time
fn naive_runs(mask: u128) -> Vec<(u32, u32)> {
    let mut out: Vec<(u32, u32)> = Vec::new();
    for bit in 0..128u32 {
        if mask & (1u128 << bit) == 0 {
            continue;
        }
        match out.last_mut() {
            Some((start, count)) if *start + *count == bit => *count += 1,
            _ => out.push((bit, 1)),
        }
    }
    out
}

#[test]
fn test_empty_mask_has_no_runs() {
    assert!(runs(0).is_empty());
}

#[test]
fn test_two_runs_for_0b10110() {
    // Slots 1, 2 and 4: one call for 1..=2, one for 4
    assert_eq!(runs(0b10110), vec![(1, 2), (4, 1)]);
    assert_eq!(BitRuns::new(0b10110).count(), 2);
}

#[test]
fn test_single_slot_zero() {
    assert_eq!(runs(1), vec![(0, 1)]);
}

#[test]
fn test_full_u32_is_one_run() {
    assert_eq!(runs(u128::from(u32::MAX)), vec![(0, 32)]);
}

#[test]
fn test_full_u128_is_one_run() {
    assert_eq!(runs(u128::MAX), vec![(0, 128)]);
}

#[test]
fn test_run_touching_top_bit() {
    let mask = (1u128 << 127) | (1u128 << 126) | 1;
    assert_eq!(runs(mask), vec![(0, 1), (126, 2)]);
}

#[test]
fn test_run_crossing_word_boundary_is_merged() {
    let words = [0x8000_0000, 0x0000_0001, 0, 0];
    let collected: Vec<SlotRun> = BitRuns::from_words(&words).collect();
    assert_eq!(collected, vec![SlotRun { start: 31, count: 2 }]);
}

#[test]
fn test_alternating_bits_give_one_run_each() {
    let mask = 0x5555_5555u128;
    let collected = runs(mask);
    assert_eq!(collected.len(), 16);
    assert!(collected.iter().all(|(_, count)| *count == 1));
}

#[test]
fn test_matches_naive_decomposition_on_pseudo_random_masks() {
    // xorshift to cover a wide range of masks deterministically
    let mut state: u128 = 0x9E37_79B9_7F4A_7C15_F39C_C060_5CED_C834;
    for _ in 0..500 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let mask = state & (state >> 3);
        assert_eq!(runs(mask), naive_runs(mask), "mask {:#034x}", mask);
    }
}

#[test]
fn test_runs_cover_exactly_the_set_bits() {
    let mask = 0b1110_0110_1000_1111u128 << 40;
    let covered = BitRuns::new(mask).fold(0u128, |acc, run| {
        acc | run.slots().fold(0u128, |m, s| m | (1u128 << s))
    });
    assert_eq!(covered, mask);
}

#[test]
fn test_set_bits_lists_individual_slots() {
    let bits: Vec<u32> = set_bits(0b1001_0010).collect();
    assert_eq!(bits, vec![1, 4, 7]);
}

#[test]
fn test_words_to_mask_places_words_in_order() {
    let mask = words_to_mask(&[1, 2, 4, 8]);
    assert_eq!(mask & 0xFFFF_FFFF, 1);
    assert_eq!((mask >> 32) & 0xFFFF_FFFF, 2);
    assert_eq!((mask >> 64) & 0xFFFF_FFFF, 4);
    assert_eq!(mask >> 96, 8);
}
