use super::*;

use crate::support;

//-----------------------------------------------------------------------------

// Builds a bit buffer of `capacity` bits with the given bits set.
fn bitmap_buffer(positions: &[usize], capacity: usize) -> RawVector {
    let mut result = RawVector::with_len(capacity, false);
    for &position in positions {
        result.set_bit(position, true);
    }
    result
}

// Builds an integer buffer of `capacity` elements of the given width, with
// `values` as its prefix.
fn array_buffer(values: &[u64], capacity: usize, width: usize) -> IntVector {
    let mut result = IntVector::with_len(cmp::max(values.len(), capacity), width, 0).unwrap();
    for (i, &value) in values.iter().enumerate() {
        result.set(i, value);
    }
    result
}

// A source buffer where the operand range starts at `start`.
fn bitmap_source(positions: &[usize], len: usize, start: usize) -> RawVector {
    let mut result = RawVector::with_len(start + len, false);
    for &position in positions {
        result.set_bit(start + position, true);
    }
    result
}

fn array_source(values: &[u64], start: usize) -> IntVector {
    let width = support::bits_needed(values.iter().copied().max().unwrap_or(0));
    let mut result = IntVector::with_len(start + values.len(), width, 0).unwrap();
    for (i, &value) in values.iter().enumerate() {
        result.set(start + i, value);
    }
    result
}

fn decode_bitmap(data: &RawVector, len: usize) -> Vec<u64> {
    support::OneIter::new(data, 0, len).map(|x| x as u64).collect()
}

fn decode_array(data: &IntVector, len: usize) -> Vec<u64> {
    (0..len).map(|i| data.get(i)).collect()
}

fn multiples_of(step: usize, limit: usize) -> Vec<u64> {
    (0..limit).step_by(step).map(|x| x as u64).collect()
}

//-----------------------------------------------------------------------------

#[test]
fn bitmap_and_bitmap_truncates_to_shorter() {
    let mut dest = bitmap_buffer(&[0, 50, 98], 100);
    let source = bitmap_source(&[0, 10, 50], 60, 7);
    let len = bitmap_and_bitmap(&mut dest, 100, &source, 7, 60);
    assert_eq!(len, 60, "Wrong intersection length");
    assert_eq!(decode_bitmap(&dest, len), vec![0, 50], "Wrong intersection contents");
    // Bits past the new length are left in place.
    assert!(dest.bit(98), "Excess capacity should be untouched");
}

#[test]
fn bitmap_and_bitmap_dense_inputs() {
    let universe = 1000;
    let mut dest = bitmap_buffer(
        &multiples_of(2, universe).iter().map(|&x| x as usize).collect::<Vec<usize>>(),
        universe,
    );
    let threes: Vec<usize> = multiples_of(3, universe).iter().map(|&x| x as usize).collect();
    let source = bitmap_source(&threes, universe, 123);
    let len = bitmap_and_bitmap(&mut dest, universe, &source, 123, universe);
    assert_eq!(len, universe, "Wrong intersection length");
    assert_eq!(decode_bitmap(&dest, len), multiples_of(6, universe), "Wrong dense intersection");
}

#[test]
fn array_and_bitmap_filters_and_compacts() {
    let mut dest = array_buffer(&[4, 9, 30, 64, 100], 5, 7);
    let source = bitmap_source(&[9, 31, 64], 65, 50);
    let len = array_and_bitmap(&mut dest, 5, &source, 50, 65);
    assert_eq!(len, 2, "Wrong intersection length");
    assert_eq!(decode_array(&dest, len), vec![9, 64], "Wrong intersection contents");
}

#[test]
fn array_and_bitmap_ignores_out_of_range() {
    // 100 is past the bitmap, so it cannot survive even though the
    // source buffer has bits beyond the operand range.
    let mut dest = array_buffer(&[2, 100], 2, 7);
    let source = bitmap_buffer(&[2, 100], 101);
    let len = array_and_bitmap(&mut dest, 2, &source, 0, 50);
    assert_eq!(len, 1, "Wrong intersection length");
    assert_eq!(decode_array(&dest, len), vec![2], "Wrong intersection contents");
}

#[test]
fn bitmap_and_array_keeps_hits_and_clears_the_rest() {
    let threes: Vec<usize> = (0..10000).step_by(3).collect();
    let mut dest = bitmap_buffer(&threes, 10000);
    let source = array_source(&[3, 4, 5, 3000, 6001, 9999], 13);
    let len = bitmap_and_array(&mut dest, 10000, &source, 13, 6);
    assert_eq!(len, 10000, "Wrong result length");
    assert_eq!(decode_bitmap(&dest, len), vec![3, 3000, 9999], "Wrong intersection contents");
}

#[test]
fn bitmap_and_array_empty_result() {
    let mut dest = bitmap_buffer(&[1, 3, 5], 6);
    let source = array_source(&[0, 2, 4, 100], 0);
    let len = bitmap_and_array(&mut dest, 6, &source, 0, 4);
    assert_eq!(len, 0, "An empty intersection should have length 0");
    assert_eq!(support::count_ones_in_range(&dest, 0, 6), 0, "All bits up to the old length should be cleared");
}

#[test]
fn array_and_array_common_elements() {
    let mut dest = array_buffer(&[4, 1534, 4003, 8903], 4, 14);
    let source = array_source(&[4, 2000, 4003, 5000], 21);
    let len = array_and_array(&mut dest, 4, &source, 21, 4);
    assert_eq!(len, 2, "Wrong intersection length");
    assert_eq!(decode_array(&dest, len), vec![4, 4003], "Wrong intersection contents");
}

#[test]
fn array_and_array_disjoint() {
    let mut dest = array_buffer(&[1, 3, 5], 3, 4);
    let source = array_source(&[0, 2, 6], 0);
    let len = array_and_array(&mut dest, 3, &source, 0, 3);
    assert_eq!(len, 0, "Disjoint arrays should intersect to length 0");
}

//-----------------------------------------------------------------------------

#[test]
fn bitmap_or_bitmap_masks_stale_capacity() {
    // Logical length 50 inside a 200-bit buffer with stale bits at 70 and
    // 120 left over from an earlier, longer set.
    let mut dest = bitmap_buffer(&[0, 40, 70, 120], 200);
    let source = bitmap_source(&[10, 99], 100, 31);
    let len = bitmap_or_bitmap(&mut dest, 50, &source, 31, 100);
    assert_eq!(len, 100, "Wrong union length");
    assert_eq!(decode_bitmap(&dest, len), vec![0, 10, 40, 99], "Stale bits must not leak into the union");
}

#[test]
fn bitmap_or_bitmap_shorter_source() {
    let mut dest = bitmap_buffer(&[0, 64, 149], 150);
    let source = bitmap_source(&[1, 64], 65, 0);
    let len = bitmap_or_bitmap(&mut dest, 150, &source, 0, 65);
    assert_eq!(len, 150, "Wrong union length");
    assert_eq!(decode_bitmap(&dest, len), vec![0, 1, 64, 149], "Wrong union contents");
}

#[test]
fn bitmap_or_array_grows_and_clears_stale_bits() {
    let mut dest = bitmap_buffer(&[2, 5, 77], 100);
    let source = array_source(&[5, 30, 90], 3);
    let len = bitmap_or_array(&mut dest, 10, &source, 3, 3);
    assert_eq!(len, 91, "Wrong union length");
    // 77 was stale capacity past the logical length 10, not part of the set.
    assert_eq!(decode_bitmap(&dest, len), vec![2, 5, 30, 90], "Wrong union contents");
}

#[test]
fn array_or_bitmap_merges_sorted() {
    let mut dest = array_buffer(&[1, 8, 64], 8, 7);
    let source = bitmap_source(&[0, 8, 65], 66, 17);
    let len = array_or_bitmap(&mut dest, 3, &source, 17, 66);
    assert_eq!(len, 5, "Wrong union length");
    assert_eq!(decode_array(&dest, len), vec![0, 1, 8, 64, 65], "Wrong union contents");
}

#[test]
fn array_or_array_merges_and_deduplicates() {
    let mut dest = array_buffer(&[4, 1534, 4003, 8903], 8, 14);
    let source = array_source(&[4, 2000, 4003, 5000], 9);
    let len = array_or_array(&mut dest, 4, &source, 9, 4);
    assert_eq!(len, 6, "Wrong union length");
    assert_eq!(decode_array(&dest, len), vec![4, 1534, 2000, 4003, 5000, 8903], "Wrong union contents");
}

#[test]
fn array_or_array_with_empty_operands() {
    let mut dest = array_buffer(&[7, 9], 4, 4);
    let source = array_source(&[1, 2], 0);
    let len = array_or_array(&mut dest, 0, &source, 0, 2);
    assert_eq!(decode_array(&dest, len), vec![1, 2], "Union with an empty destination failed");

    let mut dest = array_buffer(&[7, 9], 4, 4);
    let len = array_or_array(&mut dest, 2, &source, 0, 0);
    assert_eq!(decode_array(&dest, len), vec![7, 9], "Union with an empty source failed");
}

//-----------------------------------------------------------------------------

// The kernels are exercised through mutable color sets as well; these tests
// pin down the raw buffer contracts (offsets, compaction, masking).

#[test]
fn kernels_preserve_source() {
    let source_values: Vec<u64> = vec![10, 20, 30];
    let source = array_source(&source_values, 5);
    let mut dest = array_buffer(&[10, 25, 30], 6, 6);
    let _ = array_or_array(&mut dest, 3, &source, 5, 3);
    assert_eq!(decode_array(&source, 5), vec![0; 5], "Source prefix was modified");
    for (i, &value) in source_values.iter().enumerate() {
        assert_eq!(source.get(5 + i), value, "Source operand was modified at offset {}", i);
    }
}

//-----------------------------------------------------------------------------
