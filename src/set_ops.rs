//! Pairwise set operations over ranges of the shared buffers.
//!
//! Color sets are stored either as bitmaps (bit ranges of a [`RawVector`])
//! or as sorted arrays (element ranges of an [`IntVector`]), so intersection
//! and union each come in four variants, one per combination of
//! representations.
//!
//! Every kernel takes a destination buffer owned by the caller with a
//! logical length `dest_len`, and a read-only source range
//! `[src_start, src_start + src_len)` in another buffer. The kernel
//! overwrites the destination prefix and returns the new logical length.
//! Kernels never reallocate: anything past the new length is left in place,
//! and the union kernels require the caller to provide enough capacity up
//! front. Array operands are sorted in increasing order with distinct
//! elements.

use crate::support::{self, OneIter};

use simple_sds::bits;
use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Access, Vector};
use simple_sds::raw_vector::{RawVector, AccessRaw};

use std::cmp;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

// Reads `width` bits at `offset` within the logical bit range of `len` bits
// starting at `start`. Bits at or past the logical length read as zeros, so
// stale capacity left behind by earlier operations cannot leak through.
fn masked_word(data: &RawVector, start: usize, offset: usize, len: usize, width: usize) -> u64 {
    if offset >= len {
        return 0;
    }
    let avail = cmp::min(width, len - offset);
    unsafe { data.int(start + offset, avail) }
}

// Writes the merged values into the destination prefix and returns their count.
fn write_prefix(dest: &mut IntVector, values: &[u64], op: &str) -> usize {
    assert!(dest.len() >= values.len(), "{}: destination capacity is too small", op);
    if let Some(&max_value) = values.last() {
        assert!(support::bits_needed(max_value) <= dest.width(), "{}: destination width is too small", op);
    }
    for (i, &value) in values.iter().enumerate() {
        dest.set(i, value);
    }
    values.len()
}

//-----------------------------------------------------------------------------

// Intersections.

/// Intersects the bitmap in `dest` with a bitmap range of `source`.
///
/// The new length is the minimum of the two lengths.
pub fn bitmap_and_bitmap(dest: &mut RawVector, dest_len: usize, source: &RawVector, src_start: usize, src_len: usize) -> usize {
    let new_len = cmp::min(dest_len, src_len);
    let mut offset = 0;
    while offset < new_len {
        let width = cmp::min(bits::WORD_BITS, new_len - offset);
        let word = unsafe { dest.int(offset, width) & source.int(src_start + offset, width) };
        unsafe { dest.set_int(offset, word, width); }
        offset += width;
    }
    new_len
}

/// Intersects the sorted array in `dest` with a bitmap range of `source`,
/// compacting the surviving elements to the front.
pub fn array_and_bitmap(dest: &mut IntVector, dest_len: usize, source: &RawVector, src_start: usize, src_len: usize) -> usize {
    let mut kept = 0;
    for i in 0..dest_len {
        let value = dest.get(i);
        if (value as usize) < src_len && source.bit(src_start + value as usize) {
            dest.set(kept, value);
            kept += 1;
        }
    }
    kept
}

/// Intersects the bitmap in `dest` with a sorted array range of `source`.
///
/// The result is still a bitmap. Its length is one past the largest
/// surviving element, or zero if nothing survives; every other bit up to
/// the old length is cleared.
pub fn bitmap_and_array(dest: &mut RawVector, dest_len: usize, source: &IntVector, src_start: usize, src_len: usize) -> usize {
    let mut new_len = 0;
    let mut cleared_to = 0;
    for i in 0..src_len {
        let value = source.get(src_start + i) as usize;
        if value >= dest_len {
            // The source is sorted, so the remaining elements are also out of range.
            break;
        }
        if dest.bit(value) {
            support::zero_bits(dest, cleared_to, value - cleared_to);
            cleared_to = value + 1;
            new_len = value + 1;
        }
    }
    support::zero_bits(dest, cleared_to, dest_len - cleared_to);
    new_len
}

/// Intersects the sorted array in `dest` with a sorted array range of
/// `source`, compacting the common elements to the front.
pub fn array_and_array(dest: &mut IntVector, dest_len: usize, source: &IntVector, src_start: usize, src_len: usize) -> usize {
    let mut i = 0;
    let mut j = 0;
    let mut kept = 0;
    while i < dest_len && j < src_len {
        let a = dest.get(i);
        let b = source.get(src_start + j);
        if a == b {
            dest.set(kept, a);
            kept += 1;
            i += 1;
            j += 1;
        } else if a < b {
            i += 1;
        } else {
            j += 1;
        }
    }
    kept
}

//-----------------------------------------------------------------------------

// Unions.

/// Unions the bitmap in `dest` with a bitmap range of `source`.
///
/// The new length is the maximum of the two lengths, and `dest` must have
/// at least that many bits.
pub fn bitmap_or_bitmap(dest: &mut RawVector, dest_len: usize, source: &RawVector, src_start: usize, src_len: usize) -> usize {
    let new_len = cmp::max(dest_len, src_len);
    assert!(dest.len() >= new_len, "bitmap_or_bitmap: destination capacity is too small");
    let mut offset = 0;
    while offset < new_len {
        let width = cmp::min(bits::WORD_BITS, new_len - offset);
        let word = masked_word(dest, 0, offset, dest_len, width)
            | masked_word(source, src_start, offset, src_len, width);
        unsafe { dest.set_int(offset, word, width); }
        offset += width;
    }
    new_len
}

/// Unions the bitmap in `dest` with a sorted array range of `source`.
///
/// The new length is one past the largest element of either side, and
/// `dest` must have at least that many bits.
pub fn bitmap_or_array(dest: &mut RawVector, dest_len: usize, source: &IntVector, src_start: usize, src_len: usize) -> usize {
    let mut new_len = dest_len;
    if src_len > 0 {
        let last = source.get(src_start + src_len - 1) as usize;
        new_len = cmp::max(dest_len, last + 1);
    }
    assert!(dest.len() >= new_len, "bitmap_or_array: destination capacity is too small");
    // The grown range may hold stale bits from earlier operations.
    support::zero_bits(dest, dest_len, new_len - dest_len);
    for i in 0..src_len {
        dest.set_bit(source.get(src_start + i) as usize, true);
    }
    new_len
}

/// Unions the sorted array in `dest` with a bitmap range of `source`,
/// writing the merged elements to the front of `dest`.
///
/// `dest` must have capacity for the merged result and a large enough
/// width for the largest set bit position of the source range.
pub fn array_or_bitmap(dest: &mut IntVector, dest_len: usize, source: &RawVector, src_start: usize, src_len: usize) -> usize {
    let mut merged: Vec<u64> = Vec::with_capacity(dest_len + src_len);
    let mut i = 0;
    for position in OneIter::new(source, src_start, src_len) {
        let b = position as u64;
        while i < dest_len && dest.get(i) < b {
            merged.push(dest.get(i));
            i += 1;
        }
        if i < dest_len && dest.get(i) == b {
            i += 1;
        }
        merged.push(b);
    }
    while i < dest_len {
        merged.push(dest.get(i));
        i += 1;
    }
    write_prefix(dest, &merged, "array_or_bitmap")
}

/// Unions the sorted array in `dest` with a sorted array range of `source`,
/// writing the merged elements to the front of `dest`.
///
/// `dest` must have capacity for the merged result and a large enough
/// width for the largest element of the source range.
pub fn array_or_array(dest: &mut IntVector, dest_len: usize, source: &IntVector, src_start: usize, src_len: usize) -> usize {
    let mut merged: Vec<u64> = Vec::with_capacity(dest_len + src_len);
    let mut i = 0;
    let mut j = 0;
    while i < dest_len && j < src_len {
        let a = dest.get(i);
        let b = source.get(src_start + j);
        if a == b {
            merged.push(a);
            i += 1;
            j += 1;
        } else if a < b {
            merged.push(a);
            i += 1;
        } else {
            merged.push(b);
            j += 1;
        }
    }
    while i < dest_len {
        merged.push(dest.get(i));
        i += 1;
    }
    while j < src_len {
        merged.push(source.get(src_start + j));
        j += 1;
    }
    write_prefix(dest, &merged, "array_or_array")
}

//-----------------------------------------------------------------------------
