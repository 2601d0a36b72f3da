//! Color sets: storage-resident views and standalone mutable sets.
//!
//! A color set is the set of reference sequences (colors) that contain a
//! k-mer. A set is encoded either as a bitmap (bit `i` set iff color `i` is
//! present) or as a sorted array of colors, whichever takes less space.
//! [`ColorSetView`] is a non-owning handle to one encoded set inside the
//! concatenated buffers of a [`crate::ColorSetStorage`]. [`ColorSet`] owns
//! its buffer and additionally supports intersection and union against
//! views, which is how a query combines the color sets of its k-mers.

use crate::set_ops;
use crate::support::{self, OneIter};

use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Access, Push, Vector};
use simple_sds::raw_vector::{RawVector, AccessRaw};

use std::cmp;


//-----------------------------------------------------------------------------

/// Returns `true` if a set with the given sorted contents takes fewer bits
/// as a bitmap than as a sorted array.
///
/// A bitmap costs one bit per possible color up to the maximum `M`, while an
/// array costs about `ceil(log2(M))` bits per element. Empty sets are stored
/// as arrays. Storage ingest and [`ColorSet::from_colors`] share this
/// predicate, so a set round-trips to the same encoding through either path.
pub(crate) fn bitmap_is_smaller(colors: &[u64]) -> bool {
    match colors.last() {
        None => false,
        Some(&max_color) => {
            // ceil(log2(x)) == bit_len(x - 1) for x >= 2.
            let width = support::bits_needed(cmp::max(max_color, 2) - 1) as u64;
            width.saturating_mul(colors.len() as u64) > max_color
        }
    }
}

// Unsorted input to a color set constructor is a bug in the caller.
pub(crate) fn check_sorted(colors: &[u64], op: &str) {
    for i in 1..colors.len() {
        assert!(colors[i - 1] < colors[i], "{}: colors must be sorted and distinct", op);
    }
}

//-----------------------------------------------------------------------------

/// A non-owning handle to a color set inside shared concatenated buffers.
///
/// A view selects either a bit range of a bitmap concatenation or an element
/// range of an array concatenation. Views are cheap to copy, and the borrow
/// keeps them from outliving the storage that produced them. Two views of
/// the same stored set are interchangeable.
#[derive(Clone, Copy, Debug)]
pub enum ColorSetView<'a> {
    /// A bit range of length `len`: bit `i` is set iff color `i` is present.
    Bitmap {
        /// The shared bitmap concatenation.
        data: &'a RawVector,
        /// First bit of the range.
        start: usize,
        /// Number of bits in the range.
        len: usize,
    },
    /// A range of `len` sorted colors.
    Array {
        /// The shared array concatenation.
        data: &'a IntVector,
        /// First element of the range.
        start: usize,
        /// Number of elements in the range.
        len: usize,
    },
}

impl<'a> ColorSetView<'a> {
    /// Returns `true` if the set is encoded as a bitmap.
    #[inline]
    pub fn is_bitmap(&self) -> bool {
        matches!(self, ColorSetView::Bitmap { .. })
    }

    /// Returns `true` if the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        match self {
            ColorSetView::Bitmap { len, .. } => *len == 0,
            ColorSetView::Array { len, .. } => *len == 0,
        }
    }

    /// Returns the number of colors in the set.
    pub fn count(&self) -> usize {
        match *self {
            ColorSetView::Bitmap { data, start, len } => support::count_ones_in_range(data, start, len),
            ColorSetView::Array { len, .. } => len,
        }
    }

    /// Returns the size of the encoded set in bits.
    pub fn size_in_bits(&self) -> usize {
        match *self {
            ColorSetView::Bitmap { len, .. } => len,
            ColorSetView::Array { data, len, .. } => len * data.width(),
        }
    }

    /// Returns `true` if the set contains `color`.
    pub fn contains(&self, color: u64) -> bool {
        match *self {
            ColorSetView::Bitmap { data, start, len } => {
                (color as usize) < len && data.bit(start + color as usize)
            }
            ColorSetView::Array { data, start, len } => {
                let mut low = 0;
                let mut high = len;
                while low < high {
                    let mid = low + (high - low) / 2;
                    if data.get(start + mid) < color {
                        low = mid + 1;
                    } else {
                        high = mid;
                    }
                }
                low < len && data.get(start + low) == color
            }
        }
    }

    /// Decodes the set into a sorted vector of colors.
    pub fn to_vec(&self) -> Vec<u64> {
        match *self {
            ColorSetView::Bitmap { data, start, len } => {
                OneIter::new(data, start, len).map(|x| x as u64).collect()
            }
            ColorSetView::Array { data, start, len } => {
                (0..len).map(|i| data.get(start + i)).collect()
            }
        }
    }
}

//-----------------------------------------------------------------------------

/// A color set that owns its buffer and supports set operations.
///
/// The set is created from sorted colors or as a copy of a view, and it is
/// combined with further views using [`ColorSet::intersect_with`] and
/// [`ColorSet::union_with`]. Intersections reuse the owned buffer instead of
/// reallocating, which matters in the query loop where one mutable set is
/// intersected with the views of every k-mer in the query.
///
/// An intersection of a bitmap with an array view switches the set to the
/// array encoding, because the outcome is at most as large as the array
/// operand. Other operations preserve the encoding.
///
/// # Examples
///
/// ```
/// use kmer_coloring::ColorSet;
///
/// let evens = ColorSet::from_colors(&[0, 2, 4, 6, 8]);
/// assert_eq!(evens.count(), 5);
/// assert!(evens.contains(4));
///
/// let mut result = evens.clone();
/// result.intersect_with(&ColorSet::from_colors(&[2, 3, 4]).as_view());
/// assert_eq!(result.to_vec(), vec![2, 4]);
///
/// result.union_with(&ColorSet::from_colors(&[9]).as_view());
/// assert_eq!(result.to_vec(), vec![2, 4, 9]);
/// ```
#[derive(Clone, Debug)]
pub struct ColorSet {
    data: SetData,
    // Logical length: bits for a bitmap, elements for an array. The owned
    // buffer may be longer after in-place operations.
    len: usize,
}

#[derive(Clone, Debug)]
enum SetData {
    Bitmap(RawVector),
    Array(IntVector),
}

impl Default for ColorSet {
    fn default() -> Self {
        ColorSet { data: SetData::Bitmap(RawVector::new()), len: 0 }
    }
}

impl ColorSet {
    /// Creates a color set from a sorted vector of distinct colors.
    ///
    /// The encoding is chosen with the same predicate the storage uses.
    ///
    /// # Panics
    ///
    /// Panics if the colors are not sorted or not distinct.
    pub fn from_colors(colors: &[u64]) -> ColorSet {
        check_sorted(colors, "ColorSet::from_colors");
        if bitmap_is_smaller(colors) {
            let universe = *colors.last().unwrap() as usize + 1;
            let mut data = RawVector::with_len(universe, false);
            for &color in colors {
                data.set_bit(color as usize, true);
            }
            ColorSet { data: SetData::Bitmap(data), len: universe }
        } else {
            let width = support::bits_needed(colors.last().copied().unwrap_or(0));
            let mut data = IntVector::with_capacity(colors.len(), width).unwrap();
            for &color in colors {
                data.push(color);
            }
            ColorSet { data: SetData::Array(data), len: colors.len() }
        }
    }

    /// Creates a color set as a copy of a view, with the same encoding.
    pub fn from_view(view: &ColorSetView<'_>) -> ColorSet {
        match *view {
            ColorSetView::Bitmap { data, start, len } => {
                let mut copy = RawVector::with_len(len, false);
                support::copy_bit_range(data, start, len, &mut copy, 0);
                ColorSet { data: SetData::Bitmap(copy), len }
            }
            ColorSetView::Array { data, start, len } => {
                let mut copy = IntVector::with_capacity(len, data.width()).unwrap();
                for i in 0..len {
                    copy.push(data.get(start + i));
                }
                ColorSet { data: SetData::Array(copy), len }
            }
        }
    }

    /// Returns a view of the set's own buffer.
    ///
    /// The view borrows the set and becomes invalid when the set is mutated.
    pub fn as_view(&self) -> ColorSetView<'_> {
        match &self.data {
            SetData::Bitmap(data) => ColorSetView::Bitmap { data, start: 0, len: self.len },
            SetData::Array(data) => ColorSetView::Array { data, start: 0, len: self.len },
        }
    }

    /// Returns `true` if the set is encoded as a bitmap.
    #[inline]
    pub fn is_bitmap(&self) -> bool {
        matches!(self.data, SetData::Bitmap(_))
    }

    /// Returns `true` if the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of colors in the set.
    pub fn count(&self) -> usize {
        self.as_view().count()
    }

    /// Returns the size of the encoded set in bits.
    pub fn size_in_bits(&self) -> usize {
        self.as_view().size_in_bits()
    }

    /// Returns `true` if the set contains `color`.
    pub fn contains(&self, color: u64) -> bool {
        self.as_view().contains(color)
    }

    /// Decodes the set into a sorted vector of colors.
    pub fn to_vec(&self) -> Vec<u64> {
        self.as_view().to_vec()
    }

    /// Replaces this set with its intersection with the view.
    ///
    /// The operation reuses the owned buffer. When a bitmap is intersected
    /// with an array view, the set adopts the array encoding.
    pub fn intersect_with(&mut self, view: &ColorSetView<'_>) {
        let replacement = match (&mut self.data, *view) {
            (SetData::Bitmap(data), ColorSetView::Bitmap { data: source, start, len }) => {
                self.len = set_ops::bitmap_and_bitmap(data, self.len, source, start, len);
                None
            }
            (SetData::Array(data), ColorSetView::Bitmap { data: source, start, len }) => {
                self.len = set_ops::array_and_bitmap(data, self.len, source, start, len);
                None
            }
            (SetData::Bitmap(data), ColorSetView::Array { data: source, start, len }) => {
                // The result fits in the array operand: intersect into a
                // mutable copy of that array and adopt it.
                let mut copy = IntVector::with_capacity(len, source.width()).unwrap();
                for i in 0..len {
                    copy.push(source.get(start + i));
                }
                let new_len = set_ops::array_and_bitmap(&mut copy, len, data, 0, self.len);
                Some((SetData::Array(copy), new_len))
            }
            (SetData::Array(data), ColorSetView::Array { data: source, start, len }) => {
                self.len = set_ops::array_and_array(data, self.len, source, start, len);
                None
            }
        };
        if let Some((data, len)) = replacement {
            self.data = data;
            self.len = len;
        }
    }

    /// Replaces this set with its union with the view.
    ///
    /// The encoding is preserved; the owned buffer grows as needed to hold
    /// the result.
    pub fn union_with(&mut self, view: &ColorSetView<'_>) {
        let replacement = match (&mut self.data, *view) {
            (SetData::Bitmap(data), ColorSetView::Bitmap { data: source, start, len }) => {
                if data.len() < len {
                    data.resize(len, false);
                }
                self.len = set_ops::bitmap_or_bitmap(data, self.len, source, start, len);
                None
            }
            (SetData::Bitmap(data), ColorSetView::Array { data: source, start, len }) => {
                let needed = if len > 0 {
                    cmp::max(self.len, source.get(start + len - 1) as usize + 1)
                } else {
                    self.len
                };
                if data.len() < needed {
                    data.resize(needed, false);
                }
                self.len = set_ops::bitmap_or_array(data, self.len, source, start, len);
                None
            }
            (SetData::Array(data), ColorSetView::Bitmap { data: source, start, len }) => {
                let extra = support::count_ones_in_range(source, start, len);
                let width = cmp::max(data.width(), support::bits_needed(len.saturating_sub(1) as u64));
                let mut merged = IntVector::with_len(self.len + extra, width, 0).unwrap();
                for i in 0..self.len {
                    merged.set(i, data.get(i));
                }
                let new_len = set_ops::array_or_bitmap(&mut merged, self.len, source, start, len);
                Some((SetData::Array(merged), new_len))
            }
            (SetData::Array(data), ColorSetView::Array { data: source, start, len }) => {
                let width = cmp::max(data.width(), source.width());
                let mut merged = IntVector::with_len(self.len + len, width, 0).unwrap();
                for i in 0..self.len {
                    merged.set(i, data.get(i));
                }
                let new_len = set_ops::array_or_array(&mut merged, self.len, source, start, len);
                Some((SetData::Array(merged), new_len))
            }
        };
        if let Some((data, len)) = replacement {
            self.data = data;
            self.len = len;
        }
    }
}

//-----------------------------------------------------------------------------
