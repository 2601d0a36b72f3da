//! Concatenated storage for the distinct color sets of an index.
//!
//! A pan-genome index holds millions of distinct color sets whose sizes span
//! many orders of magnitude. Storing each set as its own heap allocation
//! wastes space on allocator headers and padding, so the storage
//! concatenates all of them into two shared buffers: bitmap-encoded sets go
//! into one bit array and array-encoded sets into one fixed-width integer
//! array. A bit vector marks the encoding of each set, and its rank support
//! maps a set identifier to the right range of the right buffer.
//!
//! The storage is built once with [`ColorSetStorageBuilder`] and is
//! read-only afterwards. A finalized [`ColorSetStorage`] can be queried from
//! multiple threads without synchronization.

use crate::color_set::{self, ColorSetView};
use crate::serialize::{read_format_tag, write_format_tag, LoadError};
use crate::support;

use simple_sds::bit_vector::BitVector;
use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Access, BitVec, Rank};
use simple_sds::raw_vector::{RawVector, AccessRaw, PushRaw};
use simple_sds::serialize::Serialize;

use std::collections::BTreeMap;
use std::io;


//-----------------------------------------------------------------------------

/// Builds a [`ColorSetStorage`] from a sequence of color sets.
///
/// Sets are appended with [`ColorSetStorageBuilder::add_set`] and receive
/// identifiers in insertion order, starting from 0. The builder keeps the
/// concatenations in growable form; [`ColorSetStorageBuilder::finalize`]
/// packs them and consumes the builder, so a storage cannot be queried
/// half-built or extended after the fact.
#[derive(Clone, Debug)]
pub struct ColorSetStorageBuilder {
    bitmap_concat: RawVector,
    arrays_concat: Vec<u64>,
    bitmap_starts: Vec<u64>,
    arrays_starts: Vec<u64>,
    is_bitmap_marks: RawVector,
}

impl Default for ColorSetStorageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorSetStorageBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        ColorSetStorageBuilder {
            bitmap_concat: RawVector::new(),
            arrays_concat: Vec::new(),
            bitmap_starts: Vec::new(),
            arrays_starts: Vec::new(),
            is_bitmap_marks: RawVector::new(),
        }
    }

    /// Returns the number of sets added so far.
    pub fn len(&self) -> usize {
        self.is_bitmap_marks.len()
    }

    /// Returns `true` if no sets have been added.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a set given as a sorted vector of distinct colors.
    ///
    /// The set is encoded as a bitmap or as an array, whichever is smaller,
    /// and its identifier is the number of sets added before it.
    ///
    /// # Panics
    ///
    /// Panics if the colors are not sorted or not distinct.
    pub fn add_set(&mut self, colors: &[u64]) {
        color_set::check_sorted(colors, "ColorSetStorageBuilder::add_set");
        if color_set::bitmap_is_smaller(colors) {
            self.is_bitmap_marks.push_bit(true);
            self.bitmap_starts.push(self.bitmap_concat.len() as u64);
            let start = self.bitmap_concat.len();
            let universe = *colors.last().unwrap() as usize + 1;
            self.bitmap_concat.resize(start + universe, false);
            for &color in colors {
                self.bitmap_concat.set_bit(start + color as usize, true);
            }
        } else {
            self.is_bitmap_marks.push_bit(false);
            self.arrays_starts.push(self.arrays_concat.len() as u64);
            self.arrays_concat.extend_from_slice(colors);
        }
    }

    /// Packs the concatenations and returns the finished storage.
    pub fn finalize(mut self) -> ColorSetStorage {
        // Sentinels one past the end, so the length of the last set of each
        // kind is starts[k + 1] - starts[k] like for any other set.
        self.bitmap_starts.push(self.bitmap_concat.len() as u64);
        self.arrays_starts.push(self.arrays_concat.len() as u64);

        let mut is_bitmap_marks = BitVector::from(self.is_bitmap_marks);
        is_bitmap_marks.enable_rank();

        let result = ColorSetStorage {
            bitmap_concat: self.bitmap_concat,
            bitmap_starts: support::pack_integers(&self.bitmap_starts),
            arrays_concat: support::pack_integers(&self.arrays_concat),
            arrays_starts: support::pack_integers(&self.arrays_starts),
            is_bitmap_marks,
        };
        log::info!("Finalized a color set storage with {} sets", result.count());
        result
    }
}

//-----------------------------------------------------------------------------

/// An immutable collection of color sets in two shared concatenations.
///
/// Each stored set is identified by its insertion order in the builder.
/// [`ColorSetStorage::view_of`] resolves an identifier to a
/// [`ColorSetView`] borrowing the storage; the view supports all read
/// queries and can be combined with others through a
/// [`crate::ColorSet`].
///
/// # Examples
///
/// ```
/// use kmer_coloring::{ColorSet, ColorSetStorageBuilder};
///
/// let mut builder = ColorSetStorageBuilder::new();
/// builder.add_set(&[4, 1534, 4003, 8903]);
/// builder.add_set(&[0, 2, 4, 6, 8]);
/// builder.add_set(&[]);
/// let storage = builder.finalize();
/// assert_eq!(storage.count(), 3);
///
/// let view = storage.view_of(0);
/// assert!(!view.is_bitmap());
/// assert_eq!(view.count(), 4);
/// assert!(view.contains(1534));
///
/// // Combine the color sets of two k-mers.
/// let mut result = ColorSet::from_view(&storage.view_of(0));
/// result.intersect_with(&storage.view_of(1));
/// assert_eq!(result.to_vec(), vec![4]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorSetStorage {
    bitmap_concat: RawVector,
    bitmap_starts: IntVector,
    arrays_concat: IntVector,
    arrays_starts: IntVector,
    is_bitmap_marks: BitVector,
}

impl ColorSetStorage {
    /// Format tag identifying this storage kind in a serialized coloring.
    pub const FORMAT_TAG: &'static str = "sdsl-hybrid-v4";

    /// Builds a storage directly from a sequence of sorted color vectors.
    ///
    /// Prefer [`ColorSetStorageBuilder`] when the sets are produced one at
    /// a time.
    pub fn from_sets<I>(sets: I) -> ColorSetStorage
    where
        I: IntoIterator,
        I::Item: AsRef<[u64]>,
    {
        let mut builder = ColorSetStorageBuilder::new();
        for set in sets {
            builder.add_set(set.as_ref());
        }
        builder.finalize()
    }

    /// Returns the number of stored sets.
    #[inline]
    pub fn count(&self) -> usize {
        self.is_bitmap_marks.len()
    }

    /// Returns a view of the set with the given identifier.
    ///
    /// # Panics
    ///
    /// Panics if `id >= self.count()`.
    pub fn view_of(&self, id: usize) -> ColorSetView<'_> {
        assert!(
            id < self.count(),
            "ColorSetStorage::view_of: color set id {} out of range ({} sets stored)",
            id, self.count()
        );
        if self.is_bitmap_marks.get(id) {
            // This many bitmaps precede this set.
            let rank = self.is_bitmap_marks.rank(id);
            let start = self.bitmap_starts.get(rank) as usize;
            let end = self.bitmap_starts.get(rank + 1) as usize;
            ColorSetView::Bitmap { data: &self.bitmap_concat, start, len: end - start }
        } else {
            // This many arrays precede this set.
            let rank = id - self.is_bitmap_marks.rank(id);
            let start = self.arrays_starts.get(rank) as usize;
            let end = self.arrays_starts.get(rank + 1) as usize;
            ColorSetView::Array { data: &self.arrays_concat, start, len: end - start }
        }
    }

    /// Returns an iterator over all stored sets in identifier order.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = ColorSetView<'a>> + 'a {
        (0..self.count()).map(move |id| self.view_of(id))
    }

    /// Returns the serialized size of each component in bytes.
    ///
    /// The keys are `bitmaps-concat`, `bitmaps-starts`, `arrays-concat`,
    /// `arrays-starts`, `is-bitmap-marks`, and
    /// `is-bitmap-marks-rank-support`.
    pub fn space_breakdown(&self) -> BTreeMap<String, usize> {
        let mut result = BTreeMap::new();
        result.insert(String::from("bitmaps-concat"), self.bitmap_concat.size_in_bytes());
        result.insert(String::from("bitmaps-starts"), self.bitmap_starts.size_in_bytes());
        result.insert(String::from("arrays-concat"), self.arrays_concat.size_in_bytes());
        result.insert(String::from("arrays-starts"), self.arrays_starts.size_in_bytes());

        // The marks serialize together with their rank support; report the
        // plain bits and the support tables separately.
        let mut plain = RawVector::with_len(self.is_bitmap_marks.len(), false);
        for i in 0..self.is_bitmap_marks.len() {
            if self.is_bitmap_marks.get(i) {
                plain.set_bit(i, true);
            }
        }
        let plain_bytes = BitVector::from(plain).size_in_bytes();
        let marks_bytes = self.is_bitmap_marks.size_in_bytes();
        result.insert(String::from("is-bitmap-marks"), plain_bytes);
        result.insert(String::from("is-bitmap-marks-rank-support"), marks_bytes - plain_bytes);

        if self.count() > 0 {
            let fraction = self.is_bitmap_marks.count_ones() as f64 / self.count() as f64;
            log::debug!("Fraction of bitmaps in the storage: {:.3}", fraction);
        }
        result
    }

    /// Writes the format tag followed by the storage.
    pub fn save_tagged<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        write_format_tag(writer, Self::FORMAT_TAG)?;
        self.serialize(writer)
    }

    /// Loads a storage written with [`ColorSetStorage::save_tagged`].
    ///
    /// If the data is tagged with a different format, the result is
    /// [`LoadError::WrongFormat`]. The caller may then reopen the input and
    /// probe another format:
    ///
    /// ```no_run
    /// use kmer_coloring::{ColorSetStorage, LoadError};
    /// use std::fs::File;
    ///
    /// # fn main() -> Result<(), LoadError> {
    /// let mut file = File::open("index.colors")?;
    /// match ColorSetStorage::load_tagged(&mut file) {
    ///     Ok(storage) => { /* use the storage */ }
    ///     Err(LoadError::WrongFormat { found, .. }) => {
    ///         // Reopen the file and try the loader for `found`.
    ///     }
    ///     Err(err) => return Err(err),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_tagged<R: io::Read>(reader: &mut R) -> Result<ColorSetStorage, LoadError> {
        let tag = read_format_tag(reader)?;
        if tag != Self::FORMAT_TAG {
            return Err(LoadError::WrongFormat { expected: Self::FORMAT_TAG, found: tag });
        }
        Ok(Self::load(reader)?)
    }
}

//-----------------------------------------------------------------------------

impl Serialize for ColorSetStorage {
    fn serialize_header<T: io::Write>(&self, _writer: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.bitmap_concat.serialize(writer)?;
        self.bitmap_starts.serialize(writer)?;
        self.arrays_concat.serialize(writer)?;
        self.arrays_starts.serialize(writer)?;
        self.is_bitmap_marks.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        log::info!("Loading a color set storage");
        let bitmap_concat = RawVector::load(reader)?;
        let bitmap_starts = IntVector::load(reader)?;
        let arrays_concat = IntVector::load(reader)?;
        let arrays_starts = IntVector::load(reader)?;
        let mut is_bitmap_marks = BitVector::load(reader)?;
        // The rank support is stored with the bit vector; make sure we have
        // it even if the data comes from a writer that skipped it.
        is_bitmap_marks.enable_rank();
        Ok(ColorSetStorage {
            bitmap_concat,
            bitmap_starts,
            arrays_concat,
            arrays_starts,
            is_bitmap_marks,
        })
    }

    fn size_in_elements(&self) -> usize {
        self.bitmap_concat.size_in_elements()
            + self.bitmap_starts.size_in_elements()
            + self.arrays_concat.size_in_elements()
            + self.arrays_starts.size_in_elements()
            + self.is_bitmap_marks.size_in_elements()
    }
}

//-----------------------------------------------------------------------------
