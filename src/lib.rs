//! # kmer-coloring: hybrid color set storage for colored k-mer indexes
//!
//! This is the color set layer of a colored de Bruijn graph index.
//! Every distinct k-mer in the index is associated with a *color set*: the
//! set of reference sequences (identified by integer colors) that contain
//! the k-mer. A pan-genome index stores millions of distinct color sets
//! whose sizes span many orders of magnitude, so the representation has to
//! avoid per-set allocation overheads.
//!
//! All sets live in two shared concatenations. A set is encoded either as a
//! plain bitmap or as a sorted array of fixed-width integers, whichever
//! takes less space for that set, and a rank structure over the per-set
//! encoding marks resolves a set identifier to its range inside the right
//! concatenation.
//!
//! See [`ColorSetStorage`] and [`ColorSetStorageBuilder`] for building and
//! querying the storage, [`ColorSetView`] for the read interface of a
//! stored set, and [`ColorSet`] for the mutable sets used to intersect the
//! color sets of all k-mers in a query.
//!
//! ### Basic concepts
//!
//! Set identifiers are dense and assigned in insertion order; the mapping
//! from graph nodes to set identifiers is maintained elsewhere. Views
//! borrow the storage and are only valid while it is alive. A finalized
//! storage is immutable, so any number of threads may query it
//! concurrently.
//!
//! Serialized storages are framed by a format tag
//! ([`ColorSetStorage::FORMAT_TAG`]), so loaders that support several
//! coloring formats can probe them until the tag matches; a mismatch is
//! reported as the recoverable [`LoadError::WrongFormat`].

pub mod color_set;
pub mod serialize;
pub mod set_ops;
pub mod storage;
pub mod support;

pub use color_set::{ColorSet, ColorSetView};
pub use serialize::LoadError;
pub use storage::{ColorSetStorage, ColorSetStorageBuilder};
