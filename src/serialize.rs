//! Format tags and load errors for serialized coloring structures.
//!
//! A serialized coloring starts with a length-prefixed ASCII tag naming the
//! concrete color set format. A loader that supports several formats probes
//! them in turn: it reads the tag, and if the tag names another format it
//! gets a recoverable [`LoadError::WrongFormat`] and can retry with the next
//! candidate.

use std::io;
use std::io::{Read, Write};

use thiserror::Error;


//-----------------------------------------------------------------------------

// A tag is a short format name; anything longer is not a tag.
const MAX_TAG_LEN: u64 = 256;

/// An error from loading a serialized coloring structure.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The data is tagged with a different format than the requested one.
    ///
    /// This is recoverable: the caller may reopen the input and try the
    /// format named in the tag.
    #[error("wrong color set format: expected tag {expected:?}, found {found:?}")]
    WrongFormat {
        /// The tag of the requested format.
        expected: &'static str,
        /// The tag found in the data.
        found: String,
    },

    /// Reading or writing the underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

//-----------------------------------------------------------------------------

/// Writes a length-prefixed ASCII format tag.
///
/// The tag is written as a little-endian `u64` length followed by the tag
/// bytes.
pub fn write_format_tag<W: Write>(writer: &mut W, tag: &str) -> io::Result<()> {
    writer.write_all(&(tag.len() as u64).to_le_bytes())?;
    writer.write_all(tag.as_bytes())?;
    Ok(())
}

/// Reads a format tag written with [`write_format_tag`].
///
/// Data that cannot be a tag at all (an implausible length or bytes that
/// are not UTF-8) is reported as [`io::ErrorKind::InvalidData`].
pub fn read_format_tag<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    let len = u64::from_le_bytes(buf);
    if len > MAX_TAG_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("format tag length {} is not plausible", len),
        ));
    }
    let mut tag = vec![0u8; len as usize];
    reader.read_exact(&mut tag)?;
    String::from_utf8(tag)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "format tag is not valid UTF-8"))
}

//-----------------------------------------------------------------------------
