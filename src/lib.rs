//! `swarchive` reads, builds, edits and decompresses the `.ar`/`.arl` archive containers used by
//! a specific video game's resource packages.
//!
//! An `.ar` file packs a flat table of named byte blobs into one buffer; an `.arl` indexes the
//! entry names across a set of split `.ar` files. Both are edited in place: the entry table
//! lives directly inside one contiguous byte buffer, and `add`/`remove`/`update` shift the tail
//! of that buffer rather than maintaining a parallel object model.
//!
//! Compressed containers come in two flavors. SEGS ([`segs`]) is a chunked DEFLATE wrapper and
//! is fully supported, including the DEFLATE inflater itself ([`inflate`]). XCompression
//! ([`xcompress`]) is an LZX-family format; this crate only understands its framing (header and
//! per-block sizes) and can copy out blocks that happen to be stored at full size, but does not
//! implement LZX decoding.
//!
//! This crate never touches the filesystem — every entry point takes an already-materialized
//! byte buffer (and, for owning constructors, a `Vec<u8>` the caller already read into memory).
//!
//! ```
//! use swarchive::ArArchive;
//!
//! let mut ar = ArArchive::create_empty(512).unwrap();
//! ar.add("msg.txt", b"Hello").unwrap();
//! assert_eq!(ar.find("msg.txt").unwrap().data(), b"Hello");
//! ```

#![forbid(unsafe_code)]

pub mod ar;
pub mod arl;
mod buffer;
mod endian;
mod error;
mod hashset;
mod inflate;
pub mod merge;
pub mod segs;
pub mod xcompress;

pub use ar::{ArArchive, ArEntry, ArHeader, ArIter};
pub use arl::{ArlArchive, ArlEntry, ArlHeader, ArlIter};
pub use buffer::ArchiveKind;
pub use error::Error;
pub use merge::{merge_many, merge_two};

/// Returns the uncompressed size a buffer would decompress to, without decompressing it.
///
/// For a [`ArchiveKind::Regular`] buffer this is simply its own length; for [`ArchiveKind::Segs`]
/// and [`ArchiveKind::XCompressed`] it is read (and byte-swapped) from the respective compressed
/// header. [`ArchiveKind::Invalid`] only ever arises from `.arl` detection and has no meaningful
/// decompressed size.
pub fn decompressed_size(kind: ArchiveKind, bytes: &[u8]) -> Result<u64, Error> {
    match kind {
        ArchiveKind::Regular => Ok(bytes.len() as u64),
        ArchiveKind::Segs => segs::decompressed_size(bytes).map(u64::from),
        ArchiveKind::XCompressed => xcompress::decompressed_size(bytes),
        ArchiveKind::Invalid => Err(Error::WrongKind),
    }
}

/// Decompresses `compressed` into `out`, dispatching on `kind`. Returns the number of bytes
/// written, which on success always equals [`decompressed_size`].
///
/// Returns [`Error::WrongKind`] for [`ArchiveKind::Regular`] (nothing to decompress) and
/// [`ArchiveKind::Invalid`]. An [`ArchiveKind::XCompressed`] buffer containing any block that
/// would need real LZX decoding surfaces [`Error::Unsupported`], per this crate's documented
/// limitation.
pub fn decompress(kind: ArchiveKind, compressed: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    match kind {
        ArchiveKind::Segs => segs::decompress(compressed, out),
        ArchiveKind::XCompressed => xcompress::decompress(compressed, out),
        ArchiveKind::Regular | ArchiveKind::Invalid => Err(Error::WrongKind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompressed_size_is_own_length_for_regular() {
        let ar = ArArchive::create_empty(64).unwrap();
        assert_eq!(
            decompressed_size(ar.kind(), &[0u8; 16]).unwrap(),
            16
        );
    }

    #[test]
    fn decompress_rejects_regular_and_invalid_kinds() {
        let mut out = [0u8; 4];
        assert_eq!(
            decompress(ArchiveKind::Regular, &[0u8; 16], &mut out),
            Err(Error::WrongKind)
        );
        assert_eq!(
            decompress(ArchiveKind::Invalid, &[0u8; 16], &mut out),
            Err(Error::WrongKind)
        );
    }
}
