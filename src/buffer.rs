//! The byte buffer underneath every archive/linker handle: ownership, capacity bookkeeping and
//! container-kind detection.
//!
//! Every entry table in this crate is maintained directly inside one contiguous buffer — there
//! is no parallel tree of owned `Entry` objects. [`RawBuffer`] is the thing that owns (or
//! borrows) that buffer and tracks how many of its bytes are currently in use.

use crate::endian::read_u32_le;

/// 4-byte little-endian magic read from offset 0 of an `.arl` buffer.
const ARL2_MAGIC: u32 = 0x324C_5241;
/// 4-byte little-endian magic read from offset 0 of a SEGS-compressed buffer.
const SEGS_MAGIC: u32 = 0x7367_6573;
/// 4-byte little-endian magic read from offset 0 of an XCompression-compressed buffer.
const XCOMP_MAGIC: u32 = 0xEE12_F50F;

/// What kind of container a buffer's first four bytes identify it as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// An uncompressed `.ar` or `.arl` (for `.arl`, this also implies the `ARL2` identifier was
    /// found; for `.ar` there is no dedicated magic, so anything that isn't one of the other
    /// three kinds is assumed Regular).
    Regular,
    /// SEGS-compressed: a chunked DEFLATE wrapper (see [`crate::segs`]).
    Segs,
    /// XCompression (LZX-family) compressed (see [`crate::xcompress`]).
    XCompressed,
    /// Identifier bytes did not match any recognized magic (only possible for `.arl`, which
    /// requires the `ARL2` identifier to be considered valid).
    Invalid,
}

impl ArchiveKind {
    /// Classifies a buffer by its first four bytes, the way `.ar` does: anything that isn't a
    /// known compressed-container magic is assumed to be an uncompressed archive.
    pub fn detect_ar(bytes: &[u8]) -> Self {
        match Self::magic(bytes) {
            Some(SEGS_MAGIC) => ArchiveKind::Segs,
            Some(XCOMP_MAGIC) => ArchiveKind::XCompressed,
            _ => ArchiveKind::Regular,
        }
    }

    /// Classifies a buffer by its first four bytes the way `.arl` does: the identifier must be
    /// `ARL2` to be considered a valid, uncompressed linker.
    pub fn detect_arl(bytes: &[u8]) -> Self {
        match Self::magic(bytes) {
            Some(ARL2_MAGIC) => ArchiveKind::Regular,
            Some(SEGS_MAGIC) => ArchiveKind::Segs,
            Some(XCOMP_MAGIC) => ArchiveKind::XCompressed,
            _ => ArchiveKind::Invalid,
        }
    }

    fn magic(bytes: &[u8]) -> Option<u32> {
        if bytes.len() < 4 {
            None
        } else {
            Some(read_u32_le(bytes, 0))
        }
    }
}

/// Either an owned, heap-allocated buffer or one borrowed from the caller.
///
/// In both cases the underlying storage is exactly `capacity` bytes long; `RawBuffer` tracks
/// how many of those bytes are in logical use in a separate `length` field, the same way the
/// original's `(data, len, cap)` triple does, rather than growing/shrinking the allocation on
/// every edit.
pub(crate) enum Storage<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a mut [u8]),
}

impl<'a> Storage<'a> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Owned(v) => v,
            Storage::Borrowed(b) => b,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Storage::Owned(v) => v,
            Storage::Borrowed(b) => b,
        }
    }
}

/// A buffer carrying a `(length, capacity, kind)` triple, shared by the `.ar` and `.arl`
/// editors and by the decompression routines.
pub struct RawBuffer<'a> {
    storage: Storage<'a>,
    length: usize,
    kind: ArchiveKind,
}

impl<'a> RawBuffer<'a> {
    pub(crate) fn new(storage: Storage<'a>, length: usize, kind: ArchiveKind) -> Self {
        debug_assert!(length <= storage.as_slice().len());
        Self {
            storage,
            length,
            kind,
        }
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.storage.as_slice()[..self.length]
    }

    pub(crate) fn capacity_bytes_mut(&mut self) -> &mut [u8] {
        self.storage.as_mut_slice()
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub(crate) fn set_length(&mut self, length: usize) {
        debug_assert!(length <= self.capacity());
        self.length = length;
    }

    pub fn capacity(&self) -> usize {
        self.storage.as_slice().len()
    }

    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }
}
