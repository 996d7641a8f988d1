use std::fmt;

/// The error type returned by fallible operations in this crate.
///
/// Every variant corresponds to one of the non-fatal conditions a caller can run into while
/// building, editing or decompressing an archive: a name collision, a missing entry, a buffer
/// that is too small, or compressed data that this crate cannot (yet, or ever) understand.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// `add` was called with a name that already exists in the archive.
    DuplicateName,

    /// `find`/`remove`/`update` was called with a name that has no matching entry.
    NotFound,

    /// An operation would need more bytes than the buffer's capacity allows.
    InsufficientCapacity {
        /// Bytes the operation would need to succeed.
        needed: usize,
        /// Bytes actually available.
        capacity: usize,
    },

    /// A linker operation was attempted on a buffer that is not a valid `.arl` (missing the
    /// `ARL2` identifier), or a decompression routine was invoked on the wrong container kind.
    WrongKind,

    /// `archive_index` passed to an `.arl` operation is out of range for the linker's
    /// `archive_count`.
    ArchiveIndexOutOfRange { index: usize, archive_count: u32 },

    /// A SEGS or XCompression block/chunk marker did not match any recognized value.
    UnknownBlockMarker(u8),

    /// The compressed data ended before the decoder expected it to, or otherwise violates the
    /// DEFLATE bitstream format.
    CorruptDeflateStream,

    /// A feature of the container that this crate deliberately does not implement (real LZX
    /// inflation being the prominent example).
    Unsupported(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;

        match self {
            DuplicateName => write!(f, "an entry with this name already exists"),
            NotFound => write!(f, "no entry with this name exists"),
            InsufficientCapacity { needed, capacity } => write!(
                f,
                "operation needs {} bytes but only {} are available",
                needed, capacity
            ),
            WrongKind => write!(f, "operation is not valid for this container's kind"),
            ArchiveIndexOutOfRange {
                index,
                archive_count,
            } => write!(
                f,
                "archive index {} is out of range for {} archives",
                index, archive_count
            ),
            UnknownBlockMarker(marker) => write!(f, "unknown block marker {:#x}", marker),
            CorruptDeflateStream => write!(f, "DEFLATE bitstream ended or decoded unexpectedly"),
            Unsupported(what) => write!(f, "unsupported: {}", what),
        }
    }
}

impl std::error::Error for Error {}
