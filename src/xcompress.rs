//! XCompression (LZX-family) framing: header and per-block metadata only.
//!
//! Full LZX inflation is out of scope (see the crate-level docs); this module can locate and
//! size every block in a compressed buffer, and can copy out blocks that happen to be stored at
//! their full declared size, but returns [`Error::Unsupported`] the moment it meets a block that
//! would actually need LZX decoding.

use crate::endian::{read_u16_be, read_u32_be, read_u64_be};
use crate::error::Error;

/// 4-byte big-endian identifier at offset 0 of an XCompression-compressed buffer.
pub const XCOMP_MAGIC: u32 = 0xEE12_F50F;

const HEADER_SIZE: usize = 48;
/// Bytes consumed by one block record's fixed part, not counting its compressed payload:
/// a 4-byte compressed size, a 1-byte marker, and 20 bytes covering the uncompressed size plus
/// reserved padding.
const BLOCK_RECORD_SIZE: usize = 4 + 1 + 20;

/// The 48-byte XCompression header, byte-swapped into native fields.
#[derive(Debug, Clone, Copy)]
pub struct XCompHeader {
    pub identifier: u32,
    pub version: u16,
    pub reserved: u16,
    pub context_flags: u32,
    pub flags: u32,
    pub window_size: u32,
    pub partition_size: u32,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    pub uncompressed_block_size: u32,
    pub compressed_block_size_max: u32,
}

fn parse_header(bytes: &[u8]) -> Result<XCompHeader, Error> {
    if bytes.len() < HEADER_SIZE {
        return Err(Error::CorruptDeflateStream);
    }
    Ok(XCompHeader {
        identifier: read_u32_be(bytes, 0),
        version: read_u16_be(bytes, 4),
        reserved: read_u16_be(bytes, 6),
        context_flags: read_u32_be(bytes, 8),
        flags: read_u32_be(bytes, 12),
        window_size: read_u32_be(bytes, 16),
        partition_size: read_u32_be(bytes, 20),
        uncompressed_size: read_u64_be(bytes, 24),
        compressed_size: read_u64_be(bytes, 32),
        uncompressed_block_size: read_u32_be(bytes, 40),
        compressed_block_size_max: read_u32_be(bytes, 44),
    })
}

/// Reads the XCompression header of `compressed` and returns its advertised uncompressed size,
/// without decompressing anything.
pub fn decompressed_size(compressed: &[u8]) -> Result<u64, Error> {
    Ok(parse_header(compressed)?.uncompressed_size)
}

/// Walks the block table following the header, copying out any block whose declared
/// uncompressed size matches the header's `uncompressed_block_size` verbatim.
///
/// The block table ends at the first record whose marker byte is zero. A block whose declared
/// size does not match `uncompressed_block_size` would need real LZX decoding to recover, which
/// this crate does not implement; encountering one is reported as [`Error::Unsupported`] rather
/// than silently emitting wrong bytes.
pub fn decompress(compressed: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    let header = parse_header(compressed)?;
    let mut pos = HEADER_SIZE;
    let mut out_pos = 0usize;

    loop {
        if pos + 5 > compressed.len() {
            return Err(Error::CorruptDeflateStream);
        }
        let compressed_block_size = read_u32_be(compressed, pos) as usize;
        let marker = compressed[pos + 4];
        if marker == 0 {
            break;
        }
        if pos + BLOCK_RECORD_SIZE > compressed.len() {
            return Err(Error::CorruptDeflateStream);
        }
        let uncompressed_block_size = read_u16_be(compressed, pos + 5) as usize;

        if uncompressed_block_size != header.uncompressed_block_size as usize {
            return Err(Error::Unsupported(
                "XCompression block requires LZX decoding",
            ));
        }

        let data_start = pos + BLOCK_RECORD_SIZE;
        if data_start + compressed_block_size > compressed.len() {
            return Err(Error::CorruptDeflateStream);
        }
        let chunk_end = out_pos + uncompressed_block_size;
        if chunk_end > out.len() {
            return Err(Error::InsufficientCapacity {
                needed: chunk_end,
                capacity: out.len(),
            });
        }

        out[out_pos..chunk_end]
            .copy_from_slice(&compressed[data_start..data_start + uncompressed_block_size]);
        out_pos = chunk_end;

        pos = data_start + compressed_block_size;
    }

    Ok(out_pos)
}
