//! SEGS: a chunked DEFLATE wrapper with big-endian on-disk headers.
//!
//! Each chunk is independently either stored verbatim (when its compressed and uncompressed
//! sizes are equal) or DEFLATE-compressed; chunks are concatenated into one flat output buffer.

use crate::endian::{read_u16_be, read_u32_be};
use crate::error::Error;
use crate::inflate::inflate;

/// 4-byte big-endian identifier ('s','g','e','s' read as one big-endian u32) at offset 0.
pub const SEGS_MAGIC: u32 = 0x7367_6573;

const HEADER_SIZE: usize = 16;
const CHUNK_ENTRY_SIZE: usize = 8;

/// The 16-byte SEGS header, byte-swapped into native fields.
#[derive(Debug, Clone, Copy)]
pub struct SegsHeader {
    pub identifier: u32,
    pub dummy: u16,
    pub chunk_count: u16,
    pub uncompressed_size: u32,
    pub compressed_size: u32,
}

fn parse_header(bytes: &[u8]) -> Result<SegsHeader, Error> {
    if bytes.len() < HEADER_SIZE {
        return Err(Error::CorruptDeflateStream);
    }
    Ok(SegsHeader {
        identifier: read_u32_be(bytes, 0),
        dummy: read_u16_be(bytes, 4),
        chunk_count: read_u16_be(bytes, 6),
        uncompressed_size: read_u32_be(bytes, 8),
        compressed_size: read_u32_be(bytes, 12),
    })
}

/// Reads the SEGS header of `compressed` and returns its advertised uncompressed size, without
/// decompressing anything.
pub fn decompressed_size(compressed: &[u8]) -> Result<u32, Error> {
    Ok(parse_header(compressed)?.uncompressed_size)
}

/// Decompresses a SEGS container from `compressed` into `out`, returning the number of bytes
/// written (always equal to the header's `uncompressed_size`, on success).
pub fn decompress(compressed: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    let header = parse_header(compressed)?;
    let uncompressed_size = header.uncompressed_size as usize;
    if out.len() < uncompressed_size {
        return Err(Error::InsufficientCapacity {
            needed: uncompressed_size,
            capacity: out.len(),
        });
    }

    let base_offset = HEADER_SIZE + header.chunk_count as usize * CHUNK_ENTRY_SIZE;
    let mut out_pos = 0usize;

    for i in 0..header.chunk_count as usize {
        let entry_offset = HEADER_SIZE + i * CHUNK_ENTRY_SIZE;
        if entry_offset + CHUNK_ENTRY_SIZE > compressed.len() {
            return Err(Error::CorruptDeflateStream);
        }

        let mut compressed_size = read_u16_be(compressed, entry_offset) as usize;
        let mut uncompressed_chunk_size = read_u16_be(compressed, entry_offset + 2) as usize;
        let raw_offset = read_u32_be(compressed, entry_offset + 4) as usize;

        let mut chunk_offset = raw_offset.wrapping_sub(1);
        if i == 0 && chunk_offset == usize::MAX {
            // `raw_offset` was 0 before the 1-based-to-0-based subtraction; rebase to the first
            // byte after the chunk table, the documented special case for the first entry.
            chunk_offset = base_offset;
        }
        if compressed_size == 0 {
            compressed_size = 65536;
        }
        if uncompressed_chunk_size == 0 {
            uncompressed_chunk_size = 65536;
        }

        let chunk_read_end = chunk_offset
            .checked_add(compressed_size)
            .ok_or(Error::CorruptDeflateStream)?;
        if chunk_read_end > compressed.len() {
            return Err(Error::CorruptDeflateStream);
        }

        let chunk_end = out_pos + uncompressed_chunk_size;
        if chunk_end > out.len() {
            return Err(Error::CorruptDeflateStream);
        }

        if uncompressed_chunk_size == compressed_size {
            let src = &compressed[chunk_offset..chunk_offset + compressed_size];
            out[out_pos..chunk_end].copy_from_slice(src);
        } else {
            let src = &compressed[chunk_offset..chunk_offset + compressed_size];
            let written = inflate(src, &mut out[out_pos..chunk_end])?;
            if written != uncompressed_chunk_size {
                return Err(Error::CorruptDeflateStream);
            }
        }

        out_pos = chunk_end;
    }

    Ok(out_pos)
}
