//! The `.arl` archive-linker editor: a list of entry names grouped by which `.ar` archive they
//! belong to, plus a running per-archive byte total.
//!
//! Unlike `.ar`, a linker entry is just a length-prefixed name — there is no payload inline.
//! Which archive an entry belongs to is not recorded in the entry itself; callers pass an
//! explicit `archive_index` to `add`/`remove`/`update`, the same way the format's original
//! tooling does.

use crate::ar::ArArchive;
use crate::buffer::{ArchiveKind, RawBuffer, Storage};
use crate::endian::{read_u32_le, write_u32_le};
use crate::error::Error;

/// 4-byte little-endian identifier at the start of every uncompressed `.arl`.
pub const ARL2_MAGIC: u32 = 0x324C_5241;

/// The fixed part of the linker header (`identifier`, `archive_count`); `archive_sizes` follows
/// immediately and is read separately since its length depends on `archive_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArlHeader {
    /// Always [`ARL2_MAGIC`].
    pub identifier: u32,
    /// Number of archives this linker tracks entries for.
    pub archive_count: u32,
}

fn write_header(buf: &mut [u8], archive_count: u32) {
    write_u32_le(buf, 0, ARL2_MAGIC);
    write_u32_le(buf, 4, archive_count);
    for i in 0..archive_count as usize {
        write_u32_le(buf, 8 + i * 4, 0);
    }
}

/// A view of one linker entry: a length-prefixed, non-NUL-terminated name.
#[derive(Debug, Clone, Copy)]
pub struct ArlEntry<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ArlEntry<'a> {
    /// Length of the name in bytes (max 255, since it is stored in one byte).
    pub fn name_len(&self) -> u8 {
        self.bytes[self.offset]
    }

    /// The entry's name.
    pub fn name(&self) -> &'a [u8] {
        let len = self.name_len() as usize;
        &self.bytes[self.offset + 1..self.offset + 1 + len]
    }

    fn size(&self) -> usize {
        1 + self.name_len() as usize
    }
}

/// Borrowing iterator over a linker's entries, in on-disk order.
pub struct ArlIter<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for ArlIter<'a> {
    type Item = ArlEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.bytes.len() {
            return None;
        }
        let entry = ArlEntry {
            bytes: self.bytes,
            offset: self.offset,
        };
        self.offset += entry.size();
        Some(entry)
    }
}

/// An in-place editor over a `.arl` buffer.
pub struct ArlArchive<'a> {
    raw: RawBuffer<'a>,
}

impl<'a> ArlArchive<'a> {
    /// Wraps an owned buffer already known to hold linker data.
    pub fn from_owned(data: Vec<u8>) -> Self {
        let kind = ArchiveKind::detect_arl(&data);
        let length = data.len();
        Self {
            raw: RawBuffer::new(Storage::Owned(data), length, kind),
        }
    }

    /// Like [`Self::from_owned`], with `headroom` extra bytes of capacity appended.
    pub fn from_owned_with_headroom(mut data: Vec<u8>, headroom: usize) -> Self {
        let kind = ArchiveKind::detect_arl(&data);
        let length = data.len();
        data.resize(length + headroom, 0);
        Self {
            raw: RawBuffer::new(Storage::Owned(data), length, kind),
        }
    }

    /// Wraps a caller-supplied buffer in place.
    pub fn from_borrowed(data: &'a mut [u8], length: usize) -> Self {
        assert!(
            length <= data.len(),
            "length must not be larger than the buffer's capacity"
        );
        let kind = ArchiveKind::detect_arl(&data[..length]);
        Self {
            raw: RawBuffer::new(Storage::Borrowed(data), length, kind),
        }
    }

    /// Allocates a fresh linker tracking `archive_count` archives, all starting at size zero.
    pub fn create_empty(capacity: usize, archive_count: u32) -> Result<Self, Error> {
        let header_len = 8 + 4 * archive_count as usize;
        if capacity < header_len {
            return Err(Error::InsufficientCapacity {
                needed: header_len,
                capacity,
            });
        }
        let mut data = vec![0u8; capacity];
        write_header(&mut data, archive_count);
        Ok(Self {
            raw: RawBuffer::new(Storage::Owned(data), header_len, ArchiveKind::Regular),
        })
    }

    /// Writes a fresh linker header into a caller-supplied buffer.
    pub fn create_empty_in(buffer: &'a mut [u8], archive_count: u32) -> Result<Self, Error> {
        let header_len = 8 + 4 * archive_count as usize;
        if buffer.len() < header_len {
            return Err(Error::InsufficientCapacity {
                needed: header_len,
                capacity: buffer.len(),
            });
        }
        write_header(buffer, archive_count);
        Ok(Self {
            raw: RawBuffer::new(Storage::Borrowed(buffer), header_len, ArchiveKind::Regular),
        })
    }

    /// Builds a linker tracking exactly one archive, populated with every name currently in
    /// `archive`.
    ///
    /// Entries whose name already exists are silently skipped (not reported as an error) — this
    /// mirrors how a linker built from several archives behaves when names collide.
    pub fn from_archive(archive: &ArArchive<'_>, capacity: usize) -> Result<Self, Error> {
        Self::from_archives(std::slice::from_ref(archive), capacity)
    }

    /// Builds a linker tracking one archive slot per entry of `archives`, populated with every
    /// name in each, in order.
    pub fn from_archives(archives: &[ArArchive<'_>], capacity: usize) -> Result<Self, Error> {
        let mut linker = Self::create_empty(capacity, archives.len() as u32)?;
        for (index, archive) in archives.iter().enumerate() {
            for entry in archive.iter() {
                match linker.add_ex(entry.name(), index) {
                    Ok(()) | Err(Error::DuplicateName) => {}
                    Err(other) => return Err(other),
                }
            }
        }
        Ok(linker)
    }

    /// Bytes currently in logical use, header included.
    pub fn length(&self) -> usize {
        self.raw.length()
    }

    /// Total capacity of the backing buffer.
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// What kind of container this buffer was classified as.
    pub fn kind(&self) -> ArchiveKind {
        self.raw.kind()
    }

    /// The fixed part of the linker header.
    pub fn header(&self) -> ArlHeader {
        let bytes = self.raw.bytes();
        ArlHeader {
            identifier: read_u32_le(bytes, 0),
            archive_count: read_u32_le(bytes, 4),
        }
    }

    /// Running byte total attributed to archive `index`, using `.ar`-entry-equivalent sizing
    /// (`20 + name_len + 1` per name, not the linker's own, smaller, on-disk entry size).
    pub fn archive_size(&self, index: usize) -> Option<u32> {
        let archive_count = self.header().archive_count as usize;
        if index >= archive_count {
            return None;
        }
        Some(read_u32_le(self.raw.bytes(), 8 + index * 4))
    }

    fn header_len(&self) -> usize {
        8 + 4 * self.header().archive_count as usize
    }

    /// Iterates over every entry in on-disk order, across all archives.
    pub fn iter(&self) -> ArlIter<'_> {
        ArlIter {
            bytes: self.raw.bytes(),
            offset: self.header_len(),
        }
    }

    /// Total number of entries across all archives. O(n).
    pub fn entry_count(&self) -> usize {
        self.iter().count()
    }

    /// Finds the entry with the given name, if any.
    pub fn find(&self, name: &str) -> Option<ArlEntry<'_>> {
        self.find_ex(name.as_bytes())
    }

    /// Finds the entry whose name matches `name` byte-for-byte.
    pub fn find_ex(&self, name: &[u8]) -> Option<ArlEntry<'_>> {
        self.iter().find(|entry| entry.name() == name)
    }

    fn locate(&self, name: &[u8]) -> Option<(usize, usize)> {
        self.iter()
            .find(|entry| entry.name() == name)
            .map(|entry| (entry.offset, entry.size()))
    }

    fn adjust_archive_size(&mut self, index: usize, delta: i64) {
        let offset = 8 + index * 4;
        let buf = self.raw.capacity_bytes_mut();
        let current = read_u32_le(buf, offset) as i64;
        write_u32_le(buf, offset, (current + delta) as u32);
    }

    /// Records `name` under archive `archive_index`. Fails if the name already exists or there
    /// isn't enough capacity.
    pub fn add(&mut self, name: &str, archive_index: usize) -> Result<(), Error> {
        self.add_ex(name.as_bytes(), archive_index)
    }

    /// Records `name` under archive `archive_index`. Fails if the name already exists or there
    /// isn't enough capacity.
    pub fn add_ex(&mut self, name: &[u8], archive_index: usize) -> Result<(), Error> {
        let archive_count = self.header().archive_count;
        if archive_index >= archive_count as usize {
            return Err(Error::ArchiveIndexOutOfRange {
                index: archive_index,
                archive_count,
            });
        }
        if self.find_ex(name).is_some() {
            return Err(Error::DuplicateName);
        }

        let offset = self.raw.length();
        let new_size = 1 + name.len();
        let needed = offset + new_size;
        let capacity = self.raw.capacity();
        if needed >= capacity {
            return Err(Error::InsufficientCapacity { needed, capacity });
        }

        let buf = self.raw.capacity_bytes_mut();
        buf[offset] = name.len() as u8;
        buf[offset + 1..offset + 1 + name.len()].copy_from_slice(name);

        self.raw.set_length(offset + new_size);
        self.adjust_archive_size(archive_index, (crate::ar::ENTRY_RECORD_SIZE + name.len() + 1) as i64);
        Ok(())
    }

    /// Removes the entry with the given name. Fails if it doesn't exist.
    pub fn remove(&mut self, name: &str, archive_index: usize) -> Result<(), Error> {
        self.remove_ex(name.as_bytes(), archive_index)
    }

    /// Removes the entry with the given name. Fails if it doesn't exist.
    pub fn remove_ex(&mut self, name: &[u8], archive_index: usize) -> Result<(), Error> {
        let archive_count = self.header().archive_count;
        if archive_index >= archive_count as usize {
            return Err(Error::ArchiveIndexOutOfRange {
                index: archive_index,
                archive_count,
            });
        }
        let (offset, size) = self.locate(name).ok_or(Error::NotFound)?;
        let length = self.raw.length();
        let new_length = length - size;

        let buf = self.raw.capacity_bytes_mut();
        buf.copy_within(offset + size..length, offset);

        self.raw.set_length(new_length);
        let ar_entry_size = crate::ar::ENTRY_RECORD_SIZE + name.len() + 1;
        self.adjust_archive_size(archive_index, -(ar_entry_size as i64));
        Ok(())
    }

    /// Renames the entry `old_name` to `new_name`. Fails if `old_name` doesn't exist or there
    /// isn't enough capacity for the new name.
    pub fn update(&mut self, old_name: &str, new_name: &str, archive_index: usize) -> Result<(), Error> {
        self.update_ex(old_name.as_bytes(), new_name.as_bytes(), archive_index)
    }

    /// Renames the entry `old_name` to `new_name`. Fails if `old_name` doesn't exist or there
    /// isn't enough capacity for the new name.
    pub fn update_ex(
        &mut self,
        old_name: &[u8],
        new_name: &[u8],
        archive_index: usize,
    ) -> Result<(), Error> {
        let archive_count = self.header().archive_count;
        if archive_index >= archive_count as usize {
            return Err(Error::ArchiveIndexOutOfRange {
                index: archive_index,
                archive_count,
            });
        }
        let (offset, old_size) = self.locate(old_name).ok_or(Error::NotFound)?;
        let new_size = 1 + new_name.len();
        let needed = offset + new_size;
        let capacity = self.raw.capacity();
        if needed >= capacity {
            return Err(Error::InsufficientCapacity { needed, capacity });
        }

        let length = self.raw.length();
        let buf = self.raw.capacity_bytes_mut();
        if new_size != old_size {
            buf.copy_within(offset + old_size..length, offset + new_size);
        }
        buf[offset] = new_name.len() as u8;
        buf[offset + 1..offset + 1 + new_name.len()].copy_from_slice(new_name);

        let new_length = length + new_size - old_size;
        self.raw.set_length(new_length);
        self.adjust_archive_size(archive_index, new_size as i64 - old_size as i64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::ArArchive;

    #[test]
    fn header_and_archive_sizes_start_zeroed() {
        let arl = ArlArchive::create_empty(64, 2).unwrap();
        let header = arl.header();
        assert_eq!(header.identifier, ARL2_MAGIC);
        assert_eq!(header.archive_count, 2);
        assert_eq!(arl.archive_size(0), Some(0));
        assert_eq!(arl.archive_size(1), Some(0));
        assert_eq!(arl.archive_size(2), None);
    }

    #[test]
    fn add_tracks_ar_entry_equivalent_size() {
        let mut arl = ArlArchive::create_empty(64, 1).unwrap();
        arl.add("a.txt", 0).unwrap();
        assert_eq!(arl.archive_size(0), Some((20 + 5 + 1) as u32));
        assert_eq!(arl.entry_count(), 1);
        assert_eq!(arl.find("a.txt").unwrap().name(), b"a.txt");
    }

    #[test]
    fn remove_decrements_archive_size_by_ar_entry_equivalent_bytes() {
        let mut arl = ArlArchive::create_empty(64, 1).unwrap();
        arl.add("a.txt", 0).unwrap();
        let before = arl.archive_size(0).unwrap();
        arl.remove("a.txt", 0).unwrap();
        assert_eq!(arl.archive_size(0).unwrap(), before - (20 + 5 + 1));
        assert!(arl.find("a.txt").is_none());
    }

    #[test]
    fn add_rejects_out_of_range_archive_index() {
        let mut arl = ArlArchive::create_empty(64, 1).unwrap();
        assert_eq!(
            arl.add("a.txt", 1),
            Err(Error::ArchiveIndexOutOfRange {
                index: 1,
                archive_count: 1
            })
        );
    }

    #[test]
    fn from_archive_copies_every_name() {
        let mut ar = ArArchive::create_empty(256).unwrap();
        ar.add("a.txt", b"1").unwrap();
        ar.add("b.txt", b"22").unwrap();

        let linker = ArlArchive::from_archive(&ar, 256).unwrap();
        assert_eq!(linker.entry_count(), 2);
        assert!(linker.find("a.txt").is_some());
        assert!(linker.find("b.txt").is_some());
    }

    #[test]
    fn from_archives_assigns_sequential_indices() {
        let mut ar0 = ArArchive::create_empty(128).unwrap();
        ar0.add("a.txt", b"1").unwrap();
        let mut ar1 = ArArchive::create_empty(128).unwrap();
        ar1.add("b.txt", b"22").unwrap();

        let archives = [ar0, ar1];
        let linker = ArlArchive::from_archives(&archives, 256).unwrap();
        assert_eq!(linker.header().archive_count, 2);
        assert_eq!(linker.archive_size(0), Some((20 + 5 + 1) as u32));
        assert_eq!(linker.archive_size(1), Some((20 + 5 + 1) as u32));
    }
}
