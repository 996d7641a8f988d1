//! Merging several `.ar` archives into one, de-duplicating by name with first-archive-wins.
//!
//! The scratch hash set never touches the heap: its backing slots live in a fixed-size stack
//! array sized the same way the original's merge routine sizes its own scratch allocator.

use crate::ar::ArArchive;
use crate::buffer::{ArchiveKind, RawBuffer, Storage};
use crate::error::Error;
use crate::hashset::ScratchHashSet;

/// Matches the original merge routine's scratch allocator: an 8 KiB stack region, sized in
/// slots of one key reference each. `8 * 1024 / size_of::<*const u8>()` is already a power of
/// two on every platform Rust targets (pointer sizes are themselves powers of two), so the slot
/// count is a compile-time constant rather than a call to `floor_power_of_two`.
const SLOT_COUNT: usize = 1024;

/// Merges `archives` into `out`, in order, keeping the first occurrence of any duplicate name.
///
/// `out` must be large enough to hold a fresh header plus every surviving entry, verbatim;
/// `InsufficientCapacity` is returned as soon as a copy would overrun it, leaving `out`'s
/// trailing bytes beyond that point unspecified.
pub fn merge_many<'a, 'b>(
    archives: &[&ArArchive<'b>],
    out: &'a mut [u8],
) -> Result<ArArchive<'a>, Error> {
    let mut slots = [None; SLOT_COUNT];
    let mut seen = ScratchHashSet::new(&mut slots);

    if out.len() < crate::ar::HEADER_SIZE {
        return Err(Error::InsufficientCapacity {
            needed: crate::ar::HEADER_SIZE,
            capacity: out.len(),
        });
    }
    crate::ar::write_fresh_header(out);
    let mut total_size = crate::ar::HEADER_SIZE;

    for (index, archive) in archives.iter().enumerate() {
        let is_last = index == archives.len() - 1;
        for entry in archive.iter() {
            let name = entry.name();
            if seen.contains(name) {
                continue;
            }

            let record = entry.raw();
            let new_total = total_size + record.len();
            if new_total > out.len() {
                return Err(Error::InsufficientCapacity {
                    needed: new_total,
                    capacity: out.len(),
                });
            }
            out[total_size..new_total].copy_from_slice(record);
            total_size = new_total;

            if !is_last {
                seen.insert(name);
            }
        }
    }

    let capacity = out.len();
    let raw = RawBuffer::new(Storage::Borrowed(out), total_size, ArchiveKind::Regular);
    debug_assert_eq!(raw.capacity(), capacity);
    Ok(ArArchive::from_raw(raw))
}

/// Convenience wrapper for the common two-archive merge.
pub fn merge_two<'a, 'b>(
    a: &ArArchive<'b>,
    b: &ArArchive<'b>,
    out: &'a mut [u8],
) -> Result<ArArchive<'a>, Error> {
    merge_many(&[a, b], out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_archive_wins_on_duplicate_name() {
        let mut a = ArArchive::create_empty(128).unwrap();
        a.add("shared.txt", b"from-a").unwrap();
        let mut b = ArArchive::create_empty(128).unwrap();
        b.add("shared.txt", b"from-b").unwrap();
        b.add("only-b.txt", b"b-data").unwrap();

        let mut out = vec![0u8; 512];
        let merged = merge_many(&[&a, &b], &mut out).unwrap();

        assert_eq!(merged.entry_count(), 2);
        assert_eq!(merged.find("shared.txt").unwrap().data(), b"from-a");
        assert_eq!(merged.find("only-b.txt").unwrap().data(), b"b-data");
    }

    #[test]
    fn reports_insufficient_capacity_before_overrunning() {
        let mut a = ArArchive::create_empty(128).unwrap();
        a.add("a.txt", b"1234567890").unwrap();

        let mut out = vec![0u8; 20];
        assert!(matches!(
            merge_many(&[&a], &mut out),
            Err(Error::InsufficientCapacity { .. })
        ));
    }
}
