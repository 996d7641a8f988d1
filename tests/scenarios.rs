//! The lettered end-to-end scenarios from the archive/linker container specification.

use swarchive::{merge_many, ArArchive, ArchiveKind};

#[test]
fn scenario_a_build_and_read_back_a_tiny_archive() {
    let mut ar = ArArchive::create_empty(512).unwrap();
    ar.add("msg.txt", b"Hello").unwrap();

    assert_eq!(ar.length(), 16 + 20 + 8 + 5);
    assert_eq!(ar.entry_count(), 1);

    let entry = ar.find("msg.txt").unwrap();
    assert_eq!(entry.payload_size(), 5);
    assert_eq!(entry.data(), b"Hello");
}

#[test]
fn scenario_b_update_expands_payload() {
    let mut ar = ArArchive::create_empty(512).unwrap();
    ar.add("msg.txt", b"Hello").unwrap();

    ar.update("msg.txt", b"Hello, world!").unwrap();

    assert_eq!(ar.length(), 16 + 20 + 8 + 13);
    assert_eq!(ar.find("msg.txt").unwrap().payload_size(), 13);
}

#[test]
fn scenario_c_remove_compacts_buffer() {
    let mut ar = ArArchive::create_empty(512).unwrap();
    ar.add("a", &[0x01]).unwrap();
    ar.add("b", &[0x02, 0x02]).unwrap();
    ar.add("c", &[0x03, 0x03, 0x03]).unwrap();

    let before = ar.length();
    ar.remove("b").unwrap();

    let entries: Vec<_> = ar
        .iter()
        .map(|e| (e.name().to_vec(), e.data().to_vec()))
        .collect();
    assert_eq!(
        entries,
        vec![
            (b"a".to_vec(), vec![0x01]),
            (b"c".to_vec(), vec![0x03, 0x03, 0x03]),
        ]
    );
    assert_eq!(ar.length(), before - (20 + 2 + 2));
}

#[test]
fn scenario_d_merge_dedupes_first_archive_wins() {
    let mut a = ArArchive::create_empty(256).unwrap();
    a.add("x", b"X1").unwrap();
    a.add("y", b"Y1").unwrap();

    let mut b = ArArchive::create_empty(256).unwrap();
    b.add("y", b"Y2").unwrap();
    b.add("z", b"Z1").unwrap();

    let mut out = vec![0u8; 4096];
    let merged = merge_many(&[&a, &b], &mut out).unwrap();
    let names: Vec<_> = merged.iter().map(|e| e.name().to_vec()).collect();
    assert_eq!(names, vec![b"x".to_vec(), b"y".to_vec(), b"z".to_vec()]);
    assert_eq!(merged.find("y").unwrap().data(), b"Y1");

    let mut out2 = vec![0u8; 4096];
    let swapped = merge_many(&[&b, &a], &mut out2).unwrap();
    let names2: Vec<_> = swapped.iter().map(|e| e.name().to_vec()).collect();
    assert_eq!(names2, vec![b"y".to_vec(), b"z".to_vec(), b"x".to_vec()]);
    assert_eq!(swapped.find("y").unwrap().data(), b"Y2");
}

#[test]
fn scenario_e_segs_decompress_verbatim_chunk() {
    let payload: Vec<u8> = (0u8..16).collect();

    let mut file = vec![0u8; 16];
    file[0..4].copy_from_slice(&0x7367_6573u32.to_le_bytes());
    file[4..6].copy_from_slice(&0u16.to_be_bytes());
    file[6..8].copy_from_slice(&1u16.to_be_bytes()); // chunk_count
    file[8..12].copy_from_slice(&(payload.len() as u32).to_be_bytes()); // uncompressed_size
    file[12..16].copy_from_slice(&(payload.len() as u32).to_be_bytes()); // compressed_size
    file.extend_from_slice(&(payload.len() as u16).to_be_bytes()); // chunk compressed_size
    file.extend_from_slice(&(payload.len() as u16).to_be_bytes()); // chunk uncompressed_size
    file.extend_from_slice(&0u32.to_be_bytes()); // offset (0 => rebase to end of chunk table)
    file.extend_from_slice(&payload);

    assert_eq!(ArchiveKind::detect_ar(&file), ArchiveKind::Segs);

    let mut out = vec![0u8; payload.len()];
    let written = swarchive::segs::decompress(&file, &mut out).unwrap();
    assert_eq!(written, payload.len());
    assert_eq!(out, payload);

    let rebound = ArArchive::from_borrowed(&mut out, written);
    assert_eq!(rebound.kind(), ArchiveKind::Regular);
    assert_eq!(rebound.length(), 16);
}

/// Packs a fixed-Huffman literal-only DEFLATE block encoding `data`, the same way a
/// conforming encoder would: each symbol's canonical code is bit-reversed before being pushed
/// into the LSB-first byte stream, mirroring how the production Huffman table decodes it.
fn fixed_huffman_literal_block(data: &[u8]) -> Vec<u8> {
    fn bit_reverse(value: u16, bits: u32) -> u16 {
        let mut v = value;
        let mut r = 0u16;
        for _ in 0..bits {
            r = (r << 1) | (v & 1);
            v >>= 1;
        }
        r
    }
    fn fixed_code(symbol: u16) -> (u16, u32) {
        match symbol {
            0..=143 => (0x030 + symbol, 8),
            256..=279 => (symbol - 256, 7),
            _ => unreachable!("only literals and end-of-block are used here"),
        }
    }

    let mut cur = 0u32;
    let mut nbits = 0u32;
    let mut out = Vec::new();
    let mut push = |value: u16, bits: u32| {
        cur |= (value as u32) << nbits;
        nbits += bits;
        while nbits >= 8 {
            out.push((cur & 0xff) as u8);
            cur >>= 8;
            nbits -= 8;
        }
    };

    push(1, 1); // BFINAL
    push(0b01, 2); // BTYPE = fixed Huffman
    for &byte in data {
        let (code, len) = fixed_code(byte as u16);
        push(bit_reverse(code, len), len);
    }
    let (code, len) = fixed_code(256); // end of block
    push(bit_reverse(code, len), len);

    if nbits > 0 {
        out.push((cur & 0xff) as u8);
    }
    out
}

#[test]
fn scenario_f_deflate_fixed_block_literal_run() {
    let deflate = fixed_huffman_literal_block(b"abracadabra");

    let mut file = vec![0u8; 16];
    file[0..4].copy_from_slice(&0x7367_6573u32.to_le_bytes());
    file[6..8].copy_from_slice(&1u16.to_be_bytes()); // chunk_count
    file[8..12].copy_from_slice(&11u32.to_be_bytes()); // uncompressed_size
    file[12..16].copy_from_slice(&(deflate.len() as u32).to_be_bytes()); // compressed_size
    file.extend_from_slice(&(deflate.len() as u16).to_be_bytes());
    file.extend_from_slice(&11u16.to_be_bytes());
    file.extend_from_slice(&0u32.to_be_bytes());
    file.extend_from_slice(&deflate);

    let mut out = vec![0u8; 11];
    let written = swarchive::segs::decompress(&file, &mut out).unwrap();
    assert_eq!(written, 11);
    assert_eq!(&out[..written], b"abracadabra");
}
