//! The block state machine: `HDR -> {STORED | FIXED | DYNAMIC} -> BULK -> (HDR | done)`.

use crate::error::Error;
use crate::inflate::bitreader::BitReader;
use crate::inflate::huffman::HuffmanTable;

/// Permuted order in which code-length code lengths are stored in a DYNAMIC block header.
const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

pub(crate) const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
pub(crate) const DIST_EXTRA_BITS: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];
pub(crate) const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];
pub(crate) const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Below this much remaining output headroom, always fall back to a byte-wise match copy.
const TAIL_GUARD: usize = 48;

#[derive(PartialEq, Eq)]
enum State {
    Hdr,
    Stored,
    Fixed,
    Dynamic,
    Bulk,
}

struct Inflater<'a, 'o> {
    reader: BitReader<'a>,
    out: &'o mut [u8],
    out_pos: usize,
    lits: HuffmanTable,
    dists: HuffmanTable,
}

impl<'a, 'o> Inflater<'a, 'o> {
    fn new(input: &'a [u8], out: &'o mut [u8]) -> Self {
        Self {
            reader: BitReader::new(input),
            out,
            out_pos: 0,
            lits: HuffmanTable::build(&[8u8; 1], 10, 15, 1),
            dists: HuffmanTable::build(&[5u8; 1], 8, 15, 1),
        }
    }

    fn run(&mut self) -> Result<usize, Error> {
        let mut state = State::Hdr;
        let mut last = false;

        loop {
            match state {
                State::Hdr => {
                    self.reader.refill();
                    last = self.reader.get_buffered(1) != 0;
                    let kind = self.reader.get_buffered(2);
                    state = match kind {
                        0 => State::Stored,
                        1 => State::Fixed,
                        2 => State::Dynamic,
                        _ => return Ok(self.out_pos),
                    };
                }
                State::Stored => {
                    self.enter_stored()?;
                    if last {
                        return Ok(self.out_pos);
                    }
                    state = State::Hdr;
                }
                State::Fixed => {
                    self.build_fixed_tables();
                    state = State::Bulk;
                }
                State::Dynamic => {
                    self.build_dynamic_tables()?;
                    state = State::Bulk;
                }
                State::Bulk => {
                    if self.run_bulk(last)? {
                        return Ok(self.out_pos);
                    }
                    state = State::Hdr;
                }
            }
        }
    }

    fn enter_stored(&mut self) -> Result<(), Error> {
        // `len`/`nlen` are read from bits already sitting in the accumulator from the HDR
        // refill, not a fresh one — there's always at least 39 buffered bits left at this
        // point, enough for the alignment padding plus both 16-bit fields.
        self.reader.drop_to_byte_boundary();
        let len = self.reader.get_buffered(16) as u16;
        let nlen = self.reader.get_buffered(16) as u16;
        self.reader.rewind_to_byte_boundary();

        if len != !nlen || len == 0 || (len as usize) > self.reader.remaining_bytes() {
            return Err(Error::CorruptDeflateStream);
        }

        let start = self.reader.byte_pos();
        let bytes = self.reader.bytes_from(start, len as usize);
        let end = self.out_pos + len as usize;
        if end > self.out.len() {
            return Err(Error::CorruptDeflateStream);
        }
        self.out[self.out_pos..end].copy_from_slice(bytes);
        self.out_pos = end;

        self.reader.skip_to(start + len as usize);
        Ok(())
    }

    fn build_fixed_tables(&mut self) {
        let mut lens = [0u8; 288 + 32];
        for item in lens.iter_mut().take(144) {
            *item = 8;
        }
        for item in lens[144..256].iter_mut() {
            *item = 9;
        }
        for item in lens[256..280].iter_mut() {
            *item = 7;
        }
        for item in lens[280..288].iter_mut() {
            *item = 8;
        }
        for item in lens[288..320].iter_mut() {
            *item = 5;
        }

        self.lits = HuffmanTable::build(&lens[..288], 10, 15, 288);
        self.dists = HuffmanTable::build(&lens[288..], 8, 15, 32);
    }

    fn build_dynamic_tables(&mut self) -> Result<(), Error> {
        self.reader.refill();
        let nlit = 257 + self.reader.get_buffered(5) as usize;
        let ndist = 1 + self.reader.get_buffered(5) as usize;
        let nlen = 4 + self.reader.get_buffered(4) as usize;

        let mut code_length_lens = [0u8; 19];
        for &position in CODE_LENGTH_ORDER.iter().take(nlen) {
            code_length_lens[position] = self.reader.get(3) as u8;
        }
        let pre_table = HuffmanTable::build(&code_length_lens, 7, 7, 19);

        let mut lens = vec![0u8; nlit + ndist];
        let mut n = 0usize;
        while n < nlit + ndist {
            self.reader.refill();
            let sym = pre_table.decode(&mut self.reader, 7);
            match sym {
                16 => {
                    let mut i = 3 + self.reader.get(2);
                    if n == 0 {
                        return Err(Error::CorruptDeflateStream);
                    }
                    let prev = lens[n - 1];
                    while i > 0 {
                        lens[n] = prev;
                        n += 1;
                        i -= 1;
                    }
                }
                17 => {
                    let mut i = 3 + self.reader.get(3);
                    while i > 0 {
                        lens[n] = 0;
                        n += 1;
                        i -= 1;
                    }
                }
                18 => {
                    let mut i = 11 + self.reader.get(7);
                    while i > 0 {
                        lens[n] = 0;
                        n += 1;
                        i -= 1;
                    }
                }
                _ => {
                    lens[n] = sym as u8;
                    n += 1;
                }
            }
        }

        self.lits = HuffmanTable::build(&lens[..nlit], 10, 15, nlit);
        self.dists = HuffmanTable::build(&lens[nlit..], 8, 15, ndist);
        Ok(())
    }

    /// Runs the BULK phase until an end-of-block or end-of-stream symbol. Returns `true` if
    /// decoding is finished (this was the last block).
    fn run_bulk(&mut self, last: bool) -> Result<bool, Error> {
        loop {
            self.reader.refill();
            let mut sym = self.lits.decode(&mut self.reader, 10);

            if sym < 256 {
                if self.out_pos >= self.out.len() {
                    return Err(Error::CorruptDeflateStream);
                }
                self.out[self.out_pos] = sym as u8;
                self.out_pos += 1;

                sym = self.lits.decode(&mut self.reader, 10);
                if sym < 256 {
                    if self.out_pos >= self.out.len() {
                        return Err(Error::CorruptDeflateStream);
                    }
                    self.out[self.out_pos] = sym as u8;
                    self.out_pos += 1;
                    continue;
                }
            }

            if sym == 256 {
                return Ok(last);
            }
            if sym >= 286 {
                return Err(Error::CorruptDeflateStream);
            }

            let length_index = (sym - 257) as usize;
            let len = self.reader.get(LENGTH_EXTRA_BITS[length_index] as u32) as usize
                + LENGTH_BASE[length_index] as usize;
            let dsym = self.dists.decode(&mut self.reader, 8) as usize;
            if dsym >= DIST_BASE.len() {
                return Err(Error::CorruptDeflateStream);
            }
            let dist =
                self.reader.get(DIST_EXTRA_BITS[dsym] as u32) as usize + DIST_BASE[dsym] as usize;

            if dist > self.out_pos {
                return Err(Error::CorruptDeflateStream);
            }
            self.copy_match(dist, len)?;
        }
    }

    fn copy_match(&mut self, dist: usize, len: usize) -> Result<(), Error> {
        let end = self.out_pos + len;
        if end > self.out.len() {
            return Err(Error::CorruptDeflateStream);
        }

        let mut dst = self.out_pos;
        let mut src = self.out_pos - dist;
        let headroom = self.out.len() - end;

        if headroom >= TAIL_GUARD {
            if dist >= 16 {
                while dst < end {
                    let chunk = 16.min(end - dst);
                    self.out.copy_within(src..src + chunk, dst);
                    dst += chunk;
                    src += chunk;
                }
            } else if dist >= 8 {
                while dst < end {
                    let chunk = 8.min(end - dst);
                    self.out.copy_within(src..src + chunk, dst);
                    dst += chunk;
                    src += chunk;
                }
            } else if dist == 1 {
                let value = self.out[src];
                self.out[dst..end].fill(value);
                dst = end;
            } else {
                while dst < end {
                    self.out[dst] = self.out[src];
                    dst += 1;
                    src += 1;
                }
            }
        } else {
            while dst < end {
                self.out[dst] = self.out[src];
                dst += 1;
                src += 1;
            }
        }

        self.out_pos = end;
        Ok(())
    }
}

/// Inflates a raw DEFLATE stream from `input` into `out`, returning the number of bytes
/// written. Fails if the stream is malformed or `out` is too small to hold the result.
pub(crate) fn inflate(input: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    Inflater::new(input, out).run()
}
