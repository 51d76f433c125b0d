//! CRC32 (IEEE 802.3) checksum engine
//!
//! The lookup table is generated on first use from the generator polynomial's
//! bit positions and shared read-only afterwards. Checksums can be computed in
//! one call with [`calculate_crc32`] or streamed chunk by chunk with [`Crc32`].

use std::sync::OnceLock;

/// Terms of the generator polynomial, counted from the most significant bit.
const POLY_TERMS: [u32; 14] = [0, 1, 2, 4, 5, 7, 8, 10, 11, 12, 16, 22, 23, 26];

/// Running state before the first byte is consumed.
pub const CRC32_INIT: u32 = 0xffff_ffff;

const CRC32_XOROUT: u32 = 0xffff_ffff;

static TABLE: OnceLock<[u32; 256]> = OnceLock::new();

/// Reflected polynomial assembled from [`POLY_TERMS`] (0xedb88320).
fn reflected_poly() -> u32 {
    POLY_TERMS.iter().fold(0, |poly, term| poly | (1 << (31 - term)))
}

fn make_table() -> [u32; 256] {
    let poly = reflected_poly();
    let mut table = [0u32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut crc = i as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ poly } else { crc >> 1 };
        }
        *entry = crc;
    }
    table
}

/// The 256-entry lookup table, built once per process.
pub fn crc32_table() -> &'static [u32; 256] {
    TABLE.get_or_init(make_table)
}

/// Feed `data` into a running CRC state without pre/post complement.
///
/// Start with [`CRC32_INIT`], carry the returned value into the next call and
/// pass the last one to [`finalize`].
pub fn crc32_no_comp(mut crc: u32, data: &[u8]) -> u32 {
    let table = crc32_table();
    for &b in data {
        crc = (crc >> 8) ^ table[((crc ^ b as u32) & 0xff) as usize];
    }
    crc
}

/// Turn a running state into the final checksum.
pub fn finalize(crc: u32) -> u32 {
    crc ^ CRC32_XOROUT
}

/// CRC32 of a complete buffer.
pub fn calculate_crc32(data: &[u8]) -> u32 {
    finalize(crc32_no_comp(CRC32_INIT, data))
}

/// Streaming CRC32 over data that arrives in chunks.
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    state: u32,
    len: u64,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self {
            state: CRC32_INIT,
            len: 0,
        }
    }
}

impl Crc32 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.state = crc32_no_comp(self.state, data);
        self.len += data.len() as u64;
    }

    /// Number of bytes consumed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finalize(&self) -> u32 {
        finalize(self.state)
    }
}
