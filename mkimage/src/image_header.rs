//! U-Boot legacy image header structures and serialization
//!
//! The header is a fixed 64-byte record, all integers big-endian:
//!
//! | offset | size | field                 |
//! |--------|------|-----------------------|
//! | 0      | 4    | magic                 |
//! | 4      | 4    | header CRC32          |
//! | 8      | 4    | timestamp             |
//! | 12     | 4    | payload size          |
//! | 16     | 4    | load address          |
//! | 20     | 4    | entry point           |
//! | 24     | 4    | payload CRC32         |
//! | 28     | 1    | OS                    |
//! | 29     | 1    | architecture          |
//! | 30     | 1    | image type            |
//! | 31     | 1    | compression           |
//! | 32     | 32   | name, zero padded     |
//!
//! The header CRC is computed over the serialized header with the header CRC
//! field set to zero.

use std::borrow::Cow;
use std::io::Read;

use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, Utc};
use log::warn;

use crate::crc::calculate_crc32;
use crate::error::{MkImageError, Result};
use crate::image_types::{Arch, Compression, HeaderCode, ImageType, OsType};

/// Magic number for U-Boot legacy images
pub const IH_MAGIC: u32 = 0x2705_1956;

/// Maximum length of image name
pub const IH_NMLEN: usize = 32;

/// Serialized header size
pub const IH_HEADER_SIZE: usize = 64;

const HCRC_OFFSET: usize = 4;

/// U-Boot legacy image header structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHeader {
    /// Magic number (must be IH_MAGIC)
    pub magic: u32,
    /// CRC32 of the header, computed with this field zeroed
    pub hcrc: u32,
    /// Creation time, seconds since the epoch
    pub time: u32,
    /// Size of the image data
    pub size: u32,
    /// Load address of the image
    pub load: u32,
    /// Entry point address
    pub ep: u32,
    /// CRC32 checksum of the image data
    pub dcrc: u32,
    pub os: HeaderCode<OsType>,
    pub arch: HeaderCode<Arch>,
    pub type_: HeaderCode<ImageType>,
    pub comp: HeaderCode<Compression>,
    name: [u8; IH_NMLEN],
}

impl Default for ImageHeader {
    fn default() -> Self {
        Self {
            magic: IH_MAGIC,
            hcrc: 0,
            time: Utc::now().timestamp() as u32,
            size: 0,
            load: 0,
            ep: 0,
            dcrc: 0,
            os: HeaderCode::default(),
            arch: HeaderCode::default(),
            type_: HeaderCode::default(),
            comp: HeaderCode::default(),
            name: [0; IH_NMLEN],
        }
    }
}

impl ImageHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(name: &str) -> Self {
        let mut header = Self::default();
        header.set_name(name);
        header
    }

    /// Set the image name.
    ///
    /// Names longer than [`IH_NMLEN`] bytes are cut at that length; the
    /// return value tells whether that happened. The cut counts bytes, not
    /// characters, so a multi-byte UTF-8 character may be split and
    /// [`name`](ImageHeader::name) then shows U+FFFD in its place. Shorter
    /// names are padded with zero bytes.
    pub fn set_name(&mut self, name: &str) -> bool {
        let bytes = name.as_bytes();
        let len = bytes.len().min(IH_NMLEN);
        self.name = [0; IH_NMLEN];
        self.name[..len].copy_from_slice(&bytes[..len]);

        let truncated = bytes.len() > IH_NMLEN;
        if truncated {
            warn!(
                "image name is {} bytes, truncated to {}",
                bytes.len(),
                IH_NMLEN
            );
        }
        truncated
    }

    /// The raw 32-byte name field.
    pub fn name_bytes(&self) -> &[u8; IH_NMLEN] {
        &self.name
    }

    /// The name up to the first zero byte.
    pub fn name(&self) -> Cow<'_, str> {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(IH_NMLEN);
        String::from_utf8_lossy(&self.name[..len])
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.time as i64, 0).unwrap_or_default()
    }

    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.time = timestamp.timestamp() as u32;
    }

    pub fn validate(&self) -> Result<()> {
        if self.magic != IH_MAGIC {
            return Err(MkImageError::invalid_magic(IH_MAGIC, self.magic));
        }
        Ok(())
    }

    /// Serialize to the 64-byte wire format, header CRC included as stored.
    pub fn to_bytes(&self) -> [u8; IH_HEADER_SIZE] {
        let mut buf = [0u8; IH_HEADER_SIZE];
        BigEndian::write_u32(&mut buf[0..4], self.magic);
        BigEndian::write_u32(&mut buf[4..8], self.hcrc);
        BigEndian::write_u32(&mut buf[8..12], self.time);
        BigEndian::write_u32(&mut buf[12..16], self.size);
        BigEndian::write_u32(&mut buf[16..20], self.load);
        BigEndian::write_u32(&mut buf[20..24], self.ep);
        BigEndian::write_u32(&mut buf[24..28], self.dcrc);
        buf[28] = self.os.code();
        buf[29] = self.arch.code();
        buf[30] = self.type_.code();
        buf[31] = self.comp.code();
        buf[32..].copy_from_slice(&self.name);
        buf
    }

    /// CRC32 over the serialized header with the header CRC field zeroed.
    ///
    /// Whatever is currently stored in `hcrc` does not affect the result.
    pub fn header_checksum(&self) -> u32 {
        let mut bytes = self.to_bytes();
        bytes[HCRC_OFFSET..HCRC_OFFSET + 4].fill(0);
        calculate_crc32(&bytes)
    }

    /// Return the header with `hcrc` set to its checksum.
    pub fn sealed(mut self) -> Self {
        self.hcrc = self.header_checksum();
        self
    }

    pub fn verify_checksum(&self) -> Result<()> {
        let computed = self.header_checksum();
        if computed != self.hcrc {
            return Err(MkImageError::HeaderCrcMismatch {
                stored: self.hcrc,
                computed,
            });
        }
        Ok(())
    }

    /// Deserialize the header from the first 64 bytes of `data`.
    ///
    /// Only the magic number is validated; call [`verify_checksum`] to check
    /// the header CRC. Enum codes missing from the tables decode to
    /// [`HeaderCode::Unknown`] and are written back unchanged.
    ///
    /// [`verify_checksum`]: ImageHeader::verify_checksum
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < IH_HEADER_SIZE {
            return Err(MkImageError::invalid_image_data(format!(
                "header data too short: {} bytes (expected at least {})",
                data.len(),
                IH_HEADER_SIZE
            )));
        }

        let word = |offset: usize| BigEndian::read_u32(&data[offset..offset + 4]);
        let mut name = [0u8; IH_NMLEN];
        name.copy_from_slice(&data[32..IH_HEADER_SIZE]);

        let header = Self {
            magic: word(0),
            hcrc: word(4),
            time: word(8),
            size: word(12),
            load: word(16),
            ep: word(20),
            dcrc: word(24),
            os: HeaderCode::from_code(data[28]),
            arch: HeaderCode::from_code(data[29]),
            type_: HeaderCode::from_code(data[30]),
            comp: HeaderCode::from_code(data[31]),
            name,
        };

        header.validate()?;
        Ok(header)
    }

    /// Read and decode a header from a reader
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut header_data = [0u8; IH_HEADER_SIZE];
        reader
            .read_exact(&mut header_data)
            .map_err(|e| MkImageError::invalid_image_data(e.to_string()))?;
        Self::from_bytes(&header_data)
    }

    /// Header plus payload size in bytes
    pub fn total_size(&self) -> u64 {
        IH_HEADER_SIZE as u64 + self.size as u64
    }

    pub fn summary(&self) -> String {
        format!(
            "Image Name:   {}\n\
             Created:      {}\n\
             Image Type:   {} {} {} ({})\n\
             Data Size:    {} Bytes\n\
             Load Address: {:08x}\n\
             Entry Point:  {:08x}\n\
             Header CRC:   0x{:08x}\n\
             Data CRC:     0x{:08x}",
            self.name(),
            self.timestamp().format("%Y-%m-%d %H:%M:%S UTC"),
            self.arch.long_name(),
            self.os.long_name(),
            self.type_.long_name(),
            self.comp.long_name(),
            self.size,
            self.load,
            self.ep,
            self.hcrc,
            self.dcrc,
        )
    }
}
