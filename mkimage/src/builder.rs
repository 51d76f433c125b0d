//! Image builder for creating U-Boot legacy images
//!
//! The payload is streamed twice: once to learn its CRC32, then again to copy
//! it behind the header. Nothing is held in memory beyond one chunk.

use std::fs::File;
use std::io::{self, Cursor, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, info};

use crate::crc::Crc32;
use crate::error::{MkImageError, Result, Stage};
use crate::image_header::{IH_HEADER_SIZE, IH_NMLEN, ImageHeader};
use crate::image_types::{Arch, Compression, ImageType, OsType};

/// Largest payload the 32-bit size field can describe
pub const MAX_DATA_SIZE: u64 = u32::MAX as u64;

/// Read/write granularity for both payload passes
pub const CHUNK_SIZE: usize = 32 * 1024;

/// Destination of an image.
pub trait ImageSink: Write {
    /// Make everything written so far durable.
    fn sync(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl ImageSink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_all()
    }
}

impl ImageSink for Vec<u8> {}

impl ImageSink for Cursor<Vec<u8>> {}

impl<T: ImageSink + ?Sized> ImageSink for &mut T {
    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }
}

/// What to do with names longer than the header field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamePolicy {
    /// Cut the name at 32 bytes
    #[default]
    Truncate,
    /// Fail with [`MkImageError::NameTooLong`]
    Reject,
}

/// Result of a successful assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    /// The header as written, checksums included
    pub header: ImageHeader,
    /// Header plus payload bytes written to the destination
    pub bytes_written: u64,
    /// The name was cut to fit the 32-byte field
    pub name_truncated: bool,
}

/// Builder for creating U-Boot images
///
/// Holds every header field the caller chooses; size and checksums are filled
/// in from the payload when the image is assembled.
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    header: ImageHeader,
    name: String,
    name_policy: NamePolicy,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            header: ImageHeader::default(),
            name: String::new(),
            name_policy: NamePolicy::default(),
        }
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self::new().name(name)
    }

    pub fn image_type(mut self, type_: ImageType) -> Self {
        self.header.type_ = type_.into();
        self
    }

    pub fn arch(mut self, arch: Arch) -> Self {
        self.header.arch = arch.into();
        self
    }

    pub fn os_type(mut self, os: OsType) -> Self {
        self.header.os = os.into();
        self
    }

    pub fn compression(mut self, comp: Compression) -> Self {
        self.header.comp = comp.into();
        self
    }

    pub fn load_address(mut self, addr: u32) -> Self {
        self.header.load = addr;
        self
    }

    pub fn entry_point(mut self, addr: u32) -> Self {
        self.header.ep = addr;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name_policy(mut self, policy: NamePolicy) -> Self {
        self.name_policy = policy;
        self
    }

    /// Creation time in seconds since the epoch
    pub fn timestamp(mut self, time: u32) -> Self {
        self.header.time = time;
        self
    }

    /// Header template; size, checksums and name are not applied yet.
    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    /// Fill in payload metadata and seal the header.
    pub fn header_for(&self, size: u32, dcrc: u32) -> Result<ImageHeader> {
        self.seal(size, dcrc).map(|(header, _)| header)
    }

    /// Sealed header plus whether the name had to be truncated.
    fn seal(&self, size: u32, dcrc: u32) -> Result<(ImageHeader, bool)> {
        self.check_name()?;

        let mut header = self.header.clone();
        let truncated = header.set_name(&self.name);
        header.size = size;
        header.dcrc = dcrc;
        header.hcrc = 0;
        Ok((header.sealed(), truncated))
    }

    /// Write header and payload from `source` into `dest`.
    ///
    /// `source` is read twice from its start; `dest` is synced before return.
    pub fn assemble<S, D>(&self, source: &mut S, dest: &mut D) -> Result<Assembled>
    where
        S: Read + Seek + ?Sized,
        D: ImageSink + ?Sized,
    {
        let size = source
            .seek(SeekFrom::End(0))
            .map_err(|e| MkImageError::unreadable(Stage::ReadSource, e))?;
        if size > MAX_DATA_SIZE {
            return Err(MkImageError::PayloadTooLarge {
                size,
                max: MAX_DATA_SIZE,
            });
        }
        rewind(source)?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut crc = Crc32::new();
        loop {
            let n = read_chunk(source, &mut buf)?;
            if n == 0 {
                break;
            }
            crc.update(&buf[..n]);
        }
        if crc.len() != size {
            return Err(MkImageError::SourceChanged {
                expected: size,
                actual: crc.len(),
            });
        }

        let (header, name_truncated) = self.seal(size as u32, crc.finalize())?;
        debug!(
            "payload: {} bytes, crc 0x{:08x}, header crc 0x{:08x}",
            header.size, header.dcrc, header.hcrc
        );

        write_counted(dest, &header.to_bytes(), Stage::WriteHeader)?;
        info!("header written");

        rewind(source)?;
        let mut copied = 0u64;
        loop {
            let n = read_chunk(source, &mut buf)?;
            if n == 0 {
                break;
            }
            write_counted(dest, &buf[..n], Stage::WritePayload)?;
            copied += n as u64;
        }
        if copied != size {
            return Err(MkImageError::SourceChanged {
                expected: size,
                actual: copied,
            });
        }
        info!("payload written: {} bytes", copied);

        dest.sync()
            .map_err(|e| MkImageError::unwritable(Stage::SyncDestination, e))?;

        Ok(Assembled {
            bytes_written: header.total_size(),
            header,
            name_truncated,
        })
    }

    fn check_name(&self) -> Result<()> {
        if self.name_policy == NamePolicy::Reject && self.name.len() > IH_NMLEN {
            return Err(MkImageError::NameTooLong {
                len: self.name.len(),
                max: IH_NMLEN,
            });
        }
        Ok(())
    }

    /// Build an image file from a payload file.
    pub fn build_to_file(
        &self,
        source: impl AsRef<Path>,
        dest: impl AsRef<Path>,
    ) -> Result<Assembled> {
        let source = source.as_ref();
        let dest = dest.as_ref();
        self.check_name()?;

        let mut src = File::open(source).map_err(|e| MkImageError::unreadable(Stage::OpenSource, e))?;
        let meta = src
            .metadata()
            .map_err(|e| MkImageError::unreadable(Stage::OpenSource, e))?;
        if !meta.is_file() {
            return Err(MkImageError::unreadable(
                Stage::OpenSource,
                io::Error::new(
                    ErrorKind::InvalidInput,
                    format!("{} is not a regular file", source.display()),
                ),
            ));
        }
        info!("source: {} ({} bytes)", source.display(), meta.len());

        let mut dst =
            File::create(dest).map_err(|e| MkImageError::unwritable(Stage::OpenDestination, e))?;
        info!("destination: {}", dest.display());

        self.assemble(&mut src, &mut dst)
    }

    /// Build the complete image in memory.
    pub fn build(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut image = Vec::with_capacity(IH_HEADER_SIZE + data.len());
        self.assemble(&mut Cursor::new(data), &mut image)?;
        Ok(image)
    }
}

fn rewind<S: Seek + ?Sized>(source: &mut S) -> Result<()> {
    source
        .seek(SeekFrom::Start(0))
        .map(|_| ())
        .map_err(|e| MkImageError::unreadable(Stage::ReadSource, e))
}

fn read_chunk<S: Read + ?Sized>(source: &mut S, buf: &mut [u8]) -> Result<usize> {
    loop {
        match source.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(MkImageError::unreadable(Stage::ReadSource, e)),
        }
    }
}

/// Issue a single write and require it to take the whole buffer.
fn write_counted<D: Write + ?Sized>(dest: &mut D, buf: &[u8], stage: Stage) -> Result<()> {
    let written = loop {
        match dest.write(buf) {
            Ok(n) => break n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(MkImageError::unwritable(stage, e)),
        }
    };
    if written != buf.len() {
        return Err(MkImageError::ShortWrite {
            stage,
            written,
            expected: buf.len(),
        });
    }
    Ok(())
}
