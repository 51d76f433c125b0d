//! # mkimage
//!
//! A Rust implementation of U-Boot's mkimage tool for creating legacy
//! (single payload) boot images.
//!
//! An image is a 64-byte big-endian header followed by the payload bytes
//! unchanged. The header records the target OS, CPU architecture, image
//! type, compression, load and entry addresses, a name and two CRC32
//! checksums.
//!
//! ## Example
//!
//! ```rust
//! use mkimage::{Arch, ImageBuilder, ImageHeader, ImageType, OsType, IH_HEADER_SIZE};
//!
//! let kernel_data = vec![0u8; 1024];
//! let image = ImageBuilder::new()
//!     .image_type(ImageType::Kernel)
//!     .arch(Arch::Arm64)
//!     .os_type(OsType::Linux)
//!     .load_address(0x80000)
//!     .entry_point(0x80000)
//!     .name("Test Kernel")
//!     .build(&kernel_data)?;
//!
//! assert_eq!(image.len(), IH_HEADER_SIZE + kernel_data.len());
//! let header = ImageHeader::from_bytes(&image)?;
//! header.verify_checksum()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod cli;
pub mod config;
pub mod crc;
pub mod error;
pub mod image_header;
pub mod image_types;

// Re-export main types for convenience
pub use builder::{Assembled, ImageBuilder, ImageSink, NamePolicy};
pub use config::ImageConfig;
pub use crc::{Crc32, calculate_crc32};
pub use error::{MkImageError, Result, Stage};
pub use image_header::{IH_HEADER_SIZE, IH_MAGIC, IH_NMLEN, ImageHeader};
pub use image_types::*;

/// Current version of the mkimage implementation
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
