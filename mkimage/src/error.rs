//! Error types for image creation

use std::fmt;
use std::io;

use thiserror::Error;

use crate::image_types::Domain;

/// The step of image assembly an I/O failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    OpenSource,
    ReadSource,
    OpenDestination,
    WriteHeader,
    WritePayload,
    SyncDestination,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OpenSource => "opening source",
            Self::ReadSource => "reading source",
            Self::OpenDestination => "opening destination",
            Self::WriteHeader => "writing header",
            Self::WritePayload => "writing payload",
            Self::SyncDestination => "syncing destination",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum MkImageError {
    #[error("resolving {domain}: unknown name '{name}'")]
    EnumNotFound { domain: Domain, name: String },

    #[error("{stage} failed: {source}")]
    SourceUnreadable {
        stage: Stage,
        #[source]
        source: io::Error,
    },

    #[error("{stage} failed: {source}")]
    DestinationUnwritable {
        stage: Stage,
        #[source]
        source: io::Error,
    },

    #[error("{stage} failed: short write ({written} of {expected} bytes)")]
    ShortWrite {
        stage: Stage,
        written: usize,
        expected: usize,
    },

    #[error("image name is {len} bytes long (max {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("payload of {size} bytes does not fit the header size field (max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    #[error("source changed while reading: expected {expected} bytes, got {actual}")]
    SourceChanged { expected: u64, actual: u64 },

    #[error("invalid magic number: expected 0x{expected:08x}, found 0x{found:08x}")]
    InvalidMagic { expected: u32, found: u32 },

    #[error("header checksum mismatch: stored 0x{stored:08x}, computed 0x{computed:08x}")]
    HeaderCrcMismatch { stored: u32, computed: u32 },

    #[error("invalid image data: {0}")]
    InvalidImageData(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MkImageError>;

impl MkImageError {
    pub fn enum_not_found(domain: Domain, name: impl Into<String>) -> Self {
        Self::EnumNotFound {
            domain,
            name: name.into(),
        }
    }

    pub fn invalid_magic(expected: u32, found: u32) -> Self {
        Self::InvalidMagic { expected, found }
    }

    pub fn invalid_image_data(msg: impl Into<String>) -> Self {
        Self::InvalidImageData(msg.into())
    }

    pub fn unreadable(stage: Stage, source: io::Error) -> Self {
        Self::SourceUnreadable { stage, source }
    }

    pub fn unwritable(stage: Stage, source: io::Error) -> Self {
        Self::DestinationUnwritable { stage, source }
    }

    /// The assembly stage this error was raised in, if it came from I/O.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::SourceUnreadable { stage, .. }
            | Self::DestinationUnwritable { stage, .. }
            | Self::ShortWrite { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_in_message() {
        let err = MkImageError::ShortWrite {
            stage: Stage::WriteHeader,
            written: 10,
            expected: 64,
        };
        assert_eq!(
            err.to_string(),
            "writing header failed: short write (10 of 64 bytes)"
        );
        assert_eq!(err.stage(), Some(Stage::WriteHeader));
    }

    #[test]
    fn test_enum_not_found_message() {
        let err = MkImageError::enum_not_found(Domain::Arch, "vax");
        assert_eq!(err.to_string(), "resolving architecture: unknown name 'vax'");
        assert_eq!(err.stage(), None);
    }
}
