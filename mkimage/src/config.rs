//! Image parameters from a TOML file, the command line and the environment
//!
//! ```toml
//! arch = "arm"
//! os = "linux"
//! type = "kernel"
//! compression = "none"
//! load_address = "0x80008000"
//! entry_point = 0x80008000
//! name = "Linux-6.6"
//! ```

use std::env;
use std::fs;
use std::path::Path;

use chrono::Utc;
use log::debug;
use serde::Deserialize;

use crate::builder::{ImageBuilder, NamePolicy};
use crate::error::{MkImageError, Result};
use crate::image_types::{Arch, Compression, ImageType, OsType};

pub const DEFAULT_OS: &str = "linux";
pub const DEFAULT_ARCH: &str = "x86";
pub const DEFAULT_TYPE: &str = "kernel";
pub const DEFAULT_COMPRESSION: &str = "none";

/// Reproducible-build override for the image timestamp
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// An address given either as a TOML integer or as a hex string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Address {
    Int(u32),
    Text(String),
}

impl Address {
    pub fn value(&self) -> Result<u32> {
        match self {
            Self::Int(v) => Ok(*v),
            Self::Text(s) => parse_address(s),
        }
    }
}

/// Parse a hexadecimal address, with or without a `0x` prefix.
pub fn parse_address(s: &str) -> Result<u32> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16)
        .map_err(|e| MkImageError::Config(format!("invalid address '{s}': {e}")))
}

/// Header parameters; every field is optional so layers can be overlaid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    pub arch: Option<String>,
    pub os: Option<String>,
    #[serde(rename = "type")]
    pub image_type: Option<String>,
    pub compression: Option<String>,
    pub load_address: Option<Address>,
    pub entry_point: Option<Address>,
    pub name: Option<String>,
    pub timestamp: Option<u32>,
    #[serde(default)]
    pub strict_name: bool,
}

impl ImageConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| MkImageError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| MkImageError::Config(format!("{}: {e}", path.display())))?;
        debug!("loaded config from {}", path.display());
        Self::from_toml(&content)
    }

    /// Values set in `top` win over values in `self`.
    pub fn overlay(self, top: ImageConfig) -> Self {
        Self {
            arch: top.arch.or(self.arch),
            os: top.os.or(self.os),
            image_type: top.image_type.or(self.image_type),
            compression: top.compression.or(self.compression),
            load_address: top.load_address.or(self.load_address),
            entry_point: top.entry_point.or(self.entry_point),
            name: top.name.or(self.name),
            timestamp: top.timestamp.or(self.timestamp),
            strict_name: top.strict_name || self.strict_name,
        }
    }

    /// Resolve every name and address into a builder.
    ///
    /// Names are checked against the tables before anything else happens;
    /// an unknown name is an error, never a silent fallback to code 0.
    pub fn to_builder(&self) -> Result<ImageBuilder> {
        let os: OsType = self.os.as_deref().unwrap_or(DEFAULT_OS).parse()?;
        let arch: Arch = self.arch.as_deref().unwrap_or(DEFAULT_ARCH).parse()?;
        let image_type: ImageType = self.image_type.as_deref().unwrap_or(DEFAULT_TYPE).parse()?;
        let comp: Compression = self
            .compression
            .as_deref()
            .unwrap_or(DEFAULT_COMPRESSION)
            .parse()?;

        let load = self.load_address.as_ref().map(Address::value).transpose()?.unwrap_or(0);
        let ep = self.entry_point.as_ref().map(Address::value).transpose()?.unwrap_or(0);
        let time = resolve_timestamp(self.timestamp, env::var(SOURCE_DATE_EPOCH).ok())?;

        debug!(
            "os: {os} ({}), arch: {arch} ({}), type: {image_type} ({}), comp: {comp} ({})",
            os as u8, arch as u8, image_type as u8, comp as u8
        );
        debug!("load: 0x{load:08x}, ep: 0x{ep:08x}, time: {time}");

        Ok(ImageBuilder::new()
            .os_type(os)
            .arch(arch)
            .image_type(image_type)
            .compression(comp)
            .load_address(load)
            .entry_point(ep)
            .timestamp(time)
            .name(self.name.clone().unwrap_or_default())
            .name_policy(if self.strict_name {
                NamePolicy::Reject
            } else {
                NamePolicy::Truncate
            }))
    }
}

/// Pick the image timestamp: explicit value, then `SOURCE_DATE_EPOCH`, then now.
pub fn resolve_timestamp(explicit: Option<u32>, source_date_epoch: Option<String>) -> Result<u32> {
    if let Some(time) = explicit {
        return Ok(time);
    }
    if let Some(epoch) = source_date_epoch {
        return epoch.trim().parse::<u32>().map_err(|e| {
            MkImageError::Config(format!("invalid {SOURCE_DATE_EPOCH} '{epoch}': {e}"))
        });
    }
    Ok(Utc::now().timestamp() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_types::Domain;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x1000").unwrap(), 0x1000);
        assert_eq!(parse_address("0X1000").unwrap(), 0x1000);
        assert_eq!(parse_address("80008000").unwrap(), 0x8000_8000);
        assert!(parse_address("0xfffffffff").is_err());
        assert!(parse_address("zz").is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = ImageConfig::from_toml(
            r#"
            arch = "arm"
            type = "firmware"
            load_address = "0x80008000"
            entry_point = 4096
            name = "board"
            "#,
        )
        .unwrap();
        assert_eq!(config.arch.as_deref(), Some("arm"));
        assert_eq!(config.image_type.as_deref(), Some("firmware"));
        assert_eq!(config.load_address.unwrap().value().unwrap(), 0x8000_8000);
        assert_eq!(config.entry_point.unwrap().value().unwrap(), 4096);
        assert!(!config.strict_name);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            ImageConfig::from_toml("archh = \"arm\""),
            Err(MkImageError::Config(_))
        ));
    }

    #[test]
    fn test_overlay() {
        let file = ImageConfig {
            arch: Some("arm".into()),
            name: Some("from file".into()),
            timestamp: Some(1),
            ..Default::default()
        };
        let cli = ImageConfig {
            name: Some("from cli".into()),
            ..Default::default()
        };
        let merged = file.overlay(cli);
        assert_eq!(merged.arch.as_deref(), Some("arm"));
        assert_eq!(merged.name.as_deref(), Some("from cli"));
        assert_eq!(merged.timestamp, Some(1));
    }

    #[test]
    fn test_to_builder_defaults() {
        let config = ImageConfig {
            timestamp: Some(42),
            ..Default::default()
        };
        let header = config.to_builder().unwrap().header().clone();
        assert_eq!(header.os, OsType::Linux);
        assert_eq!(header.arch, Arch::I386);
        assert_eq!(header.type_, ImageType::Kernel);
        assert_eq!(header.comp, Compression::None);
        assert_eq!(header.load, 0);
        assert_eq!(header.time, 42);
    }

    #[test]
    fn test_to_builder_rejects_unknown_name() {
        let config = ImageConfig {
            arch: Some("vax".into()),
            timestamp: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            config.to_builder(),
            Err(MkImageError::EnumNotFound {
                domain: Domain::Arch,
                ..
            })
        ));
    }

    #[test]
    fn test_resolve_timestamp() {
        assert_eq!(resolve_timestamp(Some(5), Some("9".into())).unwrap(), 5);
        assert_eq!(resolve_timestamp(None, Some("1700000000\n".into())).unwrap(), 1_700_000_000);
        assert!(resolve_timestamp(None, Some("yesterday".into())).is_err());
        let now = Utc::now().timestamp() as u32;
        assert!(resolve_timestamp(None, None).unwrap() >= now);
    }
}
