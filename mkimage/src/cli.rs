//! Command line interface for mkimage

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;
use colored::Colorize;
use env_logger::Env;
use log::info;

use crate::VERSION;
use crate::builder::Assembled;
use crate::config::{Address, ImageConfig, parse_address};
use crate::error::MkImageError;
use crate::image_types::supported_names;

/// Command line arguments for mkimage
#[derive(Parser, Debug)]
#[command(name = "mkimage")]
#[command(version = VERSION)]
#[command(about = "Create U-Boot legacy images", long_about = None)]
pub struct Args {
    /// Architecture (arm, arm64, x86, ppc, riscv, ...)
    #[arg(short = 'A', long)]
    pub arch: Option<String>,

    /// Operating system (linux, u-boot, vxworks, ...)
    #[arg(short = 'O', long)]
    pub os: Option<String>,

    /// Image type (kernel, ramdisk, firmware, script, ...)
    #[arg(short = 'T', long = "type")]
    pub image_type: Option<String>,

    /// Compression recorded in the header (none, gzip, bzip2, ...)
    #[arg(short = 'C', long)]
    pub compression: Option<String>,

    /// Load address (hexadecimal)
    #[arg(short = 'a', long, value_parser = parse_address)]
    pub load_address: Option<u32>,

    /// Entry point address (hexadecimal)
    #[arg(short = 'e', long, value_parser = parse_address)]
    pub entry_point: Option<u32>,

    /// Image name, at most 32 bytes
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Payload file
    #[arg(short = 'd', long = "datafile")]
    pub data_file: PathBuf,

    /// Output image file
    pub image: PathBuf,

    /// TOML file with default image parameters
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Creation time in seconds since the epoch
    #[arg(long)]
    pub timestamp: Option<u32>,

    /// Fail instead of truncating names longer than 32 bytes
    #[arg(long)]
    pub strict_name: bool,

    /// Print the header of the created image
    #[arg(long)]
    pub print_info: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode - only output errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    fn image_config(&self) -> ImageConfig {
        ImageConfig {
            arch: self.arch.clone(),
            os: self.os.clone(),
            image_type: self.image_type.clone(),
            compression: self.compression.clone(),
            load_address: self.load_address.map(Address::Int),
            entry_point: self.entry_point.map(Address::Int),
            name: self.name.clone(),
            timestamp: self.timestamp,
            strict_name: self.strict_name,
        }
    }
}

/// Install the global logger; `RUST_LOG` wins over the flags.
pub fn init_logger(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

/// Main CLI handler
pub fn run_cli(args: Args) -> anyhow::Result<Assembled> {
    let file_config = match &args.config {
        Some(path) => ImageConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ImageConfig::default(),
    };
    let config = file_config.overlay(args.image_config());

    let builder = config.to_builder().map_err(|e| match e {
        MkImageError::EnumNotFound { domain, .. } => {
            anyhow!("{e}; supported: {}", supported_names(domain).join(", "))
        }
        e => e.into(),
    })?;

    info!(
        "creating {} -> {}",
        args.data_file.display(),
        args.image.display()
    );
    let out = builder.build_to_file(&args.data_file, &args.image)?;

    if !args.quiet {
        eprintln!(
            "{}",
            format!(
                "Image created: {} ({} bytes)",
                args.image.display(),
                out.bytes_written
            )
            .green()
        );
    }
    if args.print_info {
        println!("{}", out.header.summary());
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_types::Arch;

    #[test]
    fn test_args_parsing() {
        let args = Args::try_parse_from([
            "mkimage", "-A", "arm64", "-O", "linux", "-T", "kernel", "-C", "none", "-a",
            "80080000", "-e", "0x80080000", "-n", "Test", "-d", "Image", "uImage",
        ])
        .unwrap();

        assert_eq!(args.arch.as_deref(), Some("arm64"));
        assert_eq!(args.image_type.as_deref(), Some("kernel"));
        assert_eq!(args.load_address, Some(0x8008_0000));
        assert_eq!(args.entry_point, Some(0x8008_0000));
        assert_eq!(args.name.as_deref(), Some("Test"));
        assert_eq!(args.data_file, PathBuf::from("Image"));
        assert_eq!(args.image, PathBuf::from("uImage"));
    }

    #[test]
    fn test_args_require_files() {
        assert!(Args::try_parse_from(["mkimage", "-A", "arm", "uImage"]).is_err());
        assert!(Args::try_parse_from(["mkimage", "-d", "Image"]).is_err());
    }

    #[test]
    fn test_bad_address() {
        assert!(Args::try_parse_from(["mkimage", "-a", "0xnothex", "-d", "a", "b"]).is_err());
    }

    #[test]
    fn test_image_config_from_args() {
        let args = Args::try_parse_from([
            "mkimage", "-A", "ppc", "--timestamp", "7", "--strict-name", "-d", "a", "b",
        ])
        .unwrap();
        let config = args.image_config();
        assert!(config.strict_name);
        assert_eq!(config.load_address, None);
        let header = config.to_builder().unwrap().header().clone();
        assert_eq!(header.arch, Arch::Powerpc);
        assert_eq!(header.time, 7);
    }

    #[test]
    fn test_unknown_name_lists_supported() {
        let args = Args::try_parse_from([
            "mkimage", "-O", "windows", "--timestamp", "0", "-d", "a", "b",
        ])
        .unwrap();
        let err = run_cli(args).unwrap_err().to_string();
        assert!(err.contains("unknown name 'windows'"));
        assert!(err.contains("u-boot"));
    }
}
