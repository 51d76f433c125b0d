//! Basic usage example for mkimage

use std::fs;

use mkimage::{Arch, Compression, ImageBuilder, ImageHeader, ImageType, OsType, IH_HEADER_SIZE};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Creating a simple U-Boot image with mkimage...");

    let dir = std::env::temp_dir();
    let payload = dir.join("test_kernel.bin");
    let output = dir.join("test_kernel.img");

    let kernel_data = b"Hello, U-Boot! This is a test kernel image.";
    fs::write(&payload, kernel_data)?;

    let builder = ImageBuilder::with_name("Test Kernel")
        .image_type(ImageType::Kernel)
        .arch(Arch::Arm64)
        .os_type(OsType::Linux)
        .compression(Compression::None)
        .load_address(0x80000)
        .entry_point(0x80000);

    let out = builder.build_to_file(&payload, &output)?;

    println!("Created test kernel image: {}", output.display());
    println!("  Size: {} bytes", out.bytes_written);
    println!("  Header: {IH_HEADER_SIZE} bytes");
    println!("  Data: {} bytes", kernel_data.len());

    let image = fs::read(&output)?;
    let parsed = ImageHeader::from_bytes(&image)?;
    parsed.verify_checksum()?;
    println!();
    println!("{}", parsed.summary());

    Ok(())
}
