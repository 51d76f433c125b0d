//! CLI tests for mkimage

use std::fs;
use std::io::Write;

use assert_cmd::Command;
use mkimage::{Arch, IH_HEADER_SIZE, ImageHeader, ImageType, OsType};
use predicates::prelude::*;
use tempfile::{NamedTempFile, tempdir};

fn mkimage() -> Command {
    let mut cmd = Command::cargo_bin("mkimage").unwrap();
    cmd.env_remove("SOURCE_DATE_EPOCH").env_remove("RUST_LOG");
    cmd
}

fn data_file(content: &[u8]) -> NamedTempFile {
    let mut input = NamedTempFile::new().unwrap();
    input.write_all(content).unwrap();
    input.flush().unwrap();
    input
}

/// Test CLI version
#[test]
fn test_cli_version() {
    mkimage()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// Test creating a simple image
#[test]
fn test_cli_create_simple() {
    let input = data_file(b"Test kernel data\n");
    let dir = tempdir().unwrap();
    let output = dir.path().join("uImage");

    mkimage()
        .args(["-A", "arm", "-O", "linux", "-T", "kernel", "-C", "none"])
        .args(["-a", "0x80008000", "-e", "80008000", "-n", "Test Kernel"])
        .arg("-d")
        .arg(input.path())
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("Image created"));

    let image = fs::read(&output).unwrap();
    assert_eq!(image.len(), IH_HEADER_SIZE + 17);
    let header = ImageHeader::from_bytes(&image).unwrap();
    header.verify_checksum().unwrap();
    assert_eq!(header.arch, Arch::Arm);
    assert_eq!(header.os, OsType::Linux);
    assert_eq!(header.type_, ImageType::Kernel);
    assert_eq!(header.load, 0x8000_8000);
    assert_eq!(header.ep, 0x8000_8000);
    assert_eq!(header.name(), "Test Kernel");
}

#[test]
fn test_cli_defaults() {
    let input = data_file(b"abc");
    let dir = tempdir().unwrap();
    let output = dir.path().join("uImage");

    mkimage()
        .arg("-q")
        .arg("-d")
        .arg(input.path())
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::is_empty());

    let header = ImageHeader::from_bytes(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(header.os, OsType::Linux);
    assert_eq!(header.arch, Arch::I386);
    assert_eq!(header.type_, ImageType::Kernel);
    assert_eq!(header.load, 0);
}

#[test]
fn test_cli_source_date_epoch() {
    let input = data_file(b"abc");
    let dir = tempdir().unwrap();
    let first = dir.path().join("a.img");
    let second = dir.path().join("b.img");

    for output in [&first, &second] {
        mkimage()
            .env("SOURCE_DATE_EPOCH", "1700000000")
            .arg("-d")
            .arg(input.path())
            .arg(output)
            .assert()
            .success();
    }

    let a = fs::read(&first).unwrap();
    assert_eq!(a, fs::read(&second).unwrap());
    assert_eq!(ImageHeader::from_bytes(&a).unwrap().time, 1_700_000_000);
}

#[test]
fn test_cli_unknown_arch() {
    let input = data_file(b"abc");
    let dir = tempdir().unwrap();
    let output = dir.path().join("uImage");

    mkimage()
        .args(["-A", "vax", "-d"])
        .arg(input.path())
        .arg(&output)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("architecture"))
        .stderr(predicate::str::contains("vax"));

    assert!(!output.exists());
}

#[test]
fn test_cli_missing_datafile() {
    let dir = tempdir().unwrap();
    mkimage()
        .arg(dir.path().join("uImage"))
        .assert()
        .failure();
}

#[test]
fn test_cli_unreadable_source() {
    let dir = tempdir().unwrap();
    mkimage()
        .arg("-d")
        .arg(dir.path().join("missing.bin"))
        .arg(dir.path().join("uImage"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("opening source"));
}

#[test]
fn test_cli_strict_name() {
    let input = data_file(b"abc");
    let dir = tempdir().unwrap();
    let output = dir.path().join("uImage");
    let long = "n".repeat(33);

    mkimage()
        .args(["--strict-name", "-n", long.as_str(), "-d"])
        .arg(input.path())
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("image name is 33 bytes long"));
    assert!(!output.exists());

    mkimage()
        .args(["-n", long.as_str(), "-d"])
        .arg(input.path())
        .arg(&output)
        .assert()
        .success();
    let header = ImageHeader::from_bytes(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(header.name().len(), 32);
}

#[test]
fn test_cli_config_file() {
    let input = data_file(b"firmware blob");
    let dir = tempdir().unwrap();
    let output = dir.path().join("fw.img");
    let config = dir.path().join("image.toml");
    fs::write(
        &config,
        r#"
arch = "riscv"
os = "u-boot"
type = "firmware"
load_address = "0x80200000"
name = "from config"
timestamp = 1234
"#,
    )
    .unwrap();

    mkimage()
        .args(["-n", "from cli", "-c"])
        .arg(&config)
        .arg("-d")
        .arg(input.path())
        .arg(&output)
        .assert()
        .success();

    let header = ImageHeader::from_bytes(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(header.arch, Arch::Riscv);
    assert_eq!(header.os, OsType::Uboot);
    assert_eq!(header.type_, ImageType::Firmware);
    assert_eq!(header.load, 0x8020_0000);
    assert_eq!(header.time, 1234);
    assert_eq!(header.name(), "from cli");
}

#[test]
fn test_cli_print_info() {
    let input = data_file(b"abc");
    let dir = tempdir().unwrap();

    mkimage()
        .args(["-A", "arm64", "-n", "Info Kernel", "--print-info", "-d"])
        .arg(input.path())
        .arg(dir.path().join("uImage"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Info Kernel"))
        .stdout(predicate::str::contains("Data Size:    3 Bytes"));
}
