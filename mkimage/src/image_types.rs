//! Image type definitions and name tables
//!
//! Each header enum (OS, architecture, image type, compression) has a static
//! table of `(code, short name, display name)` entries. Short names are what
//! the command line accepts; display names are used when printing headers.
//! Lookups scan the table in order and the first exact, case-sensitive match
//! wins. Entries without a short name can never be selected by name.

use std::fmt;
use std::str::FromStr;

use crate::error::{MkImageError, Result};

/// One row of a name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry<T> {
    pub id: T,
    pub sname: Option<&'static str>,
    pub lname: &'static str,
}

const fn entry<T>(id: T, sname: &'static str, lname: &'static str) -> TableEntry<T> {
    TableEntry {
        id,
        sname: Some(sname),
        lname,
    }
}

const fn unnamed<T>(id: T, lname: &'static str) -> TableEntry<T> {
    TableEntry {
        id,
        sname: None,
        lname,
    }
}

/// The four independent enumerations stored in an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Os,
    Arch,
    Type,
    Comp,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Os => "operating system",
            Self::Arch => "architecture",
            Self::Type => "image type",
            Self::Comp => "compression",
        };
        f.write_str(name)
    }
}

/// Shared behaviour of the header enums, driven by their name tables.
pub trait ImageEnum: Copy + PartialEq + Sized + 'static {
    const DOMAIN: Domain;

    fn table() -> &'static [TableEntry<Self>];

    fn code(self) -> u8;

    /// Find the first entry whose short name equals `name`.
    fn from_name(name: &str) -> Option<Self> {
        Self::table()
            .iter()
            .find(|e| e.sname == Some(name))
            .map(|e| e.id)
    }

    fn from_code(code: u8) -> Option<Self> {
        Self::table()
            .iter()
            .find(|e| e.id.code() == code)
            .map(|e| e.id)
    }

    fn short_name(self) -> &'static str {
        self.entry().and_then(|e| e.sname).unwrap_or("invalid")
    }

    fn long_name(self) -> &'static str {
        self.entry().map(|e| e.lname).unwrap_or("Unknown")
    }

    fn entry(self) -> Option<&'static TableEntry<Self>> {
        Self::table().iter().find(|e| e.id == self)
    }
}

/// A code read from a header; codes missing from the tables are kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderCode<T> {
    Known(T),
    Unknown(u8),
}

impl<T: ImageEnum> HeaderCode<T> {
    pub fn from_code(code: u8) -> Self {
        T::from_code(code).map_or(Self::Unknown(code), Self::Known)
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Known(id) => id.code(),
            Self::Unknown(code) => code,
        }
    }

    pub fn known(self) -> Option<T> {
        match self {
            Self::Known(id) => Some(id),
            Self::Unknown(_) => None,
        }
    }

    pub fn long_name(self) -> &'static str {
        self.known().map_or("Unknown", T::long_name)
    }
}

impl<T: Default> Default for HeaderCode<T> {
    fn default() -> Self {
        Self::Known(T::default())
    }
}

impl<T> From<T> for HeaderCode<T> {
    fn from(id: T) -> Self {
        Self::Known(id)
    }
}

impl<T: ImageEnum + fmt::Display> fmt::Display for HeaderCode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(id) => id.fmt(f),
            Self::Unknown(code) => write!(f, "unknown ({code})"),
        }
    }
}

/// Resolve a short name to its numeric code in the given domain.
pub fn resolve(domain: Domain, name: &str) -> Result<u8> {
    let code = match domain {
        Domain::Os => OsType::from_name(name).map(OsType::code),
        Domain::Arch => Arch::from_name(name).map(Arch::code),
        Domain::Type => ImageType::from_name(name).map(ImageType::code),
        Domain::Comp => Compression::from_name(name).map(Compression::code),
    };
    code.ok_or_else(|| MkImageError::enum_not_found(domain, name))
}

/// Every short name accepted in the given domain, in table order.
pub fn supported_names(domain: Domain) -> Vec<&'static str> {
    fn names<T: ImageEnum>() -> Vec<&'static str> {
        T::table().iter().filter_map(|e| e.sname).collect()
    }

    match domain {
        Domain::Os => names::<OsType>(),
        Domain::Arch => names::<Arch>(),
        Domain::Type => names::<ImageType>(),
        Domain::Comp => names::<Compression>(),
    }
}

/// Operating system types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum OsType {
    #[default]
    Invalid = 0,
    Openbsd = 1,
    Netbsd = 2,
    Freebsd = 3,
    Bsd4_4 = 4,
    Linux = 5,
    SvR4 = 6,
    Esix = 7,
    Solaris = 8,
    Irix = 9,
    Sco = 10,
    Dell = 11,
    Ncr = 12,
    Lynxos = 13,
    Vxworks = 14,
    Psos = 15,
    Qnx = 16,
    Uboot = 17,
    Rtems = 18,
    Artos = 19,
    Unity = 20,
    Integrity = 21,
    Ose = 22,
    Plan9 = 23,
    Openrtos = 24,
}

/// Architecture types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Arch {
    #[default]
    Invalid = 0,
    Alpha = 1,
    Arm = 2,
    I386 = 3,
    Ia64 = 4,
    Mips = 5,
    Mips64 = 6,
    Powerpc = 7,
    S390 = 8,
    Sh = 9,
    Sparc = 10,
    Sparc64 = 11,
    M68k = 12,
    Microblaze = 14,
    Nios2 = 15,
    Blackfin = 16,
    Avr32 = 17,
    St200 = 18,
    Sandbox = 19,
    Nds32 = 20,
    Openrisc = 21,
    Arm64 = 22,
    Arc = 23,
    X86_64 = 24,
    Xtensa = 25,
    Riscv = 26,
}

/// U-Boot image types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ImageType {
    /// Invalid/unknown image type
    #[default]
    Invalid = 0,
    /// Standalone program
    Standalone = 1,
    /// OS kernel image
    Kernel = 2,
    /// RAM disk image
    Ramdisk = 3,
    /// Multi-file image
    Multi = 4,
    /// Firmware image
    Firmware = 5,
    /// Script file
    Script = 6,
    /// Filesystem image
    Filesystem = 7,
    /// Binary flat device tree blob
    FlatDt = 8,
    /// Kirkwood boot image
    KwbImage = 9,
    /// Freescale i.MX boot image
    ImxImage = 10,
    /// Davinci UBL image
    UblImage = 11,
    /// TI OMAP config header image
    OmapImage = 12,
    /// TI Davinci AIS image
    AisImage = 13,
    /// OS kernel image that runs from any load address
    KernelNoload = 14,
    /// Freescale PBL boot image
    PblImage = 15,
    /// Freescale MXS boot image
    MxsImage = 16,
    /// TI Keystone GP header image
    GpImage = 17,
    /// ATMEL ROM bootable image
    AtmelImage = 18,
}

/// Compression types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Compression {
    #[default]
    None = 0,
    Gzip = 1,
    Bzip2 = 2,
    Lzma = 3,
    Lzo = 4,
    Lz4 = 5,
    Zstd = 6,
}

static OS_TABLE: [TableEntry<OsType>; 25] = [
    unnamed(OsType::Invalid, "Invalid OS"),
    entry(OsType::Linux, "linux", "Linux"),
    entry(OsType::Lynxos, "lynxos", "LynxOS"),
    entry(OsType::Netbsd, "netbsd", "NetBSD"),
    entry(OsType::Ose, "ose", "Enea OSE"),
    entry(OsType::Plan9, "plan9", "Plan 9"),
    entry(OsType::Rtems, "rtems", "RTEMS"),
    entry(OsType::Uboot, "u-boot", "U-Boot"),
    entry(OsType::Vxworks, "vxworks", "VxWorks"),
    entry(OsType::Qnx, "qnx", "QNX"),
    entry(OsType::Integrity, "integrity", "INTEGRITY"),
    entry(OsType::Bsd4_4, "4_4bsd", "4_4BSD"),
    entry(OsType::Dell, "dell", "Dell"),
    entry(OsType::Esix, "esix", "Esix"),
    entry(OsType::Freebsd, "freebsd", "FreeBSD"),
    entry(OsType::Irix, "irix", "Irix"),
    entry(OsType::Ncr, "ncr", "NCR"),
    entry(OsType::Openbsd, "openbsd", "OpenBSD"),
    entry(OsType::Psos, "psos", "pSOS"),
    entry(OsType::Sco, "sco", "SCO"),
    entry(OsType::Solaris, "solaris", "Solaris"),
    entry(OsType::SvR4, "svr4", "SVR4"),
    entry(OsType::Artos, "artos", "ARTOS"),
    entry(OsType::Unity, "unity", "Unity OS"),
    entry(OsType::Openrtos, "openrtos", "OpenRTOS"),
];

// "powerpc" and "ppc" share a code; from_code and Display pick "powerpc".
static ARCH_TABLE: [TableEntry<Arch>; 27] = [
    unnamed(Arch::Invalid, "Invalid ARCH"),
    entry(Arch::Alpha, "alpha", "Alpha"),
    entry(Arch::Arm, "arm", "ARM"),
    entry(Arch::I386, "x86", "Intel x86"),
    entry(Arch::Ia64, "ia64", "IA64"),
    entry(Arch::M68k, "m68k", "M68K"),
    entry(Arch::Microblaze, "microblaze", "MicroBlaze"),
    entry(Arch::Mips, "mips", "MIPS"),
    entry(Arch::Mips64, "mips64", "MIPS 64 Bit"),
    entry(Arch::Nios2, "nios2", "NIOS II"),
    entry(Arch::Powerpc, "powerpc", "PowerPC"),
    entry(Arch::Powerpc, "ppc", "PowerPC"),
    entry(Arch::S390, "s390", "IBM S390"),
    entry(Arch::Sh, "sh", "SuperH"),
    entry(Arch::Sparc, "sparc", "SPARC"),
    entry(Arch::Sparc64, "sparc64", "SPARC 64 Bit"),
    entry(Arch::Blackfin, "blackfin", "Blackfin"),
    entry(Arch::Avr32, "avr32", "AVR32"),
    entry(Arch::St200, "st200", "STMicroelectronics ST200"),
    entry(Arch::Nds32, "nds32", "NDS32"),
    entry(Arch::Openrisc, "or1k", "OpenRISC 1000"),
    entry(Arch::Sandbox, "sandbox", "Sandbox"),
    entry(Arch::Arm64, "arm64", "AArch64"),
    entry(Arch::Arc, "arc", "ARC"),
    entry(Arch::X86_64, "x86_64", "AMD x86_64"),
    entry(Arch::Xtensa, "xtensa", "Xtensa"),
    entry(Arch::Riscv, "riscv", "RISC-V"),
];

static TYPE_TABLE: [TableEntry<ImageType>; 19] = [
    entry(ImageType::AisImage, "aisimage", "Davinci AIS image"),
    entry(ImageType::Filesystem, "filesystem", "Filesystem Image"),
    entry(ImageType::Firmware, "firmware", "Firmware"),
    entry(ImageType::FlatDt, "flat_dt", "Flat Device Tree"),
    entry(ImageType::GpImage, "gpimage", "TI Keystone SPL Image"),
    entry(ImageType::Kernel, "kernel", "Kernel Image"),
    entry(
        ImageType::KernelNoload,
        "kernel_noload",
        "Kernel Image (no loading done)",
    ),
    entry(ImageType::KwbImage, "kwbimage", "Kirkwood Boot Image"),
    entry(ImageType::ImxImage, "imximage", "Freescale i.MX Boot Image"),
    unnamed(ImageType::Invalid, "Invalid Image"),
    entry(ImageType::Multi, "multi", "Multi-File Image"),
    entry(ImageType::OmapImage, "omapimage", "TI OMAP SPL With GP CH"),
    entry(ImageType::PblImage, "pblimage", "Freescale PBL Boot Image"),
    entry(ImageType::Ramdisk, "ramdisk", "RAMDisk Image"),
    entry(ImageType::Script, "script", "Script"),
    entry(ImageType::Standalone, "standalone", "Standalone Program"),
    entry(ImageType::UblImage, "ublimage", "Davinci UBL image"),
    entry(ImageType::MxsImage, "mxsimage", "Freescale MXS Boot Image"),
    entry(ImageType::AtmelImage, "atmelimage", "ATMEL ROM-Boot Image"),
];

static COMP_TABLE: [TableEntry<Compression>; 7] = [
    entry(Compression::None, "none", "uncompressed"),
    entry(Compression::Bzip2, "bzip2", "bzip2 compressed"),
    entry(Compression::Gzip, "gzip", "gzip compressed"),
    entry(Compression::Lzma, "lzma", "lzma compressed"),
    entry(Compression::Lzo, "lzo", "lzo compressed"),
    entry(Compression::Lz4, "lz4", "lz4 compressed"),
    entry(Compression::Zstd, "zstd", "zstd compressed"),
];

macro_rules! impl_image_enum {
    ($ty:ty, $domain:expr, $table:ident) => {
        impl ImageEnum for $ty {
            const DOMAIN: Domain = $domain;

            fn table() -> &'static [TableEntry<Self>] {
                &$table
            }

            fn code(self) -> u8 {
                self as u8
            }
        }

        impl TryFrom<u8> for $ty {
            type Error = MkImageError;

            fn try_from(value: u8) -> Result<Self> {
                Self::from_code(value).ok_or_else(|| {
                    MkImageError::invalid_image_data(format!(
                        "unknown {} code {}",
                        Self::DOMAIN,
                        value
                    ))
                })
            }
        }

        impl FromStr for $ty {
            type Err = MkImageError;

            fn from_str(s: &str) -> Result<Self> {
                Self::from_name(s).ok_or_else(|| MkImageError::enum_not_found(Self::DOMAIN, s))
            }
        }

        impl PartialEq<$ty> for HeaderCode<$ty> {
            fn eq(&self, other: &$ty) -> bool {
                *self == HeaderCode::Known(*other)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.short_name())
            }
        }
    };
}

impl_image_enum!(OsType, Domain::Os, OS_TABLE);
impl_image_enum!(Arch, Domain::Arch, ARCH_TABLE);
impl_image_enum!(ImageType, Domain::Type, TYPE_TABLE);
impl_image_enum!(Compression, Domain::Comp, COMP_TABLE);
