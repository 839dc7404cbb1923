//! QNX IFS startup header parsing and writing.

use oxilzo_core::error::{OxiLzoError, Result};
use oxilzo_lzo1x::flags::{self, CompressionMethod, FlagHeader};

/// Startup signature as stored by a little-endian image.
pub const STARTUP_SIGNATURE: [u8; 4] = [0xEB, 0x7E, 0xFF, 0x00];

/// Startup signature as stored by a big-endian image.
pub const STARTUP_SIGNATURE_BE: [u8; 4] = [0x00, 0xFF, 0x7E, 0xEB];

/// Size of the startup header structure.
pub const STARTUP_HEADER_SIZE: usize = 256;

/// Field offsets within the startup header.
mod offset {
    pub const VERSION: usize = 4;
    pub const FLAGS1: usize = 6;
    pub const FLAGS2: usize = 7;
    pub const HEADER_SIZE: usize = 8;
    pub const MACHINE: usize = 10;
    pub const STARTUP_VADDR: usize = 12;
    pub const PADDR_BIAS: usize = 16;
    pub const IMAGE_PADDR: usize = 20;
    pub const RAM_PADDR: usize = 24;
    pub const RAM_SIZE: usize = 28;
    pub const STARTUP_SIZE: usize = 32;
    pub const STORED_SIZE: usize = 36;
    pub const IMAGEFS_PADDR: usize = 40;
    pub const IMAGEFS_SIZE: usize = 44;
    pub const PREBOOT_SIZE: usize = 48;
}

/// Byte order of the multi-byte header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endian {
    Little,
    Big,
}

impl Endian {
    pub(crate) fn from_big(big_endian: bool) -> Self {
        if big_endian { Self::Big } else { Self::Little }
    }

    pub(crate) fn read_u16(self, buf: &[u8], at: usize) -> u16 {
        let bytes = [buf[at], buf[at + 1]];
        match self {
            Self::Little => u16::from_le_bytes(bytes),
            Self::Big => u16::from_be_bytes(bytes),
        }
    }

    pub(crate) fn read_u32(self, buf: &[u8], at: usize) -> u32 {
        let bytes = [buf[at], buf[at + 1], buf[at + 2], buf[at + 3]];
        match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        }
    }

    pub(crate) fn write_u16(self, buf: &mut [u8], at: usize, value: u16) {
        let bytes = match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        };
        buf[at..at + 2].copy_from_slice(&bytes);
    }

    pub(crate) fn write_u32(self, buf: &mut [u8], at: usize, value: u32) {
        let bytes = match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        };
        buf[at..at + 4].copy_from_slice(&bytes);
    }
}

/// IFS startup header.
///
/// Only the fields the tools read or rewrite are decoded; the remaining
/// bytes of the 256-byte structure are carried through untouched by
/// [`StartupHeader::write_to`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StartupHeader {
    /// Header format version.
    pub version: u16,
    /// Flag header byte (virtual, big-endian, compression).
    pub flags1: u8,
    /// Secondary flags.
    pub flags2: u8,
    /// Size of the header structure.
    pub header_size: u16,
    /// Target machine.
    pub machine: u16,
    /// Virtual address of the startup entry point.
    pub startup_vaddr: u32,
    /// Physical address bias.
    pub paddr_bias: u32,
    /// Physical address of the image.
    pub image_paddr: u32,
    /// Physical address of RAM to copy the image to.
    pub ram_paddr: u32,
    /// RAM needed by the image.
    pub ram_size: u32,
    /// Size of the startup region, startup checksum included.
    pub startup_size: u32,
    /// Size of the image as stored (compressed or not).
    pub stored_size: u32,
    /// Physical address of the image filesystem.
    pub imagefs_paddr: u32,
    /// Uncompressed size of the image filesystem.
    pub imagefs_size: u32,
    /// Size of the pre-boot code.
    pub preboot_size: u16,
}

impl StartupHeader {
    /// Parse a header at the start of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < STARTUP_HEADER_SIZE {
            return Err(OxiLzoError::invalid_header(format!(
                "startup header needs {STARTUP_HEADER_SIZE} bytes, found {}",
                buf.len()
            )));
        }

        let flags1 = buf[offset::FLAGS1];
        let endian = Endian::from_big(flags::parse_flags(flags1).big_endian);
        let expected = match endian {
            Endian::Little => STARTUP_SIGNATURE,
            Endian::Big => STARTUP_SIGNATURE_BE,
        };
        if buf[..4] != expected {
            return Err(OxiLzoError::invalid_magic(expected.to_vec(), buf[..4].to_vec()));
        }

        Ok(Self {
            version: endian.read_u16(buf, offset::VERSION),
            flags1,
            flags2: buf[offset::FLAGS2],
            header_size: endian.read_u16(buf, offset::HEADER_SIZE),
            machine: endian.read_u16(buf, offset::MACHINE),
            startup_vaddr: endian.read_u32(buf, offset::STARTUP_VADDR),
            paddr_bias: endian.read_u32(buf, offset::PADDR_BIAS),
            image_paddr: endian.read_u32(buf, offset::IMAGE_PADDR),
            ram_paddr: endian.read_u32(buf, offset::RAM_PADDR),
            ram_size: endian.read_u32(buf, offset::RAM_SIZE),
            startup_size: endian.read_u32(buf, offset::STARTUP_SIZE),
            stored_size: endian.read_u32(buf, offset::STORED_SIZE),
            imagefs_paddr: endian.read_u32(buf, offset::IMAGEFS_PADDR),
            imagefs_size: endian.read_u32(buf, offset::IMAGEFS_SIZE),
            preboot_size: endian.read_u16(buf, offset::PREBOOT_SIZE),
        })
    }

    /// Write the signature and every decoded field into `buf`.
    ///
    /// Bytes of the header not covered by a field are left as they are.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() < STARTUP_HEADER_SIZE {
            return Err(OxiLzoError::invalid_header(format!(
                "startup header needs {STARTUP_HEADER_SIZE} bytes, found {}",
                buf.len()
            )));
        }

        let endian = self.endian();
        buf[..4].copy_from_slice(match endian {
            Endian::Little => &STARTUP_SIGNATURE,
            Endian::Big => &STARTUP_SIGNATURE_BE,
        });
        endian.write_u16(buf, offset::VERSION, self.version);
        buf[offset::FLAGS1] = self.flags1;
        buf[offset::FLAGS2] = self.flags2;
        endian.write_u16(buf, offset::HEADER_SIZE, self.header_size);
        endian.write_u16(buf, offset::MACHINE, self.machine);
        endian.write_u32(buf, offset::STARTUP_VADDR, self.startup_vaddr);
        endian.write_u32(buf, offset::PADDR_BIAS, self.paddr_bias);
        endian.write_u32(buf, offset::IMAGE_PADDR, self.image_paddr);
        endian.write_u32(buf, offset::RAM_PADDR, self.ram_paddr);
        endian.write_u32(buf, offset::RAM_SIZE, self.ram_size);
        endian.write_u32(buf, offset::STARTUP_SIZE, self.startup_size);
        endian.write_u32(buf, offset::STORED_SIZE, self.stored_size);
        endian.write_u32(buf, offset::IMAGEFS_PADDR, self.imagefs_paddr);
        endian.write_u32(buf, offset::IMAGEFS_SIZE, self.imagefs_size);
        endian.write_u16(buf, offset::PREBOOT_SIZE, self.preboot_size);
        Ok(())
    }

    /// Decoded flags1.
    pub fn flags(&self) -> FlagHeader {
        flags::parse_flags(self.flags1)
    }

    /// Compression method recorded in flags1.
    pub fn compression(&self) -> CompressionMethod {
        self.flags().method()
    }

    /// Whether multi-byte fields are big-endian.
    pub fn is_big_endian(&self) -> bool {
        self.flags().big_endian
    }

    /// Record a compression method in flags1, keeping the other bits.
    pub fn set_compression(&mut self, method: CompressionMethod) {
        self.flags1 = flags::with_compression(self.flags1, method.code());
    }

    pub(crate) fn endian(&self) -> Endian {
        Endian::from_big(self.is_big_endian())
    }

    /// Byte range of the startup region.
    pub fn startup_range(&self) -> std::ops::Range<usize> {
        0..self.startup_size as usize
    }

    /// Byte range of the uncompressed image filesystem.
    pub fn imagefs_range(&self) -> std::ops::Range<usize> {
        let start = self.startup_size as usize;
        start..start + self.imagefs_size as usize
    }
}

/// Offsets of every startup signature (either byte order) in `data`.
pub fn find_signatures(data: &[u8]) -> Vec<usize> {
    data.windows(STARTUP_SIGNATURE.len())
        .enumerate()
        .filter(|(_, w)| *w == STARTUP_SIGNATURE || *w == STARTUP_SIGNATURE_BE)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(big_endian: bool) -> StartupHeader {
        StartupHeader {
            version: 1,
            flags1: if big_endian { 0x03 } else { 0x01 },
            flags2: 0,
            header_size: STARTUP_HEADER_SIZE as u16,
            machine: 0x28,
            startup_vaddr: 0x0010_0100,
            paddr_bias: 0,
            image_paddr: 0x0010_0000,
            ram_paddr: 0x0010_0000,
            ram_size: 0x0040_0000,
            startup_size: 0x1000,
            stored_size: 0x3000,
            imagefs_paddr: 0x0010_1000,
            imagefs_size: 0x2000,
            preboot_size: 0,
        }
    }

    #[test]
    fn test_write_then_parse() {
        for big_endian in [false, true] {
            let header = sample(big_endian);
            let mut buf = vec![0xCCu8; STARTUP_HEADER_SIZE];
            header.write_to(&mut buf).unwrap();
            assert_eq!(StartupHeader::parse(&buf).unwrap(), header);
            // Reserved tail untouched
            assert_eq!(buf[STARTUP_HEADER_SIZE - 1], 0xCC);
        }
    }

    #[test]
    fn test_byte_order_follows_flags() {
        let mut buf = vec![0u8; STARTUP_HEADER_SIZE];
        sample(true).write_to(&mut buf).unwrap();
        assert_eq!(&buf[..4], &STARTUP_SIGNATURE_BE);
        assert_eq!(&buf[32..36], &[0x00, 0x00, 0x10, 0x00]);

        sample(false).write_to(&mut buf).unwrap();
        assert_eq!(&buf[..4], &STARTUP_SIGNATURE);
        assert_eq!(&buf[32..36], &[0x00, 0x10, 0x00, 0x00]);
    }

    #[test]
    fn test_bad_signature() {
        let mut buf = vec![0u8; STARTUP_HEADER_SIZE];
        sample(false).write_to(&mut buf).unwrap();
        buf[0] = 0;
        assert!(matches!(
            StartupHeader::parse(&buf),
            Err(OxiLzoError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            StartupHeader::parse(&STARTUP_SIGNATURE),
            Err(OxiLzoError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_compression_bits() {
        let mut header = sample(false);
        assert_eq!(header.compression(), CompressionMethod::None);
        header.set_compression(CompressionMethod::Lzo);
        assert_eq!(header.flags1, 0x09);
        assert_eq!(header.compression(), CompressionMethod::Lzo);
        assert!(header.flags().is_virtual);
    }

    #[test]
    fn test_find_signatures() {
        let mut data = vec![0u8; 64];
        data[3..7].copy_from_slice(&STARTUP_SIGNATURE);
        data[40..44].copy_from_slice(&STARTUP_SIGNATURE);
        assert_eq!(find_signatures(&data), vec![3, 40]);
        assert!(find_signatures(&[0u8; 3]).is_empty());
    }
}
