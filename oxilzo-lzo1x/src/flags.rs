//! One-byte flag header.
//!
//! Bit layout, least significant bit first:
//!
//! ```text
//!  7   6   5   4   3   2   1   0
//! ┌───────┬───────────────┬───┬───┐
//! │ resv  │  compression  │BE │ V │
//! └───────┴───────────────┴───┴───┘
//! ```
//!
//! - bit 0: virtual
//! - bit 1: big-endian
//! - bits 2..=5: compression method code
//! - bits 6..=7: reserved, ignored on parse

/// Virtual flag bit.
pub const VIRTUAL_BIT: u8 = 0x01;

/// Big-endian flag bit.
pub const BIG_ENDIAN_BIT: u8 = 0x02;

/// Position of the compression field.
pub const COMPRESSION_SHIFT: u32 = 2;

/// Compression field mask (after shifting).
pub const COMPRESSION_MASK: u8 = 0x0F;

/// Compression field mask in place.
pub const COMPRESSION_FIELD: u8 = COMPRESSION_MASK << COMPRESSION_SHIFT;

/// Compression method named by the flag header code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// Stored uncompressed.
    None,
    /// zlib/deflate.
    Zlib,
    /// LZO1X.
    Lzo,
    /// UCL (NRV2B).
    Ucl,
    /// Any other code, kept verbatim.
    Unknown(u8),
}

impl CompressionMethod {
    /// Map a 4-bit code to a method.
    pub const fn from_code(code: u8) -> Self {
        match code & COMPRESSION_MASK {
            0 => Self::None,
            1 => Self::Zlib,
            2 => Self::Lzo,
            3 => Self::Ucl,
            other => Self::Unknown(other),
        }
    }

    /// The 4-bit code.
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Zlib => 1,
            Self::Lzo => 2,
            Self::Ucl => 3,
            Self::Unknown(code) => code & COMPRESSION_MASK,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zlib => "zlib",
            Self::Lzo => "lzo",
            Self::Ucl => "ucl",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "unknown ({code})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Decoded flag header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlagHeader {
    /// Bit 0.
    pub is_virtual: bool,
    /// Bit 1: multi-byte fields are big-endian.
    pub big_endian: bool,
    /// Bits 2..=5, in 0..=15.
    pub compression: u8,
}

impl FlagHeader {
    /// Decode a flag byte. Every byte is valid.
    pub const fn parse(byte: u8) -> Self {
        Self {
            is_virtual: byte & VIRTUAL_BIT != 0,
            big_endian: byte & BIG_ENDIAN_BIT != 0,
            compression: (byte >> COMPRESSION_SHIFT) & COMPRESSION_MASK,
        }
    }

    /// Encode back to a byte with the reserved bits clear.
    pub const fn to_byte(self) -> u8 {
        let mut byte = (self.compression & COMPRESSION_MASK) << COMPRESSION_SHIFT;
        if self.is_virtual {
            byte |= VIRTUAL_BIT;
        }
        if self.big_endian {
            byte |= BIG_ENDIAN_BIT;
        }
        byte
    }

    /// The compression method named by the code.
    pub const fn method(self) -> CompressionMethod {
        CompressionMethod::from_code(self.compression)
    }

    /// Same header with another compression method.
    pub const fn with_compression(mut self, method: CompressionMethod) -> Self {
        self.compression = method.code();
        self
    }
}

impl From<u8> for FlagHeader {
    fn from(byte: u8) -> Self {
        Self::parse(byte)
    }
}

/// Decode a flag byte.
pub const fn parse_flags(byte: u8) -> FlagHeader {
    FlagHeader::parse(byte)
}

/// Rewrite the compression field of `byte`, preserving every other bit.
pub const fn with_compression(byte: u8, code: u8) -> u8 {
    (byte & !COMPRESSION_FIELD) | ((code & COMPRESSION_MASK) << COMPRESSION_SHIFT)
}
