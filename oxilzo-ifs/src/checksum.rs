//! IFS checksums.
//!
//! A region is valid when the wrapping sum of its 32-bit words is zero. The
//! last word of each region holds the value that makes it so.
//!
//! The image checksum belongs to the uncompressed image filesystem. For an
//! LZO image it is checked on the decoded block stream; its stored word
//! travels inside the compressed payload.

use crate::header::{Endian, StartupHeader};
use crate::image::{decode_block_stream, payload_capacity};
use oxilzo_core::error::{OxiLzoError, Result};
use oxilzo_lzo1x::CompressionMethod;

/// Wrapping sum of the 32-bit words of `bytes`.
///
/// A trailing partial word is ignored.
pub fn word_sum(bytes: &[u8], big_endian: bool) -> u32 {
    let endian = Endian::from_big(big_endian);
    let chunks = bytes.chunks_exact(4);
    if !chunks.remainder().is_empty() {
        tracing::warn!(
            len = bytes.len(),
            ignored = chunks.remainder().len(),
            "checksum region is not a whole number of words"
        );
    }
    chunks.fold(0u32, |sum, word| sum.wrapping_add(endian.read_u32(word, 0)))
}

/// State of one checksummed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionChecksum {
    /// Checksum word stored at the end of the region.
    pub stored: u32,
    /// Checksum word that would make the region sum to zero.
    pub expected: u32,
}

impl RegionChecksum {
    fn of(region: &[u8], endian: Endian) -> Self {
        let body = region.len().saturating_sub(4) & !3;
        let stored = if region.len() >= 4 {
            endian.read_u32(region, body)
        } else {
            0
        };
        let sum = word_sum(&region[..body], endian == Endian::Big);
        Self {
            stored,
            expected: sum.wrapping_neg(),
        }
    }

    /// Whether the stored checksum is correct.
    pub fn is_valid(&self) -> bool {
        self.stored == self.expected
    }
}

/// Checksums of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumReport {
    /// Startup region `[0, startup_size)`.
    pub startup: RegionChecksum,
    /// Image filesystem region, decoded first for LZO images; `None` for
    /// methods this crate cannot decode.
    pub image: Option<RegionChecksum>,
}

impl ChecksumReport {
    /// Whether every checked region is valid.
    pub fn is_valid(&self) -> bool {
        self.startup.is_valid() && self.image.is_none_or(|image| image.is_valid())
    }
}

fn region<'a>(image: &'a [u8], range: std::ops::Range<usize>, what: &str) -> Result<&'a [u8]> {
    if range.end > image.len() || range.len() < 4 {
        return Err(OxiLzoError::invalid_header(format!(
            "{what} region {}..{} does not fit a {} byte image",
            range.start,
            range.end,
            image.len()
        )));
    }
    Ok(&image[range])
}

/// Verify the checksums of an image.
pub fn verify_checksums(image: &[u8]) -> Result<ChecksumReport> {
    let header = StartupHeader::parse(image)?;
    let endian = header.endian();

    let startup = RegionChecksum::of(region(image, header.startup_range(), "startup")?, endian);
    let image = match header.compression() {
        CompressionMethod::None => Some(RegionChecksum::of(
            region(image, header.imagefs_range(), "image")?,
            endian,
        )),
        CompressionMethod::Lzo => {
            let start = header.startup_range().end;
            let mut payload = Vec::with_capacity(payload_capacity(&header, image.len()));
            decode_block_stream(image, start, &mut payload, |_, _| {})?;
            Some(RegionChecksum::of(&payload, endian))
        }
        other => {
            tracing::debug!(method = %other, "image checksum not checked");
            None
        }
    };

    Ok(ChecksumReport { startup, image })
}

/// Rewrite the startup checksum so the startup region sums to zero.
///
/// Returns the checksum word written.
pub fn fix_startup_checksum(image: &mut [u8]) -> Result<u32> {
    let header = StartupHeader::parse(image)?;
    fix_region(image, header.startup_range(), header.endian(), "startup")
}

/// Rewrite the image checksum of an uncompressed image.
///
/// Returns the checksum word written. A compressed image is rejected: its
/// checksum word sits inside the compressed payload.
pub fn fix_image_checksum(image: &mut [u8]) -> Result<u32> {
    let header = StartupHeader::parse(image)?;
    let method = header.compression();
    if method != CompressionMethod::None {
        return Err(OxiLzoError::invalid_header(format!(
            "image checksum of a {method} image cannot be rewritten in place"
        )));
    }
    fix_region(image, header.imagefs_range(), header.endian(), "image")
}

fn fix_region(
    image: &mut [u8],
    range: std::ops::Range<usize>,
    endian: Endian,
    what: &str,
) -> Result<u32> {
    let start = range.start;
    let checksum = RegionChecksum::of(region(image, range.clone(), what)?, endian);
    if !checksum.is_valid() {
        let at = start + (range.len() - 4) / 4 * 4;
        endian.write_u32(image, at, checksum.expected);
        tracing::debug!(
            region = what,
            stored = checksum.stored,
            written = checksum.expected,
            "checksum rewritten"
        );
    }
    Ok(checksum.expected)
}
