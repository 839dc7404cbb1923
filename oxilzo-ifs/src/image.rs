//! IFS image compression and decompression.
//!
//! A compressed image keeps the startup region verbatim and replaces the
//! image filesystem with a sequence of LZO1X blocks:
//!
//! ```text
//! ┌────────────────┬──────────┬─────────┬──────────┬─────────┬─────┬───────┐
//! │ startup region │ len (BE) │ block 0 │ len (BE) │ block 1 │ ... │ 00 00 │
//! └────────────────┴──────────┴─────────┴──────────┴─────────┴─────┴───────┘
//! ```
//!
//! flags1 records the method and stored_size the total stored length.

use crate::checksum::fix_startup_checksum;
use crate::header::StartupHeader;
use oxilzo_core::BlockCodec;
use oxilzo_core::error::{OxiLzoError, Result};
use oxilzo_lzo1x::{CompressionMethod, Compressor};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Size of a block length field.
const LENGTH_FIELD: usize = 2;

/// Largest compressed block a length field can record.
pub const MAX_STORED_BLOCK: usize = u16::MAX as usize;

/// Image compression options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    /// Uncompressed bytes per block.
    pub block_size: u32,
    /// Compression level (9 = exhaustive).
    pub level: i32,
    /// Verify every block after compressing it.
    pub optimize: bool,
}

impl ImageOptions {
    /// What QNX's own image tools use: 64 KiB blocks at level 9.
    pub const QNX_DEFAULT: Self = Self {
        block_size: 65536,
        level: 9,
        optimize: false,
    };

    /// Set block size.
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set compression level.
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Enable or disable block verification.
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self::QNX_DEFAULT
    }
}

/// Reject images whose method this crate cannot handle.
fn check_method(method: CompressionMethod) -> Result<()> {
    match method {
        CompressionMethod::None | CompressionMethod::Lzo => Ok(()),
        other => Err(OxiLzoError::unsupported_method(other.to_string())),
    }
}

fn checked_range(image: &[u8], range: std::ops::Range<usize>, what: &str) -> Result<()> {
    if range.end > image.len() {
        return Err(OxiLzoError::invalid_header(format!(
            "{what} ends at {} but the image is {} bytes",
            range.end,
            image.len()
        )));
    }
    Ok(())
}

fn stored_size(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| OxiLzoError::invalid_length(len, u32::MAX as usize))
}

/// Compress one block, optionally verifying it.
fn compress_chunk(session: &Compressor, chunk: &[u8], verify: bool) -> Result<Vec<u8>> {
    let packed = session.compress_block(chunk)?;
    if packed.len() > MAX_STORED_BLOCK {
        return Err(OxiLzoError::block_too_large(packed.len(), MAX_STORED_BLOCK));
    }
    if verify {
        let mut scratch = vec![0u8; chunk.len()];
        if let Err(e) = session.optimize(&packed, &mut scratch) {
            tracing::warn!(error = %e, "block verification failed");
        }
    }
    Ok(packed)
}

#[cfg(not(feature = "parallel"))]
fn compress_chunks(
    session: &Compressor,
    chunks: &[&[u8]],
    verify: bool,
    progress: &mut dyn FnMut(usize, usize),
) -> Result<Vec<Vec<u8>>> {
    let total = chunks.len();
    let mut blocks = Vec::with_capacity(total);
    for (i, chunk) in chunks.iter().enumerate() {
        blocks.push(compress_chunk(session, chunk, verify)?);
        progress(i + 1, total);
    }
    Ok(blocks)
}

#[cfg(feature = "parallel")]
fn compress_chunks(
    session: &Compressor,
    chunks: &[&[u8]],
    verify: bool,
    progress: &mut dyn FnMut(usize, usize),
) -> Result<Vec<Vec<u8>>> {
    let blocks: Vec<Result<Vec<u8>>> = chunks
        .par_iter()
        .map(|chunk| compress_chunk(session, chunk, verify))
        .collect();
    progress(chunks.len(), chunks.len());
    blocks.into_iter().collect()
}

/// Compress the image filesystem of an uncompressed IFS image.
///
/// `progress` is called with the number of blocks done and the total.
pub fn compress_image(
    image: &[u8],
    options: &ImageOptions,
    mut progress: impl FnMut(usize, usize),
) -> Result<Vec<u8>> {
    let mut header = StartupHeader::parse(image)?;
    let method = header.compression();
    check_method(method)?;
    if method == CompressionMethod::Lzo {
        return Err(OxiLzoError::invalid_header("image is already compressed"));
    }

    let startup = header.startup_range();
    let imagefs = header.imagefs_range();
    checked_range(image, startup.clone(), "startup region")?;
    checked_range(image, imagefs.clone(), "image filesystem")?;
    if imagefs.end < image.len() {
        tracing::warn!(
            trailing = image.len() - imagefs.end,
            "bytes after the image filesystem are not stored"
        );
    }

    let session = Compressor::with_config(options.block_size, options.level)?;
    let block_size = (options.block_size as usize).max(1);
    let chunks: Vec<&[u8]> = image[imagefs].chunks(block_size).collect();
    tracing::debug!(
        blocks = chunks.len(),
        block_size,
        level = options.level,
        "compressing image filesystem"
    );
    let blocks = compress_chunks(&session, &chunks, options.optimize, &mut progress)?;

    let packed_len: usize = blocks.iter().map(|b| LENGTH_FIELD + b.len()).sum();
    let mut output = Vec::with_capacity(startup.end + packed_len + LENGTH_FIELD);
    output.extend_from_slice(&image[startup]);
    for block in &blocks {
        // Length checked against MAX_STORED_BLOCK in compress_chunk.
        output.extend_from_slice(&(block.len() as u16).to_be_bytes());
        output.extend_from_slice(block);
    }
    output.extend_from_slice(&0u16.to_be_bytes());

    header.set_compression(CompressionMethod::Lzo);
    header.stored_size = stored_size(output.len())?;
    header.write_to(&mut output)?;
    fix_startup_checksum(&mut output)?;

    tracing::debug!(
        input = image.len(),
        output = output.len(),
        "image compressed"
    );
    Ok(output)
}

/// Allocation hint for a decoded image filesystem.
///
/// `imagefs_size` comes straight from the header, so it is capped by what
/// the stored bytes could plausibly expand to.
pub(crate) fn payload_capacity(header: &StartupHeader, stored_len: usize) -> usize {
    (header.imagefs_size as usize).min(stored_len.saturating_mul(4))
}

/// Decode the block stream starting at `start`, appending to `out`.
///
/// Returns the number of blocks decoded.
pub(crate) fn decode_block_stream(
    image: &[u8],
    start: usize,
    out: &mut Vec<u8>,
    mut progress: impl FnMut(usize, usize),
) -> Result<usize> {
    let session = Compressor::with_config(ImageOptions::QNX_DEFAULT.block_size, 9)?;
    let total = image.len();
    let mut pos = start;
    let mut blocks = 0usize;
    loop {
        if pos + LENGTH_FIELD > total {
            return Err(OxiLzoError::input_overrun(pos));
        }
        let len = u16::from_be_bytes([image[pos], image[pos + 1]]) as usize;
        pos += LENGTH_FIELD;
        if len == 0 {
            break;
        }
        if pos + len > total {
            return Err(OxiLzoError::input_overrun(pos));
        }
        out.extend_from_slice(&session.decompress_block(&image[pos..pos + len])?);
        pos += len;
        blocks += 1;
        progress(pos, total);
    }
    progress(pos, total);
    Ok(blocks)
}

/// Decompress an LZO-compressed IFS image.
///
/// `progress` is called with the number of compressed bytes consumed and
/// the total compressed length.
pub fn decompress_image(image: &[u8], progress: impl FnMut(usize, usize)) -> Result<Vec<u8>> {
    let mut header = StartupHeader::parse(image)?;
    let method = header.compression();
    check_method(method)?;
    if method == CompressionMethod::None {
        return Err(OxiLzoError::invalid_header("image is not compressed"));
    }

    let startup = header.startup_range();
    checked_range(image, startup.clone(), "startup region")?;

    let mut output = Vec::with_capacity(startup.end + payload_capacity(&header, image.len()));
    output.extend_from_slice(&image[startup.clone()]);
    let blocks = decode_block_stream(image, startup.end, &mut output, progress)?;

    let produced = output.len() - startup.end;
    if produced != header.imagefs_size as usize {
        tracing::warn!(
            expected = header.imagefs_size,
            produced,
            "decompressed size differs from the header"
        );
    }
    tracing::debug!(blocks, produced, "image decompressed");

    header.set_compression(CompressionMethod::None);
    header.stored_size = stored_size(output.len())?;
    header.write_to(&mut output)?;
    fix_startup_checksum(&mut output)?;
    Ok(output)
}
