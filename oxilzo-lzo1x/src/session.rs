//! Block compression session.
//!
//! A [`Compressor`] carries the two parameters every operation needs, the
//! nominal block size and the compression level, and wraps the LZO1X
//! primitive with the buffer sizing and result validation rules callers
//! depend on:
//!
//! - compressed output never exceeds [`worst_case_bound`] of its input
//! - a primitive that breaks that contract is reported as an internal error
//! - decompression never returns partial output

use std::sync::OnceLock;

use crate::bound::{WorkMem, work_mem_size, worst_case_bound};
use crate::flags::{FlagHeader, parse_flags};
use crate::{decode, optimize};
use oxilzo_core::error::{OxiLzoError, Result, status};
use oxilzo_core::{BlockCodec, CompressionLevel, CompressionMode};

/// Sample used by the one-time codec self-check.
const SELF_CHECK_SAMPLE: &[u8] = b"OxiLZO self-check OxiLZO self-check OxiLZO self-check";

/// Result of the one-time self-check, shared by every session.
static INIT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Run the codec self-check once per process.
///
/// Safe to call from any thread any number of times; later calls return the
/// result of the first.
pub fn ensure_initialized() -> Result<()> {
    INIT.get_or_init(self_check)
        .clone()
        .map_err(OxiLzoError::init_failed)
}

fn self_check() -> std::result::Result<(), String> {
    for mode in [CompressionMode::Fast, CompressionMode::Exhaustive] {
        let packed = crate::compress(SELF_CHECK_SAMPLE, mode);
        if packed.len() > worst_case_bound(SELF_CHECK_SAMPLE.len()) {
            return Err(format!("{mode} encoder exceeded its bound"));
        }
        let unpacked = decode::decompress(&packed, SELF_CHECK_SAMPLE.len())
            .map_err(|e| format!("{mode} round trip failed: {e}"))?;
        if unpacked != SELF_CHECK_SAMPLE {
            return Err(format!("{mode} round trip mismatch"));
        }
    }
    tracing::debug!("LZO1X codec initialized");
    Ok(())
}

/// Output of [`Compressor::compress`]: exactly the produced bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompressedBlock {
    data: Vec<u8>,
}

impl CompressedBlock {
    /// Compressed length.
    pub fn len(&self) -> u32 {
        // Bounded by worst_case_bound of a u32 length, checked on creation.
        self.data.len() as u32
    }

    /// Whether the block holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The compressed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take ownership of the compressed bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<[u8]> for CompressedBlock {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<CompressedBlock> for Vec<u8> {
    fn from(block: CompressedBlock) -> Self {
        block.data
    }
}

/// LZO1X compression session.
///
/// # Example
///
/// ```
/// use oxilzo_lzo1x::Compressor;
///
/// let session = Compressor::with_config(1024, 9).unwrap();
/// let data = vec![0u8; 1000];
/// let packed = session.compress(&data, 1000).unwrap();
/// assert!(packed.len() < 1000);
///
/// let unpacked = session.decompress(packed.as_bytes(), packed.len()).unwrap();
/// assert_eq!(unpacked, data);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compressor {
    block_size: u32,
    level: i32,
}

impl Compressor {
    /// Default compression level (exhaustive).
    pub const DEFAULT_LEVEL: i32 = CompressionMode::EXHAUSTIVE_LEVEL;

    /// Create a session with block size 0 and level 9.
    pub fn new() -> Result<Self> {
        Self::with_config(0, Self::DEFAULT_LEVEL)
    }

    /// Create a session with explicit parameters.
    pub fn with_config(block_size: u32, level: i32) -> Result<Self> {
        ensure_initialized()?;
        Ok(Self { block_size, level })
    }

    /// Nominal uncompressed block size.
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Set the nominal uncompressed block size.
    pub fn set_block_size(&mut self, block_size: u32) {
        self.block_size = block_size;
    }

    /// Compression level.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Set the compression level. Any value is accepted.
    pub fn set_level(&mut self, level: i32) {
        self.level = level;
    }

    /// Builder-style block size.
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Builder-style level.
    pub fn with_level(mut self, level: impl Into<CompressionLevel>) -> Self {
        self.level = level.into().level();
        self
    }

    /// Encoder mode selected by the level.
    pub fn mode(&self) -> CompressionMode {
        CompressionMode::from_level(self.level)
    }

    /// Working memory one compress call allocates, in bytes.
    pub fn work_mem_size(&self) -> usize {
        work_mem_size(self.mode())
    }

    /// Compress the first `source_length` bytes of `source`.
    pub fn compress(&self, source: &[u8], source_length: u32) -> Result<CompressedBlock> {
        let n = source_length as usize;
        if n > source.len() {
            return Err(OxiLzoError::invalid_length(n, source.len()));
        }

        if source_length > self.block_size {
            tracing::warn!(
                block_size = self.block_size,
                source_length,
                "source longer than block size, sizing output from source"
            );
        }
        let capacity = worst_case_bound(self.block_size.max(source_length) as usize);

        let mut work_mem = WorkMem::new(self.mode());
        tracing::trace!(work_mem = work_mem.size_bytes(), "work memory allocated");
        let packed = crate::compress_with_work_mem(&source[..n], &mut work_mem);
        self.finish_block(packed, n, capacity)
    }

    /// Accept primitive output for an `input_len`-byte source.
    fn finish_block(
        &self,
        packed: Vec<u8>,
        input_len: usize,
        capacity: usize,
    ) -> Result<CompressedBlock> {
        let bound = worst_case_bound(input_len);
        if packed.len() > bound || packed.len() > capacity {
            tracing::error!(
                produced = packed.len(),
                bound,
                capacity,
                "compressor exceeded its worst-case bound"
            );
            return Err(OxiLzoError::internal(status::OK, packed.len(), bound));
        }

        tracing::debug!(
            input = input_len,
            output = packed.len(),
            mode = %self.mode(),
            "block compressed"
        );
        Ok(CompressedBlock { data: packed })
    }

    /// Decompress the first `source_length` bytes of `source`.
    ///
    /// The output grows until the end-of-stream marker is reached, up to
    /// `u32::MAX` bytes.
    pub fn decompress(&self, source: &[u8], source_length: u32) -> Result<Vec<u8>> {
        let n = source_length as usize;
        if n > source.len() {
            return Err(OxiLzoError::invalid_length(n, source.len()));
        }

        let capacity = worst_case_bound(self.block_size as usize);
        let data = decode::decompress_with_capacity(&source[..n], u32::MAX as usize, capacity)?;
        tracing::debug!(input = n, output = data.len(), "block decompressed");
        Ok(data)
    }

    /// Decompress into a caller buffer, returning the decoded length.
    pub fn decompress_into(&self, source: &[u8], dest: &mut [u8]) -> Result<usize> {
        decode::decompress_into(source, dest)
    }

    /// Verify a compressed block by decoding it into `unpacked`.
    pub fn optimize(&self, packed: &[u8], unpacked: &mut [u8]) -> Result<()> {
        optimize::optimize(packed, unpacked)
    }

    /// Decode a flag header byte.
    pub fn parse_flags(&self, byte: u8) -> FlagHeader {
        parse_flags(byte)
    }
}

impl BlockCodec for Compressor {
    fn compress_block(&self, input: &[u8]) -> Result<Vec<u8>> {
        let len = u32::try_from(input.len())
            .map_err(|_| OxiLzoError::invalid_length(input.len(), u32::MAX as usize))?;
        Ok(self.compress(input, len)?.into_vec())
    }

    fn decompress_block(&self, input: &[u8]) -> Result<Vec<u8>> {
        let len = u32::try_from(input.len())
            .map_err(|_| OxiLzoError::invalid_length(input.len(), u32::MAX as usize))?;
        self.decompress(input, len)
    }

    fn max_compressed_len(&self, input_len: usize) -> usize {
        worst_case_bound(input_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::END_OF_STREAM;

    #[test]
    fn test_defaults() {
        let session = Compressor::new().unwrap();
        assert_eq!(session.block_size(), 0);
        assert_eq!(session.level(), 9);
        assert_eq!(session.mode(), CompressionMode::Exhaustive);
    }

    #[test]
    fn test_init_is_idempotent() {
        assert!(ensure_initialized().is_ok());
        assert!(ensure_initialized().is_ok());
    }

    #[test]
    fn test_setters() {
        let mut session = Compressor::new().unwrap();
        session.set_block_size(4096);
        session.set_level(1);
        assert_eq!(session.block_size(), 4096);
        assert_eq!(session.mode(), CompressionMode::Fast);
        assert!(session.work_mem_size() < Compressor::new().unwrap().work_mem_size());
    }

    #[test]
    fn test_output_over_bound_is_fatal() {
        let session = Compressor::with_config(16, 9).unwrap();
        let capacity = worst_case_bound(16);

        let err = session
            .finish_block(vec![0u8; worst_case_bound(16) + 1], 16, capacity)
            .unwrap_err();
        assert!(matches!(
            err,
            OxiLzoError::Internal { bound, .. } if bound == worst_case_bound(16)
        ));
        assert!(err.is_fatal());

        // Within the bound of the real length but over the session capacity.
        let err = session
            .finish_block(vec![0u8; capacity + 1], 64, capacity)
            .unwrap_err();
        assert!(err.is_fatal());

        let block = session.finish_block(END_OF_STREAM.to_vec(), 0, capacity).unwrap();
        assert_eq!(block.as_bytes(), END_OF_STREAM);
    }

    #[test]
    fn test_source_length_beyond_buffer() {
        let session = Compressor::with_config(64, 9).unwrap();
        assert!(matches!(
            session.compress(b"abc", 4),
            Err(OxiLzoError::InvalidLength { declared: 4, available: 3 })
        ));
    }

    #[test]
    fn test_logical_length_prefix() {
        let session = Compressor::with_config(64, 1).unwrap();
        let packed = session.compress(b"abcdefgh", 3).unwrap();
        let unpacked = session.decompress(packed.as_bytes(), packed.len()).unwrap();
        assert_eq!(unpacked, b"abc");
    }

    #[test]
    fn test_empty_input() {
        let session = Compressor::with_config(0, 9).unwrap();
        let packed = session.compress(&[], 0).unwrap();
        assert_eq!(packed.as_bytes(), END_OF_STREAM);
        assert_eq!(packed.len(), 3);
        assert!(matches!(
            session.decompress(&[], 0),
            Err(OxiLzoError::InputOverrun { .. })
        ));
    }

    #[test]
    fn test_undersized_block_size() {
        let session = Compressor::with_config(16, 9).unwrap();
        let data: Vec<u8> = (0..=255u8).collect();
        let packed = session.compress(&data, 256).unwrap();
        let unpacked = session.decompress(packed.as_bytes(), packed.len()).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn test_block_codec() {
        let session = Compressor::with_config(1 << 16, 1).unwrap();
        let data = b"block codec block codec block codec".repeat(20);
        let packed = session.compress_block(&data).unwrap();
        assert!(packed.len() <= session.max_compressed_len(data.len()));
        assert_eq!(session.decompress_block(&packed).unwrap(), data);
    }

    #[test]
    fn test_parse_flags() {
        let session = Compressor::new().unwrap();
        let flags = session.parse_flags(0x0B);
        assert!(flags.is_virtual);
        assert!(flags.big_endian);
        assert_eq!(flags.compression, 2);
    }
}
