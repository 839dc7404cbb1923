//! Pure Rust LZO1X block compression.
//!
//! LZO1X is a byte-oriented LZ77 format built for very fast decompression.
//! This crate provides:
//!
//! - A fast single-pass encoder (any level other than 9)
//! - An exhaustive hash-chain encoder with lazy matching (level 9)
//! - A bounds-checked decoder that rejects malformed streams
//! - Block verification ([`optimize`])
//! - The one-byte flag header ([`FlagHeader`])
//! - The [`Compressor`] session tying these together
//!
//! Every encoded block fits in [`worst_case_bound`] of its input and ends
//! with the three-byte [`END_OF_STREAM`] marker.
//!
//! # Example
//!
//! ```
//! use oxilzo_core::CompressionMode;
//! use oxilzo_lzo1x::{compress, decompress, worst_case_bound};
//!
//! let data = b"Hello, World! Hello, World! Hello, World!";
//! let packed = compress(data, CompressionMode::Exhaustive);
//! assert!(packed.len() <= worst_case_bound(data.len()));
//!
//! let unpacked = decompress(&packed, data.len()).unwrap();
//! assert_eq!(unpacked, data);
//! ```

mod block;
mod bound;
mod decode;
mod encode;
mod exhaustive;
pub mod flags;
mod optimize;
mod session;

pub use bound::{WorkMem, work_mem_size, worst_case_bound};
pub use decode::{decompress, decompress_into};
pub use encode::END_OF_STREAM;
pub use flags::{CompressionMethod, FlagHeader, parse_flags};
pub use optimize::optimize;
pub use session::{CompressedBlock, Compressor, ensure_initialized};

use block::FastEncoder;
use exhaustive::ExhaustiveEncoder;
use oxilzo_core::CompressionMode;

/// Compress `input` into a complete LZO1X block.
///
/// Allocates working memory for `mode` for the duration of the call.
pub fn compress(input: &[u8], mode: CompressionMode) -> Vec<u8> {
    let mut work_mem = WorkMem::new(mode);
    compress_with_work_mem(input, &mut work_mem)
}

/// Compress `input` reusing caller-owned working memory.
///
/// The encoder is chosen by the mode `work_mem` was created for.
pub fn compress_with_work_mem(input: &[u8], work_mem: &mut WorkMem) -> Vec<u8> {
    let mode = work_mem.mode();
    let tables = work_mem.reset();
    match mode {
        CompressionMode::Fast => FastEncoder::new(input, tables).encode(),
        CompressionMode::Exhaustive => ExhaustiveEncoder::new(input, tables).encode(),
    }
}
