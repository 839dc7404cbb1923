//! Error types for OxiLZO operations.
//!
//! A single error enum covers the codec (LZO1X stream errors and the
//! internal-consistency check around compression), session initialization,
//! and the IFS container layer.

use std::io;
use thiserror::Error;

/// Status codes reported by the reference LZO library.
///
/// Used to give codec errors a stable numeric identity for diagnostics and
/// for callers that still speak the old status-code protocol.
pub mod status {
    /// Success.
    pub const OK: i32 = 0;
    /// Generic error.
    pub const ERROR: i32 = -1;
    /// Allocation failure.
    pub const OUT_OF_MEMORY: i32 = -2;
    /// Input could not be compressed.
    pub const NOT_COMPRESSIBLE: i32 = -3;
    /// Decoder ran past the end of its input.
    pub const INPUT_OVERRUN: i32 = -4;
    /// Decoder ran past the end of its output buffer.
    pub const OUTPUT_OVERRUN: i32 = -5;
    /// Back-reference points before the start of the output.
    pub const LOOKBEHIND_OVERRUN: i32 = -6;
    /// Stream ended without an end-of-stream marker.
    pub const EOF_NOT_FOUND: i32 = -7;
    /// End-of-stream marker found before the input was exhausted.
    pub const INPUT_NOT_CONSUMED: i32 = -8;
}

/// The main error type for OxiLZO operations.
#[derive(Debug, Error)]
pub enum OxiLzoError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Codec self-check failed during initialization.
    #[error("Codec initialization failed: {message}")]
    InitFailed {
        /// Description of the failed check.
        message: String,
    },

    /// The compressor produced output that violates its own contract.
    ///
    /// This never happens with a correct primitive and is reported
    /// separately from ordinary failures.
    #[error(
        "Internal error - compression failed: status {status}, produced {produced} bytes, bound {bound}"
    )]
    Internal {
        /// Status reported by the primitive.
        status: i32,
        /// Number of bytes produced.
        produced: usize,
        /// Worst-case bound for the input.
        bound: usize,
    },

    /// Compressed input ended in the middle of an instruction.
    #[error("Input overrun at offset {offset}")]
    InputOverrun {
        /// Input offset where more bytes were needed.
        offset: u64,
    },

    /// Decompressed output does not fit the destination.
    #[error("Output overrun: need {needed} bytes, have {available}")]
    OutputOverrun {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// Back-reference reaches before the start of the output.
    #[error("Lookbehind overrun: distance {distance} exceeds output size {available}")]
    LookbehindOverrun {
        /// The invalid distance value.
        distance: usize,
        /// Bytes of output produced so far.
        available: usize,
    },

    /// Stream ended without an end-of-stream marker.
    #[error("End-of-stream marker not found")]
    EofNotFound,

    /// End-of-stream marker reached with input left over.
    #[error("Input not consumed: {remaining} trailing bytes after end-of-stream marker")]
    InputNotConsumed {
        /// Number of unread bytes.
        remaining: usize,
    },

    /// Declared logical length exceeds the physical buffer.
    #[error("Invalid length: declared {declared} bytes, buffer holds {available}")]
    InvalidLength {
        /// Length declared by the caller.
        declared: usize,
        /// Physical buffer length.
        available: usize,
    },

    /// Invalid magic number in a header.
    #[error("Invalid magic number: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual magic bytes found.
        found: Vec<u8>,
    },

    /// Invalid header format.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// Unsupported compression method.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The compression method identifier.
        method: String,
    },

    /// A compressed block does not fit its length field.
    #[error("Compressed block too large: {size} bytes (max {max})")]
    BlockTooLarge {
        /// Compressed block size.
        size: usize,
        /// Largest size the container can record.
        max: usize,
    },
}

/// Result type alias for OxiLZO operations.
pub type Result<T> = std::result::Result<T, OxiLzoError>;

impl OxiLzoError {
    /// Create an initialization error.
    pub fn init_failed(message: impl Into<String>) -> Self {
        Self::InitFailed {
            message: message.into(),
        }
    }

    /// Create an internal-consistency error.
    pub fn internal(status: i32, produced: usize, bound: usize) -> Self {
        Self::Internal {
            status,
            produced,
            bound,
        }
    }

    /// Create an input overrun error.
    pub fn input_overrun(offset: usize) -> Self {
        Self::InputOverrun {
            offset: offset as u64,
        }
    }

    /// Create an output overrun error.
    pub fn output_overrun(needed: usize, available: usize) -> Self {
        Self::OutputOverrun { needed, available }
    }

    /// Create a lookbehind overrun error.
    pub fn lookbehind_overrun(distance: usize, available: usize) -> Self {
        Self::LookbehindOverrun {
            distance,
            available,
        }
    }

    /// Create an input-not-consumed error.
    pub fn input_not_consumed(remaining: usize) -> Self {
        Self::InputNotConsumed { remaining }
    }

    /// Create an invalid length error.
    pub fn invalid_length(declared: usize, available: usize) -> Self {
        Self::InvalidLength {
            declared,
            available,
        }
    }

    /// Create an invalid magic error.
    pub fn invalid_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create an unsupported method error.
    pub fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
        }
    }

    /// Create a block too large error.
    pub fn block_too_large(size: usize, max: usize) -> Self {
        Self::BlockTooLarge { size, max }
    }

    /// Whether this error signals a broken codec rather than bad input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Internal { .. } | Self::InitFailed { .. })
    }

    /// The equivalent LZO status code.
    pub fn status(&self) -> i32 {
        match self {
            Self::InputOverrun { .. } => status::INPUT_OVERRUN,
            Self::OutputOverrun { .. } => status::OUTPUT_OVERRUN,
            Self::LookbehindOverrun { .. } => status::LOOKBEHIND_OVERRUN,
            Self::EofNotFound => status::EOF_NOT_FOUND,
            Self::InputNotConsumed { .. } => status::INPUT_NOT_CONSUMED,
            _ => status::ERROR,
        }
    }
}
