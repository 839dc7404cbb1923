//! Core traits for block compression.
//!
//! Containers such as the IFS image layer only need to turn one block of
//! bytes into another; they do so through [`BlockCodec`] so the codec
//! session can be configured independently of the container.

use crate::error::Result;

/// Compression effort selected by a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionMode {
    /// Single-pass compression with a small hash table.
    Fast,
    /// Exhaustive match search (slower, better ratio).
    #[default]
    Exhaustive,
}

impl CompressionMode {
    /// The only level that selects exhaustive mode.
    pub const EXHAUSTIVE_LEVEL: i32 = 9;

    /// Map a level to a mode.
    ///
    /// Every value other than 9 selects fast mode; no level is rejected.
    pub fn from_level(level: i32) -> Self {
        if level == Self::EXHAUSTIVE_LEVEL {
            Self::Exhaustive
        } else {
            Self::Fast
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Exhaustive => "exhaustive",
        }
    }
}

impl std::fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Compression level.
///
/// Any integer is a valid level; see [`CompressionMode::from_level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressionLevel(i32);

impl CompressionLevel {
    /// Fastest compression.
    pub const FAST: Self = Self(1);
    /// Best compression (slowest).
    pub const BEST: Self = Self(CompressionMode::EXHAUSTIVE_LEVEL);

    /// Create a compression level from any integer.
    pub fn new(level: i32) -> Self {
        Self(level)
    }

    /// Get the level value.
    pub fn level(&self) -> i32 {
        self.0
    }

    /// The mode this level selects.
    pub fn mode(&self) -> CompressionMode {
        CompressionMode::from_level(self.0)
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::BEST
    }
}

impl From<i32> for CompressionLevel {
    fn from(level: i32) -> Self {
        Self(level)
    }
}

/// A one-shot block codec.
///
/// Implementations allocate their working memory per call, so a shared
/// reference can be used from several threads at once.
pub trait BlockCodec {
    /// Compress one block.
    fn compress_block(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Decompress one block.
    fn decompress_block(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Largest compressed size for an input of `input_len` bytes.
    fn max_compressed_len(&self, input_len: usize) -> usize;
}
