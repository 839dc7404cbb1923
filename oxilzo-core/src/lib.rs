//! # OxiLZO Core
//!
//! Core components for the OxiLZO block compression library.
//!
//! - [`error`]: Error type shared by the codec, the session, and containers
//! - [`traits`]: Compression levels/modes and the [`BlockCodec`] trait
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Tools                                               │
//! │     oxilzo CLI                                          │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Container                                           │
//! │     QNX IFS startup header, checksums, block stream     │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Codec                                               │
//! │     LZO1X encoders/decoder, Compressor session, flags   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L0: Core (this crate)                                   │
//! │     Error, CompressionLevel, BlockCodec                 │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxilzo_core::{CompressionLevel, CompressionMode};
//!
//! let level = CompressionLevel::new(9);
//! assert_eq!(level.mode(), CompressionMode::Exhaustive);
//! assert_eq!(CompressionLevel::new(3).mode(), CompressionMode::Fast);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod traits;

// Re-exports for convenience
pub use error::{OxiLzoError, Result};
pub use traits::{BlockCodec, CompressionLevel, CompressionMode};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{OxiLzoError, Result};
    pub use crate::traits::{BlockCodec, CompressionLevel, CompressionMode};
}
