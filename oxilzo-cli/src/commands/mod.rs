//! Command implementations for OxiLZO CLI.

pub mod checksum;
pub mod compress;
pub mod decompress;
pub mod flags;
pub mod info;
pub mod merge;
pub mod split;

pub use checksum::cmd_checksum;
pub use compress::{CompressOptions, cmd_compress};
pub use decompress::cmd_decompress;
pub use flags::cmd_flags;
pub use info::cmd_info;
pub use merge::cmd_merge;
pub use split::cmd_split;
