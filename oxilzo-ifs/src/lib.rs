//! QNX IFS boot image support.
//!
//! An IFS ("image filesystem") image starts with a 256-byte startup header,
//! followed by the rest of the startup code and the image filesystem. Boot
//! loaders accept the image filesystem either raw or as a stream of LZO1X
//! blocks; this crate converts between the two and keeps the checksums the
//! loader verifies intact.
//!
//! # Features
//!
//! - Startup header parsing in either byte order ([`StartupHeader`])
//! - Checksum verification and repair ([`verify_checksums`])
//! - Image compression and decompression ([`compress_image`], [`decompress_image`])
//! - Splitting a flash dump into images and merging it back ([`split`], [`merge`])
//!
//! With the `parallel` feature, image blocks are compressed with rayon.
//!
//! # Example
//!
//! ```
//! use oxilzo_ifs::{ImageOptions, StartupHeader, compress_image, decompress_image};
//!
//! let mut image = vec![0u8; 0x100 + 4096];
//! StartupHeader {
//!     startup_size: 0x100,
//!     stored_size: image.len() as u32,
//!     imagefs_size: 4096,
//!     ..StartupHeader::default()
//! }
//! .write_to(&mut image)
//! .unwrap();
//!
//! let packed = compress_image(&image, &ImageOptions::default(), |_, _| {}).unwrap();
//! let restored = decompress_image(&packed, |_, _| {}).unwrap();
//! assert_eq!(restored[0x100..], image[0x100..]);
//! ```

pub mod checksum;
pub mod header;
pub mod image;
pub mod split;

pub use checksum::{
    ChecksumReport, RegionChecksum, fix_image_checksum, fix_startup_checksum, verify_checksums,
    word_sum,
};
pub use header::{STARTUP_HEADER_SIZE, STARTUP_SIGNATURE, StartupHeader, find_signatures};
pub use image::{ImageOptions, MAX_STORED_BLOCK, compress_image, decompress_image};
pub use split::{Segment, SegmentKind, merge, part_index, split};
