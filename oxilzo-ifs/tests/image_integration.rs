//! End-to-end tests for IFS image handling.

use oxilzo_ifs::{
    ImageOptions, SegmentKind, StartupHeader, compress_image, decompress_image,
    fix_image_checksum, fix_startup_checksum, merge, split, verify_checksums,
};
use oxilzo_lzo1x::CompressionMethod;

const STARTUP_SIZE: usize = 0x800;

/// Build an uncompressed image with valid checksums.
fn build_image(imagefs_size: usize, big_endian: bool, seed: u64) -> Vec<u8> {
    let mut data = vec![0u8; STARTUP_SIZE + imagefs_size];
    let mut state = seed;
    for (i, byte) in data.iter_mut().enumerate().skip(0x100) {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        // Mostly structured with some noise, like an executable
        *byte = if i % 16 < 12 {
            (i % 251) as u8
        } else {
            (state >> 56) as u8
        };
    }

    StartupHeader {
        version: 1,
        flags1: 0x01 | if big_endian { 0x02 } else { 0 },
        header_size: 0x100,
        machine: 0x28,
        startup_vaddr: 0x0010_0200,
        image_paddr: 0x0010_0000,
        ram_paddr: 0x0010_0000,
        ram_size: (STARTUP_SIZE + imagefs_size) as u32,
        startup_size: STARTUP_SIZE as u32,
        stored_size: (STARTUP_SIZE + imagefs_size) as u32,
        imagefs_paddr: 0x0010_0800,
        imagefs_size: imagefs_size as u32,
        ..StartupHeader::default()
    }
    .write_to(&mut data)
    .unwrap();

    fix_startup_checksum(&mut data).unwrap();
    fix_image_checksum(&mut data).unwrap();
    data
}

#[test]
fn test_compress_decompress_restores_image() {
    for big_endian in [false, true] {
        let original = build_image(150_000, big_endian, 42);
        assert!(verify_checksums(&original).unwrap().is_valid());

        let packed = compress_image(&original, &ImageOptions::default(), |_, _| {}).unwrap();
        let header = StartupHeader::parse(&packed).unwrap();
        assert_eq!(header.compression(), CompressionMethod::Lzo);
        assert!(header.flags().is_virtual);
        assert_eq!(header.is_big_endian(), big_endian);
        assert_eq!(header.stored_size as usize, packed.len());
        assert!(verify_checksums(&packed).unwrap().is_valid());

        let restored = decompress_image(&packed, |_, _| {}).unwrap();
        assert_eq!(restored, original);
    }
}

#[test]
fn test_flag_byte_flips() {
    let original = build_image(20_000, false, 1);
    let packed = compress_image(&original, &ImageOptions::default(), |_, _| {}).unwrap();
    assert_eq!(original[6], 0x01);
    assert_eq!(packed[6], 0x09);

    let restored = decompress_image(&packed, |_, _| {}).unwrap();
    assert_eq!(restored[6], 0x01);
}

#[test]
fn test_levels_and_block_sizes() {
    let original = build_image(70_000, false, 9);
    for (block_size, level) in [(4096, 1), (16384, 9), (65536, 3)] {
        let options = ImageOptions::QNX_DEFAULT
            .with_block_size(block_size)
            .with_level(level)
            .with_optimize(true);
        let packed = compress_image(&original, &options, |_, _| {}).unwrap();
        let restored = decompress_image(&packed, |_, _| {}).unwrap();
        assert_eq!(restored, original, "block {block_size} level {level}");
    }
}

#[test]
fn test_progress_reaches_total() {
    let original = build_image(300_000, false, 5);
    let mut last = (0, 0);
    compress_image(&original, &ImageOptions::default(), |done, total| {
        last = (done, total);
    })
    .unwrap();
    assert_eq!(last.0, last.1);
    assert_eq!(last.1, 300_000usize.div_ceil(65536));
}

#[test]
fn test_split_merge_dump() {
    let first = build_image(10_000, false, 3);
    let second = compress_image(
        &build_image(30_000, false, 4),
        &ImageOptions::default(),
        |_, _| {},
    )
    .unwrap();
    let parts = vec![vec![0xFFu8; 512], first.clone(), vec![0xFF; 64], second.clone()];
    let dump = merge(&parts);

    let segments = split(&dump).unwrap();
    let kinds: Vec<SegmentKind> = segments.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        [
            SegmentKind::Preamble,
            SegmentKind::Image,
            SegmentKind::Gap,
            SegmentKind::Image
        ]
    );
    assert_eq!(segments[1].bytes(&dump), first.as_slice());
    assert_eq!(segments[3].bytes(&dump), second.as_slice());

    let pieces: Vec<&[u8]> = segments.iter().map(|s| s.bytes(&dump)).collect();
    assert_eq!(merge(&pieces), dump);
}
