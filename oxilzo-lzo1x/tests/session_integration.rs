//! Integration tests for the compression session.

use oxilzo_core::OxiLzoError;
use oxilzo_lzo1x::{Compressor, END_OF_STREAM, parse_flags, worst_case_bound};

/// Deterministic pseudo-random bytes.
fn lcg_bytes(size: usize, mut seed: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    for _ in 0..size {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        data.push((seed >> 32) as u8);
    }
    data
}

fn samples() -> Vec<Vec<u8>> {
    let mut text = Vec::new();
    while text.len() < 20_000 {
        text.extend_from_slice(b"The quick brown fox jumps over the lazy dog. ");
    }

    let mut mixed = lcg_bytes(8192, 7);
    mixed.extend(std::iter::repeat_n(0u8, 8192));
    mixed.extend_from_slice(&text[..8192]);
    mixed.extend(lcg_bytes(8192, 11));

    vec![
        Vec::new(),
        vec![0x5A],
        b"abc".to_vec(),
        vec![0u8; 1000],
        lcg_bytes(64, 1),
        lcg_bytes(65536, 2),
        text,
        mixed,
    ]
}

fn roundtrip(session: &Compressor, data: &[u8]) {
    let n = data.len() as u32;
    let packed = session.compress(data, n).unwrap();
    assert!(
        packed.as_bytes().len() <= worst_case_bound(data.len()),
        "level {} produced {} bytes for {} input bytes",
        session.level(),
        packed.len(),
        data.len()
    );
    assert!(packed.as_bytes().ends_with(&END_OF_STREAM));

    let unpacked = session.decompress(packed.as_bytes(), packed.len()).unwrap();
    assert_eq!(unpacked, data, "level {}", session.level());
}

#[test]
fn test_zeros_compress_well() {
    let session = Compressor::with_config(1024, 9).unwrap();
    let data = vec![0u8; 1000];
    let packed = session.compress(&data, 1000).unwrap();
    assert!(packed.len() < 1000);
    assert!(packed.len() < 32, "zeros packed to {} bytes", packed.len());

    let unpacked = session.decompress(packed.as_bytes(), packed.len()).unwrap();
    assert_eq!(unpacked, data);
}

#[test]
fn test_random_block_roundtrip() {
    let session = Compressor::with_config(64, 9).unwrap();
    let data = lcg_bytes(64, 0xDEAD_BEEF);
    let packed = session.compress(&data, 64).unwrap();
    assert!(packed.as_bytes().len() <= worst_case_bound(64));

    let unpacked = session.decompress(packed.as_bytes(), packed.len()).unwrap();
    assert_eq!(unpacked, data);
}

#[test]
fn test_exhaustive_and_fast_levels() {
    for data in samples() {
        let block_size = data.len() as u32;
        roundtrip(&Compressor::with_config(block_size, 9).unwrap(), &data);
        roundtrip(&Compressor::with_config(block_size, 1).unwrap(), &data);
    }
}

#[test]
fn test_arbitrary_levels_never_fail() {
    let data = samples().pop().unwrap_or_default();
    for level in [i32::MIN, -1, 0, 2, 5, 8, 10, 99, i32::MAX] {
        let session = Compressor::with_config(data.len() as u32, level).unwrap();
        roundtrip(&session, &data);
    }
}

#[test]
fn test_exhaustive_not_worse_on_text() {
    let mut text = Vec::new();
    while text.len() < 30_000 {
        text.extend_from_slice(b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. ");
    }
    let fast = Compressor::with_config(30_000, 1)
        .unwrap()
        .compress(&text, text.len() as u32)
        .unwrap();
    let best = Compressor::with_config(30_000, 9)
        .unwrap()
        .compress(&text, text.len() as u32)
        .unwrap();
    assert!(best.len() <= fast.len() + 8);
}

#[test]
fn test_optimize_genuine_output() {
    for level in [1, 9] {
        for data in samples() {
            let session = Compressor::with_config(data.len() as u32, level).unwrap();
            let packed = session.compress(&data, data.len() as u32).unwrap();
            let mut scratch = vec![0u8; data.len()];
            session.optimize(packed.as_bytes(), &mut scratch).unwrap();
            assert_eq!(scratch, data);
        }
    }
}

#[test]
fn test_optimize_leaves_input_unchanged() {
    let session = Compressor::with_config(4096, 9).unwrap();
    let data = b"verify verify verify verify".repeat(10);
    let packed = session.compress(&data, data.len() as u32).unwrap();
    let before = packed.clone();
    let mut scratch = vec![0u8; data.len()];
    session.optimize(packed.as_bytes(), &mut scratch).unwrap();
    assert_eq!(packed, before);
}

#[test]
fn test_empty_input() {
    let session = Compressor::new().unwrap();
    let packed = session.compress(&[], 0).unwrap();
    assert_eq!(packed.as_bytes(), END_OF_STREAM);

    assert!(matches!(
        session.decompress(&[], 0),
        Err(OxiLzoError::InputOverrun { .. })
    ));
    assert!(session.optimize(&[], &mut []).is_err());
    assert!(session.optimize(packed.as_bytes(), &mut []).is_ok());
}

#[test]
fn test_corrupted_block_is_ordinary_error() {
    let session = Compressor::with_config(8192, 9).unwrap();
    let data = lcg_bytes(4096, 3);
    let packed = session.compress(&data, 4096).unwrap().into_vec();

    let truncated = &packed[..packed.len() - 2];
    let err = session
        .decompress(truncated, truncated.len() as u32)
        .unwrap_err();
    assert!(!err.is_fatal());

    let mut trailing = packed.clone();
    trailing.push(0);
    assert!(matches!(
        session.decompress(&trailing, trailing.len() as u32),
        Err(OxiLzoError::InputNotConsumed { remaining: 1 })
    ));
}

#[test]
fn test_decompress_grows_past_block_size() {
    let session = Compressor::with_config(16, 9).unwrap();
    let data = vec![7u8; 100_000];
    let packed = session.compress(&data, data.len() as u32).unwrap();
    let unpacked = session.decompress(packed.as_bytes(), packed.len()).unwrap();
    assert_eq!(unpacked.len(), data.len());
}

#[test]
fn test_decompress_into_small_buffer() {
    let session = Compressor::with_config(1024, 9).unwrap();
    let data = vec![1u8; 1024];
    let packed = session.compress(&data, 1024).unwrap();

    let mut small = vec![0u8; 512];
    assert!(matches!(
        session.decompress_into(packed.as_bytes(), &mut small),
        Err(OxiLzoError::OutputOverrun { .. })
    ));

    let mut exact = vec![0u8; 1024];
    assert_eq!(
        session.decompress_into(packed.as_bytes(), &mut exact).unwrap(),
        1024
    );
    assert_eq!(exact, data);
}

#[test]
fn test_flags_all_bytes() {
    for byte in 0..=255u8 {
        let flags = parse_flags(byte);
        assert_eq!(flags.is_virtual, byte & 0x01 != 0);
        assert_eq!(flags.big_endian, byte & 0x02 != 0);
        assert_eq!(flags.compression, (byte >> 2) & 0x0F);
    }
}

#[test]
fn test_sessions_shared_across_threads() {
    let session = Compressor::with_config(4096, 9).unwrap();
    std::thread::scope(|s| {
        for seed in 0..4u64 {
            let session = &session;
            s.spawn(move || {
                let data = lcg_bytes(4096, seed);
                roundtrip(session, &data);
            });
        }
    });
}
