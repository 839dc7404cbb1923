//! Flags command implementation.

use oxilzo_lzo1x::parse_flags;
use serde::Serialize;

/// JSON output for the flags command.
#[derive(Debug, Serialize)]
struct FlagsJson {
    byte: u8,
    is_virtual: bool,
    big_endian: bool,
    compression: u8,
    method: String,
}

pub fn cmd_flags(byte: u8, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let flags = parse_flags(byte);

    if json {
        let out = FlagsJson {
            byte,
            is_virtual: flags.is_virtual,
            big_endian: flags.big_endian,
            compression: flags.compression,
            method: flags.method().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Flags: 0x{:02X} ({:08b})", byte, byte);
    println!("  Virtual:     {}", flags.is_virtual);
    println!("  Big-endian:  {}", flags.big_endian);
    println!("  Compression: {} ({})", flags.compression, flags.method());
    if byte & 0xC0 != 0 {
        println!("  Reserved bits set: 0x{:02X}", byte & 0xC0);
    }

    Ok(())
}
