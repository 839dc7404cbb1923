//! Info command implementation.

use crate::utils::{first_image_offset, savings};
use oxilzo_ifs::{StartupHeader, verify_checksums};
use serde::Serialize;
use std::path::PathBuf;

/// JSON output for the info command.
#[derive(Debug, Serialize)]
struct InfoJson {
    file: String,
    offset: usize,
    version: u16,
    flags1: u8,
    flags2: u8,
    is_virtual: bool,
    big_endian: bool,
    compression: String,
    header_size: u16,
    machine: u16,
    startup_vaddr: u32,
    paddr_bias: u32,
    image_paddr: u32,
    ram_paddr: u32,
    ram_size: u32,
    startup_size: u32,
    stored_size: u32,
    imagefs_paddr: u32,
    imagefs_size: u32,
    preboot_size: u16,
    checksums_valid: bool,
}

pub fn cmd_info(input: &PathBuf, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    let offset = first_image_offset(&data)?;
    let header = StartupHeader::parse(&data[offset..])?;
    let flags = header.flags();
    let checksums_valid = verify_checksums(&data[offset..])
        .map(|r| r.is_valid())
        .unwrap_or(false);

    if json {
        let out = InfoJson {
            file: input.display().to_string(),
            offset,
            version: header.version,
            flags1: header.flags1,
            flags2: header.flags2,
            is_virtual: flags.is_virtual,
            big_endian: flags.big_endian,
            compression: header.compression().to_string(),
            header_size: header.header_size,
            machine: header.machine,
            startup_vaddr: header.startup_vaddr,
            paddr_bias: header.paddr_bias,
            image_paddr: header.image_paddr,
            ram_paddr: header.ram_paddr,
            ram_size: header.ram_size,
            startup_size: header.startup_size,
            stored_size: header.stored_size,
            imagefs_paddr: header.imagefs_paddr,
            imagefs_size: header.imagefs_size,
            preboot_size: header.preboot_size,
            checksums_valid,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("IFS Image Information");
    println!("=====================");
    println!("File: {}", input.display());
    if offset > 0 {
        println!("Header offset: 0x{:X}", offset);
    }
    println!("Version: {}", header.version);
    println!(
        "Flags: 0x{:02X} (virtual: {}, big-endian: {})",
        header.flags1, flags.is_virtual, flags.big_endian
    );
    println!("Compression: {}", header.compression());
    println!("Machine: 0x{:04X}", header.machine);
    println!();
    println!("Addresses:");
    println!("  Startup vaddr: 0x{:08X}", header.startup_vaddr);
    println!("  Image paddr:   0x{:08X}", header.image_paddr);
    println!("  RAM paddr:     0x{:08X}", header.ram_paddr);
    println!("  ImageFS paddr: 0x{:08X}", header.imagefs_paddr);
    println!("  Paddr bias:    0x{:08X}", header.paddr_bias);
    println!();
    println!("Sizes:");
    println!("  Header:  {} bytes", header.header_size);
    println!("  Startup: {} bytes", header.startup_size);
    println!("  Stored:  {} bytes", header.stored_size);
    println!("  ImageFS: {} bytes", header.imagefs_size);
    println!("  RAM:     {} bytes", header.ram_size);
    println!("  Preboot: {} bytes", header.preboot_size);
    let full = header.startup_size as usize + header.imagefs_size as usize;
    if header.stored_size as usize != full {
        println!(
            "  Space saved: {:.1}%",
            savings(full, header.stored_size as usize)
        );
    }
    println!();
    println!(
        "Checksums: {}",
        if checksums_valid { "valid" } else { "INVALID" }
    );

    Ok(())
}
