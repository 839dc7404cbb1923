//! Checksum command implementation.

use crate::utils::first_image_offset;
use oxilzo_ifs::{
    ChecksumReport, RegionChecksum, StartupHeader, fix_image_checksum, fix_startup_checksum,
    verify_checksums,
};
use oxilzo_lzo1x::CompressionMethod;
use serde::Serialize;
use std::path::PathBuf;

/// JSON view of one region.
#[derive(Debug, Serialize)]
struct RegionJson {
    stored: String,
    expected: String,
    valid: bool,
}

impl RegionJson {
    fn from_region(region: &RegionChecksum) -> Self {
        Self {
            stored: format!("0x{:08X}", region.stored),
            expected: format!("0x{:08X}", region.expected),
            valid: region.is_valid(),
        }
    }
}

/// JSON output for the checksum command.
#[derive(Debug, Serialize)]
struct ChecksumJson {
    file: String,
    offset: usize,
    startup: RegionJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<RegionJson>,
    valid: bool,
}

fn print_region(name: &str, region: &RegionChecksum) {
    println!("{name} checksum read      : 0x{:08X}", region.stored);
    println!(
        "{name} checksum calculated: 0x{:08X} ({})",
        region.expected,
        if region.is_valid() { "match" } else { "MISMATCH" }
    );
}

fn print_report(report: &ChecksumReport) {
    print_region("Startup", &report.startup);
    match &report.image {
        Some(image) => print_region("Image  ", image),
        None => println!("Image checksum: not checked (unsupported compression)"),
    }
}

pub fn cmd_checksum(
    input: &PathBuf,
    fix: Option<&PathBuf>,
    json: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut data = std::fs::read(input)?;
    let offset = first_image_offset(&data)?;
    if verbose && offset > 0 {
        println!("Startup header found at offset 0x{offset:X}");
    }

    let report = verify_checksums(&data[offset..])?;

    if json {
        let out = ChecksumJson {
            file: input.display().to_string(),
            offset,
            startup: RegionJson::from_region(&report.startup),
            image: report.image.as_ref().map(RegionJson::from_region),
            valid: report.is_valid(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_report(&report);
    }

    if let Some(output) = fix {
        let image = &mut data[offset..];
        fix_startup_checksum(image)?;
        if StartupHeader::parse(image)?.compression() == CompressionMethod::None {
            fix_image_checksum(image)?;
        } else if report.image.is_some_and(|image| !image.is_valid()) {
            return Err("image checksum of a compressed image cannot be fixed in place".into());
        }
        std::fs::write(output, &data)?;
        if !json {
            println!("Checksums written to {}", output.display());
        }
    } else if !report.is_valid() {
        return Err("checksum mismatch".into());
    }

    Ok(())
}
