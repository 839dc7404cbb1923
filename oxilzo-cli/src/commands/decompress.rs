//! Decompress command implementation.

use crate::utils::create_progress_bar;
use oxilzo_ifs::{StartupHeader, decompress_image, verify_checksums};
use std::path::PathBuf;

pub fn cmd_decompress(
    input: &PathBuf,
    output: &PathBuf,
    progress: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    let header = StartupHeader::parse(&data)?;

    if verbose {
        println!("Decompressing {} to {}", input.display(), output.display());
        println!("Compression: {}", header.compression());
        println!(
            "Stored size: {} (uncompressed: {})",
            header.stored_size, header.imagefs_size
        );
    }

    let pb = create_progress_bar(data.len() as u64, progress);
    pb.set_message("decompressing");
    let restored = decompress_image(&data, |done, _| pb.set_position(done as u64))?;
    pb.finish_and_clear();

    std::fs::write(output, &restored)?;

    if verbose {
        let report = verify_checksums(&restored)?;
        let image_ok = report.image.is_none_or(|image| image.is_valid());
        println!(
            "Checksums: startup {}, image {}",
            if report.startup.is_valid() { "OK" } else { "BAD" },
            if image_ok { "OK" } else { "BAD" }
        );
    }

    println!("Decompressed {} -> {} bytes", data.len(), restored.len());

    Ok(())
}
