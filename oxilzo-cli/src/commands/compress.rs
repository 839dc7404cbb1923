//! Compress command implementation.

use crate::utils::{create_progress_bar, savings};
use oxilzo_ifs::{ImageOptions, StartupHeader, compress_image};
use std::path::PathBuf;

/// Options for compressing an image.
pub struct CompressOptions {
    pub block_size: u32,
    pub level: i32,
    pub optimize: bool,
    pub progress: bool,
    pub verbose: bool,
}

pub fn cmd_compress(
    input: &PathBuf,
    output: &PathBuf,
    options: &CompressOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    let header = StartupHeader::parse(&data)?;

    if options.verbose {
        println!("Compressing {} to {}", input.display(), output.display());
        println!(
            "Image size: {} bytes (startup {} bytes)",
            header.imagefs_size, header.startup_size
        );
        println!("Block size: {}, level: {}", options.block_size, options.level);
    }

    let image_options = ImageOptions::QNX_DEFAULT
        .with_block_size(options.block_size)
        .with_level(options.level)
        .with_optimize(options.optimize);

    let pb = create_progress_bar(0, options.progress);
    pb.set_message("compressing");
    let packed = compress_image(&data, &image_options, |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    })?;
    pb.finish_and_clear();

    std::fs::write(output, &packed)?;

    println!(
        "Compressed {} -> {} bytes ({:.1}% saved)",
        data.len(),
        packed.len(),
        savings(data.len(), packed.len())
    );

    Ok(())
}
