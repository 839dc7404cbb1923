//! Split command implementation.

use oxilzo_ifs::split;
use std::path::PathBuf;

pub fn cmd_split(
    input: &PathBuf,
    output_dir: &PathBuf,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let dump = std::fs::read(input)?;
    let segments = split(&dump)?;

    std::fs::create_dir_all(output_dir)?;

    if verbose {
        println!("{:<12} {:>10} {:>12}  Kind", "File", "Offset", "Size");
        println!("{}", "-".repeat(48));
    }

    for (index, segment) in segments.iter().enumerate() {
        let name = segment.file_name(index);
        let path = output_dir.join(&name);
        std::fs::write(&path, segment.bytes(&dump))?;

        if verbose {
            println!(
                "{:<12} {:>10} {:>12}  {}",
                name,
                format!("0x{:X}", segment.offset),
                segment.len,
                segment.kind.name()
            );
        }
    }

    let images = segments
        .iter()
        .filter(|s| s.kind == oxilzo_ifs::SegmentKind::Image)
        .count();
    println!(
        "Split {} into {} files ({} images) in {}",
        input.display(),
        segments.len(),
        images,
        output_dir.display()
    );

    Ok(())
}
