//! Merge command implementation.

use oxilzo_ifs::{merge, part_index};
use std::path::{Path, PathBuf};

/// Files written by `split`, in dump order.
fn find_parts(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let pattern = dir.join("ifs*.*");
    let pattern = pattern.to_str().ok_or("input path is not valid UTF-8")?;

    let mut files = Vec::new();
    for entry in glob::glob(pattern)? {
        let path = entry?;
        if path.is_file() {
            files.push(path);
        }
    }
    order_parts(files)
}

/// Keep split part names, order them by index, and require every index
/// from 0 up to the highest one.
fn order_parts(paths: Vec<PathBuf>) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut parts: Vec<(usize, PathBuf)> = paths
        .into_iter()
        .filter_map(|path| {
            let index = part_index(path.file_name()?.to_str()?)?;
            Some((index, path))
        })
        .collect();
    parts.sort_by_key(|(index, _)| *index);

    for (expected, (index, path)) in parts.iter().enumerate() {
        if *index != expected {
            let found = path.display();
            return Err(if *index < expected {
                format!("duplicate part index {index} ({found})").into()
            } else {
                format!("missing part ifs{expected}.*, next is {found}").into()
            });
        }
    }
    Ok(parts.into_iter().map(|(_, path)| path).collect())
}

pub fn cmd_merge(
    input_dir: &PathBuf,
    output: &PathBuf,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let files = find_parts(input_dir)?;
    if files.is_empty() {
        return Err(format!("no split parts found in {}", input_dir.display()).into());
    }

    let parts = files
        .iter()
        .map(std::fs::read)
        .collect::<Result<Vec<_>, _>>()?;

    if verbose {
        println!("{:<12} {:>14} {:>14}", "File", "Offset", "Size");
        println!("{}", "-".repeat(42));
        let mut offset = 0usize;
        for (file, part) in files.iter().zip(&parts) {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!("{:<12} {:>14} {:>14}", name, offset, part.len());
            offset += part.len();
        }
        println!();
    }

    let merged = merge(&parts);
    std::fs::write(output, &merged)?;

    println!(
        "Merged {} files to {} ({} bytes)",
        files.len(),
        output.display(),
        merged.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| Path::new("parts").join(n)).collect()
    }

    #[test]
    fn test_order_parts_numeric() {
        let ordered = order_parts(paths(&[
            "ifs0.bin", "ifs1.ifs", "ifs10.bin", "ifs11.ifs", "ifs2.bin", "ifs3.ifs", "ifs4.bin",
            "ifs5.ifs", "ifs6.bin", "ifs7.ifs", "ifs8.bin", "ifs9.ifs", "ifs.txt", "notes.md",
        ]))
        .unwrap();
        let names: Vec<String> = ordered
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 12);
        assert_eq!(names[0], "ifs0.bin");
        assert_eq!(&names[9..], ["ifs9.ifs", "ifs10.bin", "ifs11.ifs"]);
    }

    #[test]
    fn test_order_parts_missing_index() {
        let err = order_parts(paths(&["ifs0.bin", "ifs1.ifs", "ifs3.ifs"])).unwrap_err();
        assert!(err.to_string().contains("ifs2"));
    }

    #[test]
    fn test_order_parts_duplicate_index() {
        assert!(order_parts(paths(&["ifs0.bin", "ifs1.ifs", "ifs1.bin"])).is_err());
    }
}
