//! Utility functions for the CLI.

use indicatif::{ProgressBar, ProgressStyle};
use oxilzo_core::error::{OxiLzoError, status};
use oxilzo_ifs::find_signatures;
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise warnings only, or debug output with
/// `--verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ "),
    );
    pb
}

/// Offset of the first startup header in `data`.
pub fn first_image_offset(data: &[u8]) -> Result<usize, Box<dyn std::error::Error>> {
    find_signatures(data)
        .first()
        .copied()
        .ok_or_else(|| "no IFS startup signature found".into())
}

/// Message for a failed command; codec errors carry their LZO status code.
pub fn describe_error(e: &(dyn std::error::Error + 'static)) -> String {
    match e.downcast_ref::<OxiLzoError>() {
        Some(err) if err.status() != status::ERROR => {
            format!("Error: {} (status {})", e, err.status())
        }
        _ => format!("Error: {}", e),
    }
}

/// Space saved by compression, in percent.
pub fn savings(original: usize, stored: usize) -> f64 {
    if original == 0 {
        0.0
    } else {
        (1.0 - stored as f64 / original as f64) * 100.0
    }
}

/// Parse a byte given in decimal, `0x` hex, or `0b` binary.
pub fn parse_byte(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16)
    } else if let Some(bin) = s.strip_prefix("0b") {
        u8::from_str_radix(bin, 2)
    } else {
        s.parse()
    };
    parsed.map_err(|e| format!("invalid byte '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_byte() {
        assert_eq!(parse_byte("9"), Ok(9));
        assert_eq!(parse_byte("0x0B"), Ok(0x0B));
        assert_eq!(parse_byte("0b1001"), Ok(9));
        assert!(parse_byte("256").is_err());
        assert!(parse_byte("0xZZ").is_err());
    }

    #[test]
    fn test_describe_error() {
        let codec = OxiLzoError::lookbehind_overrun(4096, 12);
        let msg = describe_error(&codec);
        assert!(msg.starts_with("Error: "));
        assert!(msg.ends_with(&format!("(status {})", status::LOOKBEHIND_OVERRUN)));

        let header = OxiLzoError::invalid_header("bad");
        assert!(!describe_error(&header).contains("status"));

        let io = std::io::Error::other("disk");
        assert_eq!(describe_error(&io), "Error: disk");
    }

    #[test]
    fn test_savings() {
        assert_eq!(savings(0, 0), 0.0);
        assert!((savings(100, 25) - 75.0).abs() < 1e-9);
    }
}
