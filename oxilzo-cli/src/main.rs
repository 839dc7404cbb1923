//! OxiLZO CLI - QNX IFS image compression tool
//!
//! A Pure Rust utility for LZO-compressing, decompressing, inspecting, and
//! splitting QNX IFS boot images.

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{
    CompressOptions, cmd_checksum, cmd_compress, cmd_decompress, cmd_flags, cmd_info, cmd_merge,
    cmd_split,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oxilzo")]
#[command(author, version, about = "QNX IFS image compression with pure Rust LZO1X")]
#[command(long_about = "
OxiLZO compresses and decompresses QNX IFS boot images with LZO1X, verifies
and repairs their checksums, and splits flash dumps into their images.

Examples:
  oxilzo compress boot.ifs boot-lzo.ifs
  oxilzo compress boot.ifs boot-lzo.ifs --level 1 --block-size 32768
  oxilzo decompress boot-lzo.ifs boot.ifs
  oxilzo checksum boot.ifs --fix boot-fixed.ifs
  oxilzo info boot.ifs --json
  oxilzo split flash.bin parts/
  oxilzo merge parts/ flash.bin
  oxilzo flags 0x09
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress an IFS image with LZO
    #[command(alias = "c")]
    Compress {
        /// Uncompressed IFS image
        input: PathBuf,

        /// Output file
        output: PathBuf,

        /// Compression level (9 = best, anything else = fast)
        #[arg(short, long, default_value_t = 9, allow_negative_numbers = true)]
        level: i32,

        /// Uncompressed bytes per block
        #[arg(short, long, default_value_t = 65536)]
        block_size: u32,

        /// Verify every compressed block
        #[arg(long)]
        optimize: bool,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Decompress an LZO-compressed IFS image
    #[command(alias = "d")]
    Decompress {
        /// Compressed IFS image
        input: PathBuf,

        /// Output file
        output: PathBuf,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Read and calculate IFS checksums
    Checksum {
        /// IFS image or flash dump
        input: PathBuf,

        /// Write a copy with corrected checksums to this file
        #[arg(long, value_name = "OUTPUT")]
        fix: Option<PathBuf>,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the startup header of an IFS image
    #[command(alias = "i")]
    Info {
        /// IFS image or flash dump
        input: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Split a flash dump into its IFS images
    #[command(alias = "s")]
    Split {
        /// Flash dump
        input: PathBuf,

        /// Output directory
        #[arg(default_value = ".")]
        output_dir: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Merge split files (ifs0.bin, ifs1.ifs, ...) back into one dump
    #[command(alias = "m")]
    Merge {
        /// Directory holding the split files
        input_dir: PathBuf,

        /// Output file
        output: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Decode an IFS flag byte
    Flags {
        /// Flag byte (decimal, 0x hex, or 0b binary)
        #[arg(value_parser = utils::parse_byte)]
        byte: u8,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Compress { verbose, .. }
            | Self::Decompress { verbose, .. }
            | Self::Checksum { verbose, .. }
            | Self::Info { verbose, .. }
            | Self::Split { verbose, .. }
            | Self::Merge { verbose, .. }
            | Self::Flags { verbose, .. } => *verbose,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    utils::init_logging(cli.command.verbose());

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            level,
            block_size,
            optimize,
            quiet,
            verbose,
        } => cmd_compress(
            &input,
            &output,
            &CompressOptions {
                block_size,
                level,
                optimize,
                progress: !quiet,
                verbose,
            },
        ),
        Commands::Decompress {
            input,
            output,
            quiet,
            verbose,
        } => cmd_decompress(&input, &output, !quiet, verbose),
        Commands::Checksum {
            input,
            fix,
            json,
            verbose,
        } => cmd_checksum(&input, fix.as_ref(), json, verbose),
        Commands::Info { input, json, .. } => cmd_info(&input, json),
        Commands::Split {
            input,
            output_dir,
            verbose,
        } => cmd_split(&input, &output_dir, verbose),
        Commands::Merge {
            input_dir,
            output,
            verbose,
        } => cmd_merge(&input_dir, &output, verbose),
        Commands::Flags { byte, json, .. } => cmd_flags(byte, json),
    };

    if let Err(e) = result {
        eprintln!("{}", utils::describe_error(e.as_ref()));
        std::process::exit(1);
    }
}
