//! Splitting a flash dump into its IFS images and merging it back.

use crate::header::{STARTUP_HEADER_SIZE, StartupHeader, find_signatures};
use oxilzo_core::error::{OxiLzoError, Result};

/// What a segment of a dump holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Bytes before the first image.
    Preamble,
    /// An IFS image, `stored_size` bytes long.
    Image,
    /// Bytes between two images.
    Gap,
    /// Bytes after the last image.
    Footer,
}

impl SegmentKind {
    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Preamble => "preamble",
            Self::Image => "image",
            Self::Gap => "gap",
            Self::Footer => "footer",
        }
    }
}

/// A contiguous slice of a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Segment kind.
    pub kind: SegmentKind,
    /// Offset in the dump.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
}

impl Segment {
    /// Bytes of this segment within `dump`.
    pub fn bytes<'a>(&self, dump: &'a [u8]) -> &'a [u8] {
        &dump[self.offset..self.offset + self.len]
    }

    /// Conventional file name for the segment at `index` of a split.
    ///
    /// The preamble is `ifs0.bin`, images are `ifs{n}.ifs`, and everything
    /// else is `ifs{n}.bin`. The index is not zero-padded, so ordering parts
    /// must go through [`part_index`] rather than a lexical sort.
    pub fn file_name(&self, index: usize) -> String {
        match self.kind {
            SegmentKind::Image => format!("ifs{index}.ifs"),
            _ => format!("ifs{index}.bin"),
        }
    }
}

/// Segment index encoded in a split file name (`ifs{n}.ifs` or `ifs{n}.bin`).
pub fn part_index(file_name: &str) -> Option<usize> {
    let (stem, ext) = file_name.split_once('.')?;
    if ext != "ifs" && ext != "bin" {
        return None;
    }
    let digits = stem.strip_prefix("ifs")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Locate the IFS images in `dump` and describe every byte of it.
///
/// The returned segments are contiguous, in order, and cover the whole dump.
pub fn split(dump: &[u8]) -> Result<Vec<Segment>> {
    let candidates = find_signatures(dump);
    if candidates.is_empty() {
        let found = dump.get(..4).unwrap_or(dump).to_vec();
        return Err(OxiLzoError::invalid_magic(
            crate::header::STARTUP_SIGNATURE.to_vec(),
            found,
        ));
    }

    let mut segments = Vec::new();
    let mut pos = 0;
    for offset in candidates {
        if offset < pos {
            tracing::debug!(offset, "signature inside an accepted image, skipped");
            continue;
        }
        if dump.len() - offset < STARTUP_HEADER_SIZE {
            tracing::debug!(offset, "no room for a startup header");
            continue;
        }
        let header = match StartupHeader::parse(&dump[offset..]) {
            Ok(header) => header,
            Err(e) => {
                tracing::debug!(offset, error = %e, "not a startup header");
                continue;
            }
        };
        let len = header.stored_size as usize;
        if len < STARTUP_HEADER_SIZE || len > dump.len() - offset {
            tracing::debug!(offset, stored_size = len, "stored size does not fit the dump");
            continue;
        }

        if offset > pos {
            let kind = if segments.is_empty() {
                SegmentKind::Preamble
            } else {
                SegmentKind::Gap
            };
            segments.push(Segment {
                kind,
                offset: pos,
                len: offset - pos,
            });
        }
        tracing::debug!(offset, len, "image found");
        segments.push(Segment {
            kind: SegmentKind::Image,
            offset,
            len,
        });
        pos = offset + len;
    }

    if !segments.iter().any(|s| s.kind == SegmentKind::Image) {
        return Err(OxiLzoError::invalid_header(
            "signatures found but no valid startup header",
        ));
    }

    if pos < dump.len() {
        segments.push(Segment {
            kind: SegmentKind::Footer,
            offset: pos,
            len: dump.len() - pos,
        });
    }
    Ok(segments)
}

/// Concatenate parts in order.
pub fn merge<P: AsRef<[u8]>>(parts: &[P]) -> Vec<u8> {
    let total = parts.iter().map(|p| p.as_ref().len()).sum();
    let mut out = Vec::with_capacity(total);
    for part in parts {
        out.extend_from_slice(part.as_ref());
    }
    out
}
