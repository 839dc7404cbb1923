//! LZO1X instruction emitter shared by the fast and exhaustive encoders.
//!
//! LZO1X stream format (as emitted here):
//! - First literal run: `17 + n` followed by `n` literals (n <= 238)
//! - Literal run (n >= 4): `n - 3` (n <= 18) or `0`, zero bytes worth 255
//!   each, then a final byte, followed by `n` literals
//! - Short literal run (1..=3 literals after a match): stored in the low two
//!   bits of the second-to-last byte of that match
//! - M2 match: `((len - 1) << 5) | ((off & 7) << 2)`, `off >> 3`
//!   (len 3..=8, distance 1..=2048)
//! - M3 match: `32 | (len - 2)` or extended length, then `(off & 63) << 2`,
//!   `off >> 6` (distance 1..=16384)
//! - M4 match: `16 | hi | (len - 2)` or extended length, then two offset
//!   bytes (distance 16385..=49151)
//! - End of stream: `11 00 00`
//!
//! M1 matches are understood by the decoder but never emitted.

/// Minimum match length.
pub(crate) const MIN_MATCH: usize = 3;

/// Longest match encodable as M2.
pub(crate) const M2_MAX_LEN: usize = 8;

/// Longest M3 match without an extended length.
pub(crate) const M3_MAX_LEN: usize = 33;

/// Longest M4 match without an extended length.
pub(crate) const M4_MAX_LEN: usize = 9;

/// Largest M2 distance.
pub(crate) const M2_MAX_OFFSET: usize = 0x0800;

/// Largest M3 distance.
pub(crate) const M3_MAX_OFFSET: usize = 0x4000;

/// Largest M4 distance (largest distance overall).
pub(crate) const M4_MAX_OFFSET: usize = 0xbfff;

/// M3 instruction marker.
pub(crate) const M3_MARKER: u8 = 32;

/// M4 instruction marker.
pub(crate) const M4_MARKER: u8 = 16;

/// Longest literal run encodable in the first byte of a stream.
const FIRST_LITERAL_MAX: usize = 238;

/// End-of-stream marker (an M4 match with distance zero).
pub const END_OF_STREAM: [u8; 3] = [M4_MARKER | 1, 0, 0];

/// Number of bytes used to encode a match.
pub(crate) fn match_cost(distance: usize, len: usize) -> usize {
    if len <= M2_MAX_LEN && distance <= M2_MAX_OFFSET {
        2
    } else {
        let inline_max = if distance <= M3_MAX_OFFSET {
            M3_MAX_LEN
        } else {
            M4_MAX_LEN
        };
        if len <= inline_max {
            3
        } else {
            3 + length_bytes(len - inline_max)
        }
    }
}

/// A match worth emitting: encodable and shorter than its literals.
pub(crate) fn is_profitable(distance: usize, len: usize) -> bool {
    len >= MIN_MATCH
        && (1..=M4_MAX_OFFSET).contains(&distance)
        && match_cost(distance, len) < len
}

/// Bytes taken by an extended length of `n` (n >= 1).
fn length_bytes(n: usize) -> usize {
    1 + (n - 1) / 255
}

/// Appends LZO1X instructions to an output buffer.
pub(crate) struct StreamWriter {
    out: Vec<u8>,
}

impl StreamWriter {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            out: Vec::with_capacity(capacity),
        }
    }

    /// Emit a literal run. Must be followed by a match or by [`finish`].
    ///
    /// [`finish`]: StreamWriter::finish
    pub(crate) fn emit_literals(&mut self, literals: &[u8]) {
        let n = literals.len();
        if n == 0 {
            return;
        }

        if self.out.is_empty() && n <= FIRST_LITERAL_MAX {
            self.out.push((17 + n) as u8);
        } else if n <= 3 {
            // Stream is non-empty, so the last instruction was a match
            // whose second-to-last byte carries the literal count.
            let state_pos = self.out.len() - 2;
            self.out[state_pos] |= n as u8;
        } else if n <= 18 {
            self.out.push((n - 3) as u8);
        } else {
            self.out.push(0);
            self.push_length(n - 18);
        }

        self.out.extend_from_slice(literals);
    }

    /// Emit a match of `len` bytes at `distance` back.
    pub(crate) fn emit_match(&mut self, distance: usize, len: usize) {
        debug_assert!(len >= MIN_MATCH);
        debug_assert!((1..=M4_MAX_OFFSET).contains(&distance));

        if len <= M2_MAX_LEN && distance <= M2_MAX_OFFSET {
            let off = distance - 1;
            self.out.push((((len - 1) << 5) | ((off & 7) << 2)) as u8);
            self.out.push((off >> 3) as u8);
            return;
        }

        let off = if distance <= M3_MAX_OFFSET {
            let off = distance - 1;
            if len <= M3_MAX_LEN {
                self.out.push(M3_MARKER | (len - 2) as u8);
            } else {
                self.out.push(M3_MARKER);
                self.push_length(len - M3_MAX_LEN);
            }
            off
        } else {
            let off = distance - 0x4000;
            let hi = ((off & 0x4000) >> 11) as u8;
            if len <= M4_MAX_LEN {
                self.out.push(M4_MARKER | hi | (len - 2) as u8);
            } else {
                self.out.push(M4_MARKER | hi);
                self.push_length(len - M4_MAX_LEN);
            }
            off
        };

        self.out.push(((off & 63) << 2) as u8);
        self.out.push(((off >> 6) & 0xff) as u8);
    }

    /// Emit the trailing literals and the end-of-stream marker.
    pub(crate) fn finish(mut self, trailing: &[u8]) -> Vec<u8> {
        self.emit_literals(trailing);
        self.out.extend_from_slice(&END_OF_STREAM);
        self.out
    }

    /// Extended length: zero bytes worth 255 each, then the remainder.
    fn push_length(&mut self, mut n: usize) {
        while n > 255 {
            n -= 255;
            self.out.push(0);
        }
        self.out.push(n as u8);
    }
}

/// Encode `input` as a single literal run.
///
/// Used when a match-based encoding would exceed the worst-case bound.
pub(crate) fn store(input: &[u8]) -> Vec<u8> {
    StreamWriter::with_capacity(input.len() + input.len() / 255 + 8).finish(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stream() {
        let out = StreamWriter::with_capacity(8).finish(&[]);
        assert_eq!(out, END_OF_STREAM);
    }

    #[test]
    fn test_first_literal_run() {
        let out = store(b"abc");
        assert_eq!(out, [20, b'a', b'b', b'c', 0x11, 0, 0]);
    }

    #[test]
    fn test_long_first_literal_run() {
        let input = vec![7u8; 300];
        let out = store(&input);
        // 0, then 300 - 18 = 282 = 255 + 27
        assert_eq!(&out[..3], &[0, 0, 27]);
        assert_eq!(out.len(), 3 + 300 + 3);
    }

    #[test]
    fn test_m2_encoding() {
        let mut w = StreamWriter::with_capacity(16);
        w.emit_literals(b"abcd");
        w.emit_match(4, 8);
        let out = w.finish(&[]);
        // 17 + 4, literals, M2 (len 8, off 3), EOS
        assert_eq!(out[0], 21);
        assert_eq!(out[5], ((8 - 1) << 5 | (3 & 7) << 2) as u8);
        assert_eq!(out[6], 0);
    }

    #[test]
    fn test_short_literals_use_state_bits() {
        let mut w = StreamWriter::with_capacity(16);
        w.emit_literals(b"abcd");
        w.emit_match(4, 4);
        w.emit_literals(b"xy");
        let out = w.finish(&[]);
        assert_eq!(out[5] & 3, 2);
        assert_eq!(&out[7..9], b"xy");
    }

    #[test]
    fn test_match_cost() {
        assert_eq!(match_cost(1, 3), 2);
        assert_eq!(match_cost(2048, 8), 2);
        assert_eq!(match_cost(2049, 8), 3);
        assert_eq!(match_cost(100, 33), 3);
        assert_eq!(match_cost(100, 34), 4);
        assert_eq!(match_cost(20000, 9), 3);
        assert_eq!(match_cost(20000, 10), 4);
        assert_eq!(match_cost(20000, 9 + 255), 4);
        assert_eq!(match_cost(20000, 9 + 256), 5);
    }

    #[test]
    fn test_profitability() {
        assert!(is_profitable(1, 3));
        assert!(!is_profitable(3000, 3));
        assert!(is_profitable(3000, 4));
        assert!(!is_profitable(M4_MAX_OFFSET + 1, 100));
        assert!(!is_profitable(0, 10));
    }
}
