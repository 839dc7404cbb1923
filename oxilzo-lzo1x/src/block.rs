//! Fast single-pass LZO1X encoder.
//!
//! One hash table slot per 3-byte prefix, first candidate wins, no chain.
//! Matches are extended forward as far as the input allows.

use crate::bound::{FAST_DICT_SIZE, worst_case_bound};
use crate::encode::{M2_MAX_LEN, MIN_MATCH, StreamWriter, is_profitable, store};

/// Inputs shorter than this are stored as literals.
const MIN_INPUT: usize = M2_MAX_LEN + 5;

/// Fast LZO1X encoder over caller-provided working memory.
pub(crate) struct FastEncoder<'a> {
    input: &'a [u8],
    dict: &'a mut [u32],
}

impl<'a> FastEncoder<'a> {
    /// `dict` must hold at least [`FAST_DICT_SIZE`] zeroed entries.
    pub(crate) fn new(input: &'a [u8], dict: &'a mut [u32]) -> Self {
        debug_assert!(dict.len() >= FAST_DICT_SIZE);
        Self { input, dict }
    }

    /// Hash of the 3 bytes at `pos`.
    fn hash(data: &[u8], pos: usize) -> usize {
        let v = u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], 0]);
        (v.wrapping_mul(0x1824_429d) >> 18) as usize & (FAST_DICT_SIZE - 1)
    }

    /// Length of the common prefix of `input[a..]` and `input[b..]` (a < b).
    fn common_len(input: &[u8], a: usize, b: usize) -> usize {
        input[b..]
            .iter()
            .zip(&input[a..])
            .take_while(|(x, y)| x == y)
            .count()
    }

    /// Encode the whole input.
    pub(crate) fn encode(self) -> Vec<u8> {
        let input = self.input;
        let len = input.len();

        if len < MIN_INPUT {
            return store(input);
        }

        let mut writer = StreamWriter::with_capacity(worst_case_bound(len));
        let search_end = len - MIN_INPUT;
        let mut pos = 1;
        let mut anchor = 0;

        while pos < search_end {
            let h = Self::hash(input, pos);
            let candidate = self.dict[h] as usize;
            self.dict[h] = (pos + 1) as u32;

            if candidate > 0 {
                let match_pos = candidate - 1;
                let distance = pos - match_pos;
                if input[match_pos..match_pos + MIN_MATCH] == input[pos..pos + MIN_MATCH] {
                    let match_len = Self::common_len(input, match_pos, pos);
                    if is_profitable(distance, match_len) {
                        writer.emit_literals(&input[anchor..pos]);
                        writer.emit_match(distance, match_len);
                        pos += match_len;
                        anchor = pos;
                        continue;
                    }
                }
            }

            pos += 1;
        }

        let out = writer.finish(&input[anchor..]);
        if out.len() > worst_case_bound(len) {
            tracing::debug!(
                input = len,
                encoded = out.len(),
                "fast encoding exceeded bound, storing literals"
            );
            return store(input);
        }
        out
    }
}
