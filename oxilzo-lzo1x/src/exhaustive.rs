//! Exhaustive LZO1X encoder (level 9).
//!
//! Trades compression speed for ratio with:
//! - Hash chains over the whole 48 KiB match window
//! - Best match chosen by bytes saved rather than raw length
//! - One step of lazy evaluation before committing to a match

use crate::bound::{EXHAUSTIVE_CHAIN_SIZE, EXHAUSTIVE_HASH_SIZE, worst_case_bound};
use crate::encode::{M4_MAX_OFFSET, MIN_MATCH, StreamWriter, match_cost, store};

/// Maximum number of chain links followed per position.
const MAX_ATTEMPTS: usize = 4096;

/// Matches at least this long end the search early.
const NICE_MATCH: usize = 2048;

/// A candidate match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Match {
    distance: usize,
    len: usize,
}

impl Match {
    /// Bytes saved by emitting this match instead of literals.
    fn gain(self) -> isize {
        self.len as isize - match_cost(self.distance, self.len) as isize
    }
}

/// Exhaustive LZO1X encoder over caller-provided working memory.
pub(crate) struct ExhaustiveEncoder<'a> {
    input: &'a [u8],
    head: &'a mut [u32],
    chain: &'a mut [u32],
}

impl<'a> ExhaustiveEncoder<'a> {
    /// `tables` must hold the hash heads followed by the chain, zeroed.
    pub(crate) fn new(input: &'a [u8], tables: &'a mut [u32]) -> Self {
        debug_assert!(tables.len() >= EXHAUSTIVE_HASH_SIZE + EXHAUSTIVE_CHAIN_SIZE);
        let (head, chain) = tables.split_at_mut(EXHAUSTIVE_HASH_SIZE);
        Self { input, head, chain }
    }

    #[inline]
    fn hash3(data: &[u8], pos: usize) -> usize {
        let v = u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], 0]);
        (v.wrapping_mul(2_654_435_761) >> 16) as usize & (EXHAUSTIVE_HASH_SIZE - 1)
    }

    /// Insert position into hash table and chain.
    #[inline]
    fn insert(&mut self, pos: usize) {
        if pos + MIN_MATCH > self.input.len() {
            return;
        }
        let h = Self::hash3(self.input, pos);
        self.chain[pos & (EXHAUSTIVE_CHAIN_SIZE - 1)] = self.head[h];
        self.head[h] = (pos + 1) as u32;
    }

    /// Find the match at `pos` that saves the most bytes.
    fn find_best_match(&self, pos: usize) -> Option<Match> {
        let input = self.input;
        if pos + MIN_MATCH > input.len() {
            return None;
        }

        let max_len = input.len() - pos;
        let mut best: Option<Match> = None;
        let mut link = self.head[Self::hash3(input, pos)] as usize;
        let mut attempts = 0;

        while link > 0 && attempts < MAX_ATTEMPTS {
            let match_pos = link - 1;
            let distance = pos - match_pos;
            if distance > M4_MAX_OFFSET {
                break;
            }

            // Quick reject: a better match must extend past the current best.
            let best_len = best.map_or(0, |m| m.len);
            if best_len == 0 || input.get(match_pos + best_len) == input.get(pos + best_len) {
                let len = input[pos..]
                    .iter()
                    .zip(&input[match_pos..])
                    .take(max_len)
                    .take_while(|(a, b)| a == b)
                    .count();

                if len >= MIN_MATCH {
                    let candidate = Match { distance, len };
                    let better = match best {
                        None => true,
                        Some(b) => candidate.gain() > b.gain(),
                    };
                    if better {
                        best = Some(candidate);
                        if len >= NICE_MATCH || len == max_len {
                            break;
                        }
                    }
                }
            }

            link = self.chain[match_pos & (EXHAUSTIVE_CHAIN_SIZE - 1)] as usize;
            attempts += 1;
        }

        best.filter(|m| m.gain() > 0)
    }

    /// Encode the whole input.
    pub(crate) fn encode(mut self) -> Vec<u8> {
        let input = self.input;
        let len = input.len();
        let mut writer = StreamWriter::with_capacity(worst_case_bound(len));
        let mut pos = 0;
        let mut anchor = 0;

        while pos + MIN_MATCH <= len {
            let found = self.find_best_match(pos);
            self.insert(pos);

            let Some(m) = found else {
                pos += 1;
                continue;
            };

            // Lazy evaluation: defer if the next position saves more.
            if let Some(next) = self.find_best_match(pos + 1) {
                if next.gain() > m.gain() {
                    pos += 1;
                    continue;
                }
            }

            writer.emit_literals(&input[anchor..pos]);
            writer.emit_match(m.distance, m.len);
            for p in pos + 1..pos + m.len {
                self.insert(p);
            }
            pos += m.len;
            anchor = pos;
        }

        let out = writer.finish(&input[anchor..]);
        if out.len() > worst_case_bound(len) {
            tracing::debug!(
                input = len,
                encoded = out.len(),
                "exhaustive encoding exceeded bound, storing literals"
            );
            return store(input);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::FastEncoder;
    use crate::bound::FAST_DICT_SIZE;
    use crate::decode::decompress;

    fn encode(input: &[u8]) -> Vec<u8> {
        let mut tables = vec![0u32; EXHAUSTIVE_HASH_SIZE + EXHAUSTIVE_CHAIN_SIZE];
        ExhaustiveEncoder::new(input, &mut tables).encode()
    }

    fn text(size: usize) -> Vec<u8> {
        let text = b"Pack my box with five dozen liquor jugs. How vexingly quick daft zebras jump! ";
        text.iter().copied().cycle().take(size).collect()
    }

    #[test]
    fn test_empty() {
        let packed = encode(b"");
        assert_eq!(packed, [0x11, 0, 0]);
    }

    #[test]
    fn test_roundtrip_small() {
        for data in [&b"a"[..], b"ab", b"abc", b"abcabc", b"aaaaaaa"] {
            let packed = encode(data);
            assert_eq!(decompress(&packed, data.len()).unwrap(), data);
        }
    }

    #[test]
    fn test_roundtrip_text() {
        let data = text(10_000);
        let packed = encode(&data);
        assert!(packed.len() < data.len() / 10);
        assert_eq!(decompress(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_finds_matches_beyond_hash_collisions() {
        // Many short distinct records followed by a repeat of the first
        // one: the chain still reaches it after its hash slot was reused.
        let mut data = Vec::new();
        for i in 0..3000u32 {
            data.extend_from_slice(format!("rec{i:05}|").as_bytes());
        }
        let first = data[..200].to_vec();
        data.extend_from_slice(&first);

        let exhaustive = encode(&data);
        let mut dict = vec![0u32; FAST_DICT_SIZE];
        let fast = FastEncoder::new(&data, &mut dict).encode();
        assert!(exhaustive.len() < data.len());
        assert!(fast.len() < data.len());
        assert_eq!(decompress(&exhaustive, data.len()).unwrap(), data);
    }

    #[test]
    fn test_gain_prefers_cheaper_encoding() {
        let near = Match { distance: 10, len: 8 };
        let far = Match { distance: 20_000, len: 8 };
        assert!(near.gain() > far.gain());
    }
}
