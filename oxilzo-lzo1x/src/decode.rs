//! Safe LZO1X decoder.
//!
//! Every read is bounds-checked against the input and every write against
//! the output, so corrupted or hostile streams produce an error instead of
//! reading or writing out of bounds. The decoder accepts the full LZO1X
//! instruction set, including M1 matches that the encoders never emit.

use crate::encode::M2_MAX_OFFSET;
use oxilzo_core::error::{OxiLzoError, Result};

/// Destination of decoded bytes.
trait Sink {
    fn len(&self) -> usize;
    fn push_literals(&mut self, bytes: &[u8]) -> Result<()>;
    fn copy_match(&mut self, distance: usize, len: usize) -> Result<()>;
}

/// Growable output with an upper limit.
struct VecSink {
    buf: Vec<u8>,
    limit: usize,
}

impl VecSink {
    fn reserve(&mut self, n: usize) -> Result<()> {
        let needed = self.buf.len() + n;
        if needed > self.limit {
            return Err(OxiLzoError::output_overrun(needed, self.limit));
        }
        self.buf.reserve(n);
        Ok(())
    }
}

impl Sink for VecSink {
    fn len(&self) -> usize {
        self.buf.len()
    }

    fn push_literals(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn copy_match(&mut self, distance: usize, len: usize) -> Result<()> {
        if distance > self.buf.len() {
            return Err(OxiLzoError::lookbehind_overrun(distance, self.buf.len()));
        }
        self.reserve(len)?;
        let start = self.buf.len() - distance;
        if distance >= len {
            self.buf.extend_from_within(start..start + len);
        } else {
            // Overlapping copy repeats the last `distance` bytes.
            for i in 0..len {
                let byte = self.buf[start + i];
                self.buf.push(byte);
            }
        }
        Ok(())
    }
}

/// Fixed-size caller buffer.
struct SliceSink<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl SliceSink<'_> {
    fn check_room(&self, n: usize) -> Result<()> {
        let needed = self.pos + n;
        if needed > self.buf.len() {
            return Err(OxiLzoError::output_overrun(needed, self.buf.len()));
        }
        Ok(())
    }
}

impl Sink for SliceSink<'_> {
    fn len(&self) -> usize {
        self.pos
    }

    fn push_literals(&mut self, bytes: &[u8]) -> Result<()> {
        self.check_room(bytes.len())?;
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    fn copy_match(&mut self, distance: usize, len: usize) -> Result<()> {
        if distance > self.pos {
            return Err(OxiLzoError::lookbehind_overrun(distance, self.pos));
        }
        self.check_room(len)?;
        let start = self.pos - distance;
        if distance >= len {
            self.buf.copy_within(start..start + len, self.pos);
        } else {
            for i in 0..len {
                self.buf[self.pos + i] = self.buf[start + i];
            }
        }
        self.pos += len;
        Ok(())
    }
}

/// What the previous instruction was; decides how a byte below 16 decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// After a match with no trailing literals (or at stream start):
    /// a byte below 16 starts a literal run.
    Instruction,
    /// After a literal run of 4 or more: a byte below 16 is a 3-byte M1
    /// match reaching beyond the M2 window.
    AfterLiteralRun,
    /// After 1..=3 trailing literals: a byte below 16 is a 2-byte M1 match.
    AfterShortLiterals,
}

/// LZO1X decoder over one compressed block.
struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn read_byte(&mut self) -> Result<u8> {
        let b = *self
            .input
            .get(self.pos)
            .ok_or_else(|| OxiLzoError::input_overrun(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    /// Extended length: each zero byte adds 255, the final byte is added.
    fn read_length(&mut self, base: usize) -> Result<usize> {
        let mut len = base;
        loop {
            let b = self.read_byte()?;
            if b != 0 {
                return Ok(len + b as usize);
            }
            len += 255;
        }
    }

    fn copy_literals<S: Sink>(&mut self, out: &mut S, n: usize) -> Result<()> {
        let end = self.pos + n;
        if end > self.input.len() {
            return Err(OxiLzoError::input_overrun(self.pos));
        }
        out.push_literals(&self.input[self.pos..end])?;
        self.pos = end;
        Ok(())
    }

    /// Decode the whole block into `out`.
    fn decode<S: Sink>(&mut self, out: &mut S) -> Result<()> {
        let Some(&first) = self.input.first() else {
            return Err(OxiLzoError::input_overrun(0));
        };

        let mut state = State::Instruction;
        if first > 17 {
            self.pos = 1;
            let n = (first - 17) as usize;
            self.copy_literals(out, n)?;
            state = if n < 4 {
                State::AfterShortLiterals
            } else {
                State::AfterLiteralRun
            };
        }

        loop {
            if self.pos == self.input.len() {
                return Err(OxiLzoError::EofNotFound);
            }
            let t = self.read_byte()?;

            let (distance, len, trailing) = if t >= 64 {
                // M2
                let b = self.read_byte()? as usize;
                let distance = 1 + ((t as usize >> 2) & 7) + (b << 3);
                (distance, (t as usize >> 5) + 1, t & 3)
            } else if t >= 32 {
                // M3
                let mut len = (t & 31) as usize;
                if len == 0 {
                    len = self.read_length(31)?;
                }
                let d0 = self.read_byte()?;
                let d1 = self.read_byte()? as usize;
                let distance = 1 + (d0 as usize >> 2) + (d1 << 6);
                (distance, len + 2, d0 & 3)
            } else if t >= 16 {
                // M4 or end of stream
                let high = ((t & 8) as usize) << 11;
                let mut len = (t & 7) as usize;
                if len == 0 {
                    len = self.read_length(7)?;
                }
                let d0 = self.read_byte()?;
                let d1 = self.read_byte()? as usize;
                let distance = high + (d0 as usize >> 2) + (d1 << 6);
                if distance == 0 {
                    return self.finish();
                }
                (distance + 0x4000, len + 2, d0 & 3)
            } else {
                match state {
                    State::Instruction => {
                        let n = if t == 0 {
                            self.read_length(15)?
                        } else {
                            t as usize
                        };
                        self.copy_literals(out, n + 3)?;
                        state = State::AfterLiteralRun;
                        continue;
                    }
                    State::AfterLiteralRun => {
                        // M1 following a literal run
                        let b = self.read_byte()? as usize;
                        let distance = 1 + M2_MAX_OFFSET + (t as usize >> 2) + (b << 2);
                        (distance, 3, t & 3)
                    }
                    State::AfterShortLiterals => {
                        // M1 following a match
                        let b = self.read_byte()? as usize;
                        let distance = 1 + (t as usize >> 2) + (b << 2);
                        (distance, 2, t & 3)
                    }
                }
            };

            out.copy_match(distance, len)?;

            if trailing == 0 {
                state = State::Instruction;
            } else {
                self.copy_literals(out, trailing as usize)?;
                state = State::AfterShortLiterals;
            }
        }
    }

    /// End-of-stream marker read: all input must be consumed.
    fn finish(&self) -> Result<()> {
        let remaining = self.input.len() - self.pos;
        if remaining > 0 {
            return Err(OxiLzoError::input_not_consumed(remaining));
        }
        Ok(())
    }
}

/// Decompress an LZO1X block into a new buffer of at most `max_output` bytes.
pub fn decompress(input: &[u8], max_output: usize) -> Result<Vec<u8>> {
    decompress_with_capacity(input, max_output, max_output.min(input.len().saturating_mul(4)))
}

/// Decompress with an initial capacity hint; the buffer grows as needed.
pub(crate) fn decompress_with_capacity(
    input: &[u8],
    max_output: usize,
    capacity: usize,
) -> Result<Vec<u8>> {
    let mut sink = VecSink {
        buf: Vec::with_capacity(capacity.min(max_output)),
        limit: max_output,
    };
    Decoder::new(input).decode(&mut sink)?;
    Ok(sink.buf)
}

/// Decompress an LZO1X block into `output`, returning the decoded length.
///
/// Fails with an output overrun if `output` is too small.
pub fn decompress_into(input: &[u8], output: &mut [u8]) -> Result<usize> {
    let mut sink = SliceSink {
        buf: output,
        pos: 0,
    };
    Decoder::new(input).decode(&mut sink)?;
    Ok(sink.len())
}
