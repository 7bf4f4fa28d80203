use httparse::{parse_chunk_size, Status};

use crate::error::Error;

/// Bound on a buffered chunk-size line (`hex-digits [;ext] CRLF`). Generous
/// for any real chunk-extension use while still bounding memory against a
/// peer that never sends a terminating CRLF.
const MAX_CHUNK_SIZE_LINE: usize = 4096;

/// What a caller should do with the next bytes of a chunked body, as decided
/// by [`ChunkedState::step`].
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// The next `n` bytes of the buffer are chunk payload: hand them to the
    /// caller (decompression, `read_all`, ...) and then call
    /// [`ChunkedState::consume_data`].
    Data(usize),
    /// The next `n` bytes of *the buffer just passed to `step`* are pure
    /// framing (part or all of a chunk-size line, or the `CRLF` trailing a
    /// chunk's data) and must be dropped from the connection buffer without
    /// ever being exposed as body content. `n` may be smaller than the full
    /// framing element when it spans more than one `step` call.
    Skip(usize),
    /// The terminal `0`-sized chunk and its line terminator have been
    /// consumed; what follows is a trailer block with the same `CRLF CRLF`
    /// framing as a request head. The caller should now drive a
    /// [`crate::head::HeadAccumulator`] over the remaining buffer.
    Trailers,
    /// `input` was empty; the caller should `fill()` the connection and
    /// retry. `step` otherwise always makes progress on nonempty input.
    NeedMoreInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    ChunkSize,
    ChunkData,
    ChunkDataCrlf,
    Trailers,
}

/// Drives the chunked transfer-coding state machine (spec §4.4) one `peek()`
/// buffer at a time.
///
/// Grounded on `src/chunked.rs`'s `State` (`buffered`/`pending`/`done`
/// counters advanced across repeated parses), but reworked into an explicit
/// `Phase` enum. Two differences from the teacher's version: the trailing
/// `CRLF` after chunk data is its own phase rather than being folded into
/// `pending`, and a chunk-size line that straddles two `fill()`s is
/// accumulated in a small internal scratch buffer — `BufferedConnection`'s
/// `fill()` only tops up an *empty* buffer (spec §4.1), so unlike the
/// teacher's growable `tk_bufstream::Buf`, there is nowhere else to leave a
/// half-read line between calls.
#[derive(Debug)]
pub struct ChunkedState {
    phase: Phase,
    /// Bytes of the current chunk's data not yet accounted for.
    remaining: u64,
    /// Accumulates a chunk-size line (or the 2-byte post-data `CRLF`) across
    /// `step` calls until it is complete.
    scratch: Vec<u8>,
}

impl ChunkedState {
    pub fn new() -> ChunkedState {
        ChunkedState { phase: Phase::ChunkSize, remaining: 0, scratch: Vec::new() }
    }

    /// Looks at the start of `input` (bytes already buffered but not yet
    /// consumed) and decides what the next framing step is. Never consumes
    /// anything from `input` on the caller's behalf — callers report back
    /// via [`consume_data`] or by calling `step` again after dropping
    /// `Skip` bytes.
    pub fn step(&mut self, input: &[u8]) -> Result<Step, Error> {
        match self.phase {
            Phase::ChunkSize => self.step_chunk_size(input),
            Phase::ChunkData => {
                if input.is_empty() {
                    return Ok(Step::NeedMoreInput);
                }
                let n = (input.len() as u64).min(self.remaining) as usize;
                Ok(Step::Data(n))
            }
            Phase::ChunkDataCrlf => self.step_crlf(input),
            Phase::Trailers => Ok(Step::Trailers),
        }
    }

    fn step_chunk_size(&mut self, input: &[u8]) -> Result<Step, Error> {
        if input.is_empty() {
            return Ok(Step::NeedMoreInput);
        }
        let previous_len = self.scratch.len();
        self.scratch.extend_from_slice(input);
        // Check the cap only once we know the line hasn't terminated yet:
        // `scratch` holds whatever of the connection buffer trails the
        // size line too (the start of the chunk data, possibly more), so
        // a long chunk body must never count against this limit.
        match parse_chunk_size(&self.scratch)? {
            Status::Partial => {
                if self.scratch.len() > MAX_CHUNK_SIZE_LINE {
                    return Err(Error::HttpHeadersInvalid("chunk-size line too long"));
                }
                Ok(Step::Skip(input.len()))
            }
            Status::Complete((line_len, size)) => {
                let consumed_now = line_len - previous_len;
                self.scratch.clear();
                if size == 0 {
                    self.phase = Phase::Trailers;
                } else {
                    self.phase = Phase::ChunkData;
                    self.remaining = size;
                }
                Ok(Step::Skip(consumed_now))
            }
        }
    }

    fn step_crlf(&mut self, input: &[u8]) -> Result<Step, Error> {
        if input.is_empty() {
            return Ok(Step::NeedMoreInput);
        }
        let previous_len = self.scratch.len();
        self.scratch.extend_from_slice(input);
        if self.scratch.len() < 2 {
            return Ok(Step::Skip(input.len()));
        }
        if &self.scratch[..2] != b"\r\n" {
            return Err(Error::HttpHeadersInvalid("chunk data not followed by CRLF"));
        }
        let consumed_now = 2 - previous_len;
        self.scratch.clear();
        self.phase = Phase::ChunkSize;
        Ok(Step::Skip(consumed_now))
    }

    /// Reports that `n` bytes returned as `Step::Data` have been consumed
    /// (read, decompressed, or discarded) by the caller.
    pub fn consume_data(&mut self, n: usize) {
        assert!(n as u64 <= self.remaining);
        self.remaining -= n as u64;
        if self.remaining == 0 {
            self.phase = Phase::ChunkDataCrlf;
        }
    }

    pub fn is_awaiting_trailers(&self) -> bool {
        self.phase == Phase::Trailers
    }
}
