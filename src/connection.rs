use std::io::{Read, Write};

use crate::error::{map_read_error, map_write_error, Error};

/// Raw byte I/O over a fixed-size read buffer (spec §4.1).
///
/// Grounded on the `fill`/`peek`/`drop` contract the teacher crate gets from
/// `tk_bufstream::ReadBuf`/`netbuf::Buf`, reimplemented here over a plain
/// blocking `Read + Write` stream with a bounded `[start, end)` buffer: the
/// teacher's buffer grows to fit whatever the async reactor hands it, but
/// spec §3 calls for a *fixed* size `B`, and there is no reactor to hand
/// anything to once I/O is synchronous.
pub struct BufferedConnection<S> {
    stream: S,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    /// Recorded once some earlier operation decided the connection cannot
    /// be reused (spec §4.5 `reset`); `Exchange::reset` reads this back.
    pub closing: bool,
}

impl<S> BufferedConnection<S> {
    pub fn new(stream: S, buffer_size: usize) -> BufferedConnection<S> {
        BufferedConnection {
            stream,
            buf: vec![0u8; buffer_size.max(1)],
            start: 0,
            end: 0,
            closing: false,
        }
    }

    /// Bytes currently sitting in the buffer, unconsumed.
    pub fn peek(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    /// Advances past `n` already-peeked bytes.
    pub fn drop_consumed(&mut self, n: usize) {
        assert!(
            n <= self.end - self.start,
            "drop_consumed({}) exceeds buffered {} bytes",
            n,
            self.end - self.start
        );
        self.start += n;
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }
}

impl<S: Read> BufferedConnection<S> {
    /// Refills the buffer from the stream if it is currently empty.
    ///
    /// Per spec §4.1: only reads when `start == end`; a single `read` call
    /// that returns 0 is end-of-stream.
    pub fn fill(&mut self) -> Result<usize, Error> {
        if self.start == self.end {
            self.start = 0;
            let n = self.stream.read(&mut self.buf).map_err(map_read_error)?;
            if n == 0 {
                return Err(Error::EndOfStream);
            }
            self.end = n;
        }
        Ok(self.end - self.start)
    }

    /// Copies as many already-buffered bytes into `out` as fit, filling the
    /// internal buffer first if it is empty. Returns `0` only at
    /// end-of-stream propagated through [`fill`](Self::fill)'s error, never
    /// as a bare `Ok(0)` — callers (`BodyReader`) read "no more data right
    /// now" from the `Err(Error::EndOfStream)` case instead. Unlike
    /// [`read_at_least`](Self::read_at_least), this never blocks past the
    /// first available byte.
    pub fn read_some(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        if out.is_empty() {
            return Ok(0);
        }
        if self.start == self.end {
            self.fill()?;
        }
        let avail = self.end - self.start;
        let n = avail.min(out.len());
        out[..n].copy_from_slice(&self.buf[self.start..self.start + n]);
        self.start += n;
        Ok(n)
    }

    /// Fills `out[..len]` with at least `len` bytes (spec §4.1), using
    /// whatever is already buffered first. When the remaining amount needed
    /// is larger than the internal buffer, reads go straight into `out`
    /// rather than bouncing through the internal buffer first.
    pub fn read_at_least(&mut self, out: &mut [u8], len: usize) -> Result<usize, Error> {
        assert!(len <= out.len());
        let mut filled = 0;
        let avail = self.end - self.start;
        if avail > 0 {
            let n = avail.min(out.len());
            out[..n].copy_from_slice(&self.buf[self.start..self.start + n]);
            self.start += n;
            filled = n;
        }
        while filled < len {
            let remaining = out.len() - filled;
            if remaining > self.buf.len() {
                let n = self
                    .stream
                    .read(&mut out[filled..])
                    .map_err(map_read_error)?;
                if n == 0 {
                    return Err(Error::EndOfStream);
                }
                filled += n;
            } else {
                self.fill()?;
                let avail = self.end - self.start;
                let n = avail.min(out.len() - filled);
                out[filled..filled + n].copy_from_slice(&self.buf[self.start..self.start + n]);
                self.start += n;
                filled += n;
            }
        }
        Ok(filled)
    }
}

impl<S: Write> BufferedConnection<S> {
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.stream.write_all(bytes).map_err(map_write_error)
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.stream.flush().map_err(map_write_error)
    }
}
