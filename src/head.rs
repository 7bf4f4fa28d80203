use crate::error::Error;

/// Byte-level scan state while hunting for the blank line (`CRLF CRLF`) that
/// terminates an HTTP head or a chunked-encoding trailer block.
///
/// Grounded on `src/chunked.rs`'s `State` struct: the same shape (a small
/// running state advanced incrementally across arbitrarily-sized `fill()`
/// results) but chasing a byte pattern instead of a chunk-size counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Start,
    SeenCr,
    SeenCrLf,
    SeenCrLfCr,
    Complete,
}

/// Incrementally captures a request head (or a chunked-body trailer block)
/// into an externally-owned buffer, one `fill()`'s worth of bytes at a time
/// (spec §4.2).
///
/// The buffer is borrowed, not owned, matching spec §3/§9: the caller
/// allocates it once (sized `H`, 8-64 KiB typical) and may reuse it across
/// sequential exchanges on the same connection.
pub struct HeadAccumulator<'h> {
    buf: &'h mut [u8],
    len: usize,
    scan: Scan,
}

impl<'h> HeadAccumulator<'h> {
    pub fn new(buf: &'h mut [u8]) -> HeadAccumulator<'h> {
        HeadAccumulator { buf, len: 0, scan: Scan::Start }
    }

    /// Scans `input`, copying bytes into the internal buffer, until either a
    /// complete head is observed or `input` is exhausted. Returns how many
    /// bytes of `input` were consumed; the caller must drop that many bytes
    /// from the connection's read buffer.
    ///
    /// Fails `HeadersOversize` if the internal buffer would overflow, and
    /// `HttpHeadersInvalid` on a bare `LF`/`CR` not paired as `CRLF` (strict
    /// CRLF policy, spec §9 open question).
    pub fn check_complete_head(&mut self, input: &[u8]) -> Result<usize, Error> {
        for (i, &byte) in input.iter().enumerate() {
            if self.len >= self.buf.len() {
                return Err(Error::HeadersOversize);
            }
            self.buf[self.len] = byte;
            self.len += 1;

            self.scan = match (self.scan, byte) {
                (Scan::Start, b'\r') => Scan::SeenCr,
                (Scan::Start, b'\n') => {
                    return Err(Error::HttpHeadersInvalid("bare LF in request head"))
                }
                (Scan::Start, _) => Scan::Start,
                (Scan::SeenCr, b'\n') => Scan::SeenCrLf,
                (Scan::SeenCr, _) => {
                    return Err(Error::HttpHeadersInvalid("bare CR in request head"))
                }
                (Scan::SeenCrLf, b'\r') => Scan::SeenCrLfCr,
                (Scan::SeenCrLf, b'\n') => {
                    return Err(Error::HttpHeadersInvalid("bare LF in request head"))
                }
                (Scan::SeenCrLf, _) => Scan::Start,
                (Scan::SeenCrLfCr, b'\n') => {
                    return Ok(i + 1).map(|n| {
                        self.scan = Scan::Complete;
                        n
                    })
                }
                (Scan::SeenCrLfCr, _) => {
                    return Err(Error::HttpHeadersInvalid("bare CR in request head"))
                }
                (Scan::Complete, _) => Scan::Complete,
            };
        }
        Ok(input.len())
    }

    pub fn is_complete(&self) -> bool {
        self.scan == Scan::Complete
    }

    /// Returns the accumulated head bytes, including the terminating blank
    /// line. Only meaningful once `is_complete()`.
    pub fn get(&self) -> &[u8] {
        debug_assert!(self.is_complete(), "HeadAccumulator::get before completion");
        &self.buf[..self.len]
    }

    /// Returns to the initial state, ready to accumulate either the next
    /// request's head or (when the caller is mid chunked-body) a trailer
    /// block — the scan algorithm is identical either way (spec §4.2).
    pub fn reset(&mut self) {
        self.len = 0;
        self.scan = Scan::Start;
    }

    /// Like [`reset`](Self::reset), but primes the scan as though a `CRLF`
    /// was already observed just before the first byte fed in. The
    /// terminal `0`-sized chunk's own line (consumed separately as framing
    /// by `ChunkedState`) ends in exactly such a `CRLF`; priming the scan
    /// lets an empty trailer block (a bare `CRLF`) complete immediately,
    /// the same way a head with zero header lines completes on the
    /// request-line's own terminating `CRLF` plus the blank line.
    pub fn reset_primed_after_crlf(&mut self) {
        self.len = 0;
        self.scan = Scan::SeenCrLf;
    }
}

#[cfg(test)]
mod test {
    use super::HeadAccumulator;

    #[test]
    fn completes_on_blank_line() {
        let mut buf = [0u8; 256];
        let mut acc = HeadAccumulator::new(&mut buf);
        let input = b"GET / HTTP/1.1\r\nHost: x\r\n\r\nTRAILING";
        let n = acc.check_complete_head(input).unwrap();
        assert!(acc.is_complete());
        assert_eq!(&input[..n], b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(acc.get(), &input[..n]);
    }

    #[test]
    fn survives_arbitrary_chunking() {
        let whole = b"GET / HTTP/1.1\r\nHost: x\r\n\r\n";
        for split in 0..whole.len() {
            let mut buf = [0u8; 256];
            let mut acc = HeadAccumulator::new(&mut buf);
            let n1 = acc.check_complete_head(&whole[..split]).unwrap();
            assert_eq!(n1, split);
            assert!(!acc.is_complete());
            let n2 = acc.check_complete_head(&whole[split..]).unwrap();
            assert!(acc.is_complete(), "split at {split} failed to complete");
            assert_eq!(split + n2, whole.len());
            assert_eq!(acc.get(), &whole[..]);
        }
    }

    #[test]
    fn overflow_is_rejected() {
        let mut buf = [0u8; 8];
        let mut acc = HeadAccumulator::new(&mut buf);
        let err = acc.check_complete_head(b"GET / HTTP/1.1\r\n\r\n").unwrap_err();
        assert!(matches!(err, crate::error::Error::HeadersOversize));
    }

    #[test]
    fn bare_lf_is_rejected() {
        let mut buf = [0u8; 64];
        let mut acc = HeadAccumulator::new(&mut buf);
        let err = acc.check_complete_head(b"GET / HTTP/1.1\n\n").unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::HttpHeadersInvalid(_)
        ));
    }

    #[test]
    fn primed_reset_completes_on_bare_crlf() {
        let mut buf = [0u8; 64];
        let mut acc = HeadAccumulator::new(&mut buf);
        acc.reset_primed_after_crlf();
        let n = acc.check_complete_head(b"\r\n").unwrap();
        assert_eq!(n, 2);
        assert!(acc.is_complete());
        assert_eq!(acc.get(), b"\r\n");
    }

    #[test]
    fn primed_reset_still_accumulates_trailer_fields() {
        let mut buf = [0u8; 64];
        let mut acc = HeadAccumulator::new(&mut buf);
        acc.reset_primed_after_crlf();
        let n = acc.check_complete_head(b"X-Checksum: abc\r\n\r\n").unwrap();
        assert_eq!(n, 20);
        assert!(acc.is_complete());
        assert_eq!(acc.get(), b"X-Checksum: abc\r\n\r\n");
    }

    #[test]
    fn reset_reuses_buffer_for_trailers() {
        let mut buf = [0u8; 64];
        let mut acc = HeadAccumulator::new(&mut buf);
        acc.check_complete_head(b"X: 1\r\n\r\n").unwrap();
        assert!(acc.is_complete());
        acc.reset();
        assert!(!acc.is_complete());
        acc.check_complete_head(b"Trailer: y\r\n\r\n").unwrap();
        assert_eq!(acc.get(), b"Trailer: y\r\n\r\n");
    }
}
