//! End-to-end scenarios driving a full `Exchange` over an in-memory duplex
//! byte stream, rather than a real socket (§10.4's test-tooling convention).

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use mini_exchange::{Config, Error, Exchange, ResetOutcome, ResponseTransfer, Status};

/// A `Read + Write` stream backed by two independent byte queues: bytes
/// queued in `incoming` are what the peer "sent", and every `write` appends
/// to `outgoing`, which the test then inspects. Mirrors a real `TcpStream`'s
/// independent read/write directions, which a single `Cursor<Vec<u8>>`
/// cannot model.
struct Duplex {
    incoming: VecDeque<u8>,
    outgoing: Vec<u8>,
}

impl Duplex {
    fn new(incoming: &[u8]) -> Duplex {
        Duplex { incoming: incoming.iter().copied().collect(), outgoing: Vec::new() }
    }
}

impl Read for Duplex {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.incoming.len());
        for slot in buf[..n].iter_mut() {
            *slot = self.incoming.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for Duplex {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.outgoing.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn exchange(request: &[u8]) -> Exchange<Duplex> {
    Exchange::new(Duplex::new(request), Config::new())
}

fn written(ex: Exchange<Duplex>) -> String {
    String::from_utf8(ex.into_inner().outgoing).unwrap()
}

#[test]
fn chunked_request_with_trailing_zero_chunk() {
    let mut ex = exchange(
        b"POST / HTTP/1.1\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\n\r\n\
          1\r\nA\r\n1\r\nB\r\n2\r\nCD\r\n0\r\n\r\n",
    );
    ex.wait().unwrap();
    assert_eq!(ex.request().transfer_encoding, mini_exchange::TransferEncoding::Chunked);
    let body = ex.read_all().unwrap();
    assert_eq!(body, b"ABCD");
}

#[test]
fn keep_alive_reuse_across_two_requests() {
    let mut ex = exchange(
        b"GET / HTTP/1.1\r\nHost: x\r\n\r\nGET / HTTP/1.1\r\nHost: x\r\n\r\n",
    );
    ex.wait().unwrap();
    ex.send(Status::OK, None, ResponseTransfer::ContentLength(0)).unwrap();
    ex.finish().unwrap();
    assert_eq!(ex.reset(), ResetOutcome::Reset);

    ex.wait().unwrap();
    ex.send(Status::OK, None, ResponseTransfer::ContentLength(0)).unwrap();
    ex.finish().unwrap();
}

#[test]
fn connection_close_closes_and_echoes_header() {
    let mut ex = exchange(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n");
    ex.wait().unwrap();
    ex.send(Status::OK, None, ResponseTransfer::ContentLength(0)).unwrap();
    ex.finish().unwrap();
    assert_eq!(ex.reset(), ResetOutcome::Closing);
    let out = written(ex);
    assert!(out.contains("Connection: close\r\n"));
}

#[test]
fn head_method_omits_body_but_declares_length() {
    let mut ex = exchange(b"HEAD / HTTP/1.1\r\nHost: x\r\n\r\n");
    ex.wait().unwrap();
    ex.send(Status::OK, None, ResponseTransfer::ContentLength(5)).unwrap();
    // Bookkept as a normal 5-byte body, but suppressed on the wire.
    ex.write(b"hello").unwrap();
    ex.finish().unwrap();
    let out = written(ex);
    assert!(out.contains("Content-Length: 5\r\n"));
    assert!(!out.contains("hello"));
}

#[test]
fn content_length_mismatch_is_rejected_both_ways() {
    let mut ex = exchange(b"GET / HTTP/1.1\r\n\r\n");
    ex.wait().unwrap();
    ex.send(Status::OK, None, ResponseTransfer::ContentLength(10)).unwrap();
    ex.write(b"hi").unwrap();
    let err = ex.finish().unwrap_err();
    assert!(matches!(err, Error::MessageNotCompleted));
}

#[test]
fn content_length_overrun_is_rejected() {
    let mut ex = exchange(b"GET / HTTP/1.1\r\n\r\n");
    ex.wait().unwrap();
    ex.send(Status::OK, None, ResponseTransfer::ContentLength(2)).unwrap();
    let err = ex.write(b"too much").unwrap_err();
    assert!(matches!(err, Error::MessageTooLong));
}

#[test]
fn folded_header_is_rejected() {
    let mut ex = exchange(b"GET / HTTP/1.1\r\nX-Foo: a\r\n b\r\n\r\n");
    let err = ex.wait().unwrap_err();
    assert!(matches!(err, Error::HttpHeaderContinuationsUnsupported));
}

#[test]
fn double_compression_is_rejected() {
    let mut ex = exchange(
        b"POST / HTTP/1.1\r\nTransfer-Encoding: gzip, chunked\r\nContent-Encoding: gzip\r\n\r\n0\r\n\r\n",
    );
    let err = ex.wait().unwrap_err();
    assert!(matches!(err, Error::HttpHeadersInvalid(_)));
}

#[test]
fn chunked_write_with_empty_bytes_does_not_terminate_body() {
    let mut ex = exchange(b"GET / HTTP/1.1\r\n\r\n");
    ex.wait().unwrap();
    ex.send(Status::OK, None, ResponseTransfer::Chunked).unwrap();
    ex.write(b"").unwrap();
    ex.write(b"more").unwrap();
    ex.finish().unwrap();
    let out = written(ex);
    assert!(out.ends_with("4\r\nmore\r\n0\r\n\r\n"));
}

#[test]
fn reset_clears_state_for_the_next_wait() {
    let mut ex = exchange(b"GET /first HTTP/1.1\r\n\r\nGET /second HTTP/1.1\r\n\r\n");
    ex.wait().unwrap();
    ex.response_headers_mut().append("X-Debug", "1");
    ex.send(Status::OK, None, ResponseTransfer::ContentLength(0)).unwrap();
    ex.finish().unwrap();
    assert_eq!(ex.reset(), ResetOutcome::Reset);

    ex.wait().unwrap();
    assert_eq!(ex.request().target, "/second");
    // The header set from the previous exchange must not leak into this one.
    ex.send(Status::OK, None, ResponseTransfer::ContentLength(0)).unwrap();
    ex.finish().unwrap();
    let out = written(ex);
    assert_eq!(out.matches("X-Debug").count(), 1);
}
