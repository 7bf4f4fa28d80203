use std::io;

quick_error! {
    /// The single, flat error taxonomy for the whole crate (spec §7).
    ///
    /// Grounded on `server/error.rs` and `base_serializer::HeaderError` in
    /// the teacher crate, both `quick_error!`-defined; merged here into one
    /// enum since the spec calls for "a single projection from the OS error
    /// space into the taxonomy" kept in one place.
    #[derive(Debug)]
    pub enum Error {
        /// The peer reset the connection. All OS-specific reset signals
        /// (`ECONNRESET`, `EPIPE`, ...) are mapped here; see
        /// `connection::map_io_error`.
        ConnectionResetByPeer {
            description("connection reset by peer")
        }
        /// A read or write exceeded its deadline. The core itself never sets
        /// a deadline (spec §5); this variant exists for callers that wrap
        /// the stream in their own timeout machinery and want to report it
        /// through this taxonomy.
        ConnectionTimedOut {
            description("connection timed out")
        }
        /// The peer closed the connection cleanly before a complete head (or
        /// body) was received.
        EndOfStream {
            description("connection closed before a complete message was read")
        }
        UnexpectedReadFailure(err: io::Error) {
            description("unexpected read failure")
            display("unexpected read failure: {}", err)
        }
        UnexpectedWriteFailure(err: io::Error) {
            description("unexpected write failure")
            display("unexpected write failure: {}", err)
        }
        /// The client header buffer filled up before a complete head (or
        /// trailer) was observed.
        HeadersOversize {
            description("request head exceeds the configured header buffer")
        }
        /// The request line or a header line violates the strict grammar of
        /// spec §4.3 (bad request line, duplicate Content-Length, a `:`-less
        /// header line, and so on).
        HttpHeadersInvalid(reason: &'static str) {
            description("malformed request head")
            display("malformed request head: {}", reason)
        }
        /// A header line began with leading whitespace (obsolete line
        /// folding), which this crate does not support (spec §1 non-goals).
        HttpHeaderContinuationsUnsupported {
            description("header line continuations (folding) are not supported")
        }
        /// The request method token was empty or longer than 24 bytes.
        UnknownHttpMethod {
            description("request method is empty or too long")
        }
        /// `Content-Length` was present but was not a valid base-10 `u64`.
        InvalidContentLength {
            description("Content-Length is not a valid unsigned integer")
        }
        /// `Transfer-Encoding` named more than two codings, or a coding
        /// outside the supported set.
        HttpTransferEncodingUnsupported {
            description("unsupported or malformed Transfer-Encoding")
        }
        /// `compress`/`x-compress` was requested; decoding LZW is out of
        /// scope for this crate.
        CompressionNotSupported {
            description("the compress/x-compress coding is not supported")
        }
        /// The decompressor rejected the byte stream (corrupt gzip/deflate/
        /// zstd framing).
        DecompressionFailure(err: io::Error) {
            description("decompression failure")
            display("decompression failure: {}", err)
        }
        /// Trailers following a chunked body failed to parse as header
        /// lines.
        InvalidTrailers {
            description("invalid chunked-encoding trailers")
        }
        /// The application asked for a `Transfer-Encoding` other than
        /// `chunked` on the response.
        UnsupportedTransferEncoding {
            description("only Transfer-Encoding: chunked is supported on responses")
        }
        /// `Response::write` was called while `transfer_encoding = none`
        /// (e.g. a `204 No Content` or a `HEAD` response).
        NotWriteable {
            description("this response must not carry a body")
        }
        /// `Response::write` was called with more bytes than the declared
        /// `Content-Length` allows.
        MessageTooLong {
            description("response body exceeds the declared Content-Length")
        }
        /// `Response::finish` was called before the declared `Content-Length`
        /// had been fully written.
        MessageNotCompleted {
            description("response body is shorter than the declared Content-Length")
        }
        /// A header name or value contained a bare CR or LF.
        InvalidHeaderValue {
            description("header name or value contains CR or LF")
        }
    }
}

impl From<httparse::Error> for Error {
    fn from(err: httparse::Error) -> Error {
        let reason = match err {
            httparse::Error::HeaderName => "invalid header name",
            httparse::Error::HeaderValue => "invalid header value",
            httparse::Error::NewLine => "invalid line ending",
            httparse::Error::Status => "invalid status",
            httparse::Error::Token => "invalid token",
            httparse::Error::TooManyHeaders => "too many headers",
            httparse::Error::Version => "invalid HTTP version",
            _ => "malformed request",
        };
        Error::HttpHeadersInvalid(reason)
    }
}

impl From<httparse::InvalidChunkSize> for Error {
    fn from(_: httparse::InvalidChunkSize) -> Error {
        Error::HttpHeadersInvalid("invalid chunk size")
    }
}

/// Maps an OS-level `io::Error` observed while reading or writing the
/// connection into the crate's closed error taxonomy, so that no
/// platform-specific `io::ErrorKind` ever leaks to the caller (spec §4.1,
/// §7). This is the "single projection, kept in one place" that spec §9
/// asks for.
pub fn map_read_error(err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => Error::ConnectionResetByPeer,
        io::ErrorKind::UnexpectedEof => Error::EndOfStream,
        io::ErrorKind::TimedOut => Error::ConnectionTimedOut,
        _ => Error::UnexpectedReadFailure(err),
    }
}

pub fn map_write_error(err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => Error::ConnectionResetByPeer,
        io::ErrorKind::TimedOut => Error::ConnectionTimedOut,
        _ => Error::UnexpectedWriteFailure(err),
    }
}

/// The HTTP status that `wait`'s caller obligations (spec §6) require for a
/// given failure, or `None` when no response should be sent at all (plain
/// I/O failures).
pub fn response_status_for(err: &Error) -> Option<crate::status::Status> {
    use crate::status::Status;
    match *err {
        Error::ConnectionResetByPeer
        | Error::ConnectionTimedOut
        | Error::EndOfStream
        | Error::UnexpectedReadFailure(_)
        | Error::UnexpectedWriteFailure(_) => None,
        Error::HeadersOversize => Some(Status::REQUEST_HEADER_FIELDS_TOO_LARGE),
        _ => Some(Status::BAD_REQUEST),
    }
}
