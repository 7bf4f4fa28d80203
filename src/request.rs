use crate::error::Error;
use crate::headers::HeaderMap;
use crate::method::{self, Coding, Method};
use crate::version::Version;

/// Which framing coding (if any) the request body uses, independent of any
/// content-coding layered on top (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    None,
    Chunked,
}

/// A parsed request head (spec §3, §4.3).
///
/// Grounded on `server/buffered.rs`'s `Request` struct in the teacher crate:
/// same field shape (method, target as an owned path-and-query string,
/// version, an ordered header multi-map), generalized from the teacher's
/// `httparse`-borrowed-lifetime request to an owned struct since this crate
/// must survive past the single `fill()` that produced the head bytes.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub target: String,
    pub version: Version,
    pub headers: HeaderMap,
    pub content_length: Option<u64>,
    pub transfer_encoding: TransferEncoding,
    pub transfer_compression: Coding,
}

impl Request {
    /// True once the application, or the library on the application's
    /// behalf, has a complete picture of the request's body framing
    /// (spec §4.3 "after parsing, body framing is fixed").
    pub fn has_body(&self) -> bool {
        self.transfer_encoding == TransferEncoding::Chunked
            || self.content_length.unwrap_or(0) > 0
    }
}

const MAX_METHOD_LEN: usize = 24;
const MIN_REQUEST_LINE_LEN: usize = 10;

/// Turns accumulated head bytes (from [`crate::head::HeadAccumulator`]) into
/// a [`Request`], and separately parses chunked-body trailer blocks into a
/// bare [`HeaderMap`] (spec §4.3, §4.4 "trailer mode").
///
/// Grounded on `server/headers.rs`'s `scan_headers` in the teacher crate for
/// the overall shape (walk line by line, special-case `Content-Length` and
/// `Transfer-Encoding`), though that function is itself an unfinished
/// prototype in the teacher tree (it references an undefined `raw` binding);
/// the request-line grammar and the Transfer-Encoding right-to-left coding
/// list come instead directly from spec §4.3.
pub struct RequestParser;

impl RequestParser {
    /// Parses a complete head (`request-line CRLF *(header-line CRLF) CRLF`)
    /// into a [`Request`].
    pub fn parse(head: &[u8]) -> Result<Request, Error> {
        let text = head_to_str(head)?;
        let mut lines = split_head_lines(text);
        let request_line = lines
            .next()
            .ok_or(Error::HttpHeadersInvalid("empty request head"))?;
        let (method, target, version) = parse_request_line(request_line)?;

        let mut headers = HeaderMap::new();
        let mut content_length: Option<u64> = None;
        let mut transfer_encoding = TransferEncoding::None;
        let mut transfer_compression = Coding::Identity;
        let mut content_encoding_seen = false;

        for line in lines {
            let (name, value) = parse_header_line(line)?;
            apply_header(
                name,
                value,
                &mut headers,
                &mut content_length,
                &mut transfer_encoding,
                &mut transfer_compression,
                &mut content_encoding_seen,
            )?;
        }

        Ok(Request {
            method,
            target,
            version,
            headers,
            content_length,
            transfer_encoding,
            transfer_compression,
        })
    }

    /// Parses a trailer block (`*(header-line CRLF) CRLF`, no request line)
    /// into a bare header map, for merging into `Request::headers` once a
    /// chunked body completes (spec §4.4).
    pub fn parse_trailers(head: &[u8]) -> Result<HeaderMap, Error> {
        let text = head_to_str(head)?;
        let mut headers = HeaderMap::new();
        for line in split_head_lines(text) {
            let (name, value) = parse_header_line(line).map_err(|_| Error::InvalidTrailers)?;
            headers.append(name, value);
        }
        Ok(headers)
    }
}

fn head_to_str(head: &[u8]) -> Result<&str, Error> {
    std::str::from_utf8(head).map_err(|_| Error::HttpHeadersInvalid("head is not valid UTF-8"))
}

/// Splits an accumulated head (already known to end in `CRLF CRLF`) on
/// `CRLF`, dropping the two trailing empty strings the terminator produces.
fn split_head_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut lines: Vec<&str> = text.split("\r\n").collect();
    // `"...\r\n\r\n".split("\r\n")` ends in two empty strings: one for the
    // blank line, one for the split boundary past the final CRLF.
    if lines.last() == Some(&"") {
        lines.pop();
    }
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines.into_iter()
}

fn parse_request_line(line: &str) -> Result<(Method, String, Version), Error> {
    if line.len() < MIN_REQUEST_LINE_LEN {
        return Err(Error::HttpHeadersInvalid("request line is too short"));
    }
    let first_space = line
        .find(' ')
        .ok_or(Error::HttpHeadersInvalid("request line missing SP"))?;
    let last_space = line
        .rfind(' ')
        .ok_or(Error::HttpHeadersInvalid("request line missing SP"))?;
    if first_space == last_space {
        return Err(Error::HttpHeadersInvalid(
            "request line must have method, target and version",
        ));
    }

    let method_tok = &line[..first_space];
    if method_tok.is_empty() || method_tok.len() > MAX_METHOD_LEN {
        return Err(Error::UnknownHttpMethod);
    }
    let target = &line[first_space + 1..last_space];
    if target.is_empty() {
        return Err(Error::HttpHeadersInvalid("request target is empty"));
    }
    let version_tok = &line[last_space + 1..];
    let version = Version::parse(version_tok)
        .ok_or(Error::HttpHeadersInvalid("unsupported HTTP version"))?;

    Ok((Method::from(method_tok), target.to_string(), version))
}

/// Splits a header line on the *first* `:` only (spec §9 open question
/// resolution — see DESIGN.md), and rejects folded continuation lines
/// (leading whitespace).
fn parse_header_line(line: &str) -> Result<(&str, &str), Error> {
    if line.starts_with(' ') || line.starts_with('\t') {
        return Err(Error::HttpHeaderContinuationsUnsupported);
    }
    let colon = line
        .find(':')
        .ok_or(Error::HttpHeadersInvalid("header line missing ':'"))?;
    let name = &line[..colon];
    if name.is_empty() {
        return Err(Error::HttpHeadersInvalid("header name is empty"));
    }
    let value = line[colon + 1..].trim();
    Ok((name, value))
}

#[allow(clippy::too_many_arguments)]
fn apply_header<'a>(
    name: &'a str,
    value: &'a str,
    headers: &mut HeaderMap,
    content_length: &mut Option<u64>,
    transfer_encoding: &mut TransferEncoding,
    transfer_compression: &mut Coding,
    content_encoding_seen: &mut bool,
) -> Result<(), Error> {
    if name.eq_ignore_ascii_case("content-length") {
        if content_length.is_some() {
            return Err(Error::HttpHeadersInvalid("duplicate Content-Length"));
        }
        let n: u64 = value.parse().map_err(|_| Error::InvalidContentLength)?;
        *content_length = Some(n);
    } else if name.eq_ignore_ascii_case("transfer-encoding") {
        let (framing, compression) = parse_transfer_encoding(value)?;
        if framing == TransferEncoding::Chunked {
            if *transfer_encoding == TransferEncoding::Chunked {
                return Err(Error::HttpHeadersInvalid("duplicate chunked transfer-coding"));
            }
            *transfer_encoding = TransferEncoding::Chunked;
        }
        if !compression.is_identity() {
            if !transfer_compression.is_identity() {
                return Err(Error::HttpHeadersInvalid(
                    "multiple content-codings are not supported",
                ));
            }
            *transfer_compression = compression;
        }
    } else if name.eq_ignore_ascii_case("content-encoding") {
        if *content_encoding_seen {
            return Err(Error::HttpHeadersInvalid("duplicate Content-Encoding"));
        }
        *content_encoding_seen = true;
        let coding = Coding::parse(value.trim())
            .ok_or(Error::HttpTransferEncodingUnsupported)?;
        if !coding.is_identity() {
            if !transfer_compression.is_identity() {
                return Err(Error::HttpHeadersInvalid(
                    "multiple content-codings are not supported",
                ));
            }
            *transfer_compression = coding;
        }
    }
    headers.append(name, value);
    Ok(())
}

/// Parses a `Transfer-Encoding` value into an optional framing coding
/// (must be the rightmost token, `chunked`) and an optional compression
/// coding (the token before it), per spec §4.3.
fn parse_transfer_encoding(value: &str) -> Result<(TransferEncoding, Coding), Error> {
    let tokens: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() > 2 {
        return Err(Error::HttpTransferEncodingUnsupported);
    }

    let mut remaining = tokens.len();
    let mut framing = TransferEncoding::None;
    if remaining > 0 && method::is_chunked_token(tokens[remaining - 1]) {
        framing = TransferEncoding::Chunked;
        remaining -= 1;
    }

    let mut compression = Coding::Identity;
    if remaining == 1 {
        let tok = tokens[0];
        if method::is_chunked_token(tok) {
            return Err(Error::HttpHeadersInvalid("duplicate chunked transfer-coding"));
        }
        compression = Coding::parse(tok).ok_or(Error::HttpTransferEncodingUnsupported)?;
    } else if remaining > 1 {
        return Err(Error::HttpTransferEncodingUnsupported);
    }

    Ok((framing, compression))
}
