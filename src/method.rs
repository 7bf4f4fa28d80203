/// HTTP request method.
///
/// Mirrors the teacher crate's `Method` enum (`enums/headers.rs`): a closed
/// set of the common verbs plus an `Other` escape hatch, rather than
/// `httparse`'s bare `&str`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Options,
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Trace,
    Connect,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match *self {
            Method::Options => "OPTIONS",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Trace => "TRACE",
            Method::Connect => "CONNECT",
            Method::Other(ref s) => s,
        }
    }

    pub fn is_head(&self) -> bool {
        matches!(*self, Method::Head)
    }
}

impl<'a> From<&'a str> for Method {
    fn from(s: &'a str) -> Method {
        match s {
            "OPTIONS" => Method::Options,
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "TRACE" => Method::Trace,
            "CONNECT" => Method::Connect,
            s => Method::Other(s.to_string()),
        }
    }
}

/// A transfer/content coding recognised by `Transfer-Encoding` and
/// `Content-Encoding` (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coding {
    Identity,
    Deflate,
    Gzip,
    Compress,
    Zstd,
}

impl Coding {
    /// Parses a single comma-separated token (already trimmed of surrounding
    /// whitespace). Returns `None` for unrecognised tokens, which the caller
    /// turns into `Error::HttpTransferEncodingUnsupported`.
    pub fn parse(token: &str) -> Option<Coding> {
        if token.eq_ignore_ascii_case("identity") {
            Some(Coding::Identity)
        } else if token.eq_ignore_ascii_case("deflate") {
            Some(Coding::Deflate)
        } else if token.eq_ignore_ascii_case("gzip") || token.eq_ignore_ascii_case("x-gzip") {
            Some(Coding::Gzip)
        } else if token.eq_ignore_ascii_case("compress") || token.eq_ignore_ascii_case("x-compress")
        {
            Some(Coding::Compress)
        } else if token.eq_ignore_ascii_case("zstd") {
            Some(Coding::Zstd)
        } else {
            None
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(*self, Coding::Identity)
    }
}

/// True if `val` (trimmed of leading/trailing OWS) case-insensitively equals
/// `"chunked"`.
///
/// Grounded on `src/headers.rs`'s `is_chunked` byte scanner, simplified to
/// operate on a pre-split `&str` token (the comma-splitting itself now lives
/// in `request.rs`, where both `Transfer-Encoding` and `Content-Encoding`
/// need it).
pub fn is_chunked_token(val: &str) -> bool {
    val.trim().eq_ignore_ascii_case("chunked")
}

/// True if `val` case-insensitively contains the `close` token, as used for
/// `Connection: close` detection.
pub fn is_close_token(val: &str) -> bool {
    val.split(',').any(|tok| tok.trim().eq_ignore_ascii_case("close"))
}

/// True if `val` case-insensitively contains the `100-continue` token, as
/// used for `Expect: 100-continue` detection.
pub fn is_continue_token(val: &str) -> bool {
    val.split(',').any(|tok| tok.trim().eq_ignore_ascii_case("100-continue"))
}

#[cfg(test)]
mod test {
    use super::{is_chunked_token, is_close_token, is_continue_token, Coding, Method};

    #[test]
    fn method_from_str() {
        assert_eq!(Method::from("GET"), Method::Get);
        assert_eq!(Method::from("get"), Method::Other("get".to_string()));
        assert_eq!(Method::from("HEAD"), Method::Head);
        assert!(Method::from("HEAD").is_head());
        assert!(!Method::from("GET").is_head());
    }

    #[test]
    fn coding_parse() {
        assert_eq!(Coding::parse("chunked"), None);
        assert_eq!(Coding::parse("gzip"), Some(Coding::Gzip));
        assert_eq!(Coding::parse("X-GZIP"), Some(Coding::Gzip));
        assert_eq!(Coding::parse("Deflate"), Some(Coding::Deflate));
        assert_eq!(Coding::parse("zstd"), Some(Coding::Zstd));
        assert_eq!(Coding::parse("compress"), Some(Coding::Compress));
        assert_eq!(Coding::parse("bogus"), None);
    }

    #[test]
    fn chunked_token() {
        assert!(is_chunked_token("chunked"));
        assert!(is_chunked_token("  Chunked "));
        assert!(!is_chunked_token("chunked;q=1"));
    }

    #[test]
    fn close_token() {
        assert!(is_close_token("close"));
        assert!(is_close_token("keep-alive, close"));
        assert!(!is_close_token("keep-alive"));
    }

    #[test]
    fn continue_token() {
        assert!(is_continue_token("100-continue"));
        assert!(!is_continue_token("100-Continued"));
    }
}
