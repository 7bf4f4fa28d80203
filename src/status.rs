/// A minimal HTTP status line: a numeric code plus a reason phrase.
///
/// Unlike the teacher crate's closed `Status` enum (one variant per code),
/// this is an open `(u16, &str)` pair with a handful of named constants for
/// the statuses the core itself needs to emit (`100`, `400`, `417`, `431`).
/// Applications are free to use any `(code, reason)` pair via [`Status::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    code: u16,
    reason: &'static str,
}

impl Status {
    /// Builds a status from an application-chosen reason phrase.
    pub const fn new(code: u16, reason: &'static str) -> Status {
        Status { code, reason }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn reason(&self) -> &'static str {
        self.reason
    }

    /// True for status codes that must not carry a body: 1xx, 204, 304.
    pub fn forbids_body(&self) -> bool {
        (self.code >= 100 && self.code < 200) || self.code == 204 || self.code == 304
    }
}

impl Status {
    pub const CONTINUE: Status = Status::new(100, "Continue");
    pub const SWITCHING_PROTOCOLS: Status = Status::new(101, "Switching Protocols");
    pub const OK: Status = Status::new(200, "OK");
    pub const CREATED: Status = Status::new(201, "Created");
    pub const NO_CONTENT: Status = Status::new(204, "No Content");
    pub const NOT_MODIFIED: Status = Status::new(304, "Not Modified");
    pub const BAD_REQUEST: Status = Status::new(400, "Bad Request");
    pub const EXPECTATION_FAILED: Status = Status::new(417, "Expectation Failed");
    pub const REQUEST_HEADER_FIELDS_TOO_LARGE: Status =
        Status::new(431, "Request Header Fields Too Large");
    pub const INTERNAL_SERVER_ERROR: Status = Status::new(500, "Internal Server Error");
}

impl Default for Status {
    fn default() -> Status {
        Status::OK
    }
}

#[cfg(test)]
mod test {
    use super::Status;

    #[test]
    fn forbids_body() {
        assert!(Status::CONTINUE.forbids_body());
        assert!(Status::NO_CONTENT.forbids_body());
        assert!(Status::NOT_MODIFIED.forbids_body());
        assert!(!Status::OK.forbids_body());
        assert!(!Status::BAD_REQUEST.forbids_body());
    }

    #[test]
    fn custom_status() {
        let s = Status::new(299, "Mostly Fine");
        assert_eq!(s.code(), 299);
        assert_eq!(s.reason(), "Mostly Fine");
        assert!(!s.forbids_body());
    }
}
