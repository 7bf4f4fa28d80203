use std::io::Write;

use crate::connection::BufferedConnection;
use crate::error::Error;
use crate::headers::HeaderMap;
use crate::status::Status;
use crate::version::Version;

/// How a response body is delimited (spec §3 `ResponseTransfer`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseTransfer {
    None,
    ContentLength(u64),
    Chunked,
}

#[derive(Debug)]
enum EmitterState {
    /// Equivalent to the Exchange's own `Waited` state: `send()` is legal.
    Waiting,
    /// Head has been written; `write`/`finish` are legal. `suppress` is set
    /// for a `HEAD` request: the declared framing is tracked exactly as for
    /// a real response (so `Content-Length`/chunked bookkeeping still runs),
    /// but no body bytes ever reach the wire.
    Responded { transfer: ResponseTransfer, remaining: u64, suppress: bool },
    Finished,
}

/// Writes a response head and body under the strict operation ordering of
/// spec §4.5, synthesising `Connection`/`Transfer-Encoding`/`Content-Length`
/// the way the application hasn't already.
///
/// Grounded on `base_serializer::MessageState` in the teacher crate: same
/// sum-type-as-state-machine shape and the same header-synthesis
/// responsibilities (`add_length`/`add_chunked`/`done_headers`), collapsed
/// here into a single `send()` call since spec §6 has the application
/// populate `headers`/`transfer_encoding` on the Exchange *before* calling
/// `send`, rather than interleaving `add_header` calls between the status
/// line and the body the way the teacher's incremental API does. `write`
/// past a declared `Content-Length`, and `finish` before one is satisfied,
/// are recoverable `Result` errors here (`MessageTooLong`,
/// `MessageNotCompleted`) rather than the teacher's `panic!` — spec §7 lists
/// them alongside the rest of the error taxonomy, not among the
/// state-machine-violation panics.
#[derive(Debug)]
pub struct ResponseEmitter {
    state: EmitterState,
}

impl ResponseEmitter {
    pub fn new() -> ResponseEmitter {
        ResponseEmitter { state: EmitterState::Waiting }
    }

    pub fn is_responded(&self) -> bool {
        matches!(self.state, EmitterState::Responded { .. })
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, EmitterState::Finished)
    }

    /// Writes the status line and headers (spec §4.5 `send`).
    ///
    /// `headers` is the application's response header multi-map; any
    /// `Connection`, `Content-Length` or `Transfer-Encoding` entries it
    /// already contains are honoured instead of synthesised, and whatever
    /// ends up in the map (original or synthesised) is what goes on the
    /// wire. `keep_alive` is the connection-reuse decision spec §4.5 and
    /// §4.5's `reset` share. A status that forbids a body (1xx/204/304, spec
    /// §9's `Status::forbids_body`) collapses the declared framing to `None`
    /// — there is truly nothing to write. `is_head` is different: the
    /// declared framing (and its `Content-Length`/chunked header) is kept
    /// exactly as written, but `write` silently drops the bytes instead of
    /// putting them on the wire, matching a real response's bookkeeping with
    /// none of its body (spec §4.5's `HEAD` case).
    ///
    /// # Panics
    /// If called outside the `Waiting` state (a caller ordering bug, spec
    /// §4.5's "any operation outside the allowed state is a programmer
    /// error").
    pub fn send<S: Write>(
        &mut self,
        conn: &mut BufferedConnection<S>,
        version: Version,
        status: Status,
        reason: Option<&str>,
        headers: &mut HeaderMap,
        requested_transfer: ResponseTransfer,
        keep_alive: bool,
        is_head: bool,
    ) -> Result<(), Error> {
        match self.state {
            EmitterState::Waiting => {}
            ref other => panic!("send() called while emitter is {:?}", other),
        }

        if status.code() == 100 {
            let line = format!("{} 100 Continue\r\n\r\n", version);
            conn.write_all(line.as_bytes())?;
            // Stays in Waiting: the client still owes the real request.
            return Ok(());
        }

        if !headers.contains("connection") {
            headers.append("Connection", if keep_alive { "keep-alive" } else { "close" });
        }
        let transfer = resolve_framing(headers, requested_transfer)?;

        let mut head = Vec::new();
        write!(
            head,
            "{} {} {}\r\n",
            version,
            status.code(),
            reason.unwrap_or_else(|| status.reason())
        )
        .expect("writing to a Vec cannot fail");
        for (name, value) in headers.iter() {
            if value.bytes().any(|b| b == b'\r' || b == b'\n') {
                return Err(Error::InvalidHeaderValue);
            }
            write!(head, "{}: {}\r\n", name, value).expect("writing to a Vec cannot fail");
        }
        head.extend_from_slice(b"\r\n");
        conn.write_all(&head)?;

        let effective = if status.forbids_body() { ResponseTransfer::None } else { transfer };
        let remaining = match effective {
            ResponseTransfer::ContentLength(n) => n,
            _ => 0,
        };
        self.state = EmitterState::Responded { transfer: effective, remaining, suppress: is_head };
        Ok(())
    }

    /// Writes a body chunk (spec §4.5 `write`). Under `HEAD` (`suppress`)
    /// the length/chunk bookkeeping below still runs exactly as for a real
    /// body, but no bytes reach `conn`.
    pub fn write<S: Write>(
        &mut self,
        conn: &mut BufferedConnection<S>,
        bytes: &[u8],
    ) -> Result<(), Error> {
        match &mut self.state {
            EmitterState::Responded { transfer: ResponseTransfer::Chunked, suppress, .. } => {
                if bytes.is_empty() || *suppress {
                    return Ok(());
                }
                let header = format!("{:x}\r\n", bytes.len());
                conn.write_all(header.as_bytes())?;
                conn.write_all(bytes)?;
                conn.write_all(b"\r\n")
            }
            EmitterState::Responded {
                transfer: ResponseTransfer::ContentLength(_),
                remaining,
                suppress,
            } => {
                if bytes.len() as u64 > *remaining {
                    return Err(Error::MessageTooLong);
                }
                if !*suppress {
                    conn.write_all(bytes)?;
                }
                *remaining -= bytes.len() as u64;
                Ok(())
            }
            EmitterState::Responded { transfer: ResponseTransfer::None, .. } => {
                Err(Error::NotWriteable)
            }
            ref other => panic!("write() called while emitter is {:?}", other),
        }
    }

    /// Finalises the body (spec §4.5 `finish`).
    pub fn finish<S: Write>(&mut self, conn: &mut BufferedConnection<S>) -> Result<(), Error> {
        match self.state {
            EmitterState::Responded { transfer: ResponseTransfer::Chunked, suppress, .. } => {
                if !suppress {
                    conn.write_all(b"0\r\n\r\n")?;
                }
                self.state = EmitterState::Finished;
                Ok(())
            }
            EmitterState::Responded {
                transfer: ResponseTransfer::ContentLength(_),
                remaining,
                ..
            } => {
                if remaining != 0 {
                    return Err(Error::MessageNotCompleted);
                }
                self.state = EmitterState::Finished;
                Ok(())
            }
            EmitterState::Responded { transfer: ResponseTransfer::None, .. } => {
                self.state = EmitterState::Finished;
                Ok(())
            }
            ref other => panic!("finish() called while emitter is {:?}", other),
        }
    }

    /// Returns to `Waiting`, ready for the next exchange on a reused
    /// connection. Only legal once `finish()` has run.
    pub fn reset(&mut self) {
        match self.state {
            EmitterState::Finished => self.state = EmitterState::Waiting,
            ref other => panic!("reset() called while emitter is {:?}", other),
        }
    }
}

impl Default for ResponseEmitter {
    fn default() -> ResponseEmitter {
        ResponseEmitter::new()
    }
}

/// Resolves the response's body framing: headers the application already
/// set take precedence over `requested`, which is written into `headers` as
/// the corresponding synthesized header when neither is present (spec
/// §4.5).
fn resolve_framing(
    headers: &mut HeaderMap,
    requested: ResponseTransfer,
) -> Result<ResponseTransfer, Error> {
    if let Some(te) = headers.get("transfer-encoding") {
        if !te.trim().eq_ignore_ascii_case("chunked") {
            return Err(Error::UnsupportedTransferEncoding);
        }
        return Ok(ResponseTransfer::Chunked);
    }
    if let Some(cl) = headers.get("content-length") {
        let n: u64 = cl.trim().parse().map_err(|_| Error::InvalidContentLength)?;
        return Ok(ResponseTransfer::ContentLength(n));
    }
    match requested {
        ResponseTransfer::None => {}
        ResponseTransfer::ContentLength(n) => headers.append("Content-Length", n.to_string()),
        ResponseTransfer::Chunked => headers.append("Transfer-Encoding", "chunked"),
    }
    Ok(requested)
}
