//! A synchronous HTTP/1.x protocol core: a per-connection request/response
//! state machine (`Exchange`) driven directly by the caller's thread, with
//! no bundled reactor, thread pool, or TLS.
//!
//! The library owns wire-protocol correctness (request parsing, chunked and
//! fixed-length framing, response emission) and leaves scheduling, sockets,
//! and dispatch to the embedding application — see [`Server`] for the
//! minimal listener wrapper and [`Exchange`] for the protocol state machine
//! itself.

#[macro_use]
extern crate quick_error;

mod body;
mod chunked;
mod compress;
mod connection;
mod head;
mod headers;
mod method;
mod request;
mod response;
mod status;
mod version;

pub mod config;
pub mod error;
pub mod exchange;
pub mod server;

pub use config::Config;
pub use error::Error;
pub use exchange::{Exchange, ResetOutcome};
pub use headers::HeaderMap;
pub use method::{Coding, Method};
pub use request::{Request, TransferEncoding};
pub use response::ResponseTransfer;
pub use server::Server;
pub use status::Status;
pub use version::Version;
