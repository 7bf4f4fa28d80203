use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

/// A thin wrapper over `std::net::TcpListener` (spec §10.5): no thread pool,
/// no async runtime, no TLS. The caller accepts a connection, then builds an
/// [`crate::exchange::Exchange`] over the returned stream itself — the
/// listener's only job is the bind/accept loop.
///
/// Grounded on the teacher's framing of the listener as "thin wrappers over
/// operating-system primitives" (`server/mod.rs`'s `Config`, which
/// configures the *protocol*, never the socket).
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Binds and starts listening on `address`.
    pub fn listen<A: ToSocketAddrs>(address: A) -> io::Result<Server> {
        let listener = TcpListener::bind(address)?;
        Ok(Server { listener })
    }

    /// Accepts the next incoming connection, handing back the raw stream and
    /// the peer's address. Blocks the calling thread.
    pub fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        self.listener.accept()
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
