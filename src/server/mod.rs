//! The echo server: listener setup plus the readiness reactor.

mod connection;
mod event_loop;
mod stats;

pub use connection::{Connection, DrainOutcome, FillOutcome, FrameBuf, Phase};
pub use event_loop::serve;
pub use stats::Stats;

use std::io;
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::info;

use crate::config::{self, FRAME_SIZE};
use crate::signal;

/// Bind a non-blocking listener with SO_REUSEADDR.
///
/// SO_REUSEADDR only releases TIME_WAIT remnants; a second live listener on
/// the same port still fails to bind.
pub fn bind_listener(addr: SocketAddr) -> io::Result<std::net::TcpListener> {
    let socket = Socket::new(
        match addr {
            SocketAddr::V4(_) => Domain::IPV4,
            SocketAddr::V6(_) => Domain::IPV6,
        },
        Type::STREAM,
        Some(Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    Ok(socket.into())
}

/// Run the server on the benchmark endpoint until SIGINT.
///
/// All setup failures (bind, listen, poll creation, signal wiring)
/// propagate out; per-connection failures are handled inside the loop.
pub fn run() -> io::Result<()> {
    signal::install_sigint()?;

    let addr = config::server_addr();
    let listener = bind_listener(addr)?;
    info!(addr = %addr, frame_size = FRAME_SIZE, "listening, press Ctrl+C to stop");

    let stats = Stats::new();
    serve(listener, &stats, signal::shutdown_flag())?;

    info!(
        total_connections = stats.total_connections(),
        frames_echoed = stats.frames_echoed(),
        kb_completed = stats.bytes_completed() / 1024,
        "server shut down"
    );
    Ok(())
}
