//! The reactor: a single-threaded, zero-timeout readiness loop.
//!
//! One mio `Poll` multiplexes the listener and every client socket. The
//! poll timeout is zero, so the loop never sleeps; a fully pinned core is
//! the intended behavior of this benchmark. Building with the `poll-yield`
//! feature inserts a one-microsecond sleep per iteration instead.
//!
//! mio delivers edge-triggered notifications, so every handler drains its
//! socket to would-block or to the frame boundary before returning.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use slab::Slab;
use tracing::{debug, info, warn};

use crate::config::MAX_EVENTS;
use crate::server::connection::{Connection, DrainOutcome, FillOutcome, Phase};
use crate::server::stats::Stats;

const LISTENER_TOKEN: Token = Token(usize::MAX);

/// Whether a connection survived the event that was dispatched to it.
enum ConnStatus {
    Open,
    PeerClosed,
}

/// Run the reactor over `listener` until `stop` reads true between polls.
///
/// The listener must already be bound, listening, and non-blocking. Counter
/// updates all happen on this thread; `stats` is shared only so other
/// threads can observe progress.
pub fn serve(
    listener: std::net::TcpListener,
    stats: &Stats,
    stop: &AtomicBool,
) -> io::Result<()> {
    let mut poll = Poll::new()?;
    let mut events = Events::with_capacity(MAX_EVENTS);

    let mut listener = TcpListener::from_std(listener);
    // Registration failure on the listener is fatal; without it the server
    // can never accept anyone.
    poll.registry()
        .register(&mut listener, LISTENER_TOKEN, Interest::READABLE)?;

    let mut connections: Slab<Connection<TcpStream>> = Slab::new();
    let mut rng = SmallRng::from_os_rng();

    while !stop.load(Ordering::Relaxed) {
        // Zero timeout: busy-poll. A signal arriving mid-poll surfaces as
        // EINTR; treat it as an empty batch and re-check the flag.
        if let Err(e) = poll.poll(&mut events, Some(Duration::ZERO)) {
            if e.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(e);
        }

        for event in events.iter() {
            match event.token() {
                LISTENER_TOKEN => {
                    accept_clients(&listener, &mut poll, &mut connections, stats);
                }
                Token(conn_id) => {
                    // A token can race with teardown within one batch; the
                    // socket is already deregistered and closed, so the
                    // stale event is simply dropped.
                    if !connections.contains(conn_id) {
                        continue;
                    }
                    match drive_connection(conn_id, &mut poll, &mut connections, &mut rng, stats)
                    {
                        Ok(ConnStatus::Open) => {}
                        Ok(ConnStatus::PeerClosed) => {
                            debug!(conn_id, "client disconnected");
                            close_connection(&mut poll, &mut connections, stats, conn_id);
                        }
                        Err(e) => {
                            warn!(conn_id, error = %e, "connection error");
                            close_connection(&mut poll, &mut connections, stats, conn_id);
                        }
                    }
                }
            }
        }

        #[cfg(feature = "poll-yield")]
        std::thread::sleep(Duration::from_micros(1));
    }

    info!(
        active = connections.len(),
        "reactor stopped, dropping remaining connections"
    );
    for (_, conn) in connections.iter_mut() {
        let _ = poll.registry().deregister(conn.stream_mut());
    }
    Ok(())
}

/// Drain the accept queue. Edge-triggered: loop until would-block.
fn accept_clients(
    listener: &TcpListener,
    poll: &mut Poll,
    connections: &mut Slab<Connection<TcpStream>>,
    stats: &Stats,
) {
    loop {
        match listener.accept() {
            Ok((stream, peer_addr)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    warn!(peer = %peer_addr, error = %e, "failed to set TCP_NODELAY, dropping client");
                    continue;
                }

                let conn_id = connections.insert(Connection::new(stream));
                let conn = &mut connections[conn_id];
                if let Err(e) =
                    poll.registry()
                        .register(conn.stream_mut(), Token(conn_id), Interest::READABLE)
                {
                    warn!(conn_id, error = %e, "failed to register client socket, dropping");
                    connections.remove(conn_id);
                    continue;
                }

                stats.record_accept();
                debug!(
                    conn_id,
                    peer = %peer_addr,
                    active = stats.active_connections(),
                    "client connected"
                );
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => {
                // The individual accept failed; the listener itself is fine.
                warn!(error = %e, "accept failed");
                break;
            }
        }
    }
}

/// Drive one connection according to its phase.
///
/// Receive completion scrambles the frame and flips interest to WRITABLE
/// without writing in the same activation; the send starts on the next
/// write-readiness edge. Send completion counts the frame and flips back.
fn drive_connection(
    conn_id: usize,
    poll: &mut Poll,
    connections: &mut Slab<Connection<TcpStream>>,
    rng: &mut SmallRng,
    stats: &Stats,
) -> io::Result<ConnStatus> {
    let conn = &mut connections[conn_id];

    match conn.phase() {
        Phase::Receiving => match conn.fill()? {
            FillOutcome::WouldBlock => Ok(ConnStatus::Open),
            FillOutcome::PeerClosed => Ok(ConnStatus::PeerClosed),
            FillOutcome::Complete => {
                conn.begin_sending(rng);
                poll.registry().reregister(
                    conn.stream_mut(),
                    Token(conn_id),
                    Interest::WRITABLE,
                )?;
                Ok(ConnStatus::Open)
            }
        },
        Phase::Sending => match conn.drain()? {
            DrainOutcome::WouldBlock => Ok(ConnStatus::Open),
            DrainOutcome::Complete => {
                stats.record_frame();
                conn.begin_receiving();
                poll.registry().reregister(
                    conn.stream_mut(),
                    Token(conn_id),
                    Interest::READABLE,
                )?;
                Ok(ConnStatus::Open)
            }
        },
    }
}

/// Deregister, remove from the registry, and drop the socket.
fn close_connection(
    poll: &mut Poll,
    connections: &mut Slab<Connection<TcpStream>>,
    stats: &Stats,
    conn_id: usize,
) {
    if let Some(mut conn) = connections.try_remove(conn_id) {
        let _ = poll.registry().deregister(conn.stream_mut());
        stats.record_teardown();
        debug!(
            conn_id,
            active = stats.active_connections(),
            "connection closed"
        );
    }
}
