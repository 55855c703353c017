//! Shared compile-time configuration for both peers.
//!
//! The benchmark runs on a fixed loopback endpoint; there is no config file
//! or environment surface. Everything both binaries must agree on lives
//! here.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Address the server binds and the client connects to.
pub const SERVER_IP: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// TCP port for the benchmark endpoint.
pub const SERVER_PORT: u16 = 10_001;

/// Size of one frame in bytes. The wire protocol is nothing but an unending
/// stream of frames this size; there is no header or delimiter.
pub const FRAME_SIZE: usize = 16;

/// Capacity of one poll batch in the server's event loop.
pub const MAX_EVENTS: usize = 64;

/// The benchmark endpoint as a socket address.
pub fn server_addr() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(SERVER_IP, SERVER_PORT))
}
