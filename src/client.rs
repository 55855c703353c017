//! The benchmark client: a deadline-bounded busy send/recv loop.
//!
//! One blocking connect, then the socket goes non-blocking with Nagle
//! disabled and the driver spins: fill a frame with random bytes, write it
//! out treating would-block as an immediate retry, then read the reply the
//! same way. There are no yields; the client pins a core just like the
//! server does.
//!
//! The deadline is only checked between frames, so a started frame is
//! always fully sent (or the connection errors out) before the loop exits.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use tracing::info;

use crate::config::{self, FRAME_SIZE};

/// Frame counters for one benchmark run.
#[derive(Debug, Clone, Copy)]
pub struct Summary {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub elapsed: Duration,
}

impl Summary {
    /// Kilobytes represented by `frames` full frames.
    pub fn kilobytes(frames: u64) -> u64 {
        frames * FRAME_SIZE as u64 / 1024
    }
}

/// Run the benchmark against the standard endpoint.
pub fn run(duration: Duration) -> io::Result<Summary> {
    run_against(config::server_addr(), duration)
}

/// Run the benchmark against an explicit address (tests use ephemeral
/// ports).
pub fn run_against(addr: SocketAddr, duration: Duration) -> io::Result<Summary> {
    info!(addr = %addr, "connecting");
    let mut stream = TcpStream::connect(addr)?;
    stream.set_nodelay(true)?;
    stream.set_nonblocking(true)?;
    info!(secs = duration.as_secs_f64(), "connected, starting benchmark");

    let mut rng = SmallRng::from_os_rng();
    let mut frame = [0u8; FRAME_SIZE];

    let start = Instant::now();
    let deadline = start + duration;
    let mut frames_sent = 0u64;
    let mut frames_received = 0u64;

    while Instant::now() < deadline {
        rng.fill_bytes(&mut frame);
        send_frame(&mut stream, &frame)?;
        frames_sent += 1;

        recv_frame(&mut stream, &mut frame)?;
        frames_received += 1;
    }

    Ok(Summary {
        frames_sent,
        frames_received,
        elapsed: start.elapsed(),
    })
}

/// Busy-write one frame; would-block retries immediately.
fn send_frame(stream: &mut TcpStream, frame: &[u8; FRAME_SIZE]) -> io::Result<()> {
    let mut sent = 0;
    while sent < FRAME_SIZE {
        match stream.write(&frame[sent..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "socket accepted zero bytes",
                ))
            }
            Ok(n) => sent += n,
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Busy-read one frame; a server-side close mid-benchmark is fatal.
fn recv_frame(stream: &mut TcpStream, frame: &mut [u8; FRAME_SIZE]) -> io::Result<()> {
    let mut received = 0;
    while received < FRAME_SIZE {
        match stream.read(&mut frame[received..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by server",
                ))
            }
            Ok(n) => received += n,
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
