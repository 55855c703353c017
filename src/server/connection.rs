//! Per-connection half-duplex state machine.
//!
//! A connection oscillates between two phases: accumulate one full frame
//! from the socket, scramble it in place, then drain the frame back out.
//! Progress within the current phase is a byte count into a fixed-size
//! buffer; phases flip exactly when it reaches the frame boundary.
//!
//! Readiness notification is edge-triggered, so both the fill and drain
//! loops keep issuing syscalls until they hit the frame boundary or a
//! would-block result. Returning any earlier would leave the socket armed
//! but silent.

use std::io::{self, Read, Write};

use rand::RngCore;

use crate::config::FRAME_SIZE;
use crate::transform::scramble;

/// Which half-duplex direction the connection is currently servicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Receiving,
    Sending,
}

/// Result of one fill pass over a readable socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// A full frame is buffered.
    Complete,
    /// No more data right now; progress is preserved for the next edge.
    WouldBlock,
    /// The peer closed in an orderly fashion; the partial frame is discarded.
    PeerClosed,
}

/// Result of one drain pass over a writable socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The full frame went out.
    Complete,
    /// The socket stopped accepting bytes; resume on the next edge.
    WouldBlock,
}

/// One frame's worth of buffer plus the progress cursor for the current
/// phase.
#[derive(Debug)]
pub struct FrameBuf {
    buf: [u8; FRAME_SIZE],
    progress: usize,
}

impl FrameBuf {
    pub fn new() -> Self {
        Self {
            buf: [0; FRAME_SIZE],
            progress: 0,
        }
    }

    /// Bytes transferred in the current phase; never exceeds `FRAME_SIZE`.
    pub fn progress(&self) -> usize {
        self.progress
    }

    /// Reset the cursor at a phase boundary.
    pub fn reset(&mut self) {
        self.progress = 0;
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Read into the unfilled tail of the buffer until the frame completes
    /// or the reader would block.
    pub fn fill_from(&mut self, reader: &mut impl Read) -> io::Result<FillOutcome> {
        while self.progress < FRAME_SIZE {
            match reader.read(&mut self.buf[self.progress..]) {
                Ok(0) => return Ok(FillOutcome::PeerClosed),
                Ok(n) => self.progress += n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(FillOutcome::WouldBlock)
                }
                Err(e) => return Err(e),
            }
        }
        Ok(FillOutcome::Complete)
    }

    /// Write the unsent tail of the buffer until the frame completes or the
    /// writer would block.
    pub fn drain_to(&mut self, writer: &mut impl Write) -> io::Result<DrainOutcome> {
        while self.progress < FRAME_SIZE {
            match writer.write(&self.buf[self.progress..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "socket accepted zero bytes",
                    ))
                }
                Ok(n) => self.progress += n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(DrainOutcome::WouldBlock)
                }
                Err(e) => return Err(e),
            }
        }
        Ok(DrainOutcome::Complete)
    }
}

impl Default for FrameBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// A single client connection: its socket, frame buffer, and phase.
///
/// Generic over the stream so the state machine can be driven by in-memory
/// streams in tests; the event loop instantiates it with `mio::net::TcpStream`.
#[derive(Debug)]
pub struct Connection<S> {
    stream: S,
    frame: FrameBuf,
    phase: Phase,
}

impl<S> Connection<S> {
    /// New connections start life receiving at offset zero.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            frame: FrameBuf::new(),
            phase: Phase::Receiving,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn progress(&self) -> usize {
        self.frame.progress()
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Flip to `Sending`: scramble the completed frame in place and reset
    /// the cursor. The caller pairs this with a reregister for write
    /// readiness; the actual write waits for the next edge.
    pub fn begin_sending(&mut self, rng: &mut impl RngCore) {
        debug_assert_eq!(self.frame.progress(), FRAME_SIZE);
        scramble(self.frame.as_mut_slice(), rng);
        self.frame.reset();
        self.phase = Phase::Sending;
    }

    /// Flip back to `Receiving` after a fully sent frame. The caller pairs
    /// this with a reregister for read readiness.
    pub fn begin_receiving(&mut self) {
        debug_assert_eq!(self.frame.progress(), FRAME_SIZE);
        self.frame.reset();
        self.phase = Phase::Receiving;
    }
}

impl<S: Read + Write> Connection<S> {
    /// Drive the receive phase on a read-ready socket.
    pub fn fill(&mut self) -> io::Result<FillOutcome> {
        debug_assert_eq!(self.phase, Phase::Receiving);
        self.frame.fill_from(&mut self.stream)
    }

    /// Drive the send phase on a write-ready socket.
    pub fn drain(&mut self) -> io::Result<DrainOutcome> {
        debug_assert_eq!(self.phase, Phase::Sending);
        self.frame.drain_to(&mut self.stream)
    }
}
