//! End-to-end scenarios over real loopback sockets.
//!
//! Each test binds an ephemeral port and runs the reactor on a background
//! thread, so tests never collide with each other or with a benchmark
//! running on the fixed port.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use spinecho::client;
use spinecho::config::FRAME_SIZE;
use spinecho::server::{bind_listener, serve, Stats};

struct TestServer {
    addr: SocketAddr,
    stats: Arc<Stats>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    fn start() -> Self {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = Arc::new(Stats::new());
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let stats = Arc::clone(&stats);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                serve(listener, &stats, &stop).expect("server loop failed");
            })
        };

        Self {
            addr,
            stats,
            stop,
            handle: Some(handle),
        }
    }

    fn connect(&self) -> TcpStream {
        let stream = TcpStream::connect(self.addr).unwrap();
        stream.set_nodelay(true).unwrap();
        stream
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
    }
}

fn wait_until(mut cond: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

#[test]
fn echoes_every_frame_and_counts_bytes() {
    let server = TestServer::start();
    let mut stream = server.connect();

    let frames = 32u64;
    let mut reply = [0u8; FRAME_SIZE];
    for i in 0..frames {
        let frame = [i as u8; FRAME_SIZE];
        stream.write_all(&frame).unwrap();
        stream.read_exact(&mut reply).unwrap();
    }

    // The client has every reply, so the server must have completed exactly
    // that many send phases once its counter catches up.
    assert!(wait_until(
        || server.stats.frames_echoed() == frames,
        Duration::from_secs(5)
    ));
    assert_eq!(server.stats.bytes_completed(), frames * FRAME_SIZE as u64);
}

#[test]
fn client_driver_sent_equals_received() {
    let server = TestServer::start();

    let summary = client::run_against(server.addr, Duration::from_millis(300)).unwrap();

    assert!(summary.frames_sent > 0);
    assert_eq!(summary.frames_sent, summary.frames_received);
    assert!(wait_until(
        || server.stats.frames_echoed() == summary.frames_received,
        Duration::from_secs(5)
    ));
}

#[test]
fn active_count_peaks_and_returns_to_zero() {
    let server = TestServer::start();

    let mut streams = Vec::new();
    for i in 0..8u8 {
        let mut stream = server.connect();
        // One echo each so every connection is fully installed and driven.
        stream.write_all(&[i; FRAME_SIZE]).unwrap();
        let mut reply = [0u8; FRAME_SIZE];
        stream.read_exact(&mut reply).unwrap();
        streams.push(stream);
    }

    assert!(wait_until(
        || server.stats.active_connections() == 8,
        Duration::from_secs(5)
    ));
    assert_eq!(server.stats.total_connections(), 8);

    drop(streams);
    assert!(wait_until(
        || server.stats.active_connections() == 0,
        Duration::from_secs(5)
    ));
    assert_eq!(server.stats.total_connections(), 8);
}

#[test]
fn disconnect_mid_frame_tears_down_exactly_once() {
    let server = TestServer::start();

    let mut stream = server.connect();
    stream.write_all(&[0xee; FRAME_SIZE / 2]).unwrap();

    assert!(wait_until(
        || server.stats.total_connections() == 1,
        Duration::from_secs(5)
    ));
    drop(stream);

    assert!(wait_until(
        || server.stats.active_connections() == 0,
        Duration::from_secs(5)
    ));
    // The partial frame was discarded, not echoed.
    assert_eq!(server.stats.frames_echoed(), 0);
    assert_eq!(server.stats.total_connections(), 1);
}

#[test]
fn stop_flag_halts_the_loop_promptly() {
    let mut server = TestServer::start();

    // A client mid-frame must not delay shutdown.
    let mut stream = server.connect();
    stream.write_all(&[0x11; FRAME_SIZE / 4]).unwrap();

    server.stop.store(true, Ordering::Relaxed);
    let handle = server.handle.take().unwrap();

    let joined = Arc::new(AtomicBool::new(false));
    let watcher = {
        let joined = Arc::clone(&joined);
        thread::spawn(move || {
            handle.join().unwrap();
            joined.store(true, Ordering::Relaxed);
        })
    };
    assert!(wait_until(
        || joined.load(Ordering::Relaxed),
        Duration::from_secs(5)
    ));
    watcher.join().unwrap();
}

#[test]
fn second_listener_on_same_port_fails() {
    let first = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = first.local_addr().unwrap();

    let second = bind_listener(addr);
    assert!(second.is_err());

    // The first listener is unaffected and still accepts.
    let stats = Arc::new(Stats::new());
    let stop = Arc::new(AtomicBool::new(false));
    let handle = {
        let stats = Arc::clone(&stats);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            serve(first, &stats, &stop).expect("server loop failed");
        })
    };

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(&[0x42; FRAME_SIZE]).unwrap();
    let mut reply = [0u8; FRAME_SIZE];
    stream.read_exact(&mut reply).unwrap();

    stop.store(true, Ordering::Relaxed);
    handle.join().unwrap();
    assert_eq!(stats.frames_echoed(), 1);
}
