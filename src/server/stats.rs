//! Process-wide benchmark counters.
//!
//! All writes happen on the reactor thread; the counters are atomic only so
//! other threads (the shutdown path, tests) can read a consistent snapshot
//! while the loop runs.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::FRAME_SIZE;

/// Connection and throughput counters for one server run.
#[derive(Debug, Default)]
pub struct Stats {
    total_connections: AtomicU64,
    active_connections: AtomicU64,
    bytes_completed: AtomicU64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_accept(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_teardown(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// One full frame was echoed back to a client.
    pub(crate) fn record_frame(&self) {
        self.bytes_completed
            .fetch_add(FRAME_SIZE as u64, Ordering::Relaxed);
    }

    /// Connections accepted over the server's lifetime.
    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    /// Connections currently in the registry.
    pub fn active_connections(&self) -> u64 {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Bytes fully echoed; always a multiple of the frame size.
    pub fn bytes_completed(&self) -> u64 {
        self.bytes_completed.load(Ordering::Relaxed)
    }

    /// Frames fully echoed across all connections.
    pub fn frames_echoed(&self) -> u64 {
        self.bytes_completed() / FRAME_SIZE as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_and_teardown_balance() {
        let stats = Stats::new();

        stats.record_accept();
        stats.record_accept();
        assert_eq!(stats.total_connections(), 2);
        assert_eq!(stats.active_connections(), 2);

        stats.record_teardown();
        assert_eq!(stats.active_connections(), 1);
        assert_eq!(stats.total_connections(), 2);

        stats.record_teardown();
        assert_eq!(stats.active_connections(), 0);
    }

    #[test]
    fn bytes_completed_counts_whole_frames() {
        let stats = Stats::new();
        for _ in 0..5 {
            stats.record_frame();
        }
        assert_eq!(stats.bytes_completed(), 5 * FRAME_SIZE as u64);
        assert_eq!(stats.bytes_completed() % FRAME_SIZE as u64, 0);
        assert_eq!(stats.frames_echoed(), 5);
    }
}
