//! spinecho: a CPU-saturating TCP loopback echo benchmark.
//!
//! Two cooperating programs share this library:
//! - `spinecho-server`: a single-threaded, edge-triggered readiness reactor
//!   that reads fixed-size frames, XOR-scrambles them with random bytes, and
//!   echoes them back.
//! - `spinecho-client`: a driver that busy-spins a send-one-frame /
//!   receive-one-frame loop against the server for a wall-clock duration.
//!
//! Both peers busy-poll by design: the server's poll timeout is zero and the
//! client retries would-block immediately, so each fully occupies one core
//! while running. The point is to exercise the networking stack and
//! scheduler under a tight request/response loop, not to be a useful
//! protocol.

pub mod client;
pub mod config;
pub mod server;
pub mod signal;
pub mod transform;
