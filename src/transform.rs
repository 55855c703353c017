//! The echo transform: per-byte XOR with a random byte stream.
//!
//! Applied in place at the receive-to-send boundary on the server. The
//! transform is an involution: scrambling twice with identically seeded
//! generators restores the original bytes. It carries no meaning beyond
//! making the reply differ from the request; it is not cryptography.
//!
//! The generator is owned by the caller (the reactor thread or a test), so
//! there is no process-global RNG to race on.

use rand::RngCore;

/// XOR every byte of `buf` with an independently drawn random byte.
pub fn scramble(buf: &mut [u8], rng: &mut impl RngCore) {
    for byte in buf.iter_mut() {
        *byte ^= rng.next_u32() as u8;
    }
}
