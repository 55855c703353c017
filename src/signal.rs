//! SIGINT wiring for the server.
//!
//! The handler does exactly one async-signal-safe thing: store `true` into a
//! static atomic. The reactor observes the flag between polls; an EINTR'd
//! poll is treated as an empty batch, so shutdown is picked up within one
//! loop iteration.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigint(_signum: libc::c_int) {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

/// Install the SIGINT handler.
pub fn install_sigint() -> io::Result<()> {
    // SAFETY: the handler only performs an atomic store into a static flag,
    // which is async-signal-safe.
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = on_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t;
        libc::sigemptyset(&mut sa.sa_mask);
        sa.sa_flags = 0;
        if libc::sigaction(libc::SIGINT, &sa, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// The termination flag the reactor polls between event batches.
pub fn shutdown_flag() -> &'static AtomicBool {
    &SHUTDOWN
}
