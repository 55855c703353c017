//! spinecho-server: the echo side of the benchmark.
//!
//! Takes no arguments; log verbosity comes from `RUST_LOG`. Exits zero on
//! signal-driven shutdown and non-zero on setup failure.

use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    spinecho::server::run()?;
    Ok(())
}
