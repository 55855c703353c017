//! spinecho-client: the driving side of the benchmark.

use std::time::Duration;

use clap::Parser;
use spinecho::client::{self, Summary};
use tracing_subscriber::EnvFilter;

/// Busy-polling TCP loopback benchmark client
#[derive(Parser, Debug)]
#[command(name = "spinecho-client")]
#[command(about = "Saturates a core echoing frames against spinecho-server", long_about = None)]
struct CliArgs {
    /// How long to run, in seconds
    #[arg(default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    duration_seconds: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let summary = client::run(Duration::from_secs(args.duration_seconds))?;

    println!(
        "Completed in {:.2} seconds",
        summary.elapsed.as_secs_f64()
    );
    println!(
        "Sent {} frames ({} KB)",
        summary.frames_sent,
        Summary::kilobytes(summary.frames_sent)
    );
    println!(
        "Received {} frames ({} KB)",
        summary.frames_received,
        Summary::kilobytes(summary.frames_received)
    );
    Ok(())
}
