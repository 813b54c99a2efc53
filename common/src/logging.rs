//! Tracing setup for the bot binary.
//!
//! The library only emits events; installing a subscriber is left to binaries.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. Output goes to stderr so it doesn't
/// interleave with the board printed on stdout.
///
/// ```bash
/// RUST_LOG=minesweeper_ai=debug cargo run -- --seed 7
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
