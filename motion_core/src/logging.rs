//! `tracing` subscriber setup shared by the workspace binaries.

use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Parse a level name, falling back to `INFO`.
pub fn parse_level(level: &str) -> Level {
    level.trim().parse().unwrap_or(Level::INFO)
}

/// Install a stderr subscriber at `level`.
///
/// `RUST_LOG` takes precedence over `level`.  Calling this twice is
/// harmless; the second call leaves the first subscriber in place.
pub fn init(level: &str) {
    let filter = EnvFilter::builder()
        .with_default_directive(parse_level(level).into())
        .from_env_lossy();

    let console = fmt::layer()
        .with_writer(std::io::stderr) // stdout is reserved for CLI output
        .with_target(false)
        .with_filter(filter);

    if tracing_subscriber::registry().with(console).try_init().is_ok() {
        tracing::debug!("logging initialised at {}", level);
    }
}
