use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the logging system with console output and a daily JSON file under `logs/`.
///
/// The returned guard flushes the file writer when dropped; hold it until the process exits.
pub fn init_logging() -> WorkerGuard {
    init_logging_in("logs")
}

pub fn init_logging_in(dir: impl AsRef<Path>) -> WorkerGuard {
    let dir = dir.as_ref();
    // Ensure logs directory exists
    let _ = fs::create_dir_all(dir);

    // Daily-rotated JSON log next to the human-readable console output
    let file_appender = tracing_appender::rolling::daily(dir, "roster_sync.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    // Console goes to stderr so stdout stays clean for banners and previews
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    // Respect RUST_LOG if set; otherwise info for our crate
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("roster_sync=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
