use std::env;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

// The pipeline crates log at debug during reconciliation runs; everything
// else (walkdir, the exif reader) stays at info unless TRACING_LEVEL says
// otherwise.
const DEFAULT_FILTER: &str = "info,media_catalog_core=debug,media_catalog=debug";

/// Stdout gets a terse human-readable stream; the full record, including
/// targets and timestamps, goes to the log file. Returns the appender
/// guard, which must stay alive for the file writer to flush.
pub fn init_logger() -> impl Drop {
    let filter_layer = env::var("TRACING_LEVEL")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| "./logs/media-catalog.log".to_string());

    let file_appender = tracing_appender::rolling::never("./", &log_file_path);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_file(false)
                .without_time()
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter_layer)
        .init();

    info!("Logging to stdout and {}", log_file_path);

    guard
}
