use std::env;
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_PATH: &str = "./logs/clipsync.log";

/// Install stdout + file logging. Keep the returned guard alive for the
/// lifetime of the process or buffered file output is lost.
///
/// `TRACING_LEVEL` wins over `verbose` when both are set.
pub fn init_logger(verbose: bool) -> impl Drop {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| default_filter.to_string());
    let filter_layer = EnvFilter::new(filter);

    let log_file_path = env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_PATH.to_string());

    let file_appender = tracing_appender::rolling::never("./", log_file_path);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_file(false)
                .pretty()
                .without_time()
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter_layer)
        .init();

    debug!("Tracing is configured for stdout and file logging.");

    guard
}
