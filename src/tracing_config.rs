use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Console (INFO+) and daily-rolling file (DEBUG+) logging.
///
/// Keep the returned guard alive for the whole program; dropping it flushes and
/// stops the background file writer.
pub fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    // ./logs/book_backend.log.YYYY-MM-DD
    let file_appender = rolling::daily("./logs", "book_backend.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_filter(EnvFilter::new("debug"));

    // RUST_LOG overrides the console level
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(false)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Tracing initialized (console=INFO+, file=DEBUG+)");

    guard
}
