//! Logging configuration and setup for the Eventra platform core.
//!
//! Services emit their own structured `tracing` events inline; this module
//! only wires up the subscriber and the rolling file writer.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Guard that keeps the non-blocking file writer alive for the process lifetime
pub struct LogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Initialize logging based on configuration
pub fn init_logging(config: &LoggingConfig) -> Result<LogGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "eventra.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(LogGuard { _guard: guard })
}
