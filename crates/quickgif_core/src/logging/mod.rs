//! Logging infrastructure for Quick GIF.
//!
//! This module provides:
//! - Application-wide `tracing` setup (stderr, optional rolling log file)
//! - Per-job loggers with file + callback output
//! - A bounded tail of encoder output for failure reports
//!
//! # Example
//!
//! ```no_run
//! use quickgif_core::logging::{JobLogger, LogConfig, OutputStream};
//!
//! let logger = JobLogger::new("job_123", "/tmp/quickgif/logs", LogConfig::default(), None).unwrap();
//! logger.phase("Stage");
//! logger.command("ffmpeg -y -framerate 15 ...");
//! logger.output_line("frame=  10 fps=0.0", OutputStream::Stderr);
//! logger.success("GIF created");
//! ```

mod job_logger;
mod types;

pub use job_logger::JobLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix, OutputStream};

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// - Respects `RUST_LOG`, falling back to `default_level`
/// - Writes to stderr
/// - Also writes to `<log_dir>/quickgif.<date>.log` (daily rolling) when a
///   directory is given; keep the returned guard alive to flush it
///
/// Call once at startup. If the log directory cannot be used, logging
/// continues on stderr only.
pub fn init_tracing(default_level: LogLevel, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    let appender = log_dir.map(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("quickgif")
            .filename_suffix("log")
            .build(dir)
    });

    match appender {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer().with_writer(writer).with_ansi(false);

            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .with(filter)
                .init();
            Some(guard)
        }
        Some(Err(e)) => {
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(filter)
                .init();
            tracing::warn!("File logging disabled: {}", e);
            None
        }
        None => {
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(filter)
                .init();
            None
        }
    }
}

fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}
