//! Logging initialization for devpulse.
//!
//! Server mode: logs to `<state>/logs/devpulse-{datetime}.log`
//! One-shot commands: log to stderr

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Keeps the non-blocking writer alive; dropping it flushes buffered logs
pub struct LoggingHandle {
    pub _guard: Option<WorkerGuard>,

    /// Set only when logging to a file
    pub log_file_path: Option<PathBuf>,
}

/// Where log output goes for a given invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// Long-running servers log to a file unless disabled in config
    pub fn resolve(config: &Config, is_server_mode: bool, now: DateTime<Utc>) -> Self {
        if is_server_mode && config.logging.to_file {
            LogTarget::File(config.logs_path().join(log_file_name(now)))
        } else {
            LogTarget::Stderr
        }
    }
}

/// `devpulse-20261016T093000Z.log`
pub fn log_file_name(now: DateTime<Utc>) -> String {
    format!("devpulse-{}.log", now.format("%Y%m%dT%H%M%SZ"))
}

/// `RUST_LOG` wins over `--debug`, which wins over the configured level
fn filter_directive(config: &Config, debug_override: bool) -> String {
    if let Ok(directive) = std::env::var("RUST_LOG") {
        return directive;
    }
    if debug_override {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    }
}

/// Install the global subscriber. Can only be called once per process.
pub fn init_logging(
    config: &Config,
    is_server_mode: bool,
    debug_override: bool,
) -> Result<LoggingHandle> {
    let filter = tracing_subscriber::EnvFilter::new(filter_directive(config, debug_override));

    match LogTarget::resolve(config, is_server_mode, Utc::now()) {
        LogTarget::File(log_file_path) => {
            let logs_dir = config.logs_path();
            std::fs::create_dir_all(&logs_dir)?;

            let file_name = log_file_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| log_file_name(Utc::now()));
            let file_appender = tracing_appender::rolling::never(&logs_dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(non_blocking),
                )
                .init();

            Ok(LoggingHandle {
                _guard: Some(guard),
                log_file_path: Some(log_file_path),
            })
        }
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();

            Ok(LoggingHandle {
                _guard: None,
                log_file_path: None,
            })
        }
    }
}
