//! C12: structured logging init.
//!
//! The collector runs detached from a terminal, so its log destination is
//! always a file (`logs/daemon.log` by default), never stdout. The viewer,
//! being interactive, does not install this subscriber at all — writing
//! tracing output into the same terminal ratatui owns would corrupt the
//! display.

use crate::config::LogLevel;
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Handle that must be kept alive for the lifetime of the process; dropping
/// it stops the non-blocking writer's background thread and silently
/// truncates any buffered log lines.
pub struct LoggingGuard {
    _appender_guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Install a file-backed subscriber with `level` as the floor, honoring
/// `RUST_LOG` if set (matches the env-first convention used across this
/// codebase's other binaries).
pub fn init_file_logging(log_file: &Path, level: LogLevel) -> std::io::Result<LoggingGuard> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = log_file.parent().unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "daemon.log".to_string());
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_tracing_filter()));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    Ok(LoggingGuard {
        _appender_guard: guard,
    })
}
