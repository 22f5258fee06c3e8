use crate::error::MirrorError;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber: console output plus an appending log file.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the rest of the process.
pub fn init_logging(log_level: Level, log_file: &Path) -> Result<WorkerGuard, MirrorError> {
    let setup_error = |reason: String| MirrorError::LoggingSetup {
        path: log_file.to_path_buf(),
        reason,
    };

    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| setup_error(e.to_string()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| setup_error(e.to_string()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .map_err(|e| setup_error(e.to_string()))?;

    Ok(guard)
}
