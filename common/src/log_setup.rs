use std::path::Path;
use std::sync::OnceLock;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LogSetupError {
    #[error("Invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },
    #[error("Failed to prepare log directory '{path}': {reason}")]
    Directory { path: String, reason: String },
    #[error("Logger initialization failed: {0}")]
    Init(String),
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides `base_level`. Console output always goes to stdout
/// (WARN and above also to stderr); a daily rolling file is added when
/// `log_dir` is given.
pub fn setup_logging(base_level: &str, log_dir: Option<&Path>) -> Result<(), LogSetupError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(base_level))
        .map_err(|e| LogSetupError::Filter {
            filter: base_level.to_string(),
            reason: e.to_string(),
        })?;

    let console_writer = std::io::stdout.and(std::io::stderr.with_max_level(Level::WARN));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(true)
        .with_writer(console_writer);

    let file_layer = match log_dir {
        Some(dir) => {
            let dir_error = |reason: String| LogSetupError::Directory {
                path: dir.display().to_string(),
                reason,
            };
            std::fs::create_dir_all(dir).map_err(|e| dir_error(e.to_string()))?;

            let file_appender = tracing_appender::rolling::Builder::new()
                .rotation(tracing_appender::rolling::Rotation::DAILY)
                .filename_prefix("bargal")
                .filename_suffix("log")
                .max_log_files(5)
                .build(dir)
                .map_err(|e| dir_error(e.to_string()))?;

            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            LOG_GUARD
                .set(guard)
                .map_err(|_| LogSetupError::Init("logging already initialized".to_string()))?;

            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false)
                    .with_writer(file_writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LogSetupError::Init(e.to_string()))
}
