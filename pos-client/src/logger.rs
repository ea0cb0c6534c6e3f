//! Logging Infrastructure
//!
//! Console output plus, when a directory is given, daily rotating log files
//! (the newest 14 are kept). `RUST_LOG` overrides the configured level.

use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_PREFIX: &str = "pos-sync";
const MAX_LOG_FILES: usize = 14;

/// Initialize the global subscriber
///
/// # Arguments
/// * `level` - Log level when `RUST_LOG` is unset (e.g. "info", "debug")
/// * `json_format` - JSON lines instead of human-readable output
/// * `log_dir` - Optional directory for rotating log files
pub fn init_logger(level: &str, json_format: bool, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            Some(
                RollingFileAppender::builder()
                    .rotation(Rotation::DAILY)
                    .filename_prefix(LOG_FILE_PREFIX)
                    .filename_suffix("log")
                    .max_log_files(MAX_LOG_FILES)
                    .build(dir)?,
            )
        }
        None => None,
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    if json_format {
        let console_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true);
        let file_layer = file_appender.map(|appender| {
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_writer(appender)
        });

        registry.with(console_layer).with(file_layer).try_init()?;
    } else {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        let file_layer = file_appender.map(|appender| {
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(appender)
        });

        registry.with(console_layer).with(file_layer).try_init()?;
    }

    Ok(())
}
