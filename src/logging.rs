use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Initialise logging. With `debug` the level is `debug` and `RUST_LOG` may
/// override it; otherwise `info` is forced. When `log_file` is given, output
/// goes to that file instead of stderr. A log file that cannot be opened
/// falls back to stderr with a warning.
///
/// Calling this more than once keeps the first subscriber.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let Some(path) = log_file else {
        let _ = builder.try_init();
        return;
    };

    match file_appender(&path) {
        Ok(appender) => {
            let _ = builder.with_writer(appender).with_ansi(false).try_init();
        }
        Err(err) => {
            let _ = builder.try_init();
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "cannot open log file; logging to stderr"
            );
        }
    }
}

fn file_appender(path: &Path) -> anyhow::Result<RollingFileAppender> {
    let (dir, name) = split_log_path(path)
        .with_context(|| format!("log path {} has no file name", path.display()))?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)?;
    Ok(appender)
}

fn split_log_path(path: &Path) -> Option<(PathBuf, String)> {
    let name = path.file_name()?.to_string_lossy().into_owned();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, name))
}
