//! Tracing setup: console on stderr, plus an optional log file.

use std::path::Path;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `verbose`. The returned guard flushes the file
/// writer on drop and must live until the program exits.
pub fn init(verbose: bool, file: Option<&Path>) -> Option<WorkerGuard> {
    let default = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match file.and_then(file_appender) {
        Some(appender) => {
            let (writer, guard) = non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

/// A non-rotating appender for `path`, or `None` if its directory cannot be created.
fn file_appender(path: &Path) -> Option<tracing_appender::rolling::RollingFileAppender> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let name = path.file_name()?;
    std::fs::create_dir_all(dir).ok()?;
    Some(tracing_appender::rolling::never(dir, name))
}
