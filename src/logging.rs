use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;

/// Level filter for the subscriber.
///
/// When debug logging is disabled we force `info` level regardless of the
/// `RUST_LOG` environment variable so a stray variable cannot make the
/// launcher verbose.
pub fn env_filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    }
}

/// Initialise logging, optionally into `file` instead of stderr.
///
/// Calling this again after a subscriber is installed does nothing.
pub fn init(debug: bool, file: Option<PathBuf>) {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(debug));

    let target = file.as_deref().and_then(|path| {
        let name = path.file_name()?.to_owned();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        Some((dir, name))
    });

    let _ = match target {
        Some((dir, name)) => builder
            .with_ansi(false)
            .with_writer(tracing_appender::rolling::never(dir, name))
            .try_init(),
        None => builder.try_init(),
    };
}
