//! Tracing setup: one fmt layer (level, target, span close, all fields) written to both stdout and a log file.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Filter used when `RUST_LOG` is unset: SDK crates at `info`, HTTP internals quieted to `warn`.
pub const DEFAULT_LOG_FILTER: &str =
    "info,rbot_core=info,rbot_dispatch=info,rbot_rubika=info,hyper=warn,hyper_util=warn,reqwest=warn";

/// Installs the global tracing subscriber.
/// Output is teed to stdout and `log_file_path` (append mode, no ANSI colors; parent directories
/// are created). The filter comes from `RUST_LOG` (e.g. `rbot_dispatch=debug`), else
/// [`DEFAULT_LOG_FILTER`]. Load `.env` (dotenvy) before calling this, or `RUST_LOG` from it will
/// not apply.
pub fn init_tracing(log_file_path: &str) -> anyhow::Result<()> {
    let file = Arc::new(open_log_file(Path::new(log_file_path))?);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout.and(file))
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    Registry::default()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn test_open_log_file_appends() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("bot.log");
        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_init_tracing_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bot.log");
        let path_str = path.to_str().unwrap();

        // A second global init in the same process fails; only the file side effect is asserted.
        let _ = init_tracing(path_str);

        assert!(path.exists());
    }
}
