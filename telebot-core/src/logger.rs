//! Logging initialization: `YYYY-MM-DD HH:MM:SS LEVEL target: message key=value` lines on stdout,
//! optionally teed to an append-only log file (no ANSI codes so the file stays plain text).

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::{FmtSpan, Writer},
    fmt::time::FormatTime,
    fmt::writer::MakeWriterExt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

struct ChronoLocal;

impl FormatTime for ChronoLocal {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let t = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        write!(w, "{} ", t)
    }
}

/// Installs the global tracing subscriber.
///
/// Level comes from `RUST_LOG` (default `info`). When `log_file` is given, its parent directory
/// is created and every line is also appended to the file. Load `.env` before calling.
pub fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let event_format = tracing_subscriber::fmt::format()
        .with_timer(ChronoLocal)
        .with_level(true)
        .with_target(true)
        .with_thread_ids(false);

    let registry = Registry::default().with(env_filter);

    let result = match log_file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
            let file = Arc::new(OpenOptions::new().create(true).append(true).open(path)?);
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stdout.and(file))
                .event_format(event_format)
                .with_span_events(FmtSpan::NONE)
                .with_ansi(false);
            registry.with(fmt_layer).try_init()
        }
        None => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stdout)
                .event_format(event_format)
                .with_span_events(FmtSpan::NONE)
                .with_ansi(false);
            registry.with(fmt_layer).try_init()
        }
    };

    result.map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))
}
