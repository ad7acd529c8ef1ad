//! Log sink setup
//!
//! [`init_logging`] builds a [`LogHandle`]: a `tracing` dispatcher writing
//! to a file (truncated on open) with the line format
//!
//! ```text
//! [2024-05-01 12:00:00,123 checker.rs:88] - Number of images: 2
//! ```
//!
//! Nothing global is touched until the caller asks for it. Code that should
//! log through the handle runs inside [`LogHandle::in_scope`]; a binary that
//! wants it everywhere calls [`LogHandle::install_global`] once in `main`.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::config::LoggingConfig;

/// Timestamp layout, millisecond precision with a comma separator
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Errors raised while building the log sink
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Level name not recognized
    #[error("unknown log level '{0}'")]
    InvalidLevel(String),

    /// Log file could not be created
    #[error("failed to open log file {}: {source}", path.display())]
    Open {
        /// Requested log file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// `install_global` called after another subscriber was set
    #[error("a global logger is already installed")]
    AlreadyInstalled,
}

/// Parse a severity name.
///
/// Accepts `trace`, `debug`, `info`, `warn`/`warning`, `error`,
/// `critical`/`fatal` and `off`, in any case.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => Ok(LevelFilter::WARN),
        "critical" | "fatal" => Ok(LevelFilter::ERROR),
        other => LevelFilter::from_str(other)
            .map_err(|_| LoggingError::InvalidLevel(level.to_string())),
    }
}

/// `[<timestamp> <file>:<line>] - <message>`
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let file = meta
            .file()
            .and_then(|f| Path::new(f).file_name())
            .and_then(|f| f.to_str())
            .unwrap_or("<unknown>");

        write!(
            writer,
            "[{} {}:{}] - ",
            chrono::Local::now().format(TIMESTAMP_FORMAT),
            file,
            meta.line().unwrap_or(0)
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// A configured logging dispatcher
#[derive(Clone)]
pub struct LogHandle {
    dispatch: Dispatch,
    file: PathBuf,
    level: LevelFilter,
}

impl LogHandle {
    /// The underlying dispatcher
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Path of the log file
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Minimum severity written
    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Run `f` with this handle as the active dispatcher on the current thread
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Make this handle the process-wide default. Call once at startup.
    pub fn install_global(&self) -> Result<(), LoggingError> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
            .map_err(|_| LoggingError::AlreadyInstalled)
    }
}

impl fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogHandle")
            .field("file", &self.file)
            .field("level", &self.level)
            .finish()
    }
}

/// Build a logging handle from `config`.
///
/// The log file is created or truncated. The level applies both to the file
/// sink and to the dispatcher itself, so disabled events are never built.
pub fn init_logging(config: &LoggingConfig) -> Result<LogHandle, LoggingError> {
    let level = parse_level(&config.level)?;

    let file = File::create(&config.file).map_err(|source| LoggingError::Open {
        path: config.file.clone(),
        source,
    })?;

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(level);

    let console_layer = config.console.then(|| {
        tracing_subscriber::fmt::layer()
            .event_format(LineFormat)
            .with_writer(std::io::stderr)
            .with_filter(level)
    });

    let subscriber = tracing_subscriber::registry()
        .with(level)
        .with(file_layer)
        .with(console_layer);

    let handle = LogHandle {
        dispatch: Dispatch::new(subscriber),
        file: config.file.clone(),
        level,
    };

    handle.in_scope(|| {
        tracing::debug!(
            "logging initialized: file={} level={}",
            config.file.display(),
            level
        )
    });

    Ok(handle)
}
