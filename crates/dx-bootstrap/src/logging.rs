//! Per-owner file logging.
//!
//! Every [`LoggerHandle`] owns a private `tracing` dispatcher: a registry
//! whose own level is DEBUG, carrying one file layer filtered at the sink
//! threshold (DEBUG when verbose, INFO otherwise). Records are emitted only
//! through that dispatcher, so they never reach a process-wide subscriber
//! and two owners never write into each other's files.
//!
//! Each record is one line: `MM-DD HH:MM:SS <message>`.

use std::collections::HashMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::sync::{Arc, Mutex};

use camino::{Utf8Path, Utf8PathBuf};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::field::{Field, Visit};
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, Registry};

use crate::arguments::Arguments;
use crate::errors::LoggerError;
use crate::paths::root_relative;

/// Level of the logger itself; the sink threshold does the filtering.
pub const LOGGER_LEVEL: LevelFilter = LevelFilter::DEBUG;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month]-[day] [hour]:[minute]:[second]");

/// Source of record timestamps.
pub trait RecordClock: Send + Sync {
    /// Current instant, in the offset records should be written in.
    fn now(&self) -> OffsetDateTime;
}

/// Clock reading local time, falling back to UTC when the local offset is
/// unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl RecordClock for LocalClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

/// Event formatter writing `MM-DD HH:MM:SS <message>` lines.
struct RecordFormat {
    clock: Arc<dyn RecordClock>,
}

impl<S, N> FormatEvent<S, N> for RecordFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = self
            .clock
            .now()
            .format(TIMESTAMP_FORMAT)
            .map_err(|_| fmt::Error)?;
        let mut message = MessageVisitor::default();
        event.record(&mut message);
        writeln!(writer, "{timestamp} {}", message.text)
    }
}

/// Collects the `message` field and ignores every other field.
#[derive(Default)]
struct MessageVisitor {
    text: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.text);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.text = format!("{value:?}");
        }
    }
}

/// Severity of an emitted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Diagnostic detail, written only when verbose.
    Debug,
    /// Routine progress.
    Info,
    /// Something unexpected that did not stop the front end.
    Warn,
    /// A failed operation.
    Error,
    /// A failure the front end cannot continue from.
    Critical,
}

/// Named logger bound to one owner, with exactly one file sink.
///
/// Cloning yields another handle to the same logger and sink.
#[derive(Clone)]
pub struct LoggerHandle {
    name: Arc<str>,
    path: Utf8PathBuf,
    threshold: LevelFilter,
    dispatch: Dispatch,
}

impl fmt::Debug for LoggerHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LoggerHandle")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl LoggerHandle {
    /// Owner name the logger is bound to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved path of the file sink.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Severity threshold of the file sink.
    #[must_use]
    pub const fn threshold(&self) -> LevelFilter {
        self.threshold
    }

    /// Writes a debug record.
    pub fn debug(&self, message: impl fmt::Display) {
        self.emit(Severity::Debug, &message);
    }

    /// Writes an informational record.
    pub fn info(&self, message: impl fmt::Display) {
        self.emit(Severity::Info, &message);
    }

    /// Writes a warning record.
    pub fn warn(&self, message: impl fmt::Display) {
        self.emit(Severity::Warn, &message);
    }

    /// Writes an error record.
    pub fn error(&self, message: impl fmt::Display) {
        self.emit(Severity::Error, &message);
    }

    /// Writes a critical record. The sink filters it like an error.
    pub fn critical(&self, message: impl fmt::Display) {
        self.emit(Severity::Critical, &message);
    }

    /// Writes a record at `severity`.
    pub fn emit(&self, severity: Severity, message: &dyn fmt::Display) {
        tracing::dispatcher::with_default(&self.dispatch, || match severity {
            Severity::Debug => tracing::debug!("{message}"),
            Severity::Info => tracing::info!("{message}"),
            Severity::Warn => tracing::warn!("{message}"),
            Severity::Error => tracing::error!("{message}"),
            Severity::Critical => tracing::error!(critical = true, "{message}"),
        });
    }
}

/// Sink threshold for the verbose flag.
#[must_use]
pub const fn sink_threshold(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

/// Builds the logger for `owner` using the log-file and verbosity arguments.
///
/// Relative log paths are rooted at `working_directory`; absolute ones are
/// used verbatim. The file is opened for appending and created if missing.
///
/// # Errors
///
/// Returns [`LoggerError::OpenSink`] when the log file cannot be opened.
pub fn bind_logger(
    owner: &str,
    arguments: &Arguments,
    working_directory: &Utf8Path,
) -> Result<LoggerHandle, LoggerError> {
    bind_logger_with_clock(owner, arguments, working_directory, Arc::new(LocalClock))
}

/// [`bind_logger`] with an explicit timestamp source.
///
/// # Errors
///
/// Returns [`LoggerError::OpenSink`] when the log file cannot be opened.
pub fn bind_logger_with_clock(
    owner: &str,
    arguments: &Arguments,
    working_directory: &Utf8Path,
    clock: Arc<dyn RecordClock>,
) -> Result<LoggerHandle, LoggerError> {
    let path = root_relative(working_directory, arguments.log_file());
    let file = open_sink(&path)?;
    let threshold = sink_threshold(arguments.verbose());

    let sink = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .event_format(RecordFormat { clock })
        .with_filter(threshold);
    let subscriber = Registry::default().with(LOGGER_LEVEL).with(sink);

    Ok(LoggerHandle {
        name: Arc::from(owner),
        path,
        threshold,
        dispatch: Dispatch::new(subscriber),
    })
}

fn open_sink(path: &Utf8Path) -> Result<File, LoggerError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggerError::OpenSink {
            path: path.to_path_buf(),
            source,
        })
}

/// Explicitly owned set of loggers keyed by owner name.
///
/// Hosts that bootstrap several owners in one process keep one registry and
/// ask it for loggers; binding an owner a second time returns the existing
/// handle instead of attaching another sink.
#[derive(Debug, Default)]
pub struct LoggerRegistry {
    loggers: HashMap<String, LoggerHandle>,
}

impl LoggerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the logger for `owner`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::OpenSink`] when a new sink cannot be opened.
    pub fn bind(
        &mut self,
        owner: &str,
        arguments: &Arguments,
        working_directory: &Utf8Path,
    ) -> Result<LoggerHandle, LoggerError> {
        if let Some(existing) = self.loggers.get(owner) {
            return Ok(existing.clone());
        }
        let handle = bind_logger(owner, arguments, working_directory)?;
        self.loggers.insert(owner.to_owned(), handle.clone());
        Ok(handle)
    }

    /// Logger previously bound for `owner`.
    #[must_use]
    pub fn get(&self, owner: &str) -> Option<&LoggerHandle> {
        self.loggers.get(owner)
    }

    /// Number of bound loggers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    /// Whether no logger has been bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}
