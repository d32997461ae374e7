//! Error taxonomy for the bootstrap sequence.
//!
//! Nothing in this crate terminates the process. Launchers inspect
//! [`BootstrapError::exit_code`] and decide how to exit.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::configuration::ParseError;
use crate::variant::Variant;

/// Exit code used for every non-usage bootstrap failure.
pub const FAILURE_EXIT_CODE: u8 = 1;

/// Errors surfaced while bootstrapping a front end.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The command line did not match the variant's schema.
    #[error("{0}")]
    Usage(clap::Error),
    /// A stage was invoked before the stage it depends on.
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    /// The configuration file was missing, malformed, or incomplete.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The log sink could not be attached.
    #[error(transparent)]
    Logger(#[from] LoggerError),
    /// The current working directory could not be read.
    #[error("failed to read the current working directory: {source}")]
    WorkingDirectory {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The current working directory is not valid UTF-8.
    #[error("working directory '{}' is not valid UTF-8", path.display())]
    NonUtf8WorkingDirectory {
        /// The offending directory.
        path: PathBuf,
    },
}

impl BootstrapError {
    /// Process exit code matching this failure.
    ///
    /// Usage errors keep the argument parser's own convention; everything
    /// else exits with [`FAILURE_EXIT_CODE`].
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Usage(error) => u8::try_from(error.exit_code())
                .map_or(ExitCode::FAILURE, ExitCode::from),
            _ => ExitCode::from(FAILURE_EXIT_CODE),
        }
    }
}

/// Ordering violations in the calling front end.
///
/// These indicate a defect in the caller rather than bad user input.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionError {
    /// No arguments have been parsed yet.
    #[error("arguments not found")]
    ArgumentsNotFound,
    /// The parsed arguments carry no configuration file path.
    #[error("arguments not found: {variant} arguments carry no configuration file")]
    MissingConfigurationPath {
        /// Variant whose schema lacks a configuration path.
        variant: Variant,
    },
}

/// Fatal configuration failures.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The configuration file does not exist.
    #[error("Configuration file not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: Utf8PathBuf,
    },
    /// The configuration file exists but could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The configuration file is not well-formed key-grouped text.
    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        /// Path that was parsed.
        path: Utf8PathBuf,
        /// Reader error with its line number.
        #[source]
        source: ParseError,
    },
    /// A section the variant consumes is absent.
    #[error("configuration file {path} lacks required section [{section}]")]
    MissingSection {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Name of the missing section.
        section: &'static str,
    },
    /// A key needed to derive a value is absent.
    #[error("configuration file {path} lacks required key '{key}' in [{section}]")]
    MissingKey {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Section that was searched.
        section: &'static str,
        /// Missing key.
        key: &'static str,
    },
}

/// Failures attaching the file sink.
#[derive(Debug, Error)]
pub enum LoggerError {
    /// The log file could not be opened for appending.
    #[error("failed to open log file {path}: {source}")]
    OpenSink {
        /// Resolved log file path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
