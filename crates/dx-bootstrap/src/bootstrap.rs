//! The bootstrap manager owned by each front end.

use std::ffi::OsString;

use camino::{Utf8Path, Utf8PathBuf};

use crate::arguments::{self, Arguments};
use crate::configuration::{self, Configuration};
use crate::errors::{BootstrapError, PreconditionError};
use crate::health::{BootstrapReporter, StructuredReporter};
use crate::logging::{self, LoggerHandle};
use crate::paths::current_working_directory;
use crate::variant::Variant;

/// Result of a bootstrap invocation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The owner matched no variant, or argument parsing was disabled.
    Skipped,
    /// Every stage the variant needs has run.
    Completed {
        /// Absolute working directory the stages resolved paths against.
        working_directory: Utf8PathBuf,
    },
}

/// Runs argument parsing, configuration loading and logger binding for one
/// front end, and keeps the results for the front end's lifetime.
///
/// The stages can be driven one at a time through
/// [`parse_arguments`](Self::parse_arguments),
/// [`load_configuration`](Self::load_configuration) and
/// [`bind_logger`](Self::bind_logger), or together through
/// [`bootstrap`](Self::bootstrap), which applies the variant's gating.
#[derive(Debug)]
pub struct BootstrapManager {
    owner: String,
    variant: Option<Variant>,
    parse_args: bool,
    working_directory: Option<Utf8PathBuf>,
    arguments: Option<Arguments>,
    configuration: Option<Configuration>,
    logger: Option<LoggerHandle>,
}

impl BootstrapManager {
    /// Creates a manager for a known variant; the owner is the variant's
    /// front-end type name.
    #[must_use]
    pub fn new(variant: Variant) -> Self {
        Self::with_owner(variant.owner_name(), Some(variant))
    }

    /// Creates a manager for the front end named `owner`.
    ///
    /// Owners outside the three known front ends get a manager whose
    /// bootstrap does nothing.
    #[must_use]
    pub fn for_owner(owner: &str) -> Self {
        Self::with_owner(owner, Variant::from_owner_name(owner))
    }

    fn with_owner(owner: &str, variant: Option<Variant>) -> Self {
        Self {
            owner: owner.to_owned(),
            variant,
            parse_args: true,
            working_directory: None,
            arguments: None,
            configuration: None,
            logger: None,
        }
    }

    /// Disables the whole bootstrap sequence, for front ends embedded in a
    /// host that already parsed its own command line.
    #[must_use]
    pub fn without_argument_parsing(mut self) -> Self {
        self.parse_args = false;
        self
    }

    /// Resolves relative paths against `directory` instead of the process
    /// working directory.
    #[must_use]
    pub fn with_working_directory(mut self, directory: impl Into<Utf8PathBuf>) -> Self {
        self.working_directory = Some(directory.into());
        self
    }

    /// Owner name, which also names the logger.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Variant selected for the owner.
    #[must_use]
    pub const fn variant(&self) -> Option<Variant> {
        self.variant
    }

    /// Parsed arguments, once available.
    #[must_use]
    pub const fn arguments(&self) -> Option<&Arguments> {
        self.arguments.as_ref()
    }

    /// Loaded configuration, once available.
    #[must_use]
    pub const fn configuration(&self) -> Option<&Configuration> {
        self.configuration.as_ref()
    }

    /// Bound logger, once available.
    #[must_use]
    pub const fn logger(&self) -> Option<&LoggerHandle> {
        self.logger.as_ref()
    }

    /// Absolute directory relative paths are resolved against.
    ///
    /// # Errors
    ///
    /// Fails when the process working directory cannot be read or is not
    /// UTF-8.
    pub fn working_directory(&self) -> Result<Utf8PathBuf, BootstrapError> {
        match self.working_directory.as_ref() {
            Some(directory) => Ok(directory.clone()),
            None => current_working_directory(),
        }
    }

    /// Runs the bootstrap sequence, reporting through [`StructuredReporter`].
    ///
    /// # Errors
    ///
    /// See [`bootstrap_with`](Self::bootstrap_with).
    pub fn bootstrap<I, T>(&mut self, args: I) -> Result<BootstrapOutcome, BootstrapError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.bootstrap_with(args, &StructuredReporter)
    }

    /// Runs the bootstrap sequence for the owner's variant.
    ///
    /// Arguments are always parsed. The configuration is loaded and the
    /// logger bound only when the parsed arguments call for it: the console
    /// viewer never loads configuration, and the agent does both only for
    /// `start` and `restart`.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure. Later stages do not run, so a
    /// configuration failure never reaches the logger binder.
    pub fn bootstrap_with<I, T>(
        &mut self,
        args: I,
        reporter: &dyn BootstrapReporter,
    ) -> Result<BootstrapOutcome, BootstrapError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let Some(variant) = self.variant.filter(|_| self.parse_args) else {
            reporter.bootstrap_skipped(&self.owner);
            return Ok(BootstrapOutcome::Skipped);
        };

        reporter.bootstrap_starting(variant);
        match self.run_stages(args, reporter) {
            Ok(working_directory) => {
                reporter.bootstrap_succeeded(variant, &working_directory);
                Ok(BootstrapOutcome::Completed { working_directory })
            }
            Err(BootstrapError::Usage(usage)) => {
                reporter.usage_rejected(&usage);
                Err(BootstrapError::Usage(usage))
            }
            Err(error) => {
                reporter.bootstrap_failed(&error);
                Err(error)
            }
        }
    }

    fn run_stages<I, T>(
        &mut self,
        args: I,
        reporter: &dyn BootstrapReporter,
    ) -> Result<Utf8PathBuf, BootstrapError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let working_directory = self.working_directory()?;

        let arguments = self.parse_arguments_in(args, &working_directory)?;
        reporter.arguments_parsed(arguments);
        let loads_configuration = arguments.loads_configuration();
        let binds_logger = arguments.binds_logger();

        if loads_configuration {
            let configuration = self.load_configuration_in(&working_directory)?;
            reporter.configuration_loaded(configuration);
        }
        if binds_logger {
            let logger = self.bind_logger_in(&working_directory)?;
            reporter.logger_bound(logger);
        }
        Ok(working_directory)
    }

    /// Parses `args` (program name first) against the variant's schema and
    /// stores the result.
    ///
    /// # Errors
    ///
    /// [`BootstrapError::Usage`] for malformed command lines;
    /// [`PreconditionError::ArgumentsNotFound`] when the owner has no
    /// variant.
    pub fn parse_arguments<I, T>(&mut self, args: I) -> Result<&Arguments, BootstrapError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let working_directory = self.working_directory()?;
        self.parse_arguments_in(args, &working_directory)
    }

    fn parse_arguments_in<I, T>(
        &mut self,
        args: I,
        working_directory: &Utf8Path,
    ) -> Result<&Arguments, BootstrapError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let variant = self.variant.ok_or(PreconditionError::ArgumentsNotFound)?;
        let parsed =
            arguments::parse(variant, args, working_directory).map_err(BootstrapError::Usage)?;
        Ok(self.arguments.insert(parsed))
    }

    /// Loads the configuration named by the stored arguments, replacing any
    /// earlier result. The file is read again on every call.
    ///
    /// # Errors
    ///
    /// [`PreconditionError`] when arguments are missing or carry no
    /// configuration path; [`crate::ConfigurationError`] when the file is
    /// missing, malformed, or incomplete.
    pub fn load_configuration(&mut self) -> Result<&Configuration, BootstrapError> {
        let working_directory = self.working_directory()?;
        self.load_configuration_in(&working_directory)
    }

    fn load_configuration_in(
        &mut self,
        working_directory: &Utf8Path,
    ) -> Result<&Configuration, BootstrapError> {
        let arguments = self
            .arguments
            .as_ref()
            .ok_or(PreconditionError::ArgumentsNotFound)?;
        let loaded = configuration::load(arguments, working_directory)?;
        Ok(self.configuration.insert(loaded))
    }

    /// Binds the owner's logger from the stored arguments.
    ///
    /// A manager binds at most one logger: later calls return the existing
    /// handle without attaching another sink.
    ///
    /// # Errors
    ///
    /// [`PreconditionError::ArgumentsNotFound`] before arguments are parsed;
    /// [`crate::LoggerError`] when the log file cannot be opened.
    pub fn bind_logger(&mut self) -> Result<&LoggerHandle, BootstrapError> {
        let working_directory = self.working_directory()?;
        self.bind_logger_in(&working_directory)
    }

    fn bind_logger_in(
        &mut self,
        working_directory: &Utf8Path,
    ) -> Result<&LoggerHandle, BootstrapError> {
        let arguments = self
            .arguments
            .as_ref()
            .ok_or(PreconditionError::ArgumentsNotFound)?;
        let logger = match self.logger.take() {
            Some(existing) => existing,
            None => logging::bind_logger(&self.owner, arguments, working_directory)?,
        };
        Ok(self.logger.insert(logger))
    }
}
