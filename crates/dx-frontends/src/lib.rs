//! Launchers for the dataplane explorer front ends.
//!
//! Each binary hands its command line to [`run`], which installs stderr
//! telemetry, drives the shared [`BootstrapManager`] for the binary's
//! variant, and maps the outcome to a process exit code. The launchers stop
//! once bootstrap completes; the front ends' own work starts from the
//! manager's results.

mod telemetry;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use dx_bootstrap::{BootstrapError, BootstrapManager, BootstrapOutcome, Variant};

pub use telemetry::{
    DEFAULT_LOG_FILTER, LOG_FILTER_ENV, TelemetryError, TelemetryHandle, filter_from_env,
    initialise as initialise_telemetry,
};

/// Bootstraps the front end for `variant` from `args` (program name first).
///
/// Help and version output go to `stdout`; every failure is written to
/// `stderr`. Usage errors exit with the argument parser's code and other
/// failures with [`dx_bootstrap::FAILURE_EXIT_CODE`].
pub fn run<I, W, E>(variant: Variant, args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    if let Err(error) = telemetry::initialise(&telemetry::filter_from_env()) {
        let _ = writeln!(stderr, "{error}");
    }

    let mut manager = BootstrapManager::new(variant);
    match manager.bootstrap(args) {
        Ok(outcome) => {
            announce(&manager, &outcome);
            ExitCode::SUCCESS
        }
        Err(error) => report_failure(&error, stdout, stderr),
    }
}

fn announce(manager: &BootstrapManager, outcome: &BootstrapOutcome) {
    if let (BootstrapOutcome::Completed { .. }, Some(logger)) = (outcome, manager.logger()) {
        logger.info(format_args!("{} bootstrap complete", manager.owner()));
    }
}

fn report_failure<W, E>(error: &BootstrapError, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    W: Write,
    E: Write,
{
    let written = match error {
        BootstrapError::Usage(usage) if !usage.use_stderr() => write!(stdout, "{usage}"),
        BootstrapError::Usage(usage) => write!(stderr, "{usage}"),
        other => writeln!(stderr, "{other}"),
    };
    if written.is_err() {
        return ExitCode::FAILURE;
    }
    error.exit_code()
}
