//! Structured reporting for bootstrap stages.

use std::sync::Arc;

use camino::Utf8Path;

use crate::arguments::Arguments;
use crate::configuration::Configuration;
use crate::errors::BootstrapError;
use crate::logging::LoggerHandle;
use crate::variant::Variant;

/// Observer notified as the bootstrap sequence progresses.
pub trait BootstrapReporter: Send + Sync {
    /// Invoked when the owner matches no variant, or parsing is disabled.
    fn bootstrap_skipped(&self, owner: &str);

    /// Invoked before argument parsing begins.
    fn bootstrap_starting(&self, variant: Variant);

    /// Invoked once arguments have been parsed.
    fn arguments_parsed(&self, arguments: &Arguments);

    /// Invoked once the configuration has been loaded and derived.
    fn configuration_loaded(&self, configuration: &Configuration);

    /// Invoked once the owner's logger has been bound.
    fn logger_bound(&self, logger: &LoggerHandle);

    /// Invoked after every stage the variant needs has completed.
    fn bootstrap_succeeded(&self, variant: Variant, working_directory: &Utf8Path);

    /// Invoked when the command line is rejected or asks for help or version
    /// output. The launcher prints the parser's message itself.
    fn usage_rejected(&self, error: &clap::Error);

    /// Invoked when a stage other than argument parsing fails.
    fn bootstrap_failed(&self, error: &BootstrapError);
}

impl<T> BootstrapReporter for Arc<T>
where
    T: BootstrapReporter,
{
    fn bootstrap_skipped(&self, owner: &str) {
        (**self).bootstrap_skipped(owner);
    }

    fn bootstrap_starting(&self, variant: Variant) {
        (**self).bootstrap_starting(variant);
    }

    fn arguments_parsed(&self, arguments: &Arguments) {
        (**self).arguments_parsed(arguments);
    }

    fn configuration_loaded(&self, configuration: &Configuration) {
        (**self).configuration_loaded(configuration);
    }

    fn logger_bound(&self, logger: &LoggerHandle) {
        (**self).logger_bound(logger);
    }

    fn bootstrap_succeeded(&self, variant: Variant, working_directory: &Utf8Path) {
        (**self).bootstrap_succeeded(variant, working_directory);
    }

    fn usage_rejected(&self, error: &clap::Error) {
        (**self).usage_rejected(error);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }
}

/// Default reporter that records stages using `tracing`.
///
/// Events go to whichever subscriber the process installed, never to the
/// owner's log file.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredReporter;

impl StructuredReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BootstrapReporter for StructuredReporter {
    fn bootstrap_skipped(&self, owner: &str) {
        tracing::debug!(
            target: "dx_bootstrap::health",
            event = "bootstrap_skipped",
            owner,
            "nothing to bootstrap"
        );
    }

    fn bootstrap_starting(&self, variant: Variant) {
        tracing::debug!(
            target: "dx_bootstrap::health",
            event = "bootstrap_starting",
            variant = %variant,
            "starting bootstrap"
        );
    }

    fn arguments_parsed(&self, arguments: &Arguments) {
        tracing::debug!(
            target: "dx_bootstrap::health",
            event = "arguments_parsed",
            variant = %arguments.variant(),
            log_file = %arguments.log_file(),
            verbose = arguments.verbose(),
            "arguments parsed"
        );
    }

    fn configuration_loaded(&self, configuration: &Configuration) {
        tracing::debug!(
            target: "dx_bootstrap::health",
            event = "configuration_loaded",
            path = %configuration.path(),
            gnmi_target = ?configuration.gnmi_target(),
            vpp_nodes = configuration.vpp_gnmi_nodes().len(),
            ioam_nodes = configuration.ioam_gnmi_nodes().len(),
            "configuration loaded"
        );
    }

    fn logger_bound(&self, logger: &LoggerHandle) {
        tracing::debug!(
            target: "dx_bootstrap::health",
            event = "logger_bound",
            owner = logger.name(),
            path = %logger.path(),
            threshold = %logger.threshold(),
            "logger bound"
        );
    }

    fn bootstrap_succeeded(&self, variant: Variant, working_directory: &Utf8Path) {
        tracing::info!(
            target: "dx_bootstrap::health",
            event = "bootstrap_succeeded",
            variant = %variant,
            working_directory = %working_directory,
            "bootstrap completed"
        );
    }

    fn usage_rejected(&self, error: &clap::Error) {
        tracing::debug!(
            target: "dx_bootstrap::health",
            event = "usage_rejected",
            kind = ?error.kind(),
            exit_code = error.exit_code(),
            "command line not accepted"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: "dx_bootstrap::health",
            event = "bootstrap_failed",
            error = %error,
            "bootstrap failed"
        );
    }
}
