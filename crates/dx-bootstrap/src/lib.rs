//! Shared start-up sequence for the dataplane explorer front ends.
//!
//! Three front ends share one bootstrap: the console viewer (`DXTop`), the
//! agent controller (`DXAgent`) and the web application (`DXWeb`). Each one
//! owns a [`BootstrapManager`] which parses the variant's command line, loads
//! the key-grouped configuration file when the variant needs it, and binds a
//! per-owner file logger.
//!
//! The sequence is gated by variant. The console viewer never reads a
//! configuration file. The agent reads the configuration and binds its
//! logger only for `start` and `restart`; `stop` and `status` stop after
//! parsing. The web application always does both.
//!
//! Every stage reports through a [`BootstrapReporter`]. The default
//! [`StructuredReporter`] emits `tracing` events to the process-wide
//! subscriber, while owner loggers write only to their own files.

mod arguments;
mod bootstrap;
pub mod configuration;
mod errors;
mod health;
mod logging;
pub mod paths;
mod variant;

pub use arguments::{
    AgentArguments, AgentCommand, Arguments, ConsoleArguments, DEFAULT_AGENT_LOG_FILE,
    DEFAULT_CERTS_DIR, DEFAULT_CONFIG_FILE, DEFAULT_CONSOLE_LOG_FILE, DEFAULT_RESOURCES_DIR,
    DEFAULT_WEB_APP_LOG_FILE, WebAppArguments, parse as parse_arguments,
};
pub use bootstrap::{BootstrapManager, BootstrapOutcome};
pub use configuration::{Configuration, load as load_configuration, parse_node_list};
pub use errors::{
    BootstrapError, ConfigurationError, FAILURE_EXIT_CODE, LoggerError, PreconditionError,
};
pub use health::{BootstrapReporter, StructuredReporter};
pub use logging::{
    LOGGER_LEVEL, LocalClock, LoggerHandle, LoggerRegistry, RecordClock, Severity,
    bind_logger, bind_logger_with_clock, sink_threshold,
};
pub use variant::{Variant, VariantParseError};

#[cfg(test)]
mod tests;
