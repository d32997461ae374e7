//! Test harness utilities for the bootstrap suites.

use std::fs;
use std::sync::{Arc, Mutex};

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use crate::{
    Arguments, BootstrapError, BootstrapManager, BootstrapOutcome, BootstrapReporter,
    Configuration, LoggerHandle, Variant,
};

/// Configuration carrying every section the agent consumes.
pub const AGENT_CONFIGURATION: &str = "\
[gnmi]
target = collector:50051

[vpp]
gnmi_nodes = a, b ,c

[ioam]
gnmi_nodes = n1

[virtualbox]
vbox_user = alice
";

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    directory: TempDir,
    owner: Option<String>,
    pub reporter: Arc<RecordingReporter>,
    manager: Option<BootstrapManager>,
    outcome: Option<Result<BootstrapOutcome, BootstrapError>>,
}

impl TestWorld {
    /// Builds a world rooted in a fresh temporary directory.
    pub fn new() -> Self {
        Self {
            directory: TempDir::new().expect("create temporary directory"),
            owner: None,
            reporter: Arc::new(RecordingReporter::default()),
            manager: None,
            outcome: None,
        }
    }

    /// Selects the owner whose manager the scenario drives.
    pub fn use_owner(&mut self, owner: &str) {
        self.owner = Some(owner.to_owned());
    }

    /// Writes `contents` to `name` inside the scenario directory.
    pub fn write_file(&self, name: &str, contents: &str) {
        fs::write(self.path(name), contents).expect("write scenario file");
    }

    /// Runs the bootstrap sequence with a whitespace-separated command line.
    pub fn bootstrap(&mut self, command_line: &str) {
        let owner = self.owner.as_deref().expect("owner not selected");
        let mut manager =
            BootstrapManager::for_owner(owner).with_working_directory(self.root());
        let outcome = manager.bootstrap_with(command_line.split_whitespace(), &self.reporter);
        self.manager = Some(manager);
        self.outcome = Some(outcome);
    }

    /// Result of the last bootstrap run.
    pub fn outcome(&self) -> &Result<BootstrapOutcome, BootstrapError> {
        self.outcome.as_ref().expect("bootstrap has not run")
    }

    /// Manager used by the last bootstrap run.
    pub fn manager(&self) -> &BootstrapManager {
        self.manager.as_ref().expect("bootstrap has not run")
    }

    /// Absolute scenario directory.
    pub fn root(&self) -> Utf8PathBuf {
        Utf8Path::from_path(self.directory.path())
            .expect("temporary directory is UTF-8")
            .to_path_buf()
    }

    /// Absolute path of `name` inside the scenario directory.
    pub fn path(&self, name: &str) -> Utf8PathBuf {
        self.root().join(name)
    }
}

/// Builds a new scenario world.
pub fn world() -> std::cell::RefCell<TestWorld> {
    std::cell::RefCell::new(TestWorld::new())
}

/// Reporter that records stage events for later inspection.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<BootstrapEvent>>,
}

impl RecordingReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<BootstrapEvent> {
        self.events
            .lock()
            .expect("reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: BootstrapEvent) {
        self.events
            .lock()
            .expect("reporter mutex poisoned")
            .push(event);
    }
}

impl BootstrapReporter for RecordingReporter {
    fn bootstrap_skipped(&self, owner: &str) {
        self.record(BootstrapEvent::Skipped(owner.to_owned()));
    }

    fn bootstrap_starting(&self, variant: Variant) {
        self.record(BootstrapEvent::Starting(variant));
    }

    fn arguments_parsed(&self, _arguments: &Arguments) {
        self.record(BootstrapEvent::ArgumentsParsed);
    }

    fn configuration_loaded(&self, _configuration: &Configuration) {
        self.record(BootstrapEvent::ConfigurationLoaded);
    }

    fn logger_bound(&self, logger: &LoggerHandle) {
        self.record(BootstrapEvent::LoggerBound(logger.name().to_owned()));
    }

    fn bootstrap_succeeded(&self, variant: Variant, _working_directory: &Utf8Path) {
        self.record(BootstrapEvent::Succeeded(variant));
    }

    fn usage_rejected(&self, error: &clap::Error) {
        self.record(BootstrapEvent::UsageRejected(error.kind()));
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(BootstrapEvent::Failed(error.to_string()));
    }
}

/// Stage events tracked during tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapEvent {
    /// Bootstrap did nothing for the owner.
    Skipped(String),
    /// Bootstrap started for the variant.
    Starting(Variant),
    /// Arguments were parsed.
    ArgumentsParsed,
    /// Configuration was loaded.
    ConfigurationLoaded,
    /// Logger was bound for the owner.
    LoggerBound(String),
    /// Bootstrap completed.
    Succeeded(Variant),
    /// The command line was rejected, or asked for help or version output.
    UsageRejected(clap::error::ErrorKind),
    /// Bootstrap failed with an error description.
    Failed(String),
}
