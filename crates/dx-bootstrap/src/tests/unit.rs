//! Unit tests for the bootstrap manager.

use std::fs;
use std::sync::Arc;

use clap::error::ErrorKind;
use rstest::rstest;

use crate::{
    AgentCommand, Arguments, BootstrapError, BootstrapManager, BootstrapOutcome,
    ConfigurationError, PreconditionError, Variant,
};

use super::support::{AGENT_CONFIGURATION, BootstrapEvent, RecordingReporter, TestWorld};

#[rstest]
fn unknown_owner_skips_every_stage() {
    let reporter = Arc::new(RecordingReporter::default());
    let mut manager = BootstrapManager::for_owner("DXOther");

    let outcome = manager
        .bootstrap_with(["dxother", "--bogus"], &reporter)
        .expect("unknown owners are skipped");

    assert_eq!(outcome, BootstrapOutcome::Skipped);
    assert!(manager.arguments().is_none());
    assert_eq!(
        reporter.events(),
        vec![BootstrapEvent::Skipped(String::from("DXOther"))]
    );
}

#[rstest]
fn disabled_argument_parsing_skips_every_stage() {
    let reporter = Arc::new(RecordingReporter::default());
    let mut manager = BootstrapManager::new(Variant::WebApp).without_argument_parsing();

    let outcome = manager
        .bootstrap_with(["dxweb", "-c", "/nonexistent.ini"], &reporter)
        .expect("disabled bootstrap succeeds");

    assert_eq!(outcome, BootstrapOutcome::Skipped);
    assert!(manager.configuration().is_none());
    assert!(manager.logger().is_none());
}

#[rstest]
#[case("DXTop", Variant::Console)]
#[case("DXAgent", Variant::Agent)]
#[case("DXWeb", Variant::WebApp)]
fn owner_names_select_variants(#[case] owner: &str, #[case] expected: Variant) {
    let manager = BootstrapManager::for_owner(owner);
    assert_eq!(manager.variant(), Some(expected));
    assert_eq!(manager.owner(), owner);
}

#[rstest]
fn console_binds_logger_without_configuration() {
    let world = TestWorld::new();
    let reporter = Arc::new(RecordingReporter::default());
    let mut manager = BootstrapManager::new(Variant::Console).with_working_directory(world.root());

    let outcome = manager
        .bootstrap_with(["dxtop"], &reporter)
        .expect("console bootstrap succeeds");

    assert_eq!(
        outcome,
        BootstrapOutcome::Completed {
            working_directory: world.root()
        }
    );
    assert!(manager.configuration().is_none());
    let logger = manager.logger().expect("console logger bound");
    assert_eq!(logger.name(), "DXTop");
    assert_eq!(logger.path(), world.path("dxtop.log").as_path());
    assert_eq!(
        reporter.events(),
        vec![
            BootstrapEvent::Starting(Variant::Console),
            BootstrapEvent::ArgumentsParsed,
            BootstrapEvent::LoggerBound(String::from("DXTop")),
            BootstrapEvent::Succeeded(Variant::Console),
        ]
    );
}

#[rstest]
#[case("stop")]
#[case("status")]
fn agent_control_commands_stop_after_parsing(#[case] command: &str) {
    let world = TestWorld::new();
    let reporter = Arc::new(RecordingReporter::default());
    let mut manager = BootstrapManager::new(Variant::Agent).with_working_directory(world.root());

    manager
        .bootstrap_with(["dxagent", command, "-c", "missing.ini"], &reporter)
        .expect("control commands do not read configuration");

    assert!(manager.configuration().is_none());
    assert!(manager.logger().is_none());
}

#[rstest]
#[case("start", AgentCommand::Start)]
#[case("restart", AgentCommand::Restart)]
fn agent_launch_commands_load_configuration(#[case] command: &str, #[case] expected: AgentCommand) {
    let world = TestWorld::new();
    world.write_file("dxagent.ini", AGENT_CONFIGURATION);
    let mut manager = BootstrapManager::new(Variant::Agent).with_working_directory(world.root());

    manager
        .bootstrap(["dxagent", command, "-l", "agent.log"])
        .expect("agent bootstrap succeeds");

    let Some(Arguments::Agent(arguments)) = manager.arguments() else {
        panic!("expected agent arguments");
    };
    assert_eq!(arguments.command(), expected);
    assert_eq!(arguments.config(), world.path("dxagent.ini").as_path());
    let configuration = manager.configuration().expect("configuration loaded");
    assert_eq!(configuration.vpp_gnmi_nodes(), ["a", "b", "c"]);
    assert_eq!(
        configuration.virtualbox_config_directory(),
        Some("/home/alice/.config")
    );
    assert!(world.path("agent.log").exists());
}

#[rstest]
fn missing_configuration_never_binds_logger() {
    let world = TestWorld::new();
    let reporter = Arc::new(RecordingReporter::default());
    let mut manager = BootstrapManager::new(Variant::Agent).with_working_directory(world.root());

    let error = manager
        .bootstrap_with(["dxagent", "start", "-c", "absent.ini", "-l", "agent.log"], &reporter)
        .expect_err("missing configuration is fatal");

    assert!(matches!(
        error,
        BootstrapError::Configuration(ConfigurationError::NotFound { .. })
    ));
    assert_eq!(
        error.to_string(),
        format!("Configuration file not found: {}", world.path("absent.ini"))
    );
    assert!(manager.logger().is_none());
    assert!(!world.path("agent.log").exists());
    let events = reporter.events();
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, BootstrapEvent::LoggerBound(_))),
        "logger bound despite configuration failure: {events:?}"
    );
    assert!(matches!(events.last(), Some(BootstrapEvent::Failed(_))));
}

#[rstest]
fn usage_errors_are_reported_and_returned() {
    let reporter = Arc::new(RecordingReporter::default());
    let mut manager = BootstrapManager::new(Variant::Agent).with_working_directory("/srv/dx");

    let error = manager
        .bootstrap_with(["dxagent", "launch"], &reporter)
        .expect_err("unknown command is rejected");

    assert!(matches!(error, BootstrapError::Usage(_)));
    assert_eq!(error.exit_code(), std::process::ExitCode::from(2));
    assert!(manager.arguments().is_none());
}

#[rstest]
#[case(&["dxagent", "launch"], ErrorKind::InvalidValue)]
#[case(&["dxagent", "--help"], ErrorKind::DisplayHelp)]
fn rejected_command_lines_are_not_stage_failures(
    #[case] args: &[&str],
    #[case] expected: ErrorKind,
) {
    let reporter = Arc::new(RecordingReporter::default());
    let mut manager = BootstrapManager::new(Variant::Agent).with_working_directory("/srv/dx");

    manager
        .bootstrap_with(args.iter().copied(), &reporter)
        .expect_err("command line is not accepted");

    assert_eq!(
        reporter.events(),
        vec![
            BootstrapEvent::Starting(Variant::Agent),
            BootstrapEvent::UsageRejected(expected),
        ]
    );
}

#[rstest]
fn stages_require_parsed_arguments() {
    let mut manager = BootstrapManager::new(Variant::WebApp).with_working_directory("/srv/dx");

    let configuration = manager
        .load_configuration()
        .expect_err("configuration needs arguments");
    assert!(matches!(
        configuration,
        BootstrapError::Precondition(PreconditionError::ArgumentsNotFound)
    ));

    let logger = manager.bind_logger().expect_err("logger needs arguments");
    assert!(matches!(
        logger,
        BootstrapError::Precondition(PreconditionError::ArgumentsNotFound)
    ));
}

#[rstest]
fn console_configuration_is_a_precondition_error() {
    let mut manager = BootstrapManager::new(Variant::Console).with_working_directory("/srv/dx");
    manager
        .parse_arguments(["dxtop"])
        .expect("console arguments parse");

    let error = manager
        .load_configuration()
        .expect_err("console has no configuration file");
    assert!(matches!(
        error,
        BootstrapError::Precondition(PreconditionError::MissingConfigurationPath {
            variant: Variant::Console
        })
    ));
}

#[rstest]
fn binding_twice_reuses_the_logger() {
    let world = TestWorld::new();
    let mut manager = BootstrapManager::new(Variant::Console).with_working_directory(world.root());
    manager
        .parse_arguments(["dxtop", "-l", "top.log"])
        .expect("console arguments parse");

    manager.bind_logger().expect("first bind").info("first");
    manager.bind_logger().expect("second bind").info("second");

    let contents = fs::read_to_string(world.path("top.log")).expect("read log");
    assert_eq!(contents.lines().count(), 2, "unexpected log: {contents}");
}

#[rstest]
fn configuration_reloads_reflect_file_changes() {
    let world = TestWorld::new();
    world.write_file("dxagent.ini", AGENT_CONFIGURATION);
    let mut manager = BootstrapManager::new(Variant::WebApp).with_working_directory(world.root());
    manager
        .parse_arguments(["dxweb"])
        .expect("web arguments parse");

    let first = manager.load_configuration().expect("first load").clone();
    let second = manager.load_configuration().expect("second load").clone();
    assert_eq!(first, second);

    world.write_file("dxagent.ini", "[gnmi]\ntarget = other:1\n");
    let reloaded = manager.load_configuration().expect("reload");
    assert_eq!(reloaded.gnmi_target(), Some("other:1"));
}
