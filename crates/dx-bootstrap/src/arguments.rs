//! Command-line schemas for the three front ends.
//!
//! Each variant declares its own `clap` parser. [`parse`] selects the schema
//! for a [`Variant`] and, for the agent, resolves its path-valued options to
//! absolute form before anything else reads them.

use std::ffi::OsString;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};

use crate::paths::absolutize;
use crate::variant::Variant;

/// Default log file for the console viewer.
pub const DEFAULT_CONSOLE_LOG_FILE: &str = "dxtop.log";
/// Default log file for the agent.
pub const DEFAULT_AGENT_LOG_FILE: &str = "/var/log/dxagent.log";
/// Default log file for the web front end.
pub const DEFAULT_WEB_APP_LOG_FILE: &str = "dxweb.log";
/// Default configuration file shared by the agent and the web front end.
pub const DEFAULT_CONFIG_FILE: &str = "./dxagent.ini";
/// Default resources directory for the agent.
pub const DEFAULT_RESOURCES_DIR: &str = "./res/";
/// Default certificate and key directory.
pub const DEFAULT_CERTS_DIR: &str = "./certs/";

/// Arguments of the console viewer.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "dxtop", about = "Diagnostic Agent console app", long_about = None)]
pub struct ConsoleArguments {
    /// log file location
    #[arg(
        short = 'l',
        long = "log-file",
        value_name = "LOG_FILE",
        default_value = DEFAULT_CONSOLE_LOG_FILE
    )]
    log_file: Utf8PathBuf,
    /// increase output level
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl ConsoleArguments {
    /// Log file location as given on the command line.
    #[must_use]
    pub fn log_file(&self) -> &Utf8Path {
        &self.log_file
    }

    /// Whether debug records reach the log file.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Lifecycle command understood by the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AgentCommand {
    /// Starts the agent.
    Start,
    /// Stops a running agent.
    Stop,
    /// Stops then starts the agent.
    Restart,
    /// Reports whether the agent is running.
    Status,
}

impl AgentCommand {
    /// Whether the command launches the agent, which needs configuration and
    /// a logger. `stop` and `status` only talk to an existing process.
    #[must_use]
    pub const fn launches_agent(self) -> bool {
        matches!(self, Self::Start | Self::Restart)
    }
}

/// Arguments of the monitoring agent.
///
/// The configuration file, resources directory and certificate directory are
/// absolute once parsing returns.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "dxagent", about = "Diagnostic Agent", long_about = None)]
pub struct AgentArguments {
    /// agent lifecycle command
    #[arg(value_enum, value_name = "COMMAND")]
    command: AgentCommand,
    /// log file location
    #[arg(
        short = 'l',
        long = "log-file",
        value_name = "LOG_FILE",
        default_value = DEFAULT_AGENT_LOG_FILE
    )]
    log_file: Utf8PathBuf,
    /// configuration file location
    #[arg(short = 'c', long = "config", value_name = "CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: Utf8PathBuf,
    /// resources directory location
    #[arg(
        short = 'r',
        long = "resources-dir",
        alias = "ressources-dir",
        value_name = "RES_DIR",
        default_value = DEFAULT_RESOURCES_DIR
    )]
    resources_dir: Utf8PathBuf,
    /// certificate/key files location
    #[arg(
        short = 'k',
        long = "certs-dir",
        value_name = "CERTS_DIR",
        default_value = DEFAULT_CERTS_DIR
    )]
    certs_dir: Utf8PathBuf,
    /// disable shared memory segment (cannot use dxtop)
    #[arg(short = 's', long = "disable-shm")]
    disable_shm: bool,
    /// increase output level
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl AgentArguments {
    fn resolve_paths(mut self, working_directory: &Utf8Path) -> Self {
        self.config = absolutize(working_directory, &self.config);
        self.resources_dir = absolutize(working_directory, &self.resources_dir);
        self.certs_dir = absolutize(working_directory, &self.certs_dir);
        self
    }

    /// Requested lifecycle command.
    #[must_use]
    pub const fn command(&self) -> AgentCommand {
        self.command
    }

    /// Log file location as given on the command line.
    #[must_use]
    pub fn log_file(&self) -> &Utf8Path {
        &self.log_file
    }

    /// Absolute configuration file path.
    #[must_use]
    pub fn config(&self) -> &Utf8Path {
        &self.config
    }

    /// Absolute resources directory.
    #[must_use]
    pub fn resources_dir(&self) -> &Utf8Path {
        &self.resources_dir
    }

    /// Absolute certificate directory.
    #[must_use]
    pub fn certs_dir(&self) -> &Utf8Path {
        &self.certs_dir
    }

    /// Whether the shared memory segment is disabled.
    #[must_use]
    pub const fn disable_shm(&self) -> bool {
        self.disable_shm
    }

    /// Whether debug records reach the log file.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Arguments of the web front end.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "dxweb", about = "Diagnostic Agent web app", long_about = None)]
pub struct WebAppArguments {
    /// configuration file location
    #[arg(short = 'c', long = "config", value_name = "CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: Utf8PathBuf,
    /// log file location
    #[arg(
        short = 'l',
        long = "log-file",
        value_name = "LOG_FILE",
        default_value = DEFAULT_WEB_APP_LOG_FILE
    )]
    log_file: Utf8PathBuf,
    /// gNMI target (default from the configuration file)
    #[arg(short = 't', long = "target", value_name = "TARGET")]
    target: Option<String>,
    /// certificate/key files location
    #[arg(
        short = 'k',
        long = "certs-dir",
        value_name = "CERTS_DIR",
        default_value = DEFAULT_CERTS_DIR
    )]
    certs_dir: Utf8PathBuf,
    /// increase output level
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl WebAppArguments {
    /// Configuration file path as given on the command line.
    #[must_use]
    pub fn config(&self) -> &Utf8Path {
        &self.config
    }

    /// Log file location as given on the command line.
    #[must_use]
    pub fn log_file(&self) -> &Utf8Path {
        &self.log_file
    }

    /// gNMI target override; empty overrides count as absent.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref().filter(|target| !target.is_empty())
    }

    /// Certificate directory as given on the command line.
    #[must_use]
    pub fn certs_dir(&self) -> &Utf8Path {
        &self.certs_dir
    }

    /// Whether debug records reach the log file.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Parsed command line of any variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arguments {
    /// Console viewer arguments.
    Console(ConsoleArguments),
    /// Agent arguments.
    Agent(AgentArguments),
    /// Web front-end arguments.
    WebApp(WebAppArguments),
}

impl Arguments {
    /// Variant whose schema produced these arguments.
    #[must_use]
    pub const fn variant(&self) -> Variant {
        match self {
            Self::Console(_) => Variant::Console,
            Self::Agent(_) => Variant::Agent,
            Self::WebApp(_) => Variant::WebApp,
        }
    }

    /// Log file location as given on the command line.
    #[must_use]
    pub fn log_file(&self) -> &Utf8Path {
        match self {
            Self::Console(arguments) => arguments.log_file(),
            Self::Agent(arguments) => arguments.log_file(),
            Self::WebApp(arguments) => arguments.log_file(),
        }
    }

    /// Whether debug records reach the log file.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        match self {
            Self::Console(arguments) => arguments.verbose(),
            Self::Agent(arguments) => arguments.verbose(),
            Self::WebApp(arguments) => arguments.verbose(),
        }
    }

    /// Configuration file path, when the variant's schema has one.
    #[must_use]
    pub fn config(&self) -> Option<&Utf8Path> {
        match self {
            Self::Console(_) => None,
            Self::Agent(arguments) => Some(arguments.config()),
            Self::WebApp(arguments) => Some(arguments.config()),
        }
    }

    /// gNMI target override supplied on the command line.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::WebApp(arguments) => arguments.target(),
            Self::Console(_) | Self::Agent(_) => None,
        }
    }

    /// Whether bootstrap loads the configuration file for these arguments.
    #[must_use]
    pub const fn loads_configuration(&self) -> bool {
        match self {
            Self::Console(_) => false,
            Self::Agent(arguments) => arguments.command().launches_agent(),
            Self::WebApp(_) => true,
        }
    }

    /// Whether bootstrap binds a logger for these arguments.
    #[must_use]
    pub const fn binds_logger(&self) -> bool {
        match self {
            Self::Console(_) | Self::WebApp(_) => true,
            Self::Agent(arguments) => arguments.command().launches_agent(),
        }
    }
}

/// Parses `args` (program name first) against the schema of `variant`.
///
/// Agent paths are resolved against `working_directory`.
///
/// # Errors
///
/// Returns the parser's usage error for unknown flags, missing positionals,
/// or values outside an allowed set. Help and version requests are reported
/// the same way and carry a zero exit code.
pub fn parse<I, T>(
    variant: Variant,
    args: I,
    working_directory: &Utf8Path,
) -> Result<Arguments, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match variant {
        Variant::Console => ConsoleArguments::try_parse_from(args).map(Arguments::Console),
        Variant::Agent => AgentArguments::try_parse_from(args)
            .map(|arguments| Arguments::Agent(arguments.resolve_paths(working_directory))),
        Variant::WebApp => WebAppArguments::try_parse_from(args).map(Arguments::WebApp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;
    use rstest::rstest;

    const CWD: &str = "/srv/dx";

    fn parse_ok(variant: Variant, args: &[&str]) -> Arguments {
        parse(variant, args.iter().copied(), Utf8Path::new(CWD)).expect("arguments should parse")
    }

    #[test]
    fn schemas_are_well_formed() {
        <ConsoleArguments as CommandFactory>::command().debug_assert();
        <AgentArguments as CommandFactory>::command().debug_assert();
        <WebAppArguments as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn console_defaults() {
        let arguments = parse_ok(Variant::Console, &["dxtop"]);
        assert_eq!(arguments.variant(), Variant::Console);
        assert_eq!(arguments.log_file(), Utf8Path::new("dxtop.log"));
        assert!(!arguments.verbose());
        assert_eq!(arguments.config(), None);
        assert!(!arguments.loads_configuration());
        assert!(arguments.binds_logger());
    }

    #[test]
    fn agent_defaults_are_absolute() {
        let Arguments::Agent(agent) = parse_ok(Variant::Agent, &["dxagent", "start"]) else {
            panic!("expected agent arguments");
        };
        assert_eq!(agent.command(), AgentCommand::Start);
        assert_eq!(agent.log_file(), Utf8Path::new("/var/log/dxagent.log"));
        assert_eq!(agent.config(), Utf8Path::new("/srv/dx/dxagent.ini"));
        assert_eq!(agent.resources_dir(), Utf8Path::new("/srv/dx/res"));
        assert_eq!(agent.certs_dir(), Utf8Path::new("/srv/dx/certs"));
        assert!(!agent.disable_shm());
        assert!(!agent.verbose());
    }

    #[test]
    fn agent_resolves_relative_paths_against_working_directory() {
        let Arguments::Agent(agent) = parse_ok(
            Variant::Agent,
            &[
                "dxagent", "status", "-c", "conf/agent.ini", "-r", "share/res", "-k", "keys",
            ],
        ) else {
            panic!("expected agent arguments");
        };
        let cwd = Utf8Path::new(CWD);
        assert_eq!(agent.config(), cwd.join("conf/agent.ini").as_path());
        assert_eq!(agent.resources_dir(), cwd.join("share/res").as_path());
        assert_eq!(agent.certs_dir(), cwd.join("keys").as_path());
    }

    #[test]
    fn agent_accepts_legacy_resources_flag() {
        let Arguments::Agent(agent) = parse_ok(
            Variant::Agent,
            &["dxagent", "stop", "--ressources-dir", "/opt/dx/res"],
        ) else {
            panic!("expected agent arguments");
        };
        assert_eq!(agent.resources_dir(), Utf8Path::new("/opt/dx/res"));
    }

    #[test]
    fn agent_flags_toggle() {
        let Arguments::Agent(agent) =
            parse_ok(Variant::Agent, &["dxagent", "restart", "-s", "-v"])
        else {
            panic!("expected agent arguments");
        };
        assert!(agent.disable_shm());
        assert!(agent.verbose());
    }

    #[rstest]
    #[case("start", true)]
    #[case("restart", true)]
    #[case("stop", false)]
    #[case("status", false)]
    fn only_launching_commands_load_configuration(#[case] command: &str, #[case] launches: bool) {
        let arguments = parse_ok(Variant::Agent, &["dxagent", command]);
        assert_eq!(arguments.loads_configuration(), launches);
        assert_eq!(arguments.binds_logger(), launches);
    }

    #[test]
    fn web_app_defaults() {
        let arguments = parse_ok(Variant::WebApp, &["dxweb"]);
        let Arguments::WebApp(web) = &arguments else {
            panic!("expected web-app arguments");
        };
        assert_eq!(web.config(), Utf8Path::new("./dxagent.ini"));
        assert_eq!(web.log_file(), Utf8Path::new("dxweb.log"));
        assert_eq!(web.target(), None);
        assert_eq!(web.certs_dir(), Utf8Path::new("./certs/"));
        assert!(!web.verbose());
        assert!(arguments.loads_configuration());
    }

    #[test]
    fn web_app_ignores_empty_target() {
        let arguments = parse_ok(Variant::WebApp, &["dxweb", "--target", ""]);
        assert_eq!(arguments.target(), None);
        let arguments = parse_ok(Variant::WebApp, &["dxweb", "-t", "10.0.0.1:50051"]);
        assert_eq!(arguments.target(), Some("10.0.0.1:50051"));
    }

    #[rstest]
    #[case(Variant::Agent, &["dxagent", "reload"], ErrorKind::InvalidValue)]
    #[case(Variant::Agent, &["dxagent"], ErrorKind::MissingRequiredArgument)]
    #[case(Variant::Console, &["dxtop", "--config", "x.ini"], ErrorKind::UnknownArgument)]
    #[case(Variant::WebApp, &["dxweb", "-s"], ErrorKind::UnknownArgument)]
    fn rejects_malformed_command_lines(
        #[case] variant: Variant,
        #[case] args: &[&str],
        #[case] kind: ErrorKind,
    ) {
        let error = parse(variant, args.iter().copied(), Utf8Path::new(CWD))
            .expect_err("command line should be rejected");
        assert_eq!(error.kind(), kind);
        assert_ne!(error.exit_code(), 0);
    }

    #[test]
    fn help_requests_exit_cleanly() {
        let error = parse(Variant::Console, ["dxtop", "--help"], Utf8Path::new(CWD))
            .expect_err("help is reported as an early exit");
        assert_eq!(error.kind(), ErrorKind::DisplayHelp);
        assert_eq!(error.exit_code(), 0);
    }
}
