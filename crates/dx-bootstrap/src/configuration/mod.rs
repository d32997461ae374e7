//! Configuration loading for the agent and web front ends.
//!
//! # Data Flow
//! ```text
//! --config path (from Arguments)
//!     → parser.rs (key-grouped text → ConfigDocument)
//!     → derive.rs (required sections, defaults, derived fields)
//!     → Configuration (immutable, owned by the BootstrapManager)
//! ```
//!
//! Every call to [`load`] reads the file again; nothing is cached between
//! calls. For fixed file contents and arguments the result is identical.

mod derive;
mod interpolation;
mod parser;

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

use crate::arguments::Arguments;
use crate::errors::{BootstrapError, ConfigurationError, PreconditionError};
use crate::paths::root_relative;

pub use derive::parse_node_list;
pub use parser::{ConfigDocument, DEFAULT_SECTION, ParseError, ParseErrorKind, Section};

/// A validated configuration with its derived fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    path: Utf8PathBuf,
    document: ConfigDocument,
    gnmi_target: Option<String>,
    vpp_gnmi_nodes: Vec<String>,
    ioam_gnmi_nodes: Vec<String>,
}

impl Configuration {
    /// Configuration file path as given in the arguments.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Raw sections, including values written back during derivation.
    #[must_use]
    pub const fn document(&self) -> &ConfigDocument {
        &self.document
    }

    /// Looks up `key` in `section`.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.document.get(section, key)
    }

    /// gNMI target: the command-line override, else `[gnmi] target`.
    #[must_use]
    pub fn gnmi_target(&self) -> Option<&str> {
        self.gnmi_target.as_deref()
    }

    /// Nodes listed in `[vpp] gnmi_nodes`.
    #[must_use]
    pub fn vpp_gnmi_nodes(&self) -> &[String] {
        &self.vpp_gnmi_nodes
    }

    /// Nodes listed in `[ioam] gnmi_nodes`.
    #[must_use]
    pub fn ioam_gnmi_nodes(&self) -> &[String] {
        &self.ioam_gnmi_nodes
    }

    /// VirtualBox configuration directory, defaulted for the agent.
    #[must_use]
    pub fn virtualbox_config_directory(&self) -> Option<&str> {
        self.document.get(derive::VIRTUALBOX, derive::CONFIG_DIRECTORY)
    }
}

/// Loads and validates the configuration named by `arguments`.
///
/// Relative configuration paths are read from `working_directory`.
///
/// # Errors
///
/// - [`PreconditionError::MissingConfigurationPath`] when the variant has no
///   configuration file (the console viewer).
/// - [`ConfigurationError`] when the file is missing, unreadable, malformed,
///   or lacks a section or key the variant needs. Callers treat these as
///   fatal.
pub fn load(
    arguments: &Arguments,
    working_directory: &Utf8Path,
) -> Result<Configuration, BootstrapError> {
    let (path, rules) = match arguments {
        Arguments::Console(_) => {
            return Err(PreconditionError::MissingConfigurationPath {
                variant: arguments.variant(),
            }
            .into());
        }
        Arguments::Agent(agent) => (agent.config(), Rules::Agent),
        Arguments::WebApp(web) => (web.config(), Rules::WebApp(web.target())),
    };

    let mut document = read_document(path, working_directory)?;
    let derived = match rules {
        Rules::Agent => derive::agent(path, &mut document)?,
        Rules::WebApp(target) => derive::web_app(path, &document, target)?,
    };

    Ok(Configuration {
        path: path.to_path_buf(),
        document,
        gnmi_target: derived.gnmi_target,
        vpp_gnmi_nodes: derived.vpp_gnmi_nodes,
        ioam_gnmi_nodes: derived.ioam_gnmi_nodes,
    })
}

/// Derivation rules selected by the argument variant.
enum Rules<'a> {
    Agent,
    WebApp(Option<&'a str>),
}

fn read_document(
    path: &Utf8Path,
    working_directory: &Utf8Path,
) -> Result<ConfigDocument, ConfigurationError> {
    let location = root_relative(working_directory, path);
    let text = fs::read_to_string(&location).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigurationError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigurationError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    ConfigDocument::parse(&text).map_err(|source| ConfigurationError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
