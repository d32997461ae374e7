//! Validation and derivation rules applied after the file is read.

use camino::Utf8Path;

use crate::errors::ConfigurationError;

use super::parser::ConfigDocument;

pub(crate) const GNMI: &str = "gnmi";
pub(crate) const VPP: &str = "vpp";
pub(crate) const IOAM: &str = "ioam";
pub(crate) const VIRTUALBOX: &str = "virtualbox";

pub(crate) const TARGET: &str = "target";
pub(crate) const GNMI_NODES: &str = "gnmi_nodes";
pub(crate) const VBOX_USER: &str = "vbox_user";
pub(crate) const CONFIG_DIRECTORY: &str = "config_directory";

/// Sections the agent consumes.
const AGENT_SECTIONS: [&str; 4] = [GNMI, VPP, IOAM, VIRTUALBOX];

/// Values computed from the file and argument overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Derived {
    pub(crate) gnmi_target: Option<String>,
    pub(crate) vpp_gnmi_nodes: Vec<String>,
    pub(crate) ioam_gnmi_nodes: Vec<String>,
}

/// Agent rules: every consumed section must exist, and the VirtualBox
/// configuration directory defaults to the vbox user's home.
pub(crate) fn agent(
    path: &Utf8Path,
    document: &mut ConfigDocument,
) -> Result<Derived, ConfigurationError> {
    for section in AGENT_SECTIONS {
        require_section(path, document, section)?;
    }
    default_config_directory(path, document)?;

    Ok(Derived {
        gnmi_target: document.get(GNMI, TARGET).map(str::to_owned),
        vpp_gnmi_nodes: parse_node_list(document.get(VPP, GNMI_NODES)),
        ioam_gnmi_nodes: parse_node_list(document.get(IOAM, GNMI_NODES)),
    })
}

/// Web front-end rules: the command-line target wins; otherwise `[gnmi]`
/// must supply one. Node lists are read when their sections are present.
pub(crate) fn web_app(
    path: &Utf8Path,
    document: &ConfigDocument,
    target_override: Option<&str>,
) -> Result<Derived, ConfigurationError> {
    let gnmi_target = match target_override {
        Some(target) => Some(target.to_owned()),
        None => {
            require_section(path, document, GNMI)?;
            document.get(GNMI, TARGET).map(str::to_owned)
        }
    };

    Ok(Derived {
        gnmi_target,
        vpp_gnmi_nodes: parse_node_list(document.get(VPP, GNMI_NODES)),
        ioam_gnmi_nodes: parse_node_list(document.get(IOAM, GNMI_NODES)),
    })
}

fn require_section(
    path: &Utf8Path,
    document: &ConfigDocument,
    section: &'static str,
) -> Result<(), ConfigurationError> {
    if document.has_section(section) {
        Ok(())
    } else {
        Err(ConfigurationError::MissingSection {
            path: path.to_path_buf(),
            section,
        })
    }
}

fn default_config_directory(
    path: &Utf8Path,
    document: &mut ConfigDocument,
) -> Result<(), ConfigurationError> {
    if document.contains_key(VIRTUALBOX, CONFIG_DIRECTORY) {
        return Ok(());
    }
    let user = document
        .get(VIRTUALBOX, VBOX_USER)
        .ok_or_else(|| ConfigurationError::MissingKey {
            path: path.to_path_buf(),
            section: VIRTUALBOX,
            key: VBOX_USER,
        })?;
    let directory = format!("/home/{user}/.config");
    document.set(VIRTUALBOX, CONFIG_DIRECTORY, directory);
    Ok(())
}

/// Splits a comma-separated node list and trims each entry.
///
/// Order is preserved and empty entries between commas are kept. An absent
/// or empty value yields an empty list.
#[must_use]
pub fn parse_node_list(value: Option<&str>) -> Vec<String> {
    value
        .filter(|nodes| !nodes.is_empty())
        .into_iter()
        .flat_map(|nodes| nodes.split(','))
        .map(|node| node.trim().to_owned())
        .collect()
}
