//! The closed set of front ends sharing the bootstrap layer.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Front-end kinds that bootstrap through this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// The terminal viewer (`dxtop`).
    Console,
    /// The long-running monitoring agent (`dxagent`).
    Agent,
    /// The web front end (`dxweb`).
    WebApp,
}

impl Variant {
    /// All variants in declaration order.
    pub const ALL: [Self; 3] = [Self::Console, Self::Agent, Self::WebApp];

    /// Selects the variant whose owner type carries `name`.
    ///
    /// Returns `None` for any name outside the three known front ends, which
    /// callers treat as "nothing to bootstrap".
    #[must_use]
    pub fn from_owner_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.owner_name() == name)
    }

    /// Name of the owning front-end type; also the logger name.
    #[must_use]
    pub const fn owner_name(self) -> &'static str {
        match self {
            Self::Console => "DXTop",
            Self::Agent => "DXAgent",
            Self::WebApp => "DXWeb",
        }
    }

    /// Program name shown in usage messages.
    #[must_use]
    pub const fn program_name(self) -> &'static str {
        match self {
            Self::Console => "dxtop",
            Self::Agent => "dxagent",
            Self::WebApp => "dxweb",
        }
    }

    /// Whether the variant's schema includes a configuration file.
    #[must_use]
    pub const fn uses_configuration(self) -> bool {
        matches!(self, Self::Agent | Self::WebApp)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Console => "console",
            Self::Agent => "agent",
            Self::WebApp => "web-app",
        };
        formatter.write_str(label)
    }
}

/// Error returned when parsing a variant label fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported front-end variant: {0}")]
pub struct VariantParseError(String);

impl VariantParseError {
    /// Returns the offending value that could not be parsed.
    #[must_use]
    pub fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Variant {
    type Err = VariantParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "agent" => Ok(Self::Agent),
            "web-app" | "webapp" => Ok(Self::WebApp),
            other => Err(VariantParseError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("DXTop", Some(Variant::Console))]
    #[case("DXAgent", Some(Variant::Agent))]
    #[case("DXWeb", Some(Variant::WebApp))]
    #[case("dxtop", None)]
    #[case("Collector", None)]
    #[case("", None)]
    fn selects_variant_by_owner_name(#[case] name: &str, #[case] expected: Option<Variant>) {
        assert_eq!(Variant::from_owner_name(name), expected);
    }

    #[test]
    fn labels_round_trip_through_from_str() {
        for variant in Variant::ALL {
            let parsed: Variant = variant.to_string().parse().expect("label parses");
            assert_eq!(parsed, variant);
        }
    }

    #[test]
    fn rejects_unknown_labels() {
        let error = "daemon".parse::<Variant>().expect_err("unknown label");
        assert_eq!(error.value(), "daemon");
    }

    #[test]
    fn only_agent_and_web_app_use_configuration() {
        assert!(!Variant::Console.uses_configuration());
        assert!(Variant::Agent.uses_configuration());
        assert!(Variant::WebApp.uses_configuration());
    }
}
