//! Reader for the key-grouped (INI-style) configuration format.
//!
//! The accepted dialect matches what the agent's configuration files have
//! always used: `[section]` headers, `key = value` or `key: value` entries,
//! full-line `#`/`;` comments, and a `[DEFAULT]` section whose entries every
//! other section inherits. Keys are case-insensitive and stored lower-cased;
//! section names are case sensitive.
//!
//! A line indented deeper than the entry it follows continues that entry's
//! value. Blank lines inside a value are kept; trailing ones are dropped.
//! Values may reference other keys of their section or of `[DEFAULT]` with
//! `%(name)s`, and `%%` stands for a literal `%`. References are expanded
//! once, when the text is parsed.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use super::interpolation::{self, MAX_INTERPOLATION_DEPTH};

/// Name of the section whose entries every other section inherits.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Entries of one section, sorted by key.
pub type Section = BTreeMap<String, String>;

/// Parsed configuration text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    defaults: Section,
    sections: BTreeMap<String, Section>,
}

/// Reader error with the 1-based line where it was detected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// Line number of the offending input.
    pub line: usize,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

/// Kinds of malformed configuration text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// An entry appeared before any section header.
    MissingSectionHeader,
    /// A section header named a section seen earlier.
    DuplicateSection(String),
    /// A key was repeated inside one section.
    DuplicateOption {
        /// Section holding the duplicate.
        section: String,
        /// Repeated key.
        key: String,
    },
    /// A header had nothing between its brackets.
    EmptySectionName,
    /// An entry had nothing before its delimiter.
    EmptyKey,
    /// A line was neither a header, an entry, a comment, nor a continuation.
    MalformedLine(String),
    /// A `%` was not followed by `%` or a `%(name)s` reference.
    InterpolationSyntax {
        /// Entry holding the reference.
        key: String,
        /// Text from the offending `%` onwards.
        fragment: String,
    },
    /// A `%(name)s` reference named a key absent from the section and defaults.
    InterpolationMissing {
        /// Entry holding the reference.
        key: String,
        /// Referenced key.
        reference: String,
    },
    /// References nested more than ten levels deep.
    InterpolationDepth {
        /// Entry whose expansion recursed too far.
        key: String,
    },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSectionHeader => formatter.write_str("entry outside of any section"),
            Self::DuplicateSection(name) => write!(formatter, "section [{name}] already exists"),
            Self::DuplicateOption { section, key } => {
                write!(formatter, "option '{key}' in section [{section}] already exists")
            }
            Self::EmptySectionName => formatter.write_str("section header has no name"),
            Self::EmptyKey => formatter.write_str("entry has no key"),
            Self::MalformedLine(text) => write!(formatter, "expected 'key = value', got '{text}'"),
            Self::InterpolationSyntax { key, fragment } => write!(
                formatter,
                "option '{key}': '%' must be followed by '%' or '(', found '{fragment}'"
            ),
            Self::InterpolationMissing { key, reference } => {
                write!(formatter, "option '{key}' references missing option '{reference}'")
            }
            Self::InterpolationDepth { key } => write!(
                formatter,
                "option '{key}' nests references deeper than {MAX_INTERPOLATION_DEPTH}"
            ),
        }
    }
}

/// The last entry written, which deeper-indented lines extend.
struct OpenEntry {
    section: String,
    key: String,
    indent: usize,
}

/// Line on which each `(section, key)` entry was written.
type OptionOrigins = BTreeMap<(String, String), usize>;

impl ConfigDocument {
    /// Parses configuration text.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] for the first malformed line.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut document = Self::default();
        let mut origins = OptionOrigins::new();
        let mut current: Option<String> = None;
        let mut open: Option<OpenEntry> = None;
        let mut seen_default = false;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                if let Some(entry) = open.as_ref() {
                    document.continue_value(entry, "");
                }
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let indent = raw.len() - raw.trim_start().len();
            if let Some(entry) = open.as_ref().filter(|entry| indent > entry.indent) {
                document.continue_value(entry, trimmed);
                continue;
            }

            if let Some(header) = parse_header(trimmed) {
                let name = header.trim();
                if name.is_empty() {
                    return Err(ParseError::new(line, ParseErrorKind::EmptySectionName));
                }
                document.open_section(name, line, &mut seen_default)?;
                current = Some(name.to_owned());
                open = None;
                continue;
            }

            let Some(section) = current.as_ref() else {
                return Err(ParseError::new(line, ParseErrorKind::MissingSectionHeader));
            };
            let (raw_key, value) = split_entry(trimmed).ok_or_else(|| {
                ParseError::new(line, ParseErrorKind::MalformedLine(trimmed.to_owned()))
            })?;
            let key = raw_key.trim().to_lowercase();
            if key.is_empty() {
                return Err(ParseError::new(line, ParseErrorKind::EmptyKey));
            }
            document.insert_new(section, &key, value.trim(), line)?;
            origins.insert((section.clone(), key.clone()), line);
            open = Some(OpenEntry {
                section: section.clone(),
                key,
                indent,
            });
        }

        document.trim_value_ends();
        document.interpolate(&origins)?;
        Ok(document)
    }

    fn trim_value_ends(&mut self) {
        let sections = self.sections.values_mut();
        for value in std::iter::once(&mut self.defaults)
            .chain(sections)
            .flat_map(|entries| entries.values_mut())
        {
            let kept = value.trim_end().len();
            value.truncate(kept);
        }
    }

    /// Expands `%(name)s` references in every section, with `[DEFAULT]`
    /// entries in scope. Inherited defaults that hold a reference are
    /// expanded per section and stored there; `[DEFAULT]` keeps raw text.
    fn interpolate(&mut self, origins: &OptionOrigins) -> Result<(), ParseError> {
        for (name, entries) in &mut self.sections {
            let mut scope = self.defaults.clone();
            scope.extend(entries.iter().map(|(key, value)| (key.clone(), value.clone())));

            for (key, raw) in &scope {
                if !raw.contains('%') {
                    continue;
                }
                let expanded = interpolation::expand(key, raw, &scope).map_err(|kind| {
                    let origin = origins
                        .get(&(name.clone(), key.clone()))
                        .or_else(|| origins.get(&(DEFAULT_SECTION.to_owned(), key.clone())))
                        .copied()
                        .unwrap_or_default();
                    ParseError::new(origin, kind)
                })?;
                entries.insert(key.clone(), expanded);
            }
        }
        Ok(())
    }

    fn open_section(
        &mut self,
        name: &str,
        line: usize,
        seen_default: &mut bool,
    ) -> Result<(), ParseError> {
        let exists = if name == DEFAULT_SECTION {
            std::mem::replace(seen_default, true)
        } else {
            self.sections.contains_key(name)
        };
        if exists {
            return Err(ParseError::new(
                line,
                ParseErrorKind::DuplicateSection(name.to_owned()),
            ));
        }
        if name != DEFAULT_SECTION {
            self.sections.insert(name.to_owned(), Section::new());
        }
        Ok(())
    }

    fn insert_new(
        &mut self,
        section: &str,
        key: &str,
        value: &str,
        line: usize,
    ) -> Result<(), ParseError> {
        let entries = self.section_entries_mut(section);
        if entries.contains_key(key) {
            return Err(ParseError::new(
                line,
                ParseErrorKind::DuplicateOption {
                    section: section.to_owned(),
                    key: key.to_owned(),
                },
            ));
        }
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn continue_value(&mut self, entry: &OpenEntry, text: &str) {
        if let Some(value) = self.section_entries_mut(&entry.section).get_mut(&entry.key) {
            value.push('\n');
            value.push_str(text);
        }
    }

    fn section_entries_mut(&mut self, section: &str) -> &mut Section {
        if section == DEFAULT_SECTION {
            &mut self.defaults
        } else {
            self.sections.entry(section.to_owned()).or_default()
        }
    }

    /// Whether a non-default section named `name` exists.
    #[must_use]
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Names of the non-default sections, sorted.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Looks up `key` in `section`, falling back to `[DEFAULT]`.
    ///
    /// Returns `None` when the section does not exist.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let entries = self.sections.get(section)?;
        let normalized = key.to_lowercase();
        entries
            .get(&normalized)
            .or_else(|| self.defaults.get(&normalized))
            .map(String::as_str)
    }

    /// Whether `section` holds `key`, counting inherited defaults.
    #[must_use]
    pub fn contains_key(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_some()
    }

    /// Stores `value` under `key` in an existing section.
    ///
    /// Returns `false` without changing anything when the section is absent.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) -> bool {
        match self.sections.get_mut(section) {
            Some(entries) => {
                entries.insert(key.to_lowercase(), value.into());
                true
            }
            None => false,
        }
    }

    /// Entries of `section` merged over the defaults.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<Section> {
        let entries = self.sections.get(name)?;
        let mut merged = self.defaults.clone();
        merged.extend(entries.iter().map(|(key, value)| (key.clone(), value.clone())));
        Some(merged)
    }

    /// Entries of the `[DEFAULT]` section.
    #[must_use]
    pub const fn defaults(&self) -> &Section {
        &self.defaults
    }
}

impl ParseError {
    const fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

fn parse_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']')
}

fn split_entry(line: &str) -> Option<(&str, &str)> {
    let delimiter = line.find(['=', ':'])?;
    let (key, rest) = line.split_at(delimiter);
    Some((key, rest.get(1..).unwrap_or_default()))
}
