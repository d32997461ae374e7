//! Expansion of `%(name)s` references inside configuration values.

use super::parser::{ParseErrorKind, Section};

/// Deepest chain of references followed before giving up.
pub(crate) const MAX_INTERPOLATION_DEPTH: usize = 10;

/// Expands the value `raw` stored under `key`, resolving references in `scope`.
pub(crate) fn expand(key: &str, raw: &str, scope: &Section) -> Result<String, ParseErrorKind> {
    let mut expanded = String::with_capacity(raw.len());
    expand_into(&mut expanded, key, raw, scope, 1)?;
    Ok(expanded)
}

fn expand_into(
    out: &mut String,
    key: &str,
    raw: &str,
    scope: &Section,
    depth: usize,
) -> Result<(), ParseErrorKind> {
    if depth > MAX_INTERPOLATION_DEPTH {
        return Err(ParseErrorKind::InterpolationDepth {
            key: key.to_owned(),
        });
    }

    let mut rest = raw;
    while let Some(position) = rest.find('%') {
        let (literal, reference_start) = rest.split_at(position);
        out.push_str(literal);
        rest = reference_start;

        if let Some(after) = rest.strip_prefix("%%") {
            out.push('%');
            rest = after;
            continue;
        }

        let (reference, after) = split_reference(rest).ok_or_else(|| {
            ParseErrorKind::InterpolationSyntax {
                key: key.to_owned(),
                fragment: rest.to_owned(),
            }
        })?;
        let name = reference.to_lowercase();
        let value = scope
            .get(&name)
            .ok_or_else(|| ParseErrorKind::InterpolationMissing {
                key: key.to_owned(),
                reference: name.clone(),
            })?;
        if value.contains('%') {
            expand_into(out, key, value, scope, depth + 1)?;
        } else {
            out.push_str(value);
        }
        rest = after;
    }
    out.push_str(rest);
    Ok(())
}

/// Splits `%(name)s...` into `name` and the text after the closing `s`.
fn split_reference(text: &str) -> Option<(&str, &str)> {
    let inner = text.strip_prefix("%(")?;
    let close = inner.find(')')?;
    let (name, tail) = inner.split_at(close);
    if name.is_empty() {
        return None;
    }
    Some((name, tail.strip_prefix(")s")?))
}
