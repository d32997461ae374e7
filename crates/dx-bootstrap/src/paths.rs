//! Lexical path resolution against the bootstrap working directory.
//!
//! Nothing here touches the filesystem: resolution must be deterministic and
//! happen before any configuration is read.

use std::env;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

use crate::errors::BootstrapError;

/// Resolves `path` to an absolute, normalised path rooted at `base`.
///
/// Absolute inputs keep their own root. `.` components are dropped and `..`
/// components remove the preceding segment without climbing above the root.
#[must_use]
pub fn absolutize(base: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut resolved = Utf8PathBuf::new();
    for component in joined.components() {
        match component {
            Utf8Component::Prefix(_) | Utf8Component::RootDir => {
                resolved.push(component.as_str());
            }
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                let has_segment = resolved
                    .components()
                    .next_back()
                    .is_some_and(|last| matches!(last, Utf8Component::Normal(_)));
                if has_segment {
                    resolved.pop();
                }
            }
            Utf8Component::Normal(segment) => resolved.push(segment),
        }
    }
    resolved
}

/// Roots a relative path at `base` without normalising it; absolute paths
/// are returned verbatim.
#[must_use]
pub fn root_relative(base: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Reads the process working directory as a UTF-8 path.
pub fn current_working_directory() -> Result<Utf8PathBuf, BootstrapError> {
    let directory =
        env::current_dir().map_err(|source| BootstrapError::WorkingDirectory { source })?;
    Utf8PathBuf::from_path_buf(directory)
        .map_err(|path| BootstrapError::NonUtf8WorkingDirectory { path })
}
