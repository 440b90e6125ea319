//! Mapping between container entry names and scratch-tree paths.
//!
//! Entry names are always forward-slash separated. Backslashes are treated as
//! separators in both directions, so a name written on Windows by another tool
//! lands in the same place as it would on any other host.

use crate::archive::error::{ArchiveError, Result};
use std::path::{Component, Path, PathBuf};

/// Convert an entry name to a path relative to the extraction root.
///
/// Empty and `.` segments are dropped. Names containing `..`, an absolute
/// root or a drive prefix are rejected so nothing is written outside the
/// destination directory.
pub fn entry_to_relative(name: &str) -> Result<PathBuf> {
    let mut relative = PathBuf::new();

    for segment in name.split(['/', '\\']) {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            return Err(ArchiveError::UnsafeEntryPath(name.to_string()));
        }

        // A single segment must parse as exactly one normal component; this
        // catches prefixes such as `C:` on Windows.
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => relative.push(part),
            _ => return Err(ArchiveError::UnsafeEntryPath(name.to_string())),
        }
    }

    if relative.as_os_str().is_empty() && !name.ends_with('/') {
        return Err(ArchiveError::UnsafeEntryPath(name.to_string()));
    }

    Ok(relative)
}

/// Convert a path relative to the scratch root to an entry name.
///
/// Returns `None` for paths that are not valid UTF-8 or that contain
/// anything other than normal components.
pub fn relative_to_entry(relative: &Path) -> Option<String> {
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_str()?.replace('\\', "/")),
            Component::CurDir => continue,
            _ => return None,
        }
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}
