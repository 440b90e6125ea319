//! Materialise a container's entries as files.

use crate::archive::container::{Container, ContainerEntry};
use crate::archive::error::{ArchiveError, Result};
use crate::archive::path::entry_to_relative;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Unpack the container at `container_path` into `dest_dir`.
///
/// `dest_dir` is created if absent. Entries are written in container order;
/// directory entries only create directories. Each file receives the entry's
/// modification time so that a later repack carries it forward.
///
/// On failure `dest_dir` may hold a partial tree; the caller owns its removal.
pub fn unpack<P: AsRef<Path>, Q: AsRef<Path>>(container_path: P, dest_dir: Q) -> Result<()> {
    let container_path = container_path.as_ref();
    let dest_dir = dest_dir.as_ref();

    let container = Container::open(container_path)?;
    debug!(
        container = %container_path.display(),
        entries = container.len(),
        "unpacking container"
    );
    extract(&container, dest_dir)
}

/// Write every entry of `container` below `dest_dir`.
pub fn extract(container: &Container, dest_dir: &Path) -> Result<()> {
    fs::create_dir_all(dest_dir).map_err(|e| ArchiveError::io(dest_dir, e))?;

    for entry in container.entries() {
        let target = dest_dir.join(entry_to_relative(entry.path())?);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| ArchiveError::io(&target, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
        }
        write_entry(entry, &target).map_err(|e| ArchiveError::io(&target, e))?;
    }

    Ok(())
}

fn write_entry(entry: &ContainerEntry, target: &Path) -> std::io::Result<()> {
    let mut file = File::create(target)?;
    file.write_all(entry.data())?;
    if let Some(modified) = entry.modified() {
        file.set_modified(modified)?;
    }
    Ok(())
}
